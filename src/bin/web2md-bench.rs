//! Load-test binary for a running web2md service.
//!
//! Reads `benchmark/urls.dat`, then drives `POST /convert/batch` at rising
//! request rates until the mean response time crosses the threshold.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use web2md::bench::{
    load_urls, BenchmarkObserver, BenchmarkReport, ControllerState, HttpBatchEndpoint,
    LoadController, StopReason, TierReport, DEFAULT_URL_FILE,
};
use web2md::config::DEFAULT_PORT;
use web2md::BenchmarkConfig;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn millis(d: Duration) -> String {
    format!("{:.2}ms", d.as_secs_f64() * 1000.0)
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner on stderr while a window runs, one result
/// block per tier on stdout so redirected runs keep every line.
struct CliObserver {
    bar: ProgressBar,
    /// Errors printed in the current tier.
    errors_shown: AtomicUsize,
}

/// Sample errors printed per tier before the rest are only counted.
const MAX_ERRORS_SHOWN: usize = 10;

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Benchmark");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors_shown: AtomicUsize::new(0),
        })
    }

    /// Print a result line to stdout without tearing the spinner.
    fn say(&self, line: String) {
        self.bar.suspend(|| println!("{line}"));
    }
}

impl BenchmarkObserver for CliObserver {
    fn on_state_change(&self, state: ControllerState) {
        match state {
            ControllerState::Running(tier) => self.bar.set_message(format!("{tier} req/s")),
            ControllerState::Escalating => self.bar.set_message("escalating…"),
            ControllerState::Idle | ControllerState::Stopped => {}
        }
    }

    fn on_tier_start(&self, tier: u64) {
        self.errors_shown.store(0, Ordering::SeqCst);
        self.say(format!(
            "\n{} {}",
            cyan("◆"),
            bold(&format!("Testing at {tier} requests/second..."))
        ));
    }

    fn on_sample_error(&self, _tier: u64, error: &str) {
        let shown = self.errors_shown.fetch_add(1, Ordering::SeqCst);
        if shown < MAX_ERRORS_SHOWN {
            let msg = if error.chars().count() > 100 {
                let cut: String = error.chars().take(99).collect();
                format!("{cut}\u{2026}")
            } else {
                error.to_string()
            };
            self.say(format!("  {} Error: {}", red("✗"), dim(&msg)));
        }
    }

    fn on_tier_complete(&self, report: &TierReport) {
        let shown = self.errors_shown.load(Ordering::SeqCst);
        if shown > MAX_ERRORS_SHOWN {
            self.say(format!(
                "  {}",
                dim(&format!("… {} more errors", shown - MAX_ERRORS_SHOWN))
            ));
        }
        self.say(format!(
            "  Average response time: {}",
            bold(&millis(report.mean_latency))
        ));
        self.say(format!(
            "  Valid responses: {}/{} ({:.1}%)  {}",
            report.valid,
            report.total,
            report.valid_percent(),
            dim(&format!("{} batches", report.batches)),
        ));
    }

    fn on_stop(&self, _reason: &StopReason) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Benchmark a service on localhost:8000
  web2md-bench

  # Different port, stop after 2100 req/s even if latency stays low
  web2md-bench --port 9000 --max-tier 2100

URL LIST:
  benchmark/urls.dat, relative to the working directory: one URL per line,
  blank lines ignored.

SCHEDULE:
  10 req/s → 100 req/s → +1000 req/s per round, 10 s per round, until the
  mean per-URL response time exceeds 500 ms.
"#;

/// Find the request rate a web2md service can sustain.
#[derive(Parser, Debug)]
#[command(
    name = "web2md-bench",
    version,
    about = "Find the request rate a web2md service can sustain",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Port of the service under test on localhost.
    #[arg(short, long, env = "WEB2MD_BENCH_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Stop instead of escalating past this many requests per second.
    #[arg(long)]
    max_tier: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WEB2MD_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The spinner carries the progress; library logs only surface as errors
    // unless asked for.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let urls = load_urls(DEFAULT_URL_FILE).context("Cannot start benchmark")?;
    println!(
        "{} Loaded {} URLs from {}",
        cyan("◆"),
        urls.len(),
        DEFAULT_URL_FILE
    );

    let config = BenchmarkConfig::builder()
        .max_tier(cli.max_tier)
        .build()
        .context("Invalid benchmark configuration")?;

    let endpoint =
        HttpBatchEndpoint::for_port(cli.port, Duration::from_secs(config.request_timeout_secs))
            .context("Failed to build HTTP client")?;
    println!("{} Target: {}", cyan("◆"), endpoint.batch_url());

    let observer = CliObserver::new();
    let mut controller = LoadController::new(endpoint, urls, config)
        .context("Cannot start benchmark")?
        .with_observer(observer);

    let report = controller.run().await;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &BenchmarkReport) {
    println!();
    match &report.stop {
        StopReason::ThresholdExceeded { tier, mean } => println!(
            "{} Benchmark completed: average response time {} exceeded the threshold at {} requests/second",
            red("✘"),
            bold(&millis(*mean)),
            bold(&tier.to_string()),
        ),
        StopReason::MaxTierReached { tier } => println!(
            "{} Benchmark completed: maximum tier {} requests/second reached under the threshold",
            green("✔"),
            bold(&tier.to_string()),
        ),
    }
    match report.last_sustainable_tier() {
        Some(tier) => println!("   Last sustainable rate: {} requests/second", bold(&tier.to_string())),
        None => println!("   {}", dim("No tier stayed under the threshold")),
    }
}
