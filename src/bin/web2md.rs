//! HTTP service binary for web2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` / `ServerConfig` and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use web2md::config::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS};
use web2md::server::{self, AppState};
use web2md::{ConcurrencyLimiter, ConversionConfig, FetchStrategy, PageConverter, ServerConfig};

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on 0.0.0.0:8000
  web2md

  # Different port, smaller fetch pool
  web2md --port 9000 --max-concurrency 20

  # Convert a page
  curl 'http://localhost:8000/convert?url=https%3A%2F%2Fwww.rust-lang.org%2F'

  # Convert several pages at once
  curl -X POST http://localhost:8000/convert/batch \
       -H 'Content-Type: application/json' \
       -d '{"urls": ["https://www.rust-lang.org/", "https://docs.rs/"]}'

ENDPOINTS:
  GET  /convert?url=<url>   Markdown as text/plain; {"detail": ...} on error
  POST /convert/batch       {"urls": [...]} → {"results": [...]} in input order
  GET  /health              ok

ENVIRONMENT VARIABLES:
  WEB2MD_HOST              Bind address (default 0.0.0.0)
  WEB2MD_PORT              Listening port (default 8000)
  WEB2MD_MAX_CONCURRENCY   Fetches in flight across the process (default 100)
  WEB2MD_TIMEOUT           Per-fetch timeout in seconds (default 10)
  WEB2MD_USER_AGENT        User-Agent for outbound fetches, literal or a
                           preset name (e.g. firefox_windows)
  WEB2MD_NO_PRIME          Skip the cookie-priming request
  RUST_LOG                 Overrides the log filter (e.g. web2md=debug,tower_http=debug)
"#;

/// Serve web-page-to-Markdown conversion over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "web2md",
    version,
    about = "Serve web-page-to-Markdown conversion over HTTP",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "WEB2MD_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "WEB2MD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum fetches in flight across all requests.
    #[arg(short = 'c', long, env = "WEB2MD_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    max_concurrency: usize,

    /// Per-fetch timeout in seconds.
    #[arg(short, long, env = "WEB2MD_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout: u64,

    /// User-Agent sent with every outbound request: a literal string or one of
    /// chrome_windows, firefox_windows, safari_mac, edge_windows, mobile_chrome.
    #[arg(long, env = "WEB2MD_USER_AGENT")]
    user_agent: Option<String>,

    /// Fetch pages directly, without the cookie-priming request.
    #[arg(long, env = "WEB2MD_NO_PRIME")]
    no_prime: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WEB2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "WEB2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let server_config = ServerConfig {
        host: cli.host.clone(),
        port: cli.port,
    };

    let limiter = Arc::new(ConcurrencyLimiter::new(config.max_concurrency));
    let converter =
        PageConverter::new(&config, limiter).context("Failed to initialise the converter")?;
    info!("Starting web2md with {:?}", config);

    // ── Serve ────────────────────────────────────────────────────────────
    let state = Arc::new(AppState::new(converter));
    server::serve(&server_config, state)
        .await
        .with_context(|| format!("Server on {} stopped", server_config.bind_addr()))?;
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .max_concurrency(cli.max_concurrency)
        .request_timeout_secs(cli.timeout)
        .fetch_strategy(if cli.no_prime {
            FetchStrategy::Direct
        } else {
            FetchStrategy::Primed
        });

    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }

    builder.build().context("Invalid configuration")
}
