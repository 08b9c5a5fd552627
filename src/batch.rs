//! Batch conversion: many URLs, one result per URL, input order preserved.

use crate::convert::UrlConverter;
use crate::output::ConversionResult;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{info, warn};

/// Convert every URL in `urls` concurrently.
///
/// `result[i]` always belongs to `urls[i]`. At most
/// [`UrlConverter::concurrency`] conversions are in progress at once, and a
/// finished conversion frees its slot immediately: a slow URL never stops
/// the ones behind it from starting. Results are put back in input order
/// once the whole batch is done.
///
/// Failures never escape: each one becomes a `success: false` entry carrying
/// the error message, and the call returns only after every URL finished.
pub async fn convert_batch<C>(converter: &C, urls: &[String]) -> Vec<ConversionResult>
where
    C: UrlConverter,
{
    if urls.is_empty() {
        return Vec::new();
    }

    let start = Instant::now();
    let width = converter.concurrency().max(1);
    info!("Converting batch of {} URLs (width {})", urls.len(), width);

    let mut indexed: Vec<(usize, ConversionResult)> =
        stream::iter(urls.iter().cloned().enumerate().map(|(idx, url)| async move {
            let result = match converter.convert(&url).await {
                Ok(markdown) => ConversionResult::ok(url, markdown),
                Err(e) => {
                    warn!("Batch item {} failed: {}", url, e);
                    ConversionResult::failed(url, e)
                }
            };
            (idx, result)
        }))
        .buffer_unordered(width)
        .collect()
        .await;

    indexed.sort_unstable_by_key(|(idx, _)| *idx);
    let results: Vec<ConversionResult> = indexed.into_iter().map(|(_, r)| r).collect();

    let succeeded = results.iter().filter(|r| r.success).count();
    info!(
        "Batch complete: {} succeeded, {} failed in {}ms",
        succeeded,
        results.len() - succeeded,
        start.elapsed().as_millis()
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Web2MdError;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Succeeds for URLs starting with `https://`, sleeping longer for
    /// earlier positions so completion order is the reverse of input order.
    /// URLs containing `/slow` take two seconds.
    struct FakeConverter {
        active: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
        width: usize,
    }

    impl FakeConverter {
        fn new(width: usize) -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                started: AtomicUsize::new(0),
                width,
            }
        }
    }

    impl UrlConverter for FakeConverter {
        fn convert(&self, url: &str) -> impl Future<Output = Result<String, Web2MdError>> + Send {
            let url = url.to_string();
            async move {
                self.started.fetch_add(1, Ordering::SeqCst);
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);

                let sleep = if url.contains("/slow") {
                    Duration::from_millis(2000)
                } else {
                    let delay = url.trim_start_matches(|c: char| !c.is_ascii_digit());
                    let delay: u64 = delay.parse().unwrap_or(0);
                    Duration::from_millis(50u64.saturating_sub(delay * 10))
                };
                tokio::time::sleep(sleep).await;

                self.active.fetch_sub(1, Ordering::SeqCst);
                if url.starts_with("https://") {
                    Ok(format!("# {url}"))
                } else {
                    Err(Web2MdError::InvalidUrl {
                        url,
                        reason: "relative URL without a base".into(),
                    })
                }
            }
        }

        fn concurrency(&self) -> usize {
            self.width
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn mixed_batch_keeps_positions() {
        let converter = FakeConverter::new(8);
        let input = urls(&["https://good.example/0", "not-a-url", "https://good2.example/2"]);
        let results = convert_batch(&converter, &input).await;

        assert_eq!(results.len(), 3);
        let success: Vec<bool> = results.iter().map(|r| r.success).collect();
        assert_eq!(success, vec![true, false, true]);
        assert!(results[0].error.is_none());
        assert!(results[2].error.is_none());
        assert!(!results[1].error.as_deref().unwrap_or("").is_empty());
        assert!(results[1].markdown.is_empty());
        for (r, u) in results.iter().zip(&input) {
            assert_eq!(&r.url, u);
        }
    }

    #[tokio::test]
    async fn order_survives_out_of_order_completion() {
        let converter = FakeConverter::new(5);
        let input: Vec<String> = (0..5).map(|i| format!("https://site.example/{i}")).collect();
        let results = convert_batch(&converter, &input).await;
        let got: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        let want: Vec<&str> = input.iter().map(String::as_str).collect();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn width_bounds_in_progress_units() {
        let converter = FakeConverter::new(3);
        let input: Vec<String> = (0..20).map(|i| format!("https://site.example/{}", i % 5)).collect();
        let results = convert_batch(&converter, &input).await;
        assert_eq!(results.len(), 20);
        assert!(converter.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn empty_batch() {
        let converter = FakeConverter::new(4);
        assert!(convert_batch(&converter, &[]).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_head_does_not_hold_back_the_rest() {
        let converter = std::sync::Arc::new(FakeConverter::new(2));
        let input = urls(&[
            "https://site.example/slow",
            "https://site.example/4",
            "https://site.example/4",
            "https://site.example/4",
        ]);

        let start = tokio::time::Instant::now();
        let task = {
            let converter = std::sync::Arc::clone(&converter);
            let input = input.clone();
            tokio::spawn(async move { convert_batch(converter.as_ref(), &input).await })
        };

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(converter.started.load(Ordering::SeqCst), 4);

        let results = task.await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(2100), "took {:?}", start.elapsed());
        let got: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        let want: Vec<&str> = input.iter().map(String::as_str).collect();
        assert_eq!(got, want);
        assert!(results.iter().all(|r| r.success));
        assert!(converter.peak.load(Ordering::SeqCst) <= 2);
    }
}
