//! Batched image-load diagnostics
//!
//! Loading a page of thumbnails produces a burst of events. Rather than
//! logging each one, failures and hit/fetch counts are accumulated and
//! flushed as one report once no new event has arrived for the debounce
//! window.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Default quiet period before a report is flushed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// A single image that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    /// Human-readable label, usually the design title
    pub label: Option<String>,
    pub url: String,
    pub error: String,
}

/// Accumulated events for one flush
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub failures: Vec<ImageFailure>,
    /// Resolutions served from either cache tier
    pub cached: u64,
    /// Resolutions that went to the network and succeeded
    pub fetched: u64,
}

impl DiagnosticsReport {
    /// Whether there is anything to report
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.cached == 0 && self.fetched == 0
    }
}

/// Destination for flushed reports
pub trait DiagnosticsSink: Send + Sync {
    fn flush(&self, report: &DiagnosticsReport);
}

/// Sink that writes reports as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn flush(&self, report: &DiagnosticsReport) {
        for failure in &report.failures {
            warn!(
                design = failure.label.as_deref().unwrap_or("(unknown)"),
                url = %failure.url,
                error = %failure.error,
                "Image load failed"
            );
        }

        if report.cached > 0 || report.fetched > 0 {
            info!("Images: {} cached {} fetched", report.cached, report.fetched);
        }
    }
}

#[derive(Default)]
struct Pending {
    report: DiagnosticsReport,
    generation: u64,
}

struct Inner {
    pending: Mutex<Pending>,
    sink: Arc<dyn DiagnosticsSink>,
    debounce: Duration,
}

/// Debounced event aggregator; clones share the same buffer
#[derive(Clone)]
pub struct Diagnostics {
    inner: Option<Arc<Inner>>,
}

impl Diagnostics {
    /// Aggregate into `sink`, flushing after `debounce` of quiet
    pub fn new(sink: Arc<dyn DiagnosticsSink>, debounce: Duration) -> Self {
        Self {
            inner: Some(Arc::new(Inner {
                pending: Mutex::new(Pending::default()),
                sink,
                debounce,
            })),
        }
    }

    /// Aggregate into tracing with the default debounce
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink), DEFAULT_DEBOUNCE)
    }

    /// Drop every event
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Record an image that failed to load
    pub fn record_failure(&self, label: Option<&str>, url: &str, error: &str) {
        self.record(|report| {
            report.failures.push(ImageFailure {
                label: label.map(str::to_string),
                url: url.to_string(),
                error: error.to_string(),
            })
        });
    }

    /// Record a resolution served from cache
    pub fn record_cached(&self) {
        self.record(|report| report.cached += 1);
    }

    /// Record a resolution fetched from the network
    pub fn record_fetched(&self) {
        self.record(|report| report.fetched += 1);
    }

    /// Flush whatever is pending right away
    pub fn flush_now(&self) {
        let Some(inner) = &self.inner else {
            return;
        };
        let report = {
            let mut pending = inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.generation += 1;
            std::mem::take(&mut pending.report)
        };
        if !report.is_empty() {
            inner.sink.flush(&report);
        }
    }

    fn record(&self, apply: impl FnOnce(&mut DiagnosticsReport)) {
        let Some(inner) = &self.inner else {
            return;
        };

        let generation = {
            let mut pending = inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            apply(&mut pending.report);
            pending.generation += 1;
            pending.generation
        };

        // Outside a runtime there is no timer to wait on
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.flush_now();
            return;
        };

        let inner = Arc::clone(inner);
        handle.spawn(async move {
            tokio::time::sleep(inner.debounce).await;

            let report = {
                let mut pending = inner.pending.lock().unwrap_or_else(|e| e.into_inner());
                if pending.generation != generation {
                    // A newer event restarted the window
                    return;
                }
                std::mem::take(&mut pending.report)
            };

            if !report.is_empty() {
                inner.sink.flush(&report);
            }
        });
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::tracing()
    }
}

/// Sink that keeps every flushed report, for tests
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<DiagnosticsReport>>,
}

impl CollectingSink {
    /// Create an empty collecting sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports flushed so far
    pub fn reports(&self) -> Vec<DiagnosticsReport> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn flush(&self, report: &DiagnosticsReport) {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(report.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn collecting() -> (Diagnostics, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        let diagnostics = Diagnostics::new(sink.clone(), DEFAULT_DEBOUNCE);
        (diagnostics, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_flushes_once() {
        let (diagnostics, sink) = collecting();

        for _ in 0..16 {
            diagnostics.record_cached();
        }
        diagnostics.record_fetched();
        diagnostics.record_failure(Some("Pikachu Planter"), "https://cdn/p.png", "HTTP 404");

        sleep(Duration::from_millis(600)).await;

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].cached, 16);
        assert_eq!(reports[0].fetched, 1);
        assert_eq!(reports[0].failures[0].error, "HTTP 404");
        assert_eq!(reports[0].failures[0].label.as_deref(), Some("Pikachu Planter"));
    }

    #[tokio::test(start_paused = true)]
    async fn new_events_restart_the_window() {
        let (diagnostics, sink) = collecting();

        diagnostics.record_cached();
        sleep(Duration::from_millis(300)).await;
        diagnostics.record_cached();
        sleep(Duration::from_millis(300)).await;

        assert!(sink.reports().is_empty());

        sleep(Duration::from_millis(300)).await;
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].cached, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_flush_separately() {
        let (diagnostics, sink) = collecting();

        diagnostics.record_fetched();
        sleep(Duration::from_millis(600)).await;
        diagnostics.record_fetched();
        sleep(Duration::from_millis(600)).await;

        let reports = sink.reports();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.fetched == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_now_skips_the_timer() {
        let (diagnostics, sink) = collecting();

        diagnostics.record_failure(None, "https://cdn/x.png", "connection refused");
        diagnostics.flush_now();
        assert_eq!(sink.reports().len(), 1);

        // The pending timer finds nothing left to flush
        sleep(Duration::from_millis(600)).await;
        assert_eq!(sink.reports().len(), 1);
    }

    #[test]
    fn outside_runtime_flushes_immediately() {
        let (diagnostics, sink) = collecting();
        diagnostics.record_cached();
        assert_eq!(sink.reports().len(), 1);
    }

    #[test]
    fn disabled_records_nothing() {
        let diagnostics = Diagnostics::disabled();
        diagnostics.record_cached();
        diagnostics.record_failure(Some("x"), "u", "e");
        diagnostics.flush_now();
    }
}
