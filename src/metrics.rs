//! Metrics collection and export module

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Redemption counters
    pub redemptions_submitted: IntCounter,
    pub redemptions_committed: IntCounter,
    pub redemptions_failed: IntCounter,
    pub redemptions_timed_out: IntCounter,

    // Polling counters
    pub transaction_polls: IntCounter,

    // Query cache counters
    pub cache_hits: IntCounter,
    pub cache_misses: IntCounter,

    // Histograms
    pub redemption_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let redemptions_submitted = IntCounter::with_opts(Opts::new(
            "redemptions_submitted_total",
            "Number of redemption requests submitted",
        ))?;

        let redemptions_committed = IntCounter::with_opts(Opts::new(
            "redemptions_committed_total",
            "Number of redemptions that reached the committed state",
        ))?;

        let redemptions_failed = IntCounter::with_opts(Opts::new(
            "redemptions_failed_total",
            "Number of redemptions that reached the failed state",
        ))?;

        let redemptions_timed_out = IntCounter::with_opts(Opts::new(
            "redemptions_timed_out_total",
            "Number of redemptions abandoned after exhausting the poll budget",
        ))?;

        let transaction_polls = IntCounter::with_opts(Opts::new(
            "transaction_polls_total",
            "Number of transaction status polls issued",
        ))?;

        let cache_hits = IntCounter::with_opts(Opts::new(
            "query_cache_hits_total",
            "Number of ensure_query_data calls served from a fresh cache entry",
        ))?;

        let cache_misses = IntCounter::with_opts(Opts::new(
            "query_cache_misses_total",
            "Number of ensure_query_data calls that ran their fetcher",
        ))?;

        let redemption_latency = Histogram::with_opts(HistogramOpts::new(
            "redemption_latency_seconds",
            "Wall-clock time from redemption submit to terminal state",
        ))?;

        registry.register(Box::new(redemptions_submitted.clone()))?;
        registry.register(Box::new(redemptions_committed.clone()))?;
        registry.register(Box::new(redemptions_failed.clone()))?;
        registry.register(Box::new(redemptions_timed_out.clone()))?;
        registry.register(Box::new(transaction_polls.clone()))?;
        registry.register(Box::new(cache_hits.clone()))?;
        registry.register(Box::new(cache_misses.clone()))?;
        registry.register(Box::new(redemption_latency.clone()))?;

        Ok(Self {
            registry,
            redemptions_submitted,
            redemptions_committed,
            redemptions_failed,
            redemptions_timed_out,
            transaction_polls,
            cache_hits,
            cache_misses,
            redemption_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = metrics();

        let before = m.redemptions_submitted.get();
        m.redemptions_submitted.inc();
        assert_eq!(m.redemptions_submitted.get(), before + 1);

        let before = m.transaction_polls.get();
        m.transaction_polls.inc();
        assert_eq!(m.transaction_polls.get(), before + 1);
    }

    #[test]
    fn histogram_records() {
        let m = metrics();
        m.redemption_latency.observe(0.5);
        assert!(m.redemption_latency.get_sample_count() > 0);
    }
}
