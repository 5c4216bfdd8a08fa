//! Prometheus metrics for the concierge service.
//!
//! Covers HTTP traffic, content retrieval (phases, cache, latency), chat
//! turns and language-model calls.
//!
//! # Example
//! ```no_run
//! use tour_concierge::metrics::HTTP_REQUESTS_TOTAL;
//!
//! HTTP_REQUESTS_TOTAL
//!     .with_label_values(&["GET", "/health", "200"])
//!     .inc();
//! ```

mod middleware;

pub use middleware::{MetricsLayer, MetricsService};

use lazy_static::lazy_static;
use prometheus::{
    core::Collector, Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts,
    Registry,
};

const NAMESPACE: &str = "tour_concierge";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    pub static ref HTTP_CONNECTIONS_ACTIVE: Gauge = Gauge::with_opts(
        Opts::new("http_connections_active", "Number of in-flight HTTP requests")
            .namespace(NAMESPACE)
    ).expect("Failed to create HTTP_CONNECTIONS_ACTIVE metric");

    // ============================================================================
    // Retrieval Metrics
    // ============================================================================

    /// Labels: outcome (primary, fallback, skipped, error)
    pub static ref RETRIEVAL_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("retrieval_requests_total", "Retrieval calls by outcome")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create RETRIEVAL_REQUESTS_TOTAL metric");

    /// Labels: event (hit, miss)
    pub static ref RETRIEVAL_CACHE_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("retrieval_cache_events_total", "Retrieval cache hits and misses")
            .namespace(NAMESPACE),
        &["event"]
    ).expect("Failed to create RETRIEVAL_CACHE_EVENTS_TOTAL metric");

    pub static ref RETRIEVAL_FALLBACK_TOTAL: Counter = Counter::with_opts(
        Opts::new("retrieval_fallback_total", "Word-by-word fallback searches run")
            .namespace(NAMESPACE)
    ).expect("Failed to create RETRIEVAL_FALLBACK_TOTAL metric");

    pub static ref RETRIEVAL_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("retrieval_duration_seconds", "Retrieval latency in seconds")
            .namespace(NAMESPACE)
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])
    ).expect("Failed to create RETRIEVAL_DURATION_SECONDS metric");

    pub static ref RETRIEVAL_RESULTS_RETURNED: Histogram = Histogram::with_opts(
        HistogramOpts::new("retrieval_results_returned", "Documents returned per retrieval")
            .namespace(NAMESPACE)
            .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 10.0])
    ).expect("Failed to create RETRIEVAL_RESULTS_RETURNED metric");

    // ============================================================================
    // Chat / LLM Metrics
    // ============================================================================

    /// Labels: kind (message, more_info), status (success, fallback)
    pub static ref CHAT_TURNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("chat_turns_total", "Chat turns answered")
            .namespace(NAMESPACE),
        &["kind", "status"]
    ).expect("Failed to create CHAT_TURNS_TOTAL metric");

    /// Labels: provider, status
    pub static ref LLM_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("llm_requests_total", "Language model completions requested")
            .namespace(NAMESPACE),
        &["provider", "status"]
    ).expect("Failed to create LLM_REQUESTS_TOTAL metric");

    /// Labels: provider
    pub static ref LLM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("llm_request_duration_seconds", "Language model latency in seconds")
            .namespace(NAMESPACE)
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["provider"]
    ).expect("Failed to create LLM_REQUEST_DURATION_SECONDS metric");

    // ============================================================================
    // Tour Metrics
    // ============================================================================

    /// Labels: event (started, advanced, completed, quiz_correct, quiz_incorrect)
    pub static ref TOUR_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("tour_events_total", "Guided tour events")
            .namespace(NAMESPACE),
        &["event"]
    ).expect("Failed to create TOUR_EVENTS_TOTAL metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

fn register<C: Collector + Clone + 'static>(collector: &C) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(Box::new(collector.clone())) {
        Err(prometheus::Error::AlreadyReg) => Ok(()),
        other => other,
    }
}

/// Register every metric with the global registry.
///
/// Calling this more than once is harmless.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(&*HTTP_REQUESTS_TOTAL)?;
    register(&*HTTP_REQUEST_DURATION_SECONDS)?;
    register(&*HTTP_CONNECTIONS_ACTIVE)?;

    register(&*RETRIEVAL_REQUESTS_TOTAL)?;
    register(&*RETRIEVAL_CACHE_EVENTS_TOTAL)?;
    register(&*RETRIEVAL_FALLBACK_TOTAL)?;
    register(&*RETRIEVAL_DURATION_SECONDS)?;
    register(&*RETRIEVAL_RESULTS_RETURNED)?;

    register(&*CHAT_TURNS_TOTAL)?;
    register(&*LLM_REQUESTS_TOTAL)?;
    register(&*LLM_REQUEST_DURATION_SECONDS)?;

    register(&*TOUR_EVENTS_TOTAL)?;

    register(&*BUILD_INFO)?;
    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Render the registry in the Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_retrieval_counters() {
        RETRIEVAL_CACHE_EVENTS_TOTAL.with_label_values(&["hit"]).inc();

        let value = RETRIEVAL_CACHE_EVENTS_TOTAL.with_label_values(&["hit"]).get();
        assert!(value >= 1.0);
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().unwrap();
        let metrics = gather_metrics();
        assert!(metrics.contains("tour_concierge_build_info"));
    }
}
