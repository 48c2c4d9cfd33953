//! Metrics collection module for the quote book
//!
//! Counts operations and tracks their latencies with Prometheus, and renders
//! the gathered values as text on demand.

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Instant;

lazy_static! {
    /// Global Prometheus registry instance
    pub static ref REGISTRY_INSTANCE: Registry = Registry::new();

    /// Counter for quote manager operations by method
    pub static ref OP_COUNTER_VEC: CounterVec = CounterVec::new(
        Opts::new("quote_op_counter", "quote operation counter"),
        &["method"]
    )
    .unwrap();

    /// Histogram of quote manager operation latencies
    pub static ref OP_HISTOGRAM_VEC: HistogramVec = HistogramVec::new(
        HistogramOpts::new("quote_op_cost", "quote operation cost"),
        &["method"]
    )
    .unwrap();
}

/// Registers all metric collectors with the global registry.
pub fn init_registry() {
    let _ = REGISTRY_INSTANCE.register(Box::new(OP_COUNTER_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(OP_HISTOGRAM_VEC.clone()));
}

/// Counts and times one operation.
///
/// # Arguments
///
/// * `method` - Name of the operation being measured
/// * `handler` - Function to execute and measure
///
/// # Returns
///
/// Returns the result of the handler function
pub fn observe<F, T>(method: &'static str, handler: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    OP_COUNTER_VEC.with_label_values(&[method]).inc();
    let result = handler();

    let elapsed = start.elapsed();
    OP_HISTOGRAM_VEC
        .with_label_values(&[method])
        .observe(elapsed.as_secs_f64());

    result
}

/// Renders everything gathered so far in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY_INSTANCE.gather(), &mut buffer) {
        log::warn!("failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
