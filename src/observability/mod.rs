// Observability: metrics recording and the end-of-run snapshot

pub mod metrics;

pub use metrics::{emit_counter, emit_gauge, emit_histogram, init, snapshot, MetricName};
