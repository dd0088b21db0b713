pub mod collector;
pub mod metrics;
pub mod monitor;

pub use collector::MetricsCollector;
pub use metrics::{MetricsSnapshot, NodeMetrics};
pub use monitor::PipelineMonitor;
