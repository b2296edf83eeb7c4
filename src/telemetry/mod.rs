pub mod metrics;
pub mod tracing;

pub use metrics::DeliveryMetrics;
pub use self::tracing::{TracingConfig, TracingError, TracingGuard, init_tracing};
