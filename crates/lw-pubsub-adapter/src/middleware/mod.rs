//! Middleware for the registration intake.
//!
//! Layer order: Request → RequestSpan → StructuralGate → BodyLimit → Handler

pub mod metrics;
pub mod tracing;

pub use metrics::{IntakeMetrics, MetricsSnapshot};
pub use self::tracing::RequestSpanLayer;
