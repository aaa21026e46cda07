pub mod health;
pub mod operations;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use operations::{operation_status, resolve_operation};
