//! Metric pipelines, generic over [`crate::backend_trait::EvalBackend`].

pub mod accuracy;
pub mod log_loss;

pub use accuracy::evaluate_accuracy;
pub use log_loss::evaluate_log_loss;
