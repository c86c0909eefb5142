use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SprayError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("capacity exceeded: {quantity} {value:.3} > limit {limit:.3}")]
    Capacity {
        quantity: &'static str,
        value: f64,
        limit: f64,
    },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing geometry")]
    MissingGeometry,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Shorthand for a `Validation` error wrapped in a report.
pub(crate) fn invalid(msg: impl Into<String>) -> Report {
    Report::new(SprayError::Validation(msg.into()))
}
