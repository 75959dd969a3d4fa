//! Error types for the shared pool

use thiserror::Error;

/// Boxed error produced by a fallible object factory
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Object construction failed: {0}")]
    Construction(#[source] BoxError),

    #[error("Pool has already been dropped")]
    PoolExpired,

    #[error("Operation was cancelled")]
    Cancelled,

    #[cfg(feature = "metrics")]
    #[error("Metrics export failed: {0}")]
    MetricsExport(#[from] prometheus::Error),
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_construction_keeps_source() {
        let err = PoolError::Construction("socket refused".into());

        assert_eq!(err.to_string(), "Object construction failed: socket refused");
        assert_eq!(err.source().unwrap().to_string(), "socket refused");
    }
}
