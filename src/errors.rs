use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool size must be at least 1, got {0}")]
    InvalidSize(usize),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
