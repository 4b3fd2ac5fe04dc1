use thiserror::Error;

pub type MarketResult<T> = Result<T, MarketError>;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data store error: {0}")]
    Store(String),

    #[error("Degenerate regression input: {0}")]
    DegenerateInput(String),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
