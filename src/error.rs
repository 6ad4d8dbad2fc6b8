use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart store is not configured: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cart write failed: {0}")]
    StoreWrite(String),

    #[error("store call timed out")]
    Timeout,

    #[error("database error")]
    Db(#[from] sqlx::Error),

    #[error("guest cart serialization error")]
    Serialization(#[from] serde_json::Error),

    #[error("guest cart io error")]
    Io(#[from] std::io::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub type CartResult<T> = Result<T, CartError>;
