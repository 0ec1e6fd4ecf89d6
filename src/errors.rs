use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy shared by the stock ledger, the store and the services.
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(
        "Insufficient stock for product {product}: {available} available, {requested} requested"
    )]
    InsufficientStock {
        product: Uuid,
        /// Stock the removal was measured against; an edited sale's own quantity counts as
        /// available.
        available: i64,
        /// Units the operation tried to take out.
        requested: i64,
    },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type Result<T> = std::result::Result<T, StockError>;

impl StockError {
    pub fn not_found(kind: &str, id: Uuid) -> Self {
        StockError::NotFound(format!("{kind} {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StockError::Validation(message.into())
    }
}

impl From<std::io::Error> for StockError {
    fn from(err: std::io::Error) -> Self {
        StockError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StockError {
    fn from(err: serde_json::Error) -> Self {
        StockError::Validation(format!("malformed document: {err}"))
    }
}
