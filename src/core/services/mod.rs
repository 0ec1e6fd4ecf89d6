pub mod audit_service;
pub mod customer_service;
pub mod import_service;
pub mod product_service;
pub mod summary_service;

pub use audit_service::AuditService;
pub use customer_service::CustomerService;
pub use import_service::{ImportReport, ImportService, JsonFileCache, LegacyCache};
pub use product_service::ProductService;
pub use summary_service::SummaryService;

use serde::de::DeserializeOwned;

use crate::errors::StockError;
use crate::storage::{decode_all, Collection, DocumentStore};

pub type ServiceResult<T> = Result<T, StockError>;

/// Loads and decodes every record of `collection` visible to `owner`.
pub(crate) fn load_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    owner: &str,
) -> ServiceResult<Vec<T>> {
    let documents = store.query(collection, owner)?;
    decode_all(&documents)
}

#[cfg(test)]
mod tests;
