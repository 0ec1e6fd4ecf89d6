use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Product, ProductDraft, StockLevel};
use crate::ledger::load_owned;
use crate::errors::StockError;
use crate::storage::{transact, Collection, DocumentStore, WriteMode};

use super::{load_all, ServiceResult};

pub struct ProductService;

impl ProductService {
    /// Creates a product whose stock starts at the draft's opening quantity.
    pub fn create(
        store: &dyn DocumentStore,
        owner: &str,
        draft: &ProductDraft,
    ) -> ServiceResult<Product> {
        draft.validate()?;
        let product = Product::new(owner, draft.description.trim(), draft.size)
            .with_opening_quantity(draft.opening_quantity);
        store.set(
            Collection::Products,
            product.id,
            serde_json::to_value(&product)?,
            WriteMode::Replace,
        )?;
        info!(product = %product.id, quantity = product.quantity, "product created");
        Ok(product)
    }

    /// Changes description and size. Quantity is left to the stock ledger.
    pub fn update(
        store: &dyn DocumentStore,
        owner: &str,
        id: Uuid,
        draft: &ProductDraft,
    ) -> ServiceResult<Product> {
        draft.validate()?;
        let description = draft.description.trim().to_string();
        let product = transact(store, |txn| {
            let mut product: Product = load_owned(txn, Collection::Products, id, owner, "product")?;
            product.description = description.clone();
            product.size = draft.size;
            txn.write(
                Collection::Products,
                id,
                json!({ "description": product.description, "size": product.size }),
                WriteMode::Merge,
            );
            Ok(product)
        })?;
        info!(product = %id, "product updated");
        Ok(product)
    }

    /// Deletes a product that no purchase or sale refers to.
    ///
    /// The product is read before the reference check. Every movement rewrites its product's
    /// quantity, so one committed after that read conflicts the delete and the re-run sees it.
    pub fn remove(store: &dyn DocumentStore, owner: &str, id: Uuid) -> ServiceResult<Product> {
        let outcome = transact(store, |txn| {
            let product: Product = load_owned(txn, Collection::Products, id, owner, "product")?;
            let references = Self::movement_count(store, owner, id)?;
            if references > 0 {
                return Err(StockError::validation(format!(
                    "product is referenced by {} movement(s)",
                    references
                )));
            }
            txn.delete(Collection::Products, id);
            Ok(product)
        });
        match outcome {
            Ok(product) => {
                info!(product = %id, "product deleted");
                Ok(product)
            }
            Err(err) => {
                warn!(product = %id, error = %err, "product deletion refused");
                Err(err)
            }
        }
    }

    pub fn get(store: &dyn DocumentStore, owner: &str, id: Uuid) -> ServiceResult<Product> {
        transact(store, |txn| {
            load_owned(txn, Collection::Products, id, owner, "product")
        })
    }

    /// Products of `owner` sorted by description, then size.
    pub fn list(store: &dyn DocumentStore, owner: &str) -> ServiceResult<Vec<Product>> {
        let mut products: Vec<Product> = load_all(store, Collection::Products, owner)?;
        products.sort_by(|a, b| {
            a.description
                .to_lowercase()
                .cmp(&b.description.to_lowercase())
                .then(a.size.cmp(&b.size))
        });
        Ok(products)
    }

    /// Products at or below `low_at`, scarcest first.
    pub fn low_stock(
        store: &dyn DocumentStore,
        owner: &str,
        critical_at: i64,
        low_at: i64,
    ) -> ServiceResult<Vec<(Product, StockLevel)>> {
        let mut flagged: Vec<(Product, StockLevel)> = Self::list(store, owner)?
            .into_iter()
            .map(|product| {
                let level = product.stock_level(critical_at, low_at);
                (product, level)
            })
            .filter(|(_, level)| *level != StockLevel::Healthy)
            .collect();
        flagged.sort_by_key(|(product, _)| product.quantity);
        Ok(flagged)
    }

    fn movement_count(store: &dyn DocumentStore, owner: &str, id: Uuid) -> ServiceResult<usize> {
        let target = id.to_string();
        let mut count = 0;
        for collection in [Collection::Purchases, Collection::Sales] {
            count += store
                .query(collection, owner)?
                .iter()
                .filter(|doc| doc.data.get("productId").and_then(|v| v.as_str()) == Some(target.as_str()))
                .count();
        }
        Ok(count)
    }
}
