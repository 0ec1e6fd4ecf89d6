use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{OwnerScoped, Product};
use crate::errors::{Result, StockError};
use crate::storage::{Collection, StoreTransaction, WriteMode};

/// Reads a record inside the transaction, treating other owners' records as absent.
pub(crate) fn load_owned<T>(
    txn: &mut dyn StoreTransaction,
    collection: Collection,
    id: Uuid,
    owner: &str,
    kind: &str,
) -> Result<T>
where
    T: DeserializeOwned + OwnerScoped,
{
    match txn.get::<T>(collection, id)? {
        Some(record) if record.is_owned_by(owner) => Ok(record),
        _ => Err(StockError::not_found(kind, id)),
    }
}

pub(super) fn load_product(
    txn: &mut dyn StoreTransaction,
    id: Uuid,
    owner: &str,
) -> Result<Product> {
    load_owned(txn, Collection::Products, id, owner, "product")
}

/// Applies `delta` to the freshly read `product` and buffers the new quantity.
///
/// A delta that removes stock may not take the quantity below zero.
pub(super) fn apply_delta(
    txn: &mut dyn StoreTransaction,
    product: &mut Product,
    delta: i64,
) -> Result<i64> {
    let next = product.quantity + delta;
    if delta < 0 && next < 0 {
        return Err(StockError::InsufficientStock {
            product: product.id,
            available: product.quantity,
            requested: -delta,
        });
    }
    product.quantity = next;
    txn.write(
        Collection::Products,
        product.id,
        json!({ "quantity": next }),
        WriteMode::Merge,
    );
    Ok(next)
}

/// Moves stock for an edited movement.
///
/// `reversal` undoes the old movement on its product and `effect` applies the new one. When both
/// target the same product only the net delta is applied. A sale edit is checked against the
/// stock restored by its reversal, so the error names the full quantity asked for.
pub(super) fn rebalance(
    txn: &mut dyn StoreTransaction,
    owner: &str,
    previous: Option<(Uuid, i64)>,
    target: Uuid,
    effect: i64,
) -> Result<i64> {
    match previous {
        Some((old_product, reversal)) if old_product != target => {
            let mut old = load_product(txn, old_product, owner)?;
            let mut new = load_product(txn, target, owner)?;
            apply_delta(txn, &mut old, reversal)?;
            apply_delta(txn, &mut new, effect)
        }
        Some((_, reversal)) => {
            let mut product = load_product(txn, target, owner)?;
            let restored = product.quantity + reversal;
            if reversal > 0 && effect < 0 && restored + effect < 0 {
                return Err(StockError::InsufficientStock {
                    product: product.id,
                    available: restored,
                    requested: -effect,
                });
            }
            apply_delta(txn, &mut product, reversal + effect)
        }
        None => {
            let mut product = load_product(txn, target, owner)?;
            apply_delta(txn, &mut product, effect)
        }
    }
}
