use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Purchase, PurchaseDraft};
use crate::errors::Result;
use crate::storage::{transact, Collection};

use super::stock::{apply_delta, load_owned, load_product, rebalance};
use super::StockLedger;

impl StockLedger<'_> {
    /// Creates a purchase, or edits `existing`, crediting the product in the same transaction.
    ///
    /// `new quantity = current − previous purchase quantity + draft quantity`.
    pub fn record_purchase(
        &self,
        draft: &PurchaseDraft,
        existing: Option<Uuid>,
    ) -> Result<Purchase> {
        draft.validate()?;
        let owner = self.owner;
        let purchase_id = existing.unwrap_or_else(Uuid::new_v4);

        let outcome = transact(self.store, |txn| {
            let previous = match existing {
                Some(id) => Some(load_owned::<Purchase>(
                    txn,
                    Collection::Purchases,
                    id,
                    owner,
                    "purchase",
                )?),
                None => None,
            };
            let reversal = previous
                .as_ref()
                .map(|old| (old.product_id, -i64::from(old.quantity)));
            let quantity = rebalance(
                txn,
                owner,
                reversal,
                draft.product_id,
                i64::from(draft.quantity),
            )?;

            let purchase = Purchase::from_draft(purchase_id, owner, draft);
            txn.put_merged(Collection::Purchases, purchase_id, &purchase)?;
            Ok((purchase, quantity))
        });

        match outcome {
            Ok((purchase, quantity)) => {
                info!(
                    purchase = %purchase.id,
                    product = %purchase.product_id,
                    quantity = purchase.quantity,
                    stock = quantity,
                    edited = existing.is_some(),
                    "purchase recorded"
                );
                Ok(purchase)
            }
            Err(err) => {
                warn!(product = %draft.product_id, error = %err, "purchase rejected");
                Err(err)
            }
        }
    }

    /// Removes a purchase and takes its quantity back out of stock.
    pub fn delete_purchase(&self, purchase_id: Uuid) -> Result<Purchase> {
        let owner = self.owner;
        let outcome = transact(self.store, |txn| {
            let purchase: Purchase =
                load_owned(txn, Collection::Purchases, purchase_id, owner, "purchase")?;
            let mut product = load_product(txn, purchase.product_id, owner)?;
            let quantity = apply_delta(txn, &mut product, -i64::from(purchase.quantity))?;
            txn.delete(Collection::Purchases, purchase_id);
            Ok((purchase, quantity))
        });

        match outcome {
            Ok((purchase, quantity)) => {
                info!(
                    purchase = %purchase_id,
                    product = %purchase.product_id,
                    stock = quantity,
                    "purchase deleted"
                );
                Ok(purchase)
            }
            Err(err) => {
                warn!(purchase = %purchase_id, error = %err, "purchase deletion rejected");
                Err(err)
            }
        }
    }
}
