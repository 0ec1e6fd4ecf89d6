use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Customer, Sale, SaleDraft};
use crate::errors::Result;
use crate::storage::{transact, Collection};

use super::stock::{apply_delta, load_owned, load_product, rebalance};
use super::StockLedger;

impl StockLedger<'_> {
    /// Creates a sale, or edits `existing`, debiting the product in the same transaction.
    ///
    /// `new quantity = current + previous sale quantity − draft quantity`, which must stay
    /// non-negative when measured against the quantity read inside the transaction.
    pub fn record_sale(&self, draft: &SaleDraft, existing: Option<Uuid>) -> Result<Sale> {
        draft.validate()?;
        let owner = self.owner;
        let sale_id = existing.unwrap_or_else(Uuid::new_v4);

        let outcome = transact(self.store, |txn| {
            let previous = match existing {
                Some(id) => Some(load_owned::<Sale>(
                    txn,
                    Collection::Sales,
                    id,
                    owner,
                    "sale",
                )?),
                None => None,
            };
            load_owned::<Customer>(txn, Collection::Customers, draft.customer_id, owner, "customer")?;
            let reversal = previous
                .as_ref()
                .map(|old| (old.product_id, i64::from(old.quantity)));
            let quantity = rebalance(
                txn,
                owner,
                reversal,
                draft.product_id,
                -i64::from(draft.quantity),
            )?;

            let sale = Sale::from_draft(sale_id, owner, draft);
            txn.put_merged(Collection::Sales, sale_id, &sale)?;
            Ok((sale, quantity))
        });

        match outcome {
            Ok((sale, quantity)) => {
                info!(
                    sale = %sale.id,
                    product = %sale.product_id,
                    quantity = sale.quantity,
                    stock = quantity,
                    edited = existing.is_some(),
                    "sale recorded"
                );
                Ok(sale)
            }
            Err(err) => {
                warn!(product = %draft.product_id, error = %err, "sale rejected");
                Err(err)
            }
        }
    }

    /// Removes a sale and returns its quantity to stock, whatever the current level is.
    pub fn delete_sale(&self, sale_id: Uuid) -> Result<Sale> {
        let owner = self.owner;
        let outcome = transact(self.store, |txn| {
            let sale: Sale = load_owned(txn, Collection::Sales, sale_id, owner, "sale")?;
            let mut product = load_product(txn, sale.product_id, owner)?;
            let quantity = apply_delta(txn, &mut product, i64::from(sale.quantity))?;
            txn.delete(Collection::Sales, sale_id);
            Ok((sale, quantity))
        });

        match outcome {
            Ok((sale, quantity)) => {
                info!(
                    sale = %sale_id,
                    product = %sale.product_id,
                    stock = quantity,
                    "sale deleted"
                );
                Ok(sale)
            }
            Err(err) => {
                warn!(sale = %sale_id, error = %err, "sale deletion rejected");
                Err(err)
            }
        }
    }
}
