//! Stock ledger: the transactional path through which every stock movement flows.
//!
//! Each operation runs as one store transaction that re-reads the affected product, derives the
//! new quantity from that fresh state and writes both the product and the movement record. The
//! store may re-run a body after a conflicting commit, so bodies touch nothing outside `txn`.

mod purchases;
mod sales;
mod stock;

pub(crate) use stock::load_owned;

use crate::storage::DocumentStore;

/// Stock-mutation operations for one owner scope.
pub struct StockLedger<'a> {
    store: &'a dyn DocumentStore,
    owner: &'a str,
}

impl<'a> StockLedger<'a> {
    pub fn new(store: &'a dyn DocumentStore, owner: &'a str) -> Self {
        Self { store, owner }
    }

    pub fn owner(&self) -> &str {
        self.owner
    }
}
