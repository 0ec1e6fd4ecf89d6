//! Live month-to-date statistics recomputed from collection subscriptions.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{RecvError, Select};
use tracing::debug;

use crate::core::clock::Clock;
use crate::core::services::SummaryService;
use crate::domain::{Customer, MonthlyStats, Product, Purchase, Sale};
use crate::errors::{Result, StockError};
use crate::storage::{decode_all, Collection, Document, DocumentStore, FeedEvent, Subscription};

/// Holds one subscription per collection and the latest snapshot each one delivered.
pub struct DashboardFeed {
    owner: String,
    subscriptions: Vec<Subscription>,
    snapshots: BTreeMap<Collection, Vec<Document>>,
    clock: Arc<dyn Clock>,
}

impl DashboardFeed {
    /// Subscribes to every collection and waits for the initial snapshots.
    pub fn open(store: &dyn DocumentStore, owner: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut subscriptions = Vec::with_capacity(Collection::ALL.len());
        let mut snapshots = BTreeMap::new();
        for collection in Collection::ALL {
            let subscription = store.subscribe(collection, owner)?;
            match subscription.recv() {
                Some(FeedEvent::Snapshot(documents)) => {
                    snapshots.insert(collection, documents);
                }
                Some(FeedEvent::Error(message)) => return Err(StockError::StoreUnavailable(message)),
                None => {
                    return Err(StockError::StoreUnavailable(format!(
                        "{collection} feed closed before its first snapshot"
                    )))
                }
            }
            subscriptions.push(subscription);
        }
        debug!(owner, "dashboard feed opened");
        Ok(Self {
            owner: owner.to_string(),
            subscriptions,
            snapshots,
            clock,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Statistics over the snapshots received so far.
    pub fn current(&self) -> Result<MonthlyStats> {
        let products: Vec<Product> = self.decode(Collection::Products)?;
        let purchases: Vec<Purchase> = self.decode(Collection::Purchases)?;
        let sales: Vec<Sale> = self.decode(Collection::Sales)?;
        let customers: Vec<Customer> = self.decode(Collection::Customers)?;
        SummaryService::monthly(
            &products,
            &purchases,
            &sales,
            &customers,
            self.clock.today(),
        )
    }

    /// Blocks until any collection changes and returns the recomputed statistics.
    ///
    /// Returns `None` once the feed is closed or the store dropped it.
    pub fn next(&mut self) -> Option<Result<MonthlyStats>> {
        let (collection, received) = self.wait(None)?;
        self.apply(collection, received)
    }

    /// Like [`DashboardFeed::next`], but gives up after `timeout` and returns `None`.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Result<MonthlyStats>> {
        let (collection, received) = self.wait(Some(timeout))?;
        self.apply(collection, received)
    }

    pub fn is_open(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active)
    }

    /// Cancels every subscription. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for subscription in &mut self.subscriptions {
            subscription.unsubscribe();
        }
        self.subscriptions.clear();
        debug!(owner = %self.owner, "dashboard feed closed");
    }

    fn wait(
        &self,
        timeout: Option<Duration>,
    ) -> Option<(Collection, std::result::Result<FeedEvent, RecvError>)> {
        if self.subscriptions.is_empty() {
            return None;
        }
        let mut select = Select::new();
        for subscription in &self.subscriptions {
            select.recv(subscription.receiver());
        }
        let operation = match timeout {
            Some(timeout) => select.select_timeout(timeout).ok()?,
            None => select.select(),
        };
        let subscription = &self.subscriptions[operation.index()];
        let received = operation.recv(subscription.receiver());
        Some((subscription.collection(), received))
    }

    fn apply(
        &mut self,
        collection: Collection,
        received: std::result::Result<FeedEvent, RecvError>,
    ) -> Option<Result<MonthlyStats>> {
        match received {
            Ok(FeedEvent::Snapshot(documents)) => {
                debug!(%collection, count = documents.len(), "dashboard snapshot received");
                self.snapshots.insert(collection, documents);
                Some(self.current())
            }
            Ok(FeedEvent::Error(message)) => Some(Err(StockError::StoreUnavailable(message))),
            Err(RecvError) => None,
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        match self.snapshots.get(&collection) {
            Some(documents) => decode_all(documents),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for DashboardFeed {
    fn drop(&mut self) {
        self.close();
    }
}
