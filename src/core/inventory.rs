use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::core::clock::{Clock, SystemClock};
use crate::core::live::DashboardFeed;
use crate::core::services::{
    AuditService, CustomerService, ImportReport, ImportService, LegacyCache, ProductService,
    ServiceResult, SummaryService,
};
use crate::domain::{
    newest_first, Customer, CustomerDraft, MonthlyStats, Product, ProductDraft, Purchase,
    PurchaseDraft, Sale, SaleDraft, StockDiscrepancy, StockLevel,
};
use crate::ledger::StockLedger;
use crate::storage::{decode_all, Collection, DocumentStore, MemoryStore};

/// Entry point for one signed-in owner: every operation runs against `store` scoped to `owner`.
#[derive(Clone)]
pub struct Inventory {
    store: Arc<dyn DocumentStore>,
    owner: String,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl Inventory {
    pub fn new(store: Arc<dyn DocumentStore>, owner: impl Into<String>) -> Self {
        Self {
            store,
            owner: owner.into(),
            config: Config::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Fresh in-process store sized by `config.max_transaction_attempts`.
    pub fn in_memory(owner: impl Into<String>, config: Config) -> Self {
        let store = MemoryStore::with_max_attempts(config.max_transaction_attempts);
        Self::new(Arc::new(store), owner).with_config(config)
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn ledger(&self) -> StockLedger<'_> {
        StockLedger::new(self.store.as_ref(), &self.owner)
    }

    // Products

    pub fn create_product(&self, draft: &ProductDraft) -> ServiceResult<Product> {
        ProductService::create(self.store(), &self.owner, draft)
    }

    pub fn update_product(&self, id: Uuid, draft: &ProductDraft) -> ServiceResult<Product> {
        ProductService::update(self.store(), &self.owner, id, draft)
    }

    pub fn delete_product(&self, id: Uuid) -> ServiceResult<Product> {
        ProductService::remove(self.store(), &self.owner, id)
    }

    pub fn product(&self, id: Uuid) -> ServiceResult<Product> {
        ProductService::get(self.store(), &self.owner, id)
    }

    pub fn products(&self) -> ServiceResult<Vec<Product>> {
        ProductService::list(self.store(), &self.owner)
    }

    /// Products classified critical or low using the configured thresholds.
    pub fn low_stock(&self) -> ServiceResult<Vec<(Product, StockLevel)>> {
        ProductService::low_stock(
            self.store(),
            &self.owner,
            self.config.critical_stock_threshold,
            self.config.low_stock_threshold,
        )
    }

    // Customers

    pub fn create_customer(&self, draft: &CustomerDraft) -> ServiceResult<Customer> {
        CustomerService::create(self.store(), &self.owner, draft)
    }

    pub fn update_customer(&self, id: Uuid, draft: &CustomerDraft) -> ServiceResult<Customer> {
        CustomerService::update(self.store(), &self.owner, id, draft)
    }

    pub fn delete_customer(&self, id: Uuid) -> ServiceResult<Customer> {
        CustomerService::remove(self.store(), &self.owner, id)
    }

    pub fn customer(&self, id: Uuid) -> ServiceResult<Customer> {
        CustomerService::get(self.store(), &self.owner, id)
    }

    pub fn customers(&self) -> ServiceResult<Vec<Customer>> {
        CustomerService::list(self.store(), &self.owner)
    }

    // Movements

    pub fn record_purchase(
        &self,
        draft: &PurchaseDraft,
        existing: Option<Uuid>,
    ) -> ServiceResult<Purchase> {
        self.ledger().record_purchase(draft, existing)
    }

    pub fn delete_purchase(&self, id: Uuid) -> ServiceResult<Purchase> {
        self.ledger().delete_purchase(id)
    }

    pub fn record_sale(&self, draft: &SaleDraft, existing: Option<Uuid>) -> ServiceResult<Sale> {
        self.ledger().record_sale(draft, existing)
    }

    pub fn delete_sale(&self, id: Uuid) -> ServiceResult<Sale> {
        self.ledger().delete_sale(id)
    }

    /// Purchases, newest first.
    pub fn purchases(&self) -> ServiceResult<Vec<Purchase>> {
        let mut purchases: Vec<Purchase> =
            decode_all(&self.store.query(Collection::Purchases, &self.owner)?)?;
        newest_first(&mut purchases);
        Ok(purchases)
    }

    /// Sales, newest first.
    pub fn sales(&self) -> ServiceResult<Vec<Sale>> {
        let mut sales: Vec<Sale> =
            decode_all(&self.store.query(Collection::Sales, &self.owner)?)?;
        newest_first(&mut sales);
        Ok(sales)
    }

    // Reporting

    pub fn monthly_stats(&self) -> ServiceResult<MonthlyStats> {
        self.monthly_stats_on(self.clock.today())
    }

    pub fn monthly_stats_on(&self, today: NaiveDate) -> ServiceResult<MonthlyStats> {
        SummaryService::for_owner(self.store(), &self.owner, today)
    }

    pub fn audit(&self) -> ServiceResult<Vec<StockDiscrepancy>> {
        AuditService::for_owner(self.store(), &self.owner)
    }

    pub fn dashboard_feed(&self) -> ServiceResult<DashboardFeed> {
        DashboardFeed::open(self.store(), &self.owner, Arc::clone(&self.clock))
    }

    /// Imports cached offline records once per owner. Problems end up in the report.
    pub fn import_legacy(&self, cache: &dyn LegacyCache) -> ImportReport {
        let report = ImportService::run(self.store(), &self.owner, cache);
        info!(
            owner = %self.owner,
            imported = report.total_imported(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "legacy import finished"
        );
        report
    }
}
