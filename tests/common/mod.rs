#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use stockbook::{
    config::Config,
    core::FixedClock,
    domain::{Customer, CustomerDraft, Product, ProductDraft, Size},
    storage::MemoryStore,
    Inventory,
};
use tempfile::TempDir;
use uuid::Uuid;

pub const OWNER: &str = "loja-centro";

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated base directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn today() -> NaiveDate {
    day(2024, 6, 20)
}

/// Inventory over a fresh store, pinned to [`today`].
pub fn inventory() -> (Inventory, Arc<MemoryStore>) {
    inventory_with(MemoryStore::new())
}

pub fn inventory_with(store: MemoryStore) -> (Inventory, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let inventory = Inventory::new(store.clone(), OWNER)
        .with_config(Config::default())
        .with_clock(Arc::new(FixedClock::new(today())));
    (inventory, store)
}

pub fn stocked(inventory: &Inventory, description: &str, opening: u32) -> Product {
    inventory
        .create_product(&ProductDraft::new(description, Size::Medium).with_opening_quantity(opening))
        .expect("create product")
}

pub fn customer(inventory: &Inventory, name: &str) -> Customer {
    inventory
        .create_customer(&CustomerDraft::new(name, "11987654321").expect("valid customer"))
        .expect("create customer")
}

pub fn quantity_of(inventory: &Inventory, product: Uuid) -> i64 {
    inventory.product(product).expect("product exists").quantity
}
