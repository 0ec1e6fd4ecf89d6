#![doc(test(attr(deny(warnings))))]

//! Stockbook keeps a small shop's stock ledger consistent: products, purchases, sales and
//! customers stored in an owner-scoped document store, with every stock movement applied in
//! the same optimistic transaction as the record that causes it.

pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use crate::core::Inventory;
pub use crate::errors::{Result, StockError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and logs the build being run.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        let build = utils::build_info::current();
        tracing::info!(build = %build.summary(), "stockbook initialized");
    });
}
