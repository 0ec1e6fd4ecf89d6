mod audit_service_tests;
mod customer_service_tests;
mod import_service_tests;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Customer, CustomerDraft, Product, ProductDraft, Size};
use crate::storage::MemoryStore;

use super::{CustomerService, ProductService};

pub(super) const OWNER: &str = "loja-centro";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(super) fn product(store: &MemoryStore, description: &str, opening: u32) -> Product {
    ProductService::create(
        store,
        OWNER,
        &ProductDraft::new(description, Size::Medium).with_opening_quantity(opening),
    )
    .unwrap()
}

pub(super) fn customer(store: &MemoryStore, name: &str) -> Customer {
    CustomerService::create(
        store,
        OWNER,
        &CustomerDraft::new(name, "(11) 98765-4321").unwrap(),
    )
    .unwrap()
}

pub(super) fn unknown_id() -> Uuid {
    Uuid::new_v4()
}
