use rust_decimal_macros::dec;
use serde_json::json;

use super::{customer, date, product, unknown_id, OWNER};
use crate::core::services::{AuditService, CustomerService};
use crate::domain::{CustomerDraft, SaleDraft, StockDiscrepancy};
use crate::errors::StockError;
use crate::ledger::StockLedger;
use crate::storage::{Collection, DocumentStore, MemoryStore};

#[test]
fn create_normalizes_input() {
    let store = MemoryStore::new();
    let created = CustomerService::create(
        &store,
        OWNER,
        &CustomerDraft::new("  Joana Lima ", "(21) 3456-7890").unwrap(),
    )
    .unwrap();
    assert_eq!(created.name, "Joana Lima");
    assert_eq!(created.phone_number, "2134567890");
    assert_eq!(created.formatted_phone(), "(21) 3456-7890");
    assert_eq!(created.whatsapp_link(), "https://wa.me/552134567890");
}

#[test]
fn update_replaces_fields_and_keeps_extras() {
    let store = MemoryStore::new();
    let created = customer(&store, "Rita");
    store
        .set(
            Collection::Customers,
            created.id,
            json!({ "importedFromLocalCache": true }),
            crate::storage::WriteMode::Merge,
        )
        .unwrap();

    let updated = CustomerService::update(
        &store,
        OWNER,
        created.id,
        &CustomerDraft::new("Rita Souza", "11 91234 5678").unwrap(),
    )
    .unwrap();
    assert_eq!(updated.phone_number, "11912345678");

    let stored = store.query(Collection::Customers, OWNER).unwrap().remove(0);
    assert_eq!(stored.data["name"], json!("Rita Souza"));
    assert_eq!(stored.data["importedFromLocalCache"], json!(true));
}

#[test]
fn other_owners_cannot_touch_customer() {
    let store = MemoryStore::new();
    let created = customer(&store, "Paula");
    let draft = CustomerDraft::new("Intrusa", "11987654321").unwrap();
    assert!(matches!(
        CustomerService::update(&store, "outra-loja", created.id, &draft),
        Err(StockError::NotFound(_))
    ));
    assert!(matches!(
        CustomerService::remove(&store, "outra-loja", created.id),
        Err(StockError::NotFound(_))
    ));
    assert!(matches!(
        CustomerService::get(&store, OWNER, unknown_id()),
        Err(StockError::NotFound(_))
    ));
}

#[test]
fn list_sorts_by_name_ignoring_case() {
    let store = MemoryStore::new();
    customer(&store, "bruna");
    customer(&store, "Ana");
    customer(&store, "Carlos");
    let names: Vec<String> = CustomerService::list(&store, OWNER)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Ana", "bruna", "Carlos"]);
}

#[test]
fn removing_customer_leaves_sales_for_the_audit() {
    let store = MemoryStore::new();
    let stocked = product(&store, "Jaqueta", 2);
    let buyer = customer(&store, "Marta");
    let sale = StockLedger::new(&store, OWNER)
        .record_sale(
            &SaleDraft::new(buyer.id, stocked.id, 1, dec!(120), date(2024, 3, 9)),
            None,
        )
        .unwrap();

    CustomerService::remove(&store, OWNER, buyer.id).unwrap();
    let findings = AuditService::for_owner(&store, OWNER).unwrap();
    assert_eq!(
        findings,
        vec![StockDiscrepancy::MissingCustomer {
            sale: sale.id,
            customer: buyer.id,
        }]
    );
}
