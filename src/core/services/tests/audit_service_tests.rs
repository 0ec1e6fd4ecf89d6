use rust_decimal_macros::dec;
use serde_json::json;

use super::{customer, date, product, unknown_id, OWNER};
use crate::core::services::AuditService;
use crate::domain::{Purchase, PurchaseDraft, SaleDraft, StockDiscrepancy};
use crate::ledger::StockLedger;
use crate::storage::{Collection, DocumentStore, MemoryStore, WriteMode};

#[test]
fn ledger_operations_leave_no_findings() {
    let store = MemoryStore::new();
    let item = product(&store, "Regata", 3);
    let buyer = customer(&store, "Nina");
    let ledger = StockLedger::new(&store, OWNER);
    let purchase = ledger
        .record_purchase(&PurchaseDraft::new(item.id, 4, dec!(9), date(2024, 4, 1)), None)
        .unwrap();
    ledger
        .record_sale(
            &SaleDraft::new(buyer.id, item.id, 6, dec!(25), date(2024, 4, 2)),
            None,
        )
        .unwrap();
    ledger
        .record_purchase(
            &PurchaseDraft::new(item.id, 5, dec!(9), date(2024, 4, 1)),
            Some(purchase.id),
        )
        .unwrap();

    assert!(AuditService::for_owner(&store, OWNER).unwrap().is_empty());
}

#[test]
fn tampered_quantity_is_reported() {
    let store = MemoryStore::new();
    let item = product(&store, "Short", 3);
    store
        .set(
            Collection::Products,
            item.id,
            json!({ "quantity": -2 }),
            WriteMode::Merge,
        )
        .unwrap();

    let findings = AuditService::for_owner(&store, OWNER).unwrap();
    assert_eq!(
        findings,
        vec![
            StockDiscrepancy::QuantityMismatch {
                product: item.id,
                cached: -2,
                expected: 3,
            },
            StockDiscrepancy::NegativeQuantity {
                product: item.id,
                quantity: -2,
            },
        ]
    );
    assert!(findings[0].describe().contains("add up to 3"));
}

#[test]
fn movement_of_unknown_product_is_reported() {
    let orphan = Purchase::from_draft(
        unknown_id(),
        OWNER,
        &PurchaseDraft::new(unknown_id(), 1, dec!(1), date(2024, 1, 1)),
    );
    let findings = AuditService::stock_discrepancies(&[], &[orphan.clone()], &[], &[]);
    assert_eq!(
        findings,
        vec![StockDiscrepancy::MissingProduct {
            movement: orphan.id,
            product: orphan.product_id,
        }]
    );
}
