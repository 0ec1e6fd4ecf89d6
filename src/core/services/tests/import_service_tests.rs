use std::collections::BTreeMap;
use std::fs;

use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tempfile::tempdir;

use super::OWNER;
use crate::core::services::import_service::{IMPORT_TAG, LEGACY_ID_FIELD};
use crate::core::services::{AuditService, ImportService, JsonFileCache, LegacyCache};
use crate::domain::{Customer, Product, Purchase, Sale};
use crate::storage::{decode_all, Collection, DocumentStore, MemoryStore};

fn legacy_cache() -> BTreeMap<Collection, Vec<Value>> {
    BTreeMap::from([
        (
            Collection::Customers,
            vec![json!({ "id": "1700000000001", "name": "Ana", "phoneNumber": "11987654321" })],
        ),
        (
            Collection::Products,
            vec![json!({ "id": 1, "description": "Camiseta", "size": "M", "quantity": 12 })],
        ),
        (
            Collection::Purchases,
            vec![json!({
                "id": "p1", "productId": 1, "quantity": 5, "unitCost": 12.5, "date": "2024-05-02"
            })],
        ),
        (
            Collection::Sales,
            vec![json!({
                "id": "s1", "productId": 1, "customerId": "1700000000001",
                "quantity": 3, "unitPrice": "30.00", "date": "2024-05-03"
            })],
        ),
    ])
}

fn owned<T: serde::de::DeserializeOwned>(store: &MemoryStore, collection: Collection) -> Vec<T> {
    decode_all(&store.query(collection, OWNER).unwrap()).unwrap()
}

#[test]
fn import_tags_records_and_resolves_references() {
    let store = MemoryStore::new();
    let report = ImportService::run(&store, OWNER, &legacy_cache());
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.total_imported(), 4);

    let products: Vec<Product> = owned(&store, Collection::Products);
    let customers: Vec<Customer> = owned(&store, Collection::Customers);
    let purchases: Vec<Purchase> = owned(&store, Collection::Purchases);
    let sales: Vec<Sale> = owned(&store, Collection::Sales);
    assert_eq!(products[0].quantity, 12);
    assert_eq!(products[0].opening_quantity, 10);
    assert_eq!(purchases[0].product_id, products[0].id);
    assert_eq!(purchases[0].unit_cost, dec!(12.5));
    assert_eq!(sales[0].product_id, products[0].id);
    assert_eq!(sales[0].customer_id, customers[0].id);

    for collection in Collection::ALL {
        for doc in store.query(collection, OWNER).unwrap() {
            assert_eq!(doc.data[IMPORT_TAG], json!(true));
            assert_eq!(doc.data["ownerId"], json!(OWNER));
            assert!(doc.data.get(LEGACY_ID_FIELD).is_some());
        }
    }
    assert!(AuditService::for_owner(&store, OWNER).unwrap().is_empty());
}

#[test]
fn second_run_imports_nothing() {
    let store = MemoryStore::new();
    ImportService::run(&store, OWNER, &legacy_cache());
    let before = store.export().unwrap().document_count();

    let report = ImportService::run(&store, OWNER, &legacy_cache());
    assert_eq!(report.total_imported(), 0);
    assert_eq!(report.skipped.len(), 4);
    assert_eq!(store.export().unwrap().document_count(), before);
}

#[test]
fn resumed_import_links_to_earlier_records() {
    let store = MemoryStore::new();
    let mut first = legacy_cache();
    first.remove(&Collection::Purchases);
    first.remove(&Collection::Sales);
    ImportService::run(&store, OWNER, &first);

    let report = ImportService::run(&store, OWNER, &legacy_cache());
    assert_eq!(report.skipped, vec![Collection::Customers, Collection::Products]);
    assert_eq!(report.imported_in(Collection::Purchases), 1);
    assert_eq!(report.imported_in(Collection::Sales), 1);

    let products: Vec<Product> = owned(&store, Collection::Products);
    let sales: Vec<Sale> = owned(&store, Collection::Sales);
    assert_eq!(products.len(), 1);
    assert_eq!(sales[0].product_id, products[0].id);
}

#[test]
fn each_owner_gets_its_own_copy() {
    let store = MemoryStore::new();
    ImportService::run(&store, OWNER, &legacy_cache());
    let report = ImportService::run(&store, "filial-norte", &legacy_cache());
    assert_eq!(report.total_imported(), 4);
    assert_eq!(store.query(Collection::Products, "filial-norte").unwrap().len(), 1);
    assert_eq!(store.query(Collection::Products, OWNER).unwrap().len(), 1);
}

#[test]
fn bad_items_are_reported_without_stopping_the_import() {
    let store = MemoryStore::new();
    let mut cache = legacy_cache();
    cache.get_mut(&Collection::Purchases).unwrap().extend([
        json!("not an object"),
        json!({ "id": "p2", "productId": 99, "quantity": 1, "unitCost": 1, "date": "2024-05-02" }),
        json!({ "id": "p3", "productId": 1, "quantity": "many", "unitCost": 1, "date": "2024-05-02" }),
    ]);

    let report = ImportService::run(&store, OWNER, &cache);
    assert_eq!(report.failures.len(), 3, "{:?}", report.failures);
    assert!(report.failures[1].contains("productId `99`"));
    assert_eq!(report.imported_in(Collection::Purchases), 1);
    assert_eq!(report.imported_in(Collection::Sales), 1);
}

#[test]
fn offline_store_failures_are_swallowed() {
    let store = MemoryStore::new();
    store.set_available(false);
    let report = ImportService::run(&store, OWNER, &legacy_cache());
    assert_eq!(report.total_imported(), 0);
    assert_eq!(report.failures.len(), 4);
}

#[test]
fn file_cache_reads_either_naming_scheme() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("produtos.json"),
        r#"[{ "id": 1, "description": "Boné", "size": "U", "quantity": 2 }]"#,
    )
    .unwrap();
    fs::write(temp.path().join("customers.json"), "[]").unwrap();
    fs::write(temp.path().join("vendas.json"), r#"{ "oops": true }"#).unwrap();

    let cache = JsonFileCache::new(temp.path());
    assert_eq!(cache.load(Collection::Products).unwrap().unwrap().len(), 1);
    assert_eq!(cache.load(Collection::Customers).unwrap(), Some(Vec::new()));
    assert!(cache.load(Collection::Purchases).unwrap().is_none());
    assert!(cache.load(Collection::Sales).is_err());

    let store = MemoryStore::new();
    let report = ImportService::run(&store, OWNER, &cache);
    assert_eq!(report.imported_in(Collection::Products), 1);
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn portuguese_field_names_are_translated() {
    let cache = BTreeMap::from([
        (
            Collection::Customers,
            vec![json!({ "id": 7, "nome": "Joana", "whatsapp": "(21) 99876-5432" })],
        ),
        (
            Collection::Products,
            vec![json!({ "id": 3, "descricao": "Bermuda", "tamanho": "G", "quantidade": "4" })],
        ),
        (
            Collection::Purchases,
            vec![json!({
                "id": 30, "produtoId": 3, "quantidade": "6", "precoCusto": "22.00", "data": "2024-05-02"
            })],
        ),
        (
            Collection::Sales,
            vec![json!({
                "id": 40, "produtoId": 3, "clienteId": 7, "quantidade": 2,
                "precoVenda": 55, "data": "2024-05-04"
            })],
        ),
    ]);
    let store = MemoryStore::new();
    let report = ImportService::run(&store, OWNER, &cache);
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.total_imported(), 4);

    let products: Vec<Product> = owned(&store, Collection::Products);
    let customers: Vec<Customer> = owned(&store, Collection::Customers);
    let sales: Vec<Sale> = owned(&store, Collection::Sales);
    assert_eq!(products[0].description, "Bermuda");
    assert_eq!(products[0].quantity, 4);
    assert_eq!(products[0].opening_quantity, 0);
    assert_eq!(customers[0].phone_number, "21998765432");
    assert_eq!(sales[0].customer_id, customers[0].id);
    assert_eq!(sales[0].unit_price, dec!(55));
    assert!(AuditService::for_owner(&store, OWNER).unwrap().is_empty());
}
