use tracing::info;
use uuid::Uuid;

use crate::domain::{Customer, CustomerDraft};
use crate::ledger::load_owned;
use crate::storage::{transact, Collection, DocumentStore, WriteMode};

use super::{load_all, ServiceResult};

pub struct CustomerService;

impl CustomerService {
    pub fn create(
        store: &dyn DocumentStore,
        owner: &str,
        draft: &CustomerDraft,
    ) -> ServiceResult<Customer> {
        let customer = Customer::from_draft(Uuid::new_v4(), owner, draft);
        store.set(
            Collection::Customers,
            customer.id,
            serde_json::to_value(&customer)?,
            WriteMode::Replace,
        )?;
        info!(customer = %customer.id, "customer created");
        Ok(customer)
    }

    pub fn update(
        store: &dyn DocumentStore,
        owner: &str,
        id: Uuid,
        draft: &CustomerDraft,
    ) -> ServiceResult<Customer> {
        let customer = transact(store, |txn| {
            load_owned::<Customer>(txn, Collection::Customers, id, owner, "customer")?;
            let customer = Customer::from_draft(id, owner, draft);
            txn.put_merged(Collection::Customers, id, &customer)?;
            Ok(customer)
        })?;
        info!(customer = %id, "customer updated");
        Ok(customer)
    }

    /// Deletes a customer. Sales that named it keep their reference and show up in the audit.
    pub fn remove(store: &dyn DocumentStore, owner: &str, id: Uuid) -> ServiceResult<Customer> {
        let customer = transact(store, |txn| {
            let customer: Customer =
                load_owned(txn, Collection::Customers, id, owner, "customer")?;
            txn.delete(Collection::Customers, id);
            Ok(customer)
        })?;
        info!(customer = %id, "customer deleted");
        Ok(customer)
    }

    pub fn get(store: &dyn DocumentStore, owner: &str, id: Uuid) -> ServiceResult<Customer> {
        transact(store, |txn| {
            load_owned(txn, Collection::Customers, id, owner, "customer")
        })
    }

    pub fn list(store: &dyn DocumentStore, owner: &str) -> ServiceResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = load_all(store, Collection::Customers, owner)?;
        customers.sort_by_key(|customer| customer.name.to_lowercase());
        Ok(customers)
    }
}
