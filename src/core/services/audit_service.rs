use std::collections::{HashMap, HashSet};

use tracing::warn;
use uuid::Uuid;

use crate::domain::{Customer, Movement, Product, Purchase, Sale, StockDiscrepancy};
use crate::storage::{Collection, DocumentStore};

use super::{load_all, ServiceResult};

/// Cross-checks cached product quantities against the movement history.
pub struct AuditService;

impl AuditService {
    pub fn stock_discrepancies(
        products: &[Product],
        purchases: &[Purchase],
        sales: &[Sale],
        customers: &[Customer],
    ) -> Vec<StockDiscrepancy> {
        let mut net: HashMap<Uuid, i64> = HashMap::new();
        let mut findings = Vec::new();
        let known_products: HashSet<Uuid> = products.iter().map(|p| p.id).collect();
        let known_customers: HashSet<Uuid> = customers.iter().map(|c| c.id).collect();

        for purchase in purchases {
            *net.entry(purchase.product_id).or_default() += purchase.stock_delta();
            if !known_products.contains(&purchase.product_id) {
                findings.push(StockDiscrepancy::MissingProduct {
                    movement: purchase.id,
                    product: purchase.product_id,
                });
            }
        }
        for sale in sales {
            *net.entry(sale.product_id).or_default() += sale.stock_delta();
            if !known_products.contains(&sale.product_id) {
                findings.push(StockDiscrepancy::MissingProduct {
                    movement: sale.id,
                    product: sale.product_id,
                });
            }
            if !known_customers.contains(&sale.customer_id) {
                findings.push(StockDiscrepancy::MissingCustomer {
                    sale: sale.id,
                    customer: sale.customer_id,
                });
            }
        }

        for product in products {
            let expected = product.opening_quantity + net.get(&product.id).copied().unwrap_or(0);
            if product.quantity != expected {
                findings.push(StockDiscrepancy::QuantityMismatch {
                    product: product.id,
                    cached: product.quantity,
                    expected,
                });
            }
            if product.quantity < 0 {
                findings.push(StockDiscrepancy::NegativeQuantity {
                    product: product.id,
                    quantity: product.quantity,
                });
            }
        }
        findings
    }

    pub fn for_owner(store: &dyn DocumentStore, owner: &str) -> ServiceResult<Vec<StockDiscrepancy>> {
        let products: Vec<Product> = load_all(store, Collection::Products, owner)?;
        let purchases: Vec<Purchase> = load_all(store, Collection::Purchases, owner)?;
        let sales: Vec<Sale> = load_all(store, Collection::Sales, owner)?;
        let customers: Vec<Customer> = load_all(store, Collection::Customers, owner)?;
        let findings = Self::stock_discrepancies(&products, &purchases, &sales, &customers);
        for finding in &findings {
            warn!(owner, "{}", finding.describe());
        }
        Ok(findings)
    }
}
