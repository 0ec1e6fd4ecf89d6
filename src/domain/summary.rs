use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Month-to-date dashboard figures for one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub reference_date: NaiveDate,
    pub month_start: NaiveDate,
    pub total_products: usize,
    pub total_customers: usize,
    pub month_purchase_count: usize,
    pub month_sale_count: usize,
    pub purchases_total: Decimal,
    pub sales_total: Decimal,
    pub month_profit: Decimal,
    /// Fraction of sales revenue kept as profit; zero when nothing was sold.
    pub profit_margin: Decimal,
}

impl MonthlyStats {
    pub fn empty(reference_date: NaiveDate, month_start: NaiveDate) -> Self {
        Self {
            reference_date,
            month_start,
            total_products: 0,
            total_customers: 0,
            month_purchase_count: 0,
            month_sale_count: 0,
            purchases_total: Decimal::ZERO,
            sales_total: Decimal::ZERO,
            month_profit: Decimal::ZERO,
            profit_margin: Decimal::ZERO,
        }
    }
}

/// Inconsistency found while auditing stock against its movement history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockDiscrepancy {
    QuantityMismatch {
        product: Uuid,
        cached: i64,
        expected: i64,
    },
    NegativeQuantity {
        product: Uuid,
        quantity: i64,
    },
    MissingProduct {
        movement: Uuid,
        product: Uuid,
    },
    MissingCustomer {
        sale: Uuid,
        customer: Uuid,
    },
}

impl StockDiscrepancy {
    pub fn describe(&self) -> String {
        match self {
            StockDiscrepancy::QuantityMismatch {
                product,
                cached,
                expected,
            } => format!(
                "product {} holds quantity {} but its movements add up to {}",
                product, cached, expected
            ),
            StockDiscrepancy::NegativeQuantity { product, quantity } => {
                format!("product {} has negative stock {}", product, quantity)
            }
            StockDiscrepancy::MissingProduct { movement, product } => format!(
                "movement {} references unknown product {}",
                movement, product
            ),
            StockDiscrepancy::MissingCustomer { sale, customer } => {
                format!("sale {} references unknown customer {}", sale, customer)
            }
        }
    }
}
