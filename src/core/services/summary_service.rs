use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Customer, Movement, MonthlyStats, Product, Purchase, Sale};
use crate::errors::StockError;
use crate::storage::{Collection, DocumentStore};

use super::{load_all, ServiceResult};

/// Month-to-date figures derived from full collection snapshots.
pub struct SummaryService;

impl SummaryService {
    /// First day of the month containing `today`.
    pub fn month_start(today: NaiveDate) -> NaiveDate {
        today.with_day(1).unwrap_or(today)
    }

    /// Whether `date` falls in `[month_start(today), today]`.
    pub fn in_month_to_date(date: NaiveDate, today: NaiveDate) -> bool {
        date >= Self::month_start(today) && date <= today
    }

    /// Weighted-average unit cost per product over its whole purchase history.
    pub fn weighted_average_costs(
        purchases: &[Purchase],
    ) -> ServiceResult<HashMap<Uuid, Decimal>> {
        let mut totals: HashMap<Uuid, (Decimal, Decimal)> = HashMap::new();
        for purchase in purchases {
            let entry = totals
                .entry(purchase.product_id)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 = add(entry.0, purchase.line_total()?, "purchase cost")?;
            entry.1 += Decimal::from(purchase.quantity);
        }
        Ok(totals
            .into_iter()
            .filter(|(_, (_, quantity))| !quantity.is_zero())
            .map(|(product, (cost, quantity))| (product, cost / quantity))
            .collect())
    }

    /// Month-to-date statistics. Totals that cannot be represented fail with a validation error.
    pub fn monthly(
        products: &[Product],
        purchases: &[Purchase],
        sales: &[Sale],
        customers: &[Customer],
        today: NaiveDate,
    ) -> ServiceResult<MonthlyStats> {
        let mut stats = MonthlyStats::empty(today, Self::month_start(today));
        stats.total_products = products.len();
        stats.total_customers = customers.len();

        for purchase in purchases
            .iter()
            .filter(|purchase| Self::in_month_to_date(purchase.date, today))
        {
            stats.month_purchase_count += 1;
            stats.purchases_total =
                add(stats.purchases_total, purchase.line_total()?, "purchases total")?;
        }

        let costs = Self::weighted_average_costs(purchases)?;
        for sale in sales
            .iter()
            .filter(|sale| Self::in_month_to_date(sale.date, today))
        {
            let cost = costs
                .get(&sale.product_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            stats.month_sale_count += 1;
            stats.sales_total = add(stats.sales_total, sale.line_total()?, "sales total")?;
            let margin = sale
                .unit_price
                .checked_sub(cost)
                .and_then(|unit| unit.checked_mul(Decimal::from(sale.quantity)))
                .ok_or_else(|| overflow("month profit"))?;
            stats.month_profit = add(stats.month_profit, margin, "month profit")?;
        }

        if stats.sales_total > Decimal::ZERO {
            stats.profit_margin = stats
                .month_profit
                .checked_div(stats.sales_total)
                .ok_or_else(|| overflow("profit margin"))?;
        }
        Ok(stats)
    }

    /// Loads the owner's collections and computes [`SummaryService::monthly`] over them.
    pub fn for_owner(
        store: &dyn DocumentStore,
        owner: &str,
        today: NaiveDate,
    ) -> ServiceResult<MonthlyStats> {
        let products: Vec<Product> = load_all(store, Collection::Products, owner)?;
        let purchases: Vec<Purchase> = load_all(store, Collection::Purchases, owner)?;
        let sales: Vec<Sale> = load_all(store, Collection::Sales, owner)?;
        let customers: Vec<Customer> = load_all(store, Collection::Customers, owner)?;
        Self::monthly(&products, &purchases, &sales, &customers, today)
    }
}

fn overflow(figure: &str) -> StockError {
    StockError::validation(format!("{figure} is too large to represent"))
}

fn add(total: Decimal, amount: Decimal, figure: &str) -> ServiceResult<Decimal> {
    total.checked_add(amount).ok_or_else(|| overflow(figure))
}
