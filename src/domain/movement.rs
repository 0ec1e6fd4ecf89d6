use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Identifiable, Movement, OwnerScoped};
use crate::domain::forms;
use crate::errors::{Result, StockError};

/// Largest unit cost or price a draft accepts.
pub const MAX_UNIT_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Stock-in movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub owner_id: String,
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_cost: Decimal,
    pub date: NaiveDate,
}

impl Purchase {
    pub fn from_draft(id: Uuid, owner_id: &str, draft: &PurchaseDraft) -> Self {
        Self {
            id,
            owner_id: owner_id.to_string(),
            product_id: draft.product_id,
            quantity: draft.quantity,
            unit_cost: draft.unit_cost,
            date: draft.date,
        }
    }
}

impl Identifiable for Purchase {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl OwnerScoped for Purchase {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Movement for Purchase {
    fn product_id(&self) -> Uuid {
        self.product_id
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn unit_amount(&self) -> Decimal {
        self.unit_cost
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn stock_delta(&self) -> i64 {
        i64::from(self.quantity)
    }
}

/// Stock-out movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub owner_id: String,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub date: NaiveDate,
}

impl Sale {
    pub fn from_draft(id: Uuid, owner_id: &str, draft: &SaleDraft) -> Self {
        Self {
            id,
            owner_id: owner_id.to_string(),
            customer_id: draft.customer_id,
            product_id: draft.product_id,
            quantity: draft.quantity,
            unit_price: draft.unit_price,
            date: draft.date,
        }
    }
}

impl Identifiable for Sale {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl OwnerScoped for Sale {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Movement for Sale {
    fn product_id(&self) -> Uuid {
        self.product_id
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn unit_amount(&self) -> Decimal {
        self.unit_price
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn stock_delta(&self) -> i64 {
        -i64::from(self.quantity)
    }
}

/// Requested purchase values, validated before any store access.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDraft {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_cost: Decimal,
    pub date: NaiveDate,
}

impl PurchaseDraft {
    pub fn new(product_id: Uuid, quantity: u32, unit_cost: Decimal, date: NaiveDate) -> Self {
        Self {
            product_id,
            quantity,
            unit_cost,
            date,
        }
    }

    pub fn from_form(product_id: &str, quantity: &str, unit_cost: &str, date: &str) -> Result<Self> {
        Ok(Self {
            product_id: forms::reference("Product", product_id)?,
            quantity: forms::positive_integer("Quantity", quantity)?,
            unit_cost: forms::non_negative_amount("Unit cost", unit_cost)?,
            date: forms::date("Date", date)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_quantity(self.quantity)?;
        validate_amount("Unit cost", self.unit_cost)
    }
}

/// Requested sale values, validated before any store access.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub date: NaiveDate,
}

impl SaleDraft {
    pub fn new(
        customer_id: Uuid,
        product_id: Uuid,
        quantity: u32,
        unit_price: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            customer_id,
            product_id,
            quantity,
            unit_price,
            date,
        }
    }

    pub fn from_form(
        customer_id: &str,
        product_id: &str,
        quantity: &str,
        unit_price: &str,
        date: &str,
    ) -> Result<Self> {
        Ok(Self {
            customer_id: forms::reference("Customer", customer_id)?,
            product_id: forms::reference("Product", product_id)?,
            quantity: forms::positive_integer("Quantity", quantity)?,
            unit_price: forms::non_negative_amount("Unit price", unit_price)?,
            date: forms::date("Date", date)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_quantity(self.quantity)?;
        validate_amount("Unit price", self.unit_price)
    }
}

fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        Err(StockError::validation("Quantity must be at least 1"))
    } else {
        Ok(())
    }
}

fn validate_amount(field: &str, amount: Decimal) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(StockError::validation(format!(
            "{field} must be zero or positive"
        )))
    } else if amount > MAX_UNIT_AMOUNT {
        Err(StockError::validation(format!(
            "{field} must not exceed {MAX_UNIT_AMOUNT}"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    #[test]
    fn sale_delta_is_negative_and_totals_multiply() {
        let draft = SaleDraft::new(Uuid::new_v4(), Uuid::new_v4(), 3, dec!(5.00), day());
        let sale = Sale::from_draft(Uuid::new_v4(), "alice", &draft);
        assert_eq!(sale.stock_delta(), -3);
        assert_eq!(sale.line_total().unwrap(), dec!(15.00));
    }

    #[test]
    fn drafts_reject_zero_quantity_and_negative_amounts() {
        let product = Uuid::new_v4();
        assert!(PurchaseDraft::new(product, 0, dec!(1), day()).validate().is_err());
        assert!(PurchaseDraft::new(product, 1, dec!(-0.01), day()).validate().is_err());
        assert!(PurchaseDraft::new(product, 1, Decimal::ZERO, day()).validate().is_ok());
    }

    #[test]
    fn drafts_reject_amounts_above_the_ceiling() {
        let product = Uuid::new_v4();
        let customer = Uuid::new_v4();
        assert!(PurchaseDraft::new(product, 1, MAX_UNIT_AMOUNT, day()).validate().is_ok());
        let err = PurchaseDraft::new(product, 4, Decimal::MAX / dec!(2), day())
            .validate()
            .unwrap_err();
        assert!(matches!(err, StockError::Validation(ref msg) if msg.contains("Unit cost")));
        assert!(SaleDraft::new(customer, product, 1, MAX_UNIT_AMOUNT + dec!(0.01), day())
            .validate()
            .is_err());
        let sale = Sale::from_draft(
            Uuid::new_v4(),
            "alice",
            &SaleDraft::new(customer, product, u32::MAX, MAX_UNIT_AMOUNT, day()),
        );
        assert!(sale.line_total().is_ok());
    }

    #[test]
    fn purchase_form_reports_non_numeric_quantity() {
        let product = Uuid::new_v4().to_string();
        let err = PurchaseDraft::from_form(&product, "dez", "2.00", "2024-05-02").unwrap_err();
        assert!(matches!(err, StockError::Validation(ref msg) if msg.contains("Quantity")));
    }

    #[test]
    fn purchase_reads_legacy_numeric_cost() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "ownerId": "alice",
            "productId": Uuid::new_v4(),
            "quantity": 2,
            "unitCost": 12.5,
            "date": "2024-05-02"
        });
        let purchase: Purchase = serde_json::from_value(json).unwrap();
        assert_eq!(purchase.unit_cost, dec!(12.5));
    }
}
