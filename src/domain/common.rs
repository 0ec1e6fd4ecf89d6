use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::{Result, StockError};

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Records partitioned by the account that created them.
pub trait OwnerScoped {
    fn owner_id(&self) -> &str;

    fn is_owned_by(&self, owner: &str) -> bool {
        self.owner_id() == owner
    }
}

/// Supplies a presentation-ready label for UI or logs.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// A purchase or sale: a record that moves stock of one product.
pub trait Movement: Identifiable + OwnerScoped {
    fn product_id(&self) -> Uuid;
    fn quantity(&self) -> u32;
    fn unit_amount(&self) -> Decimal;
    fn date(&self) -> NaiveDate;

    /// Signed effect on the product's stock: positive for stock-in.
    fn stock_delta(&self) -> i64;

    /// `quantity × unit amount`, or a validation error when it cannot be represented.
    fn line_total(&self) -> Result<Decimal> {
        self.unit_amount()
            .checked_mul(Decimal::from(self.quantity()))
            .ok_or_else(|| StockError::validation("line total is too large to represent"))
    }
}

/// Sorts movements newest first, breaking ties by id so listings are stable.
pub fn newest_first<M: Movement>(movements: &mut [M]) {
    movements.sort_by(|a, b| b.date().cmp(&a.date()).then_with(|| a.id().cmp(&b.id())));
}

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use rust_decimal;
pub use uuid;
