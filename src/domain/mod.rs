pub mod common;
pub mod customer;
pub mod forms;
pub mod movement;
pub mod product;
pub mod summary;

pub use common::{newest_first, Displayable, Identifiable, Movement, OwnerScoped};
pub use customer::{Customer, CustomerDraft};
pub use movement::{Purchase, PurchaseDraft, Sale, SaleDraft, MAX_UNIT_AMOUNT};
pub use product::{Product, ProductDraft, Size, StockLevel};
pub use summary::{MonthlyStats, StockDiscrepancy};
