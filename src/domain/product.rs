use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable, OwnerScoped};
use crate::domain::forms;
use crate::errors::{Result, StockError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "PP")]
    ExtraSmall,
    #[serde(rename = "P")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "G")]
    Large,
    #[serde(rename = "GG")]
    ExtraLarge,
    #[serde(rename = "XG")]
    DoubleExtraLarge,
    #[serde(rename = "XXG")]
    TripleExtraLarge,
    #[serde(rename = "U")]
    OneSize,
}

impl Size {
    pub const ALL: [Size; 8] = [
        Size::ExtraSmall,
        Size::Small,
        Size::Medium,
        Size::Large,
        Size::ExtraLarge,
        Size::DoubleExtraLarge,
        Size::TripleExtraLarge,
        Size::OneSize,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Size::ExtraSmall => "PP",
            Size::Small => "P",
            Size::Medium => "M",
            Size::Large => "G",
            Size::ExtraLarge => "GG",
            Size::DoubleExtraLarge => "XG",
            Size::TripleExtraLarge => "XXG",
            Size::OneSize => "U",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Size {
    type Err = StockError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        Size::ALL
            .into_iter()
            .find(|size| size.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                let options: Vec<&str> = Size::ALL.iter().map(Size::code).collect();
                StockError::validation(format!(
                    "Select a valid size (options: {})",
                    options.join(", ")
                ))
            })
    }
}

/// How close a product is to running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Critical,
    Low,
    Healthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub owner_id: String,
    pub description: String,
    pub size: Size,
    /// Cached stock, kept equal to `opening_quantity + Σ purchases − Σ sales`.
    pub quantity: i64,
    #[serde(default)]
    pub opening_quantity: i64,
}

impl Product {
    pub fn new(owner_id: impl Into<String>, description: impl Into<String>, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            description: description.into(),
            size,
            quantity: 0,
            opening_quantity: 0,
        }
    }

    pub fn with_opening_quantity(mut self, quantity: u32) -> Self {
        self.opening_quantity = i64::from(quantity);
        self.quantity = i64::from(quantity);
        self
    }

    pub fn stock_level(&self, critical_at: i64, low_at: i64) -> StockLevel {
        if self.quantity <= critical_at {
            StockLevel::Critical
        } else if self.quantity <= low_at {
            StockLevel::Low
        } else {
            StockLevel::Healthy
        }
    }
}

impl Identifiable for Product {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl OwnerScoped for Product {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Displayable for Product {
    fn display_label(&self) -> String {
        format!("{} ({})", self.description, self.size)
    }
}

/// Editable product fields. Quantity is deliberately absent: it only moves through movements.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub description: String,
    pub size: Size,
    pub opening_quantity: u32,
}

impl ProductDraft {
    pub fn new(description: impl Into<String>, size: Size) -> Self {
        Self {
            description: description.into(),
            size,
            opening_quantity: 0,
        }
    }

    pub fn with_opening_quantity(mut self, quantity: u32) -> Self {
        self.opening_quantity = quantity;
        self
    }

    pub fn from_form(description: &str, size: &str, opening_quantity: &str) -> Result<Self> {
        let description = forms::required_text("Description", description)?;
        if size.trim().is_empty() {
            return Err(StockError::validation("Size is required"));
        }
        let size = size.parse::<Size>()?;
        let opening_quantity = forms::non_negative_integer("Quantity", opening_quantity)?;
        Ok(Self {
            description,
            size,
            opening_quantity,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(StockError::validation("Description is required"));
        }
        Ok(())
    }
}
