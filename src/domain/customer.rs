use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable, OwnerScoped};
use crate::domain::forms;
use crate::errors::{Result, StockError};

const WHATSAPP_BASE_URL: &str = "https://wa.me/55";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    /// Digits only, area code included.
    pub phone_number: String,
}

impl Customer {
    pub fn from_draft(id: Uuid, owner_id: &str, draft: &CustomerDraft) -> Self {
        Self {
            id,
            owner_id: owner_id.to_string(),
            name: draft.name.clone(),
            phone_number: draft.phone_number.clone(),
        }
    }

    /// `(11) 98765-4321` for mobile numbers, `(11) 3456-7890` for landlines.
    pub fn formatted_phone(&self) -> String {
        format_phone(&self.phone_number)
    }

    pub fn whatsapp_link(&self) -> String {
        format!("{}{}", WHATSAPP_BASE_URL, digits_only(&self.phone_number))
    }
}

impl Identifiable for Customer {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl OwnerScoped for Customer {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Displayable for Customer {
    fn display_label(&self) -> String {
        self.name.clone()
    }
}

/// Validated customer input: trimmed name and a normalized phone number.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDraft {
    pub name: String,
    pub phone_number: String,
}

impl CustomerDraft {
    pub fn new(name: &str, phone: &str) -> Result<Self> {
        let name = forms::required_text("Name", name)?;
        let phone_number = normalize_phone(phone)?;
        Ok(Self { name, phone_number })
    }
}

pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Strips formatting and checks the number has 10 or 11 digits.
pub fn normalize_phone(input: &str) -> Result<String> {
    if input.trim().is_empty() {
        return Err(StockError::validation("Phone number is required"));
    }
    let digits = digits_only(input);
    if (10..=11).contains(&digits.len()) {
        Ok(digits)
    } else {
        Err(StockError::validation(format!(
            "Phone number must have 10 or 11 digits (got {})",
            digits.len()
        )))
    }
}

pub fn format_phone(input: &str) -> String {
    let digits = digits_only(input);
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => input.to_string(),
    }
}
