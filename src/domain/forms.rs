//! Parsers for raw form input. Each returns a validation error naming the offending field.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::{Result, StockError};

pub fn required_text(field: &str, input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(StockError::validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn reference(field: &str, input: &str) -> Result<Uuid> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StockError::validation(format!("{field} is required")));
    }
    Uuid::parse_str(trimmed)
        .map_err(|_| StockError::validation(format!("{field} is not a valid identifier")))
}

pub fn positive_integer(field: &str, input: &str) -> Result<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StockError::validation(format!("{field} is required")));
    }
    let value = trimmed.parse::<u32>().map_err(|_| {
        StockError::validation(format!("{field}: enter a whole number (1 or greater)"))
    })?;
    if value == 0 {
        Err(StockError::validation(format!("{field} must be at least 1")))
    } else {
        Ok(value)
    }
}

/// Like [`positive_integer`] but blank means zero.
pub fn non_negative_integer(field: &str, input: &str) -> Result<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| StockError::validation(format!("{field}: enter a whole number")))
}

/// Accepts either `.` or `,` as decimal separator.
pub fn non_negative_amount(field: &str, input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StockError::validation(format!("{field} is required")));
    }
    let normalized = trimmed.replace(',', ".");
    let value = Decimal::from_str(&normalized)
        .map_err(|_| StockError::validation(format!("{field}: enter a numeric amount")))?;
    if value.is_sign_negative() && !value.is_zero() {
        Err(StockError::validation(format!(
            "{field} must be zero or positive"
        )))
    } else {
        Ok(value)
    }
}

pub fn date(field: &str, input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StockError::validation(format!(
            "{field} is required (use YYYY-MM-DD)"
        )));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| StockError::validation(format!("{field}: use YYYY-MM-DD format")))
}
