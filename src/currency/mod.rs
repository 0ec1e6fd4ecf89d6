//! Money and percentage rendering for dashboards and listings.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("BRL")
    }
}

/// Separators and date layout for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub date_format: DateFormatStyle,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "pt-BR".into(),
            decimal_separator: ',',
            grouping_separator: '.',
            date_format: DateFormatStyle::DayFirst,
        }
    }
}

impl LocaleConfig {
    /// Known tags get their conventions; anything else falls back to `pt-BR`.
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "en-US" => Self {
                language_tag: tag.into(),
                decimal_separator: '.',
                grouping_separator: ',',
                date_format: DateFormatStyle::MonthFirst,
            },
            "en-GB" => Self {
                language_tag: tag.into(),
                decimal_separator: '.',
                grouping_separator: ',',
                date_format: DateFormatStyle::DayFirst,
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateFormatStyle {
    /// `31/12/2024`
    DayFirst,
    /// `12/31/2024`
    MonthFirst,
    /// `2024-12-31`
    Iso,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NegativeStyle {
    #[default]
    Sign,
    Parentheses,
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "BRL" => "R$".into(),
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "JPY" => "¥".into(),
        _ => code.into(),
    }
}

pub fn minor_units_for(code: &str) -> u32 {
    match code {
        "JPY" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

/// Rounds half away from zero to `precision` places and applies the locale's separators.
pub fn format_number(locale: &LocaleConfig, value: Decimal, precision: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };
    let mut body = group_digits(int_part, locale.grouping_separator);
    if let Some(frac) = frac_part {
        body.push(locale.decimal_separator);
        body.push_str(frac);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        body.insert(0, '-');
    }
    body
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// `R$ 1.234,56` for BRL under the default locale.
pub fn format_currency_value(
    amount: Decimal,
    code: &CurrencyCode,
    locale: &LocaleConfig,
    negative_style: NegativeStyle,
) -> String {
    let precision = minor_units_for(code.as_str());
    let rounded = amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    let body = format_number(locale, rounded.abs(), precision);
    let symbol = symbol_for(code.as_str());
    let negative = rounded < Decimal::ZERO;
    match (negative, negative_style) {
        (false, _) => format!("{} {}", symbol, body),
        (true, NegativeStyle::Sign) => format!("-{} {}", symbol, body),
        (true, NegativeStyle::Parentheses) => format!("({} {})", symbol, body),
    }
}

pub fn format_brl(amount: Decimal) -> String {
    format_currency_value(
        amount,
        &CurrencyCode::default(),
        &LocaleConfig::default(),
        NegativeStyle::Sign,
    )
}

/// Renders a ratio (`0.235`) as a percentage with one decimal place (`23,5%`).
pub fn format_percentage(locale: &LocaleConfig, ratio: Decimal) -> String {
    format!("{}%", format_number(locale, ratio * Decimal::ONE_HUNDRED, 1))
}

pub fn format_date(locale: &LocaleConfig, date: NaiveDate) -> String {
    match locale.date_format {
        DateFormatStyle::DayFirst => date.format("%d/%m/%Y").to_string(),
        DateFormatStyle::MonthFirst => date.format("%m/%d/%Y").to_string(),
        DateFormatStyle::Iso => date.format("%Y-%m-%d").to_string(),
    }
}
