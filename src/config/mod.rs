use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::core::utils::{ensure_dir, PathResolver};
use crate::currency::{format_currency_value, CurrencyCode, LocaleConfig, NegativeStyle};
use crate::errors::{Result, StockError};
use crate::storage::json_backend::write_atomic;
use crate::storage::memory_backend::DEFAULT_MAX_ATTEMPTS;

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// User preferences and tuning knobs for a stockbook installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Attempts a store transaction gets before a conflict is reported as a failure.
    #[serde(default = "Config::default_max_transaction_attempts")]
    pub max_transaction_attempts: usize,
    #[serde(default = "Config::default_critical_stock_threshold")]
    pub critical_stock_threshold: i64,
    #[serde(default = "Config::default_low_stock_threshold")]
    pub low_stock_threshold: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "pt-BR".into(),
            currency: "BRL".into(),
            max_transaction_attempts: Self::default_max_transaction_attempts(),
            critical_stock_threshold: Self::default_critical_stock_threshold(),
            low_stock_threshold: Self::default_low_stock_threshold(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_max_transaction_attempts() -> usize {
        DEFAULT_MAX_ATTEMPTS
    }

    pub fn default_critical_stock_threshold() -> i64 {
        5
    }

    pub fn default_low_stock_threshold() -> i64 {
        10
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_transaction_attempts == 0 {
            return Err(StockError::validation(
                "maxTransactionAttempts must be at least 1",
            ));
        }
        if self.critical_stock_threshold > self.low_stock_threshold {
            return Err(StockError::validation(
                "criticalStockThreshold cannot exceed lowStockThreshold",
            ));
        }
        Ok(())
    }

    pub fn resolve_data_dir(&self) -> PathBuf {
        PathResolver::resolve_base(self.data_dir.clone())
    }

    pub fn locale_config(&self) -> LocaleConfig {
        LocaleConfig::for_tag(&self.locale)
    }

    pub fn currency_code(&self) -> CurrencyCode {
        CurrencyCode::new(self.currency.as_str())
    }

    /// Formats `amount` in the configured currency and locale.
    pub fn format_amount(&self, amount: rust_decimal::Decimal) -> String {
        format_currency_value(
            amount,
            &self.currency_code(),
            &self.locale_config(),
            NegativeStyle::Sign,
        )
    }
}

/// Loads, saves and backs up [`Config`] under a base directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        let backups_dir = PathResolver::config_backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            backups_dir,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored configuration, or defaults when none was saved yet.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    /// Writes a timestamped copy of `config` and returns the backup file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String> {
        ensure_dir(&self.backups_dir)?;
        let mut name = format!(
            "config_{}",
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT)
        );
        if let Some(label) = sanitize_note(note) {
            name.push('_');
            name.push_str(&label);
        }
        name.push('.');
        name.push_str(BACKUP_EXTENSION);
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.backups_dir.join(&name), &json)?;
        Ok(name)
    }

    pub fn restore(&self, backup_name: &str) -> Result<Config> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(StockError::NotFound(format!(
                "configuration backup `{}`",
                backup_name
            )));
        }
        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| backup_timestamp(b).cmp(&backup_timestamp(a)).then(b.cmp(a)));
        Ok(entries)
    }
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if !sanitized.is_empty() && !sanitized.ends_with('-') {
            sanitized.push('-');
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extracts the `YYYYMMDD_HHMM` stamp that follows the `config_` prefix.
fn backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stamp = name.strip_prefix("config_")?.get(..13)?;
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}
