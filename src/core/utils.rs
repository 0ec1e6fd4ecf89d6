use dirs::home_dir;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::Result;

const DEFAULT_DIR_NAME: &str = ".stockbook";
const HOME_ENV: &str = "STOCKBOOK_HOME";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const CONFIG_BACKUP_DIR: &str = "backups";
const SNAPSHOT_FILE: &str = "store.json";
const LEGACY_CACHE_DIR: &str = "local_cache";

/// Resolves on-disk locations for configuration, snapshots and the legacy cache.
pub struct PathResolver;

impl PathResolver {
    /// Application data directory: `$STOCKBOOK_HOME`, else `~/.stockbook`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn resolve_base(custom: Option<PathBuf>) -> PathBuf {
        custom.unwrap_or_else(Self::base_dir)
    }

    pub fn config_dir_in(base: &Path) -> PathBuf {
        base.join(CONFIG_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        Self::config_dir_in(base).join(CONFIG_FILE)
    }

    pub fn config_backup_dir_in(base: &Path) -> PathBuf {
        Self::config_dir_in(base).join(CONFIG_BACKUP_DIR)
    }

    pub fn snapshot_file_in(base: &Path) -> PathBuf {
        base.join(SNAPSHOT_FILE)
    }

    pub fn legacy_cache_dir_in(base: &Path) -> PathBuf {
        base.join(LEGACY_CACHE_DIR)
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
