/// Build metadata embedded by `build.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMetadata {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub profile: &'static str,
}

impl BuildMetadata {
    /// `0.1.0 (abc1234, clean, release)`
    pub fn summary(&self) -> String {
        format!(
            "{} ({}, {}, {})",
            self.version, self.git_hash, self.git_status, self.profile
        )
    }
}

pub fn current() -> BuildMetadata {
    BuildMetadata {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("STOCKBOOK_BUILD_HASH").unwrap_or("unknown"),
        git_status: option_env!("STOCKBOOK_BUILD_STATUS").unwrap_or("unknown"),
        timestamp: option_env!("STOCKBOOK_BUILD_TIMESTAMP").unwrap_or("unknown"),
        profile: option_env!("STOCKBOOK_BUILD_PROFILE").unwrap_or("unknown"),
    }
}
