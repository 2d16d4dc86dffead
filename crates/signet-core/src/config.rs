//! Engine configuration.
//!
//! Plain serde structs with defaults, a `validate()` pass, and TOML file
//! loading. Durations are integer seconds in the file and convert to
//! `chrono::Duration` at the call sites that need them.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::{SignetError, SignetResult};

/// Key-material cache tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds before an unfinished claim becomes reclaimable by another worker.
    pub reclaim_horizon_secs: u64,
    /// Seconds before served cache data is logged as stale.
    pub freshness_window_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            reclaim_horizon_secs: 60,
            freshness_window_secs: 300,
        }
    }
}

impl CacheConfig {
    /// The reclaim horizon as a duration.
    pub fn reclaim_horizon(&self) -> Duration {
        Duration::seconds(self.reclaim_horizon_secs as i64)
    }

    /// The freshness window as a duration.
    pub fn freshness_window(&self) -> Duration {
        Duration::seconds(self.freshness_window_secs as i64)
    }
}

/// Eligibility traversal tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityConfig {
    /// Depth bound on approver-chain traversal. The chain is persisted data
    /// and not guaranteed acyclic; the visited set already guarantees
    /// termination, the bound caps pathological depth.
    pub max_approver_depth: usize,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            max_approver_depth: 32,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cache tuning
    pub cache: CacheConfig,
    /// Eligibility tuning
    pub eligibility: EligibilityConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> SignetResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SignetError::invalid(format!("read config {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> SignetResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SignetError::serialization(format!("parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges.
    pub fn validate(&self) -> SignetResult<()> {
        if self.cache.reclaim_horizon_secs == 0 {
            return Err(SignetError::invalid(
                "cache.reclaim_horizon_secs must be positive",
            ));
        }
        if self.eligibility.max_approver_depth == 0 {
            return Err(SignetError::invalid(
                "eligibility.max_approver_depth must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.reclaim_horizon(), Duration::seconds(60));
        assert_eq!(config.eligibility.max_approver_depth, 32);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [cache]
            reclaim_horizon_secs = 15
            "#,
        )
        .expect("parse");
        assert_eq!(config.cache.reclaim_horizon_secs, 15);
        assert_eq!(config.cache.freshness_window_secs, 300);
        assert_eq!(config.eligibility.max_approver_depth, 32);
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = EngineConfig::from_toml("[cache]\nreclaim_horizon_secs = 0\n")
            .expect_err("must fail");
        assert_matches::assert_matches!(err, SignetError::Invalid { .. });
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "[eligibility]\nmax_approver_depth = 8\n").expect("write");
        let config = EngineConfig::load_from_file(file.path()).expect("load");
        assert_eq!(config.eligibility.max_approver_depth, 8);
    }
}
