//! Engine-wide settings.
//!
//! # Example
//!
//! ```
//! use tenant_workflow::config::EngineConfig;
//! use tenant_workflow::custom_field::domain::FieldMode;
//!
//! let config = EngineConfig::from_json_str(r#"{"field_mode": "lenient"}"#).unwrap();
//! assert_eq!(config.field_mode, FieldMode::Lenient);
//! assert_eq!(config.quarantine_threshold, 3);
//! ```

use crate::custom_field::domain::FieldMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors returned while loading [`EngineConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineConfigError {
    /// The document is not valid JSON or has unknown keys.
    #[error("invalid engine configuration: {0}")]
    Parse(String),

    /// A value is out of range.
    #[error("invalid engine configuration: {field} {reason}")]
    OutOfRange {
        /// Offending key.
        field: &'static str,
        /// Why it is out of range.
        reason: &'static str,
    },
}

/// Settings shared by every engine service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Policy for undeclared custom fields.
    pub field_mode: FieldMode,
    /// Upper bound of an automation rule's action sequence.
    pub max_actions_per_rule: usize,
    /// Consecutive failures after which a rule is auto-deactivated.
    pub quarantine_threshold: u32,
    /// Rolling window, in seconds, within which the failures must fall.
    pub quarantine_window_secs: u64,
    /// Default deadline for external reference resolution, in milliseconds.
    pub resolver_timeout_ms: u64,
    /// Whether an untouched tenant receives the canonical seed.
    pub seed_defaults: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field_mode: FieldMode::Strict,
            max_actions_per_rule: 10,
            quarantine_threshold: 3,
            quarantine_window_secs: 3600,
            resolver_timeout_ms: 2000,
            seed_defaults: true,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; omitted keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineConfigError::Parse`] for malformed JSON or unknown
    /// keys, and [`EngineConfigError::OutOfRange`] for zero limits.
    pub fn from_json_str(text: &str) -> Result<Self, EngineConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| EngineConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineConfigError::OutOfRange`] naming the first zero limit.
    pub const fn validate(&self) -> Result<(), EngineConfigError> {
        let zero = "must be greater than zero";
        if self.max_actions_per_rule == 0 {
            return Err(EngineConfigError::OutOfRange {
                field: "max_actions_per_rule",
                reason: zero,
            });
        }
        if self.quarantine_threshold == 0 {
            return Err(EngineConfigError::OutOfRange {
                field: "quarantine_threshold",
                reason: zero,
            });
        }
        if self.quarantine_window_secs == 0 {
            return Err(EngineConfigError::OutOfRange {
                field: "quarantine_window_secs",
                reason: zero,
            });
        }
        Ok(())
    }

    /// Returns the quarantine window as a duration.
    #[must_use]
    pub const fn quarantine_window(&self) -> Duration {
        Duration::from_secs(self.quarantine_window_secs)
    }

    /// Returns the default resolver deadline as a duration.
    #[must_use]
    pub const fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }
}
