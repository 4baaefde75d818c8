//! Engine configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! exempt_operations = ["session.login", "session.logout", "zone.query*"]
//! honor_skip_flag = true
//! warn_unknown_fields = true
//! ```

use crate::error::{RbacError, Result};
use crate::iam::PatternMatcher;
use crate::validation::validate_pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Authorization engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Operation-id patterns that are never checked
    pub exempt_operations: Vec<String>,

    /// Respect the per-request skip flag
    pub honor_skip_flag: bool,

    /// Warn when a field-scoped deny names a field the operation does not declare
    pub warn_unknown_fields: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            exempt_operations: Vec::new(),
            honor_skip_flag: true,
            warn_unknown_fields: true,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Builder-style exemption
    pub fn exempt(mut self, pattern: &str) -> Self {
        self.exempt_operations.push(pattern.to_string());
        self
    }

    pub fn validate(&self) -> Result<()> {
        for pattern in &self.exempt_operations {
            validate_pattern(pattern).map_err(|e| {
                RbacError::InvalidConfig(format!("exempt operation [{}]: {}", pattern, e))
            })?;
        }
        Ok(())
    }

    /// True if an exempt pattern matches the operation id
    pub fn is_exempt(&self, operation_id: &str) -> bool {
        self.exempt_operations
            .iter()
            .any(|p| PatternMatcher::matches(p, operation_id))
    }
}
