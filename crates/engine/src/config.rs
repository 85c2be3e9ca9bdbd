//! Engine configuration.
//!
//! ```rust
//! use routix_engine::{AssignmentMode, EngineConfig};
//!
//! let config = EngineConfig::from_json_str(r#"{"max_call_depth": 64}"#).unwrap();
//! assert_eq!(config.max_call_depth, 64);
//! assert_eq!(config.assignment, AssignmentMode::Literal);
//! assert!(config.builtins);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::EngineError;

/// Default limit on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// What a match rule's `assign to` yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// The rule's target, verbatim.
    #[default]
    Literal,
    /// The matched candidate's `id` field when it has one, else the target.
    Candidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Calls nested deeper than this fail with `RecursionLimitExceeded`.
    pub max_call_depth: usize,
    pub assignment: AssignmentMode,
    /// Whether `len`, `max`, `min`, and `contains` are available.
    pub builtins: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            assignment: AssignmentMode::Literal,
            builtins: true,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON object; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read and parse a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}
