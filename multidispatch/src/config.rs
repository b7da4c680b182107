//! Multimethod configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! yields a usable configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-multimethod behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How tuple patterns of differing arity are compared.
    pub tuple_arity: TupleArity,

    /// Fail `unregister` for a pattern that has no binding.
    pub strict_unregister: bool,

    /// Emit a trace event for every candidate examined during resolution.
    pub trace_resolution: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tuple_arity: TupleArity::Exact,
            strict_unregister: false,
            trace_resolution: false,
        }
    }
}

/// Tuple arity policy of the specificity predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleArity {
    /// Tuples of different length never match.
    #[default]
    Exact,
    /// Only the common prefix is compared; extra elements are ignored.
    Prefix,
}

impl DispatchConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builder: set the tuple arity policy.
    pub fn with_tuple_arity(mut self, arity: TupleArity) -> Self {
        self.tuple_arity = arity;
        self
    }

    /// Builder: require `unregister` to find a binding.
    pub fn with_strict_unregister(mut self, strict: bool) -> Self {
        self.strict_unregister = strict;
        self
    }

    /// Builder: trace resolution steps.
    pub fn with_trace_resolution(mut self, trace: bool) -> Self {
        self.trace_resolution = trace;
        self
    }
}
