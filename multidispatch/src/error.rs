//! Error types for multimethod registration and dispatch.

use thiserror::Error;

use crate::hierarchy::TypeKey;
use crate::pattern::{DispatchPattern, DispatchValue};

/// Errors surfaced by a [`MultiMethod`](crate::MultiMethod).
///
/// Every variant names the multimethod it came from so that a failure far
/// from the call site can still be traced back to its table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("invalid dispatch strategy for multimethod '{method}': {reason}")]
    InvalidDispatchStrategy { method: String, reason: String },

    #[error(
        "preference conflict in multimethod '{method}': {over} is already preferred to {preferred}"
    )]
    PreferenceConflict {
        method: String,
        preferred: DispatchPattern,
        over: DispatchPattern,
    },

    #[error(
        "no matching method on multimethod '{method}' for {value}, and no default method defined"
    )]
    NoMatchingMethod { method: String, value: DispatchValue },

    #[error(
        "multiple methods in multimethod '{method}' match dispatch value {value} -> {first} and {second}, and neither is preferred"
    )]
    AmbiguousDispatch {
        method: String,
        value: DispatchValue,
        first: DispatchPattern,
        second: DispatchPattern,
    },

    #[error("no method registered on multimethod '{method}' for {pattern}")]
    NotRegistered {
        method: String,
        pattern: DispatchPattern,
    },

    #[error("dispatch strategy of multimethod '{method}' failed: {source}")]
    Strategy {
        method: String,
        #[source]
        source: StrategyError,
    },
}

impl DispatchError {
    /// The name of the multimethod that raised this error.
    pub fn method_name(&self) -> &str {
        match self {
            DispatchError::InvalidDispatchStrategy { method, .. }
            | DispatchError::PreferenceConflict { method, .. }
            | DispatchError::NoMatchingMethod { method, .. }
            | DispatchError::AmbiguousDispatch { method, .. }
            | DispatchError::NotRegistered { method, .. }
            | DispatchError::Strategy { method, .. } => method,
        }
    }
}

/// Failure of a dispatch strategy to compute a value from call arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("missing positional argument at index {index}")]
    MissingArgument { index: usize },

    #[error("{0}")]
    Custom(String),
}

/// Errors from declaring relations in a [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("declaring {sub} <: {sup} would make {sub} its own ancestor")]
    Cycle { sub: TypeKey, sup: TypeKey },
}

/// Dispatch result type.
pub type DispatchResult<T> = Result<T, DispatchError>;
