//! Dispatch patterns and the specificity predicate.

use std::fmt;

use crate::config::TupleArity;
use crate::hierarchy::{TypeHierarchy, TypeKey};

/// Key under which an implementation is registered.
///
/// Dispatch values share the same shape, see [`DispatchValue`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DispatchPattern {
    /// A single type (or named tag).
    Type(TypeKey),
    /// A fixed-arity, ordered sequence of sub-patterns.
    Tuple(Vec<DispatchPattern>),
    /// Fallback used only when no other pattern matches.
    Default,
    /// Wildcard that matches every value.
    Anything,
}

/// Value computed per call by a dispatch strategy.
pub type DispatchValue = DispatchPattern;

/// The fallback pattern.
pub const DEFAULT: DispatchPattern = DispatchPattern::Default;

/// The wildcard pattern.
pub const ANYTHING: DispatchPattern = DispatchPattern::Anything;

impl DispatchPattern {
    /// Pattern for the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        DispatchPattern::Type(TypeKey::of::<T>())
    }

    /// Pattern for a named tag.
    pub const fn named(name: &'static str) -> Self {
        DispatchPattern::Type(TypeKey::named(name))
    }

    /// Tuple of arbitrary sub-patterns.
    pub fn tuple(items: impl IntoIterator<Item = DispatchPattern>) -> Self {
        DispatchPattern::Tuple(items.into_iter().collect())
    }

    /// Tuple of type patterns, the shape produced by all-argument type
    /// dispatch.
    pub fn types(keys: impl IntoIterator<Item = TypeKey>) -> Self {
        DispatchPattern::Tuple(keys.into_iter().map(DispatchPattern::Type).collect())
    }

    /// The type key if this is a type pattern.
    pub fn as_type(&self) -> Option<&TypeKey> {
        match self {
            DispatchPattern::Type(key) => Some(key),
            _ => None,
        }
    }

    /// Number of elements if this is a tuple pattern.
    pub fn arity(&self) -> Option<usize> {
        match self {
            DispatchPattern::Tuple(items) => Some(items.len()),
            _ => None,
        }
    }
}

impl From<TypeKey> for DispatchPattern {
    fn from(key: TypeKey) -> Self {
        DispatchPattern::Type(key)
    }
}

impl From<Vec<DispatchPattern>> for DispatchPattern {
    fn from(items: Vec<DispatchPattern>) -> Self {
        DispatchPattern::Tuple(items)
    }
}

impl fmt::Display for DispatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchPattern::Type(key) => write!(f, "{key}"),
            DispatchPattern::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            DispatchPattern::Default => f.write_str("<Default>"),
            DispatchPattern::Anything => f.write_str("<Anything>"),
        }
    }
}

/// Does `value` match `pattern`, with tuples required to agree in arity.
pub fn matches<H>(value: &DispatchValue, pattern: &DispatchPattern, hierarchy: &H) -> bool
where
    H: TypeHierarchy + ?Sized,
{
    matches_with(value, pattern, hierarchy, TupleArity::Exact)
}

/// Does `value` match `pattern`.
///
/// Rules, in order: equal values match; `Anything` matches every value;
/// two tuples match elementwise (arity governed by `arity`); two type keys
/// match when the value is a subtype of the pattern. Any other pairing of
/// shapes does not match.
pub fn matches_with<H>(
    value: &DispatchValue,
    pattern: &DispatchPattern,
    hierarchy: &H,
    arity: TupleArity,
) -> bool
where
    H: TypeHierarchy + ?Sized,
{
    if value == pattern {
        return true;
    }
    match (value, pattern) {
        (_, DispatchPattern::Anything) => true,
        (DispatchPattern::Tuple(values), DispatchPattern::Tuple(patterns)) => {
            if arity == TupleArity::Exact && values.len() != patterns.len() {
                return false;
            }
            // Zip stops at the shorter side, which is the prefix behavior.
            values
                .iter()
                .zip(patterns)
                .all(|(v, p)| matches_with(v, p, hierarchy, arity))
        }
        (DispatchPattern::Type(sub), DispatchPattern::Type(sup)) => hierarchy.is_subtype(sub, sup),
        _ => false,
    }
}
