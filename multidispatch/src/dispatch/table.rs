//! Method table and best-match search.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::hierarchy::TypeHierarchy;
use crate::pattern::{matches_with, DispatchPattern, DispatchValue};
use crate::preference::PreferenceGraph;
use crate::strategy::CallArgs;

/// A registered implementation.
///
/// Identity is the `Arc` allocation: the same handle bound under two
/// patterns is one implementation as far as ambiguity is concerned.
pub type Method<R> = Arc<dyn Fn(&CallArgs<'_>) -> R + Send + Sync>;

/// Pattern-to-implementation bindings plus the preferences used to order
/// them.
pub struct MethodTable<R> {
    methods: IndexMap<DispatchPattern, Method<R>>,
    preferences: PreferenceGraph,
}

impl<R> Default for MethodTable<R> {
    fn default() -> Self {
        Self {
            methods: IndexMap::new(),
            preferences: PreferenceGraph::new(),
        }
    }
}

impl<R> MethodTable<R> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `method` under `pattern`, returning the binding it replaced.
    pub fn insert(&mut self, pattern: DispatchPattern, method: Method<R>) -> Option<Method<R>> {
        self.methods.insert(pattern, method)
    }

    /// Remove the binding for `pattern`.
    pub fn remove(&mut self, pattern: &DispatchPattern) -> Option<Method<R>> {
        self.methods.shift_remove(pattern)
    }

    /// Remove every binding. Preferences are kept.
    pub fn clear(&mut self) {
        self.methods.clear();
    }

    /// The implementation bound under exactly `pattern`.
    pub fn get(&self, pattern: &DispatchPattern) -> Option<&Method<R>> {
        self.methods.get(pattern)
    }

    /// Registered patterns in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &DispatchPattern> + '_ {
        self.methods.keys()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no method is bound.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Preferences of this table.
    pub fn preferences(&self) -> &PreferenceGraph {
        &self.preferences
    }

    /// Mutable access to the preferences.
    pub fn preferences_mut(&mut self) -> &mut PreferenceGraph {
        &mut self.preferences
    }

    /// Find the single best registered pattern for `value`, ignoring the
    /// `Default` fallback.
    ///
    /// Patterns are scanned once. A matching pattern replaces the running
    /// best when it dominates it; after each step the best must dominate
    /// the pattern just seen, unless both are bound to the same
    /// implementation. The first pair that fails this is reported.
    pub fn find_best<H>(
        &self,
        method: &str,
        value: &DispatchValue,
        hierarchy: &H,
        config: &DispatchConfig,
    ) -> DispatchResult<Option<(&DispatchPattern, &Method<R>)>>
    where
        H: TypeHierarchy + ?Sized,
    {
        let arity = config.tuple_arity;
        let mut best: Option<(&DispatchPattern, &Method<R>)> = None;

        for (pattern, implementation) in &self.methods {
            if !matches_with(value, pattern, hierarchy, arity) {
                if config.trace_resolution {
                    trace!(method, %value, %pattern, "pattern does not match");
                }
                continue;
            }

            let (current, current_impl) = match best {
                Some((current, current_impl))
                    if !self.preferences.dominates(pattern, current, hierarchy, arity) =>
                {
                    (current, current_impl)
                }
                _ => (pattern, implementation),
            };
            best = Some((current, current_impl));

            if config.trace_resolution {
                trace!(method, %value, %pattern, best = %current, "pattern matches");
            }

            if !self.preferences.dominates(current, pattern, hierarchy, arity)
                && !Arc::ptr_eq(current_impl, implementation)
            {
                return Err(DispatchError::AmbiguousDispatch {
                    method: method.to_string(),
                    value: value.clone(),
                    first: pattern.clone(),
                    second: current.clone(),
                });
            }
        }

        Ok(best)
    }

    /// Resolve `value` to a binding, falling back to `Default` when nothing
    /// matches.
    pub fn lookup<H>(
        &self,
        method: &str,
        value: &DispatchValue,
        hierarchy: &H,
        config: &DispatchConfig,
    ) -> DispatchResult<(&DispatchPattern, &Method<R>)>
    where
        H: TypeHierarchy + ?Sized,
    {
        if let Some(found) = self.find_best(method, value, hierarchy, config)? {
            return Ok(found);
        }
        self.methods
            .get_key_value(&DispatchPattern::Default)
            .ok_or_else(|| DispatchError::NoMatchingMethod {
                method: method.to_string(),
                value: value.clone(),
            })
    }
}

impl<R> fmt::Debug for MethodTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("patterns", &self.methods.keys().collect::<Vec<_>>())
            .field("preferences", &self.preferences)
            .finish()
    }
}
