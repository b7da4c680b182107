//! The user-facing multimethod.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::hierarchy::{FlatHierarchy, TypeHierarchy};
use crate::pattern::{DispatchPattern, DispatchValue};
use crate::strategy::{CallArgs, DispatchStrategy};

use super::table::{Method, MethodTable};

/// A named function whose implementation is chosen per call from the
/// dispatch value of its arguments.
///
/// Calls take a shared lock on the method table only long enough to pick
/// an implementation; registration and preferences take it exclusively.
/// The chosen implementation runs with no lock held, so it may call back
/// into the same multimethod.
pub struct MultiMethod<R> {
    name: String,
    strategy: Box<dyn DispatchStrategy>,
    hierarchy: Arc<dyn TypeHierarchy>,
    config: DispatchConfig,
    table: RwLock<MethodTable<R>>,
}

impl<R> MultiMethod<R> {
    /// Create a multimethod with a flat type hierarchy and default
    /// configuration.
    pub fn new(name: impl Into<String>, strategy: impl DispatchStrategy + 'static) -> Self {
        Self::from_parts(
            name.into(),
            Box::new(strategy),
            Arc::new(FlatHierarchy),
            DispatchConfig::default(),
        )
    }

    /// Start building a multimethod.
    pub fn builder(name: impl Into<String>) -> MultiMethodBuilder<R> {
        MultiMethodBuilder::new(name)
    }

    fn from_parts(
        name: String,
        strategy: Box<dyn DispatchStrategy>,
        hierarchy: Arc<dyn TypeHierarchy>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            name,
            strategy,
            hierarchy,
            config,
            table: RwLock::new(MethodTable::new()),
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Type hierarchy consulted for matching and preference propagation.
    pub fn hierarchy(&self) -> &Arc<dyn TypeHierarchy> {
        &self.hierarchy
    }

    /// Bind `f` under `pattern`, replacing any earlier binding for the same
    /// pattern. Returns the handle so it can be bound elsewhere too.
    pub fn register<F>(&self, pattern: impl Into<DispatchPattern>, f: F) -> Method<R>
    where
        F: Fn(&CallArgs<'_>) -> R + Send + Sync + 'static,
    {
        let method: Method<R> = Arc::new(f);
        self.register_method(pattern, Arc::clone(&method));
        method
    }

    /// Bind an existing implementation handle under `pattern`. Returns the
    /// binding it replaced.
    pub fn register_method(
        &self,
        pattern: impl Into<DispatchPattern>,
        method: Method<R>,
    ) -> Option<Method<R>> {
        let pattern = pattern.into();
        debug!(multimethod = %self.name, %pattern, "registered method");
        self.table.write().insert(pattern, method)
    }

    /// Remove the binding for `pattern`.
    ///
    /// Removing an unbound pattern is a no-op unless
    /// [`DispatchConfig::strict_unregister`] is set.
    pub fn unregister(&self, pattern: &DispatchPattern) -> DispatchResult<Option<Method<R>>> {
        let removed = self.table.write().remove(pattern);
        match removed {
            Some(method) => {
                debug!(multimethod = %self.name, %pattern, "unregistered method");
                Ok(Some(method))
            }
            None if self.config.strict_unregister => Err(DispatchError::NotRegistered {
                method: self.name.clone(),
                pattern: pattern.clone(),
            }),
            None => Ok(None),
        }
    }

    /// Remove every method. Preferences are kept.
    pub fn clear(&self) {
        debug!(multimethod = %self.name, "cleared methods");
        self.table.write().clear();
    }

    /// Prefer `preferred` over `over` when both match and neither is more
    /// specific. Fails, leaving preferences untouched, if the opposite
    /// preference already holds.
    pub fn prefer(
        &self,
        preferred: impl Into<DispatchPattern>,
        over: impl Into<DispatchPattern>,
    ) -> DispatchResult<()> {
        let mut table = self.table.write();
        table
            .preferences_mut()
            .insert(&self.name, preferred.into(), over.into(), &*self.hierarchy)?;
        Ok(())
    }

    /// Whether `x` is preferred over `y`, explicitly or by propagation.
    pub fn prefers(&self, x: &DispatchPattern, y: &DispatchPattern) -> bool {
        self.table.read().preferences().prefers(x, y, &*self.hierarchy)
    }

    /// Snapshot of the explicit preference edges.
    pub fn preferences(&self) -> Vec<(DispatchPattern, DispatchPattern)> {
        self.table
            .read()
            .preferences()
            .edges()
            .map(|(preferred, over)| (preferred.clone(), over.clone()))
            .collect()
    }

    /// The implementation bound under exactly `pattern`.
    pub fn method_for(&self, pattern: &DispatchPattern) -> Option<Method<R>> {
        self.table.read().get(pattern).cloned()
    }

    /// Whether `pattern` has a binding.
    pub fn contains(&self, pattern: &DispatchPattern) -> bool {
        self.table.read().get(pattern).is_some()
    }

    /// Registered patterns in registration order.
    pub fn patterns(&self) -> Vec<DispatchPattern> {
        self.table.read().patterns().cloned().collect()
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether no method is registered.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Dispatch value of a call under this multimethod's strategy.
    pub fn dispatch_value(&self, args: &CallArgs<'_>) -> DispatchResult<DispatchValue> {
        self.strategy
            .dispatch_value(args)
            .map_err(|source| DispatchError::Strategy {
                method: self.name.clone(),
                source,
            })
    }

    /// The pattern that `value` resolves to, `Default` included.
    pub fn selected_pattern(&self, value: &DispatchValue) -> DispatchResult<DispatchPattern> {
        let table = self.table.read();
        let (pattern, _) = self.lookup(&table, value)?;
        Ok(pattern.clone())
    }

    /// The implementation that `value` resolves to.
    pub fn resolve_value(&self, value: &DispatchValue) -> DispatchResult<Method<R>> {
        let table = self.table.read();
        let (_, method) = self.lookup(&table, value)?;
        Ok(Arc::clone(method))
    }

    /// The implementation a call with `args` would run.
    pub fn resolve(&self, args: &CallArgs<'_>) -> DispatchResult<Method<R>> {
        let value = self.dispatch_value(args)?;
        self.resolve_value(&value)
    }

    /// Call the multimethod. The chosen implementation receives `args`
    /// unchanged and its result is returned as is.
    pub fn invoke(&self, args: &CallArgs<'_>) -> DispatchResult<R> {
        let method = self.resolve(args)?;
        Ok(method(args))
    }

    fn lookup<'t>(
        &self,
        table: &'t MethodTable<R>,
        value: &DispatchValue,
    ) -> DispatchResult<(&'t DispatchPattern, &'t Method<R>)> {
        match table.lookup(&self.name, value, &*self.hierarchy, &self.config) {
            Ok(found) => {
                if self.config.trace_resolution {
                    trace!(multimethod = %self.name, %value, pattern = %found.0, "resolved");
                }
                Ok(found)
            }
            Err(err) => {
                debug!(multimethod = %self.name, %value, error = %err, "dispatch failed");
                Err(err)
            }
        }
    }
}

impl<R> fmt::Debug for MultiMethod<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MultiMethod '{}'>", self.name)
    }
}

impl<R> fmt::Display for MultiMethod<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MultiMethod '{}'>", self.name)
    }
}

/// Builder for [`MultiMethod`].
pub struct MultiMethodBuilder<R> {
    name: String,
    strategy: Option<Box<dyn DispatchStrategy>>,
    hierarchy: Option<Arc<dyn TypeHierarchy>>,
    config: DispatchConfig,
    _result: PhantomData<fn() -> R>,
}

impl<R> MultiMethodBuilder<R> {
    /// Create a builder for a multimethod called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: None,
            hierarchy: None,
            config: DispatchConfig::default(),
            _result: PhantomData,
        }
    }

    /// Set the dispatch strategy. Required.
    pub fn strategy(mut self, strategy: impl DispatchStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Set the type hierarchy. Defaults to [`FlatHierarchy`].
    pub fn hierarchy(mut self, hierarchy: impl TypeHierarchy + 'static) -> Self {
        self.hierarchy = Some(Arc::new(hierarchy));
        self
    }

    /// Use a hierarchy shared with other multimethods.
    pub fn shared_hierarchy(mut self, hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish the multimethod.
    pub fn build(self) -> DispatchResult<MultiMethod<R>> {
        let Some(strategy) = self.strategy else {
            return Err(DispatchError::InvalidDispatchStrategy {
                method: self.name,
                reason: "no dispatch strategy supplied".to_string(),
            });
        };
        let hierarchy = self.hierarchy.unwrap_or_else(|| Arc::new(FlatHierarchy));
        Ok(MultiMethod::from_parts(self.name, strategy, hierarchy, self.config))
    }
}
