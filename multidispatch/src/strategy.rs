//! Call arguments and the strategies that turn them into dispatch values.

use std::any::Any;
use std::fmt;

use crate::error::StrategyError;
use crate::hierarchy::TypeKey;
use crate::pattern::{DispatchPattern, DispatchValue};

/// A value that can be passed to a multimethod.
///
/// Implemented for every `Any + Send + Sync` type.
pub trait Argument: Any + Send + Sync {
    /// Runtime type key of the value.
    fn type_key(&self) -> TypeKey;

    /// Upcast for downcasting in implementations.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> Argument for T {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Borrowed arguments of one multimethod call.
///
/// Keyword arguments travel to the chosen implementation but are not seen
/// by the standard strategies.
#[derive(Clone, Default)]
pub struct CallArgs<'a> {
    positional: Vec<&'a dyn Argument>,
    keywords: Vec<(&'a str, &'a dyn Argument)>,
}

impl<'a> CallArgs<'a> {
    /// Arguments from a list of positional values.
    pub fn new(positional: Vec<&'a dyn Argument>) -> Self {
        Self {
            positional,
            keywords: Vec::new(),
        }
    }

    /// No arguments at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn with_arg(mut self, value: &'a dyn Argument) -> Self {
        self.positional.push(value);
        self
    }

    /// Add a keyword argument. A repeated name shadows the earlier value.
    pub fn with_keyword(mut self, name: &'a str, value: &'a dyn Argument) -> Self {
        self.keywords.retain(|(existing, _)| *existing != name);
        self.keywords.push((name, value));
        self
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    /// Whether there are no positional arguments.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    /// Positional arguments in call order.
    pub fn positional(&self) -> &[&'a dyn Argument] {
        &self.positional
    }

    /// Keyword arguments in the order they were added.
    pub fn keywords(&self) -> impl Iterator<Item = (&'a str, &'a dyn Argument)> + '_ {
        self.keywords.iter().copied()
    }

    /// The positional argument at `index`, untyped.
    pub fn arg(&self, index: usize) -> Option<&'a dyn Argument> {
        self.positional.get(index).copied()
    }

    /// The positional argument at `index`, if it has type `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&'a T> {
        self.arg(index).and_then(|arg| arg.as_any().downcast_ref::<T>())
    }

    /// The keyword argument `name`, untyped.
    pub fn keyword_arg(&self, name: &str) -> Option<&'a dyn Argument> {
        self.keywords
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// The keyword argument `name`, if it has type `T`.
    pub fn keyword<T: Any>(&self, name: &str) -> Option<&'a T> {
        self.keyword_arg(name)
            .and_then(|arg| arg.as_any().downcast_ref::<T>())
    }

    /// Type key of the positional argument at `index`.
    pub fn type_key(&self, index: usize) -> Option<TypeKey> {
        self.arg(index).map(|arg| arg.type_key())
    }

    /// Type keys of all positional arguments.
    pub fn type_keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.positional.iter().map(|arg| (**arg).type_key())
    }
}

impl fmt::Debug for CallArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallArgs")
            .field("positional", &self.type_keys().collect::<Vec<_>>())
            .field(
                "keywords",
                &self
                    .keywords
                    .iter()
                    .map(|(name, value)| (*name, (**value).type_key()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Build positional [`CallArgs`] from references.
///
/// ```
/// use multidispatch::{args, TypeKey};
///
/// let (a, b) = (1_u8, "two");
/// let call = args![&a, &b];
/// assert_eq!(call.type_key(0), Some(TypeKey::of::<u8>()));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::CallArgs::empty()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::CallArgs::new(vec![$($arg as &dyn $crate::Argument),+])
    };
}

/// Computes the dispatch value of a call.
pub trait DispatchStrategy: Send + Sync {
    fn dispatch_value(&self, args: &CallArgs<'_>) -> Result<DispatchValue, StrategyError>;
}

impl<F> DispatchStrategy for F
where
    F: Fn(&CallArgs<'_>) -> Result<DispatchValue, StrategyError> + Send + Sync,
{
    fn dispatch_value(&self, args: &CallArgs<'_>) -> Result<DispatchValue, StrategyError> {
        self(args)
    }
}

/// Dispatch on the types of all positional arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDispatch;

impl DispatchStrategy for TypeDispatch {
    fn dispatch_value(&self, args: &CallArgs<'_>) -> Result<DispatchValue, StrategyError> {
        type_dispatch(args)
    }
}

/// Dispatch on the type of the first positional argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleTypeDispatch;

impl DispatchStrategy for SingleTypeDispatch {
    fn dispatch_value(&self, args: &CallArgs<'_>) -> Result<DispatchValue, StrategyError> {
        single_type_dispatch(args)
    }
}

/// Tuple of the runtime type of every positional argument.
pub fn type_dispatch(args: &CallArgs<'_>) -> Result<DispatchValue, StrategyError> {
    Ok(DispatchPattern::types(args.type_keys()))
}

/// Runtime type of the first positional argument.
pub fn single_type_dispatch(args: &CallArgs<'_>) -> Result<DispatchValue, StrategyError> {
    args.type_key(0)
        .map(DispatchPattern::Type)
        .ok_or(StrategyError::MissingArgument { index: 0 })
}
