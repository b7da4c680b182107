//! Runtime multiple dispatch.
//!
//! A [`MultiMethod`] picks, at call time, the most specific registered
//! implementation for the dispatch value of its arguments. The dispatch
//! value is computed by a pluggable [`DispatchStrategy`]: the types of all
//! positional arguments, the type of the first one, or any custom key.
//!
//! - **Type relation**: [`TypeHierarchy`] supplies direct supertypes of a
//!   [`TypeKey`]; [`TypeRegistry`] is a declared hierarchy.
//! - **Specificity**: [`matches`] decides whether a dispatch value matches a
//!   [`DispatchPattern`] (type, tuple, [`ANYTHING`] wildcard, [`DEFAULT`]
//!   fallback).
//! - **Preferences**: [`PreferenceGraph`] breaks ties between patterns that
//!   are equally specific, and refuses contradictory orderings.
//! - **Resolution**: [`MethodTable::find_best`] scans the bindings and
//!   reports ambiguity instead of guessing.
//!
//! # Example
//!
//! ```
//! use multidispatch::{args, type_dispatch, DispatchPattern, MultiMethod, TypeRegistry, DEFAULT};
//!
//! trait Animal {}
//! struct Dog;
//! struct Cat;
//!
//! let zoo = TypeRegistry::new();
//! zoo.declare_type::<Dog, dyn Animal>().unwrap();
//! zoo.declare_type::<Cat, dyn Animal>().unwrap();
//!
//! let speak = MultiMethod::<&'static str>::builder("speak")
//!     .strategy(type_dispatch)
//!     .hierarchy(zoo)
//!     .build()
//!     .unwrap();
//! speak.register(DispatchPattern::tuple([DispatchPattern::of::<Dog>()]), |_| "woof");
//! speak.register(DispatchPattern::tuple([DispatchPattern::of::<dyn Animal>()]), |_| "...");
//! speak.register(DEFAULT, |_| "?");
//!
//! assert_eq!(speak.invoke(&args![&Dog]).unwrap(), "woof");
//! assert_eq!(speak.invoke(&args![&Cat]).unwrap(), "...");
//! assert_eq!(speak.invoke(&args![&42_u8]).unwrap(), "?");
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod hierarchy;
pub mod pattern;
pub mod preference;
pub mod strategy;

pub use config::{ConfigError, DispatchConfig, TupleArity};
pub use dispatch::{Method, MethodTable, MultiMethod, MultiMethodBuilder};
pub use error::{DispatchError, DispatchResult, HierarchyError, StrategyError};
pub use hierarchy::{FlatHierarchy, TypeHierarchy, TypeKey, TypeRegistry};
pub use pattern::{matches, matches_with, DispatchPattern, DispatchValue, ANYTHING, DEFAULT};
pub use preference::PreferenceGraph;
pub use strategy::{
    single_type_dispatch, type_dispatch, Argument, CallArgs, DispatchStrategy,
    SingleTypeDispatch, TypeDispatch,
};
