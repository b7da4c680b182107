//! Multimethod registration and resolution.
//!
//! A [`MultiMethod`] owns a [`MethodTable`] (pattern bindings plus a
//! [`PreferenceGraph`](crate::PreferenceGraph)), a dispatch strategy and a
//! type hierarchy. A call runs the strategy over its arguments, searches the
//! table for the single best matching pattern and runs the implementation
//! bound to it.
//!
//! # Resolution
//!
//! 1. **Compute** the dispatch value from the arguments
//! 2. **Scan** every registered pattern that the value matches
//! 3. **Keep** the running best, replacing it by any pattern dominating it
//! 4. **Fail** as soon as the best does not dominate a matching pattern
//!    bound to a different implementation
//! 5. **Fall back** to `Default` when nothing matched

mod multimethod;
mod table;


pub use multimethod::{MultiMethod, MultiMethodBuilder};
pub use table::{Method, MethodTable};
