//! Type relation used by dispatch.
//!
//! Rust has no inheritance, so the subtype relation is supplied by the
//! embedding code through [`TypeHierarchy`]. A [`TypeKey`] names either a
//! Rust type (concrete or `dyn Trait`) or a free-standing tag, and the
//! hierarchy answers which keys are direct supertypes of which.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::HierarchyError;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Identity {
    Rust(TypeId),
    Named(&'static str),
}

/// Identifier of a dispatchable "type".
///
/// Equality and hashing only look at the identity; the display name is
/// carried along for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    identity: Identity,
    name: &'static str,
}

impl TypeKey {
    /// The key of a Rust type. `T` may be unsized, so `dyn Trait` works as
    /// an abstract supertype.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            identity: Identity::Rust(TypeId::of::<T>()),
            name: type_name::<T>(),
        }
    }

    /// A key identified by name alone, for dispatching on custom tags.
    pub const fn named(name: &'static str) -> Self {
        Self {
            identity: Identity::Named(name),
            name,
        }
    }

    /// Build a key from an already-obtained `TypeId`.
    pub fn from_type_id(id: TypeId, name: &'static str) -> Self {
        Self {
            identity: Identity::Rust(id),
            name,
        }
    }

    /// Display name of the key.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this key names the Rust type `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.identity == Identity::Rust(TypeId::of::<T>())
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity {
            Identity::Rust(_) => write!(f, "TypeKey({})", self.name),
            Identity::Named(_) => write!(f, "TypeKey(:{})", self.name),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity {
            Identity::Rust(_) => f.write_str(self.name),
            Identity::Named(_) => write!(f, ":{}", self.name),
        }
    }
}

/// Host-provided type metadata.
///
/// Implementors only need [`supertypes_of`](Self::supertypes_of); the
/// subtype check and ancestor walk are derived from it and tolerate
/// cyclic answers.
pub trait TypeHierarchy: Send + Sync {
    /// Direct supertypes of `ty`. Not transitive.
    fn supertypes_of(&self, ty: &TypeKey) -> Vec<TypeKey>;

    /// True iff `a == b` or `a` is a declared descendant of `b`.
    fn is_subtype(&self, a: &TypeKey, b: &TypeKey) -> bool {
        if a == b {
            return true;
        }
        let mut seen = FxHashSet::default();
        let mut stack = self.supertypes_of(a);
        while let Some(ty) = stack.pop() {
            if ty == *b {
                return true;
            }
            if seen.insert(ty) {
                stack.extend(self.supertypes_of(&ty));
            }
        }
        false
    }

    /// `ty` followed by all of its transitive supertypes, each listed once,
    /// nearest first.
    fn ancestors(&self, ty: &TypeKey) -> Vec<TypeKey> {
        let mut seen = FxHashSet::default();
        seen.insert(*ty);
        let mut out = vec![*ty];
        let mut next = 0;
        while next < out.len() {
            let current = out[next];
            next += 1;
            for parent in self.supertypes_of(&current) {
                if seen.insert(parent) {
                    out.push(parent);
                }
            }
        }
        out
    }
}

impl<F> TypeHierarchy for F
where
    F: Fn(&TypeKey) -> Vec<TypeKey> + Send + Sync,
{
    fn supertypes_of(&self, ty: &TypeKey) -> Vec<TypeKey> {
        self(ty)
    }
}

/// A hierarchy in which every key is related only to itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatHierarchy;

impl TypeHierarchy for FlatHierarchy {
    fn supertypes_of(&self, _ty: &TypeKey) -> Vec<TypeKey> {
        Vec::new()
    }

    fn is_subtype(&self, a: &TypeKey, b: &TypeKey) -> bool {
        a == b
    }
}

/// A declared, growable type hierarchy.
///
/// Declarations take `&self` so one registry can be shared behind an `Arc`
/// by several multimethods and still grow afterwards.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    parents: RwLock<FxHashMap<TypeKey, Vec<TypeKey>>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `sup` as a direct supertype of `sub`.
    ///
    /// Re-declaring an existing relation is a no-op. A declaration that
    /// would make `sub` its own ancestor is rejected and leaves the
    /// registry unchanged.
    pub fn declare(&self, sub: TypeKey, sup: TypeKey) -> Result<(), HierarchyError> {
        let mut parents = self.parents.write();
        if sub == sup || reaches(&parents, sup, sub) {
            return Err(HierarchyError::Cycle { sub, sup });
        }
        let entry = parents.entry(sub).or_default();
        if !entry.contains(&sup) {
            debug!(%sub, %sup, "declared supertype");
            entry.push(sup);
        }
        Ok(())
    }

    /// Declare `Sup` as a direct supertype of `Sub`.
    pub fn declare_type<Sub, Sup>(&self) -> Result<(), HierarchyError>
    where
        Sub: ?Sized + 'static,
        Sup: ?Sized + 'static,
    {
        self.declare(TypeKey::of::<Sub>(), TypeKey::of::<Sup>())
    }

    /// Builder form of [`declare`](Self::declare).
    pub fn with(self, sub: TypeKey, sup: TypeKey) -> Result<Self, HierarchyError> {
        self.declare(sub, sup)?;
        Ok(self)
    }

    /// Number of keys with at least one declared supertype.
    pub fn len(&self) -> usize {
        self.parents.read().len()
    }

    /// Whether nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.parents.read().is_empty()
    }
}

impl TypeHierarchy for TypeRegistry {
    fn supertypes_of(&self, ty: &TypeKey) -> Vec<TypeKey> {
        self.parents.read().get(ty).cloned().unwrap_or_default()
    }
}

/// Whether `to` is `from` or one of its ancestors in `parents`.
fn reaches(parents: &FxHashMap<TypeKey, Vec<TypeKey>>, from: TypeKey, to: TypeKey) -> bool {
    let mut seen = FxHashSet::default();
    let mut stack = vec![from];
    while let Some(ty) = stack.pop() {
        if ty == to {
            return true;
        }
        if seen.insert(ty) {
            if let Some(ps) = parents.get(&ty) {
                stack.extend(ps.iter().copied());
            }
        }
    }
    false
}
