//! Explicit priority between patterns.
//!
//! Edges propagate along the type relation: preferring a supertype of `y`
//! means preferring `y`, and a preference held by a supertype of `x` is
//! held by `x`. Preferences also chain through explicit edges, and no
//! insertion is allowed to close a cycle.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::TupleArity;
use crate::error::{DispatchError, DispatchResult};
use crate::hierarchy::TypeHierarchy;
use crate::pattern::{matches_with, DispatchPattern};

/// Directed "preferred over" edges for one multimethod.
#[derive(Debug, Clone, Default)]
pub struct PreferenceGraph {
    edges: IndexMap<DispatchPattern, IndexSet<DispatchPattern>>,
}

impl PreferenceGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `preferred` over `over`.
    ///
    /// Returns `Ok(true)` if the edge is new and `Ok(false)` if it was
    /// already present. Fails without touching the graph if both are the
    /// same pattern, or if the edge would leave two patterns the graph
    /// mentions (or their supertypes) each preferred over the other. That
    /// covers `over` already being preferred to `preferred`, an edge on a
    /// supertype contradicting an existing edge below it, and an edge
    /// between a type and its own supertype, which would turn the order
    /// given by specificity around for deeper subtypes.
    pub fn insert<H>(
        &mut self,
        method: &str,
        preferred: DispatchPattern,
        over: DispatchPattern,
        hierarchy: &H,
    ) -> DispatchResult<bool>
    where
        H: TypeHierarchy + ?Sized,
    {
        if self
            .edges
            .get(&preferred)
            .is_some_and(|overs| overs.contains(&over))
        {
            return Ok(false);
        }
        if preferred == over || self.prefers(&over, &preferred, hierarchy) {
            return Err(self.conflict(method, preferred, over));
        }

        self.edges.entry(preferred.clone()).or_default().insert(over.clone());
        if let Some((a, b)) = self.contradiction(hierarchy) {
            debug!(method, %a, %b, "preference would make patterns prefer each other");
            self.remove_edge(&preferred, &over);
            return Err(self.conflict(method, preferred, over));
        }

        debug!(method, %preferred, %over, "added preference");
        Ok(true)
    }

    fn conflict(
        &self,
        method: &str,
        preferred: DispatchPattern,
        over: DispatchPattern,
    ) -> DispatchError {
        debug!(method, %preferred, %over, "rejected conflicting preference");
        DispatchError::PreferenceConflict {
            method: method.to_string(),
            preferred,
            over,
        }
    }

    fn remove_edge(&mut self, preferred: &DispatchPattern, over: &DispatchPattern) {
        if let Some(overs) = self.edges.get_mut(preferred) {
            overs.shift_remove(over);
            if overs.is_empty() {
                self.edges.shift_remove(preferred);
            }
        }
    }

    /// A pair of patterns, among edge endpoints and their supertypes, that
    /// prefer each other. A pattern preferring itself counts: every pair of
    /// its subtypes would then prefer each other.
    fn contradiction<H>(&self, hierarchy: &H) -> Option<(DispatchPattern, DispatchPattern)>
    where
        H: TypeHierarchy + ?Sized,
    {
        let mut nodes: IndexSet<DispatchPattern> = IndexSet::new();
        for (preferred, over) in self.edges() {
            nodes.extend(lineage(preferred, hierarchy));
            nodes.extend(lineage(over, hierarchy));
        }
        for (i, a) in nodes.iter().enumerate() {
            if self.prefers(a, a, hierarchy) {
                return Some((a.clone(), a.clone()));
            }
            for b in nodes.iter().skip(i + 1) {
                if self.prefers(a, b, hierarchy) && self.prefers(b, a, hierarchy) {
                    return Some((a.clone(), b.clone()));
                }
            }
        }
        None
    }

    /// Whether `x` is preferred over `y`, directly or through propagation
    /// and chaining.
    pub fn prefers<H>(&self, x: &DispatchPattern, y: &DispatchPattern, hierarchy: &H) -> bool
    where
        H: TypeHierarchy + ?Sized,
    {
        if self.edges.is_empty() {
            return false;
        }
        let targets = lineage(y, hierarchy);
        let mut seen = FxHashSet::default();
        let mut stack = lineage(x, hierarchy);
        while let Some(node) = stack.pop() {
            if !seen.insert(node.clone()) {
                continue;
            }
            let Some(over) = self.edges.get(&node) else {
                continue;
            };
            for target in over {
                if targets.contains(target) {
                    return true;
                }
                stack.extend(lineage(target, hierarchy));
            }
        }
        false
    }

    /// Whether `x` should win over `y` when both match: `x` is preferred,
    /// or `x` is at least as specific as `y`.
    pub fn dominates<H>(
        &self,
        x: &DispatchPattern,
        y: &DispatchPattern,
        hierarchy: &H,
        arity: TupleArity,
    ) -> bool
    where
        H: TypeHierarchy + ?Sized,
    {
        self.prefers(x, y, hierarchy) || matches_with(x, y, hierarchy, arity)
    }

    /// Explicit edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&DispatchPattern, &DispatchPattern)> + '_ {
        self.edges
            .iter()
            .flat_map(|(preferred, overs)| overs.iter().map(move |over| (preferred, over)))
    }

    /// Patterns explicitly preferred less than `preferred`.
    pub fn preferred_over(&self, preferred: &DispatchPattern) -> Vec<DispatchPattern> {
        self.edges
            .get(preferred)
            .map(|overs| overs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of explicit edges.
    pub fn len(&self) -> usize {
        self.edges.values().map(IndexSet::len).sum()
    }

    /// Whether no edge has been recorded.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// A pattern followed by its supertypes. Only type patterns have any.
fn lineage<H>(pattern: &DispatchPattern, hierarchy: &H) -> Vec<DispatchPattern>
where
    H: TypeHierarchy + ?Sized,
{
    match pattern {
        DispatchPattern::Type(key) => hierarchy
            .ancestors(key)
            .into_iter()
            .map(DispatchPattern::Type)
            .collect(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{FlatHierarchy, TypeRegistry};
    use crate::pattern::{ANYTHING, DEFAULT};

    trait Animal {}
    struct Dog;
    struct Puppy;
    struct Cat;

    fn zoo() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.declare_type::<Dog, dyn Animal>().unwrap();
        registry.declare_type::<Puppy, Dog>().unwrap();
        registry.declare_type::<Cat, dyn Animal>().unwrap();
        registry
    }

    fn p<T: ?Sized + 'static>() -> DispatchPattern {
        DispatchPattern::of::<T>()
    }

    #[test]
    fn test_direct_edge() {
        let h = FlatHierarchy;
        let mut graph = PreferenceGraph::new();
        assert!(graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap());
        assert!(graph.prefers(&p::<Dog>(), &p::<Cat>(), &h));
        assert!(!graph.prefers(&p::<Cat>(), &p::<Dog>(), &h));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let h = FlatHierarchy;
        let mut graph = PreferenceGraph::new();
        assert!(graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap());
        assert!(!graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_preferring_supertype_covers_subtypes() {
        let h = zoo();
        let mut graph = PreferenceGraph::new();
        graph.insert("m", p::<Cat>(), p::<Dog>(), &h).unwrap();
        assert!(graph.prefers(&p::<Cat>(), &p::<Puppy>(), &h));
    }

    #[test]
    fn test_preference_inherited_from_supertype() {
        let h = zoo();
        let mut graph = PreferenceGraph::new();
        graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap();
        assert!(graph.prefers(&p::<Puppy>(), &p::<Cat>(), &h));
        assert!(!graph.prefers(&p::<dyn Animal>(), &p::<Cat>(), &h));
    }

    #[test]
    fn test_preferences_chain() {
        let h = FlatHierarchy;
        let (a, b, c) = (
            DispatchPattern::named("a"),
            DispatchPattern::named("b"),
            DispatchPattern::named("c"),
        );
        let mut graph = PreferenceGraph::new();
        graph.insert("m", a.clone(), b.clone(), &h).unwrap();
        graph.insert("m", b.clone(), c.clone(), &h).unwrap();
        assert!(graph.prefers(&a, &c, &h));

        let err = graph.insert("m", c.clone(), a.clone(), &h).unwrap_err();
        assert!(matches!(err, DispatchError::PreferenceConflict { .. }));
        assert_eq!(graph.len(), 2);
        assert!(!graph.prefers(&c, &a, &h));
    }

    #[test]
    fn test_conflict_through_propagation() {
        let h = zoo();
        let mut graph = PreferenceGraph::new();
        graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap();
        // Cat over Puppy would contradict Puppy inheriting Dog's preference.
        assert!(graph.insert("m", p::<Cat>(), p::<Puppy>(), &h).is_err());
    }

    #[test]
    fn test_supertype_edge_cannot_contradict_subtype_edge() {
        let h = zoo();
        let mut graph = PreferenceGraph::new();
        graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap();

        // Cat would inherit Animal's preference for Dog.
        let err = graph.insert("m", p::<dyn Animal>(), p::<Dog>(), &h).unwrap_err();
        assert!(matches!(err, DispatchError::PreferenceConflict { .. }));
        assert_eq!(graph.len(), 1);
        assert!(graph.prefers(&p::<Dog>(), &p::<Cat>(), &h));
        assert!(!graph.prefers(&p::<Cat>(), &p::<Dog>(), &h));
    }

    #[test]
    fn test_rejected_edge_is_rolled_back() {
        let h = zoo();
        let mut graph = PreferenceGraph::new();
        graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap();
        assert!(graph.insert("m", p::<dyn Animal>(), p::<Puppy>(), &h).is_err());

        let edges: Vec<_> = graph.edges().map(|(a, b)| (a.clone(), b.clone())).collect();
        assert_eq!(edges, vec![(p::<Dog>(), p::<Cat>())]);
        assert!(graph.preferred_over(&p::<dyn Animal>()).is_empty());
    }

    #[test]
    fn test_edges_between_related_types_rejected() {
        let h = zoo();
        let mut graph = PreferenceGraph::new();
        assert!(graph.insert("m", p::<dyn Animal>(), p::<Dog>(), &h).is_err());
        assert!(graph.insert("m", p::<Dog>(), p::<dyn Animal>(), &h).is_err());
        assert!(graph.is_empty());
        assert!(graph.insert("m", p::<Puppy>(), p::<Cat>(), &h).unwrap());
    }

    #[test]
    fn test_self_preference_rejected() {
        let mut graph = PreferenceGraph::new();
        assert!(graph.insert("m", DEFAULT, DEFAULT, &FlatHierarchy).is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_dominates_by_specificity_or_preference() {
        let h = zoo();
        let mut graph = PreferenceGraph::new();
        let arity = TupleArity::Exact;
        assert!(graph.dominates(&p::<Dog>(), &p::<dyn Animal>(), &h, arity));
        assert!(graph.dominates(&p::<Dog>(), &ANYTHING, &h, arity));
        assert!(!graph.dominates(&p::<Dog>(), &p::<Cat>(), &h, arity));

        graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap();
        assert!(graph.dominates(&p::<Dog>(), &p::<Cat>(), &h, arity));
    }

    #[test]
    fn test_edges_in_insertion_order() {
        let h = FlatHierarchy;
        let mut graph = PreferenceGraph::new();
        graph.insert("m", p::<Dog>(), p::<Cat>(), &h).unwrap();
        graph.insert("m", p::<Dog>(), p::<Puppy>(), &h).unwrap();
        let edges: Vec<_> = graph.edges().map(|(a, b)| (a.clone(), b.clone())).collect();
        assert_eq!(
            edges,
            vec![(p::<Dog>(), p::<Cat>()), (p::<Dog>(), p::<Puppy>())]
        );
        assert_eq!(graph.preferred_over(&p::<Dog>()).len(), 2);
    }
}
