//! Property tests for the specificity predicate and preferences.

use multidispatch::{
    args, matches, single_type_dispatch, CallArgs, DispatchError, DispatchPattern, MultiMethod,
    StrategyError, TypeHierarchy, TypeKey, TypeRegistry, ANYTHING, DEFAULT,
};
use proptest::prelude::*;

const KEYS: [&str; 5] = ["shape", "polygon", "square", "circle", "rock"];

/// `square <: polygon <: shape`, `circle <: shape`, `rock` unrelated.
fn shapes() -> TypeRegistry {
    let registry = TypeRegistry::new();
    for (sub, sup) in [("polygon", "shape"), ("square", "polygon"), ("circle", "shape")] {
        registry
            .declare(TypeKey::named(sub), TypeKey::named(sup))
            .unwrap();
    }
    registry
}

fn key() -> impl Strategy<Value = TypeKey> {
    prop::sample::select(KEYS.to_vec()).prop_map(TypeKey::named)
}

/// Distinct pairs with `sub <: sup` in [`shapes`].
fn subtype_pair() -> impl Strategy<Value = (TypeKey, TypeKey)> {
    prop::sample::select(vec![
        ("polygon", "shape"),
        ("square", "polygon"),
        ("square", "shape"),
        ("circle", "shape"),
    ])
    .prop_map(|(sub, sup)| (TypeKey::named(sub), TypeKey::named(sup)))
}

fn preferring() -> MultiMethod<()> {
    MultiMethod::builder("props")
        .strategy(single_type_dispatch)
        .hierarchy(shapes())
        .build()
        .unwrap()
}

fn pattern() -> impl Strategy<Value = DispatchPattern> {
    let leaf = prop_oneof![
        4 => key().prop_map(DispatchPattern::Type),
        1 => Just(ANYTHING),
        1 => Just(DEFAULT),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(DispatchPattern::Tuple)
    })
}

proptest! {
    #[test]
    fn test_every_pattern_matches_itself(p in pattern()) {
        prop_assert!(matches(&p, &p, &shapes()));
    }

    #[test]
    fn test_wildcard_matches_every_value(v in pattern()) {
        prop_assert!(matches(&v, &ANYTHING, &shapes()));
    }

    #[test]
    fn test_pairs_match_elementwise(
        a in pattern(), b in pattern(), c in pattern(), d in pattern()
    ) {
        let h = shapes();
        let value = DispatchPattern::tuple([a.clone(), b.clone()]);
        let pat = DispatchPattern::tuple([c.clone(), d.clone()]);
        prop_assert_eq!(
            matches(&value, &pat, &h),
            matches(&a, &c, &h) && matches(&b, &d, &h)
        );
    }

    #[test]
    fn test_opposite_preference_conflicts(x in pattern(), y in pattern()) {
        let mm = preferring();
        // Self-preference and edges between related types are refused outright.
        prop_assume!(mm.prefer(x.clone(), y.clone()).is_ok());
        let before = mm.preferences();

        let conflict = mm.prefer(y, x);
        prop_assert!(
            matches!(conflict, Err(DispatchError::PreferenceConflict { .. })),
            "expected a preference conflict"
        );
        prop_assert_eq!(mm.preferences(), before);
    }

    #[test]
    fn test_no_two_patterns_prefer_each_other(
        calls in prop::collection::vec((pattern(), pattern()), 1..8)
    ) {
        let mm = preferring();
        let mut universe = KEYS.map(DispatchPattern::named).to_vec();
        for (x, y) in &calls {
            universe.push(x.clone());
            universe.push(y.clone());
        }

        for (x, y) in calls {
            let before = mm.preferences();
            if mm.prefer(x, y).is_err() {
                prop_assert_eq!(mm.preferences(), before);
            }
            for (i, a) in universe.iter().enumerate() {
                for b in universe[i + 1..].iter().filter(|b| *b != a) {
                    prop_assert!(
                        !(mm.prefers(a, b) && mm.prefers(b, a)),
                        "{} and {} prefer each other",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_subtype_wins_without_preference((sub, sup) in subtype_pair()) {
        let h = shapes();
        prop_assert!(h.is_subtype(&sub, &sup));
        // Dispatch on the key passed as the first argument.
        let mm = MultiMethod::<&'static str>::builder("props")
            .strategy(|call: &CallArgs<'_>| -> Result<DispatchPattern, StrategyError> {
                let key = call
                    .get::<TypeKey>(0)
                    .copied()
                    .ok_or(StrategyError::MissingArgument { index: 0 })?;
                Ok(DispatchPattern::Type(key))
            })
            .hierarchy(h)
            .build()
            .unwrap();
        mm.register(DispatchPattern::Type(sup), |_| "super");
        mm.register(DispatchPattern::Type(sub), |_| "sub");

        prop_assert_eq!(mm.invoke(&args![&sub]).unwrap(), "sub");
    }
}
