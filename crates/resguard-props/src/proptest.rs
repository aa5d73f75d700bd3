//! Property-based tests for the property codec.
//!
//! Covers:
//! - decode(encode(t)) == t for trees without unknowns, secrets kept
//! - secrecy is never promoted to the enclosing container
//! - the guard accepts every tree that contains no unknowns

use crate::codec::{DecodeOptions, decode, encode};
use crate::guard::{Guarded, guard};
use crate::value::{Archive, ArchiveMember, Asset, PropertyMap, PropertyValue};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Strategies
// ============================================================================

fn arb_key() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,11}").unwrap()
}

fn arb_asset() -> impl Strategy<Value = Asset> {
    prop_oneof![
        "[a-z/]{1,16}".prop_map(|path| Asset::File { path }),
        ".{0,24}".prop_map(|content| Asset::Text { content }),
        "https://[a-z]{1,8}\\.com/[a-z]{0,8}".prop_map(|uri| Asset::Remote { uri }),
    ]
}

fn arb_archive() -> impl Strategy<Value = Archive> {
    prop_oneof![
        "[a-z/]{1,16}".prop_map(|path| Archive::File { path }),
        "https://[a-z]{1,8}\\.com/[a-z]{0,8}".prop_map(|uri| Archive::Remote { uri }),
        prop::collection::btree_map(arb_key(), arb_asset(), 0..4).prop_map(|members| {
            Archive::Collection(
                members
                    .into_iter()
                    .map(|(k, a)| (k, ArchiveMember::Asset(a)))
                    .collect::<BTreeMap<_, _>>(),
            )
        }),
    ]
}

fn arb_leaf() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        Just(PropertyValue::Null),
        any::<bool>().prop_map(PropertyValue::from),
        any::<i64>().prop_map(PropertyValue::from),
        (-1.0e9f64..1.0e9).prop_map(PropertyValue::from),
        // Too short to collide with a 36-character unknown sentinel.
        "[ -~]{0,16}".prop_map(PropertyValue::from),
        arb_asset().prop_map(PropertyValue::from),
        arb_archive().prop_map(PropertyValue::from),
    ]
}

/// Trees with secrets at arbitrary positions but no unknowns.
fn arb_known_tree() -> impl Strategy<Value = PropertyValue> {
    arb_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(PropertyValue::Sequence),
            prop::collection::btree_map(arb_key(), inner.clone(), 0..6)
                .prop_map(|m| PropertyValue::Map(m.into_iter().collect::<PropertyMap>())),
            inner.prop_map(PropertyValue::secret),
        ]
    })
}

fn every_read_succeeds(g: &Guarded<'_>) -> bool {
    if g.is_sequence() {
        return g
            .iter()
            .all(|item| item.map(|c| every_read_succeeds(&c)).unwrap_or(false));
    }
    if g.is_map() {
        return g
            .entries()
            .all(|item| item.map(|(_, c)| every_read_succeeds(&c)).unwrap_or(false));
    }
    true
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn roundtrip_preserves_known_trees(tree in arb_known_tree()) {
        let wire = encode(&tree);
        let back = decode(&wire, DecodeOptions::keep_secrets()).unwrap();
        prop_assert_eq!(back, tree);
    }

    #[test]
    fn dropping_secrets_equals_plain_tree(tree in arb_known_tree()) {
        let wire = encode(&tree);
        let back = decode(&wire, DecodeOptions::default()).unwrap();
        prop_assert_eq!(back, tree.to_plain());
    }

    #[test]
    fn secret_sequences_only_mark_their_own_position(
        items in prop::collection::vec(arb_leaf(), 1..5),
    ) {
        let tree = PropertyValue::Sequence(
            items.into_iter().map(PropertyValue::secret).collect(),
        );
        let back = decode(&encode(&tree), DecodeOptions::keep_secrets()).unwrap();
        prop_assert!(!back.is_secret());
        prop_assert_eq!(back, tree);
    }

    #[test]
    fn guard_accepts_trees_without_unknowns(tree in arb_known_tree()) {
        prop_assert!(!tree.contains_unknowns());
        prop_assert!(every_read_succeeds(&guard(&tree)));
    }
}
