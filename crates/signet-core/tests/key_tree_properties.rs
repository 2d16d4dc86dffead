//! Key tree property tests
//!
//! Invariants the resolution and sufficiency walks rely on:
//! - flattening is order-independent across sibling permutations
//! - flattening a union of trees equals the union of flattenings
//! - sufficiency is monotone in the signature set
//! - a satisfiable tree is satisfied once every member key has signed

use std::collections::BTreeSet;

use proptest::prelude::*;
use signet_core::{KeyTree, PublicKey};

fn arb_key() -> impl Strategy<Value = PublicKey> {
    // Small alphabet so trees share keys across branches
    (0u8..16).prop_map(|b| PublicKey::new(vec![b; 32]))
}

/// Trees whose threshold is always attainable (`required <= children.len()`).
fn arb_tree() -> impl Strategy<Value = KeyTree> {
    let leaf = arb_key().prop_map(KeyTree::Leaf);
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop::collection::vec(inner, 1..5).prop_flat_map(|children| {
            let max = children.len() as u32;
            (0..=max).prop_map(move |required| KeyTree::threshold(required, children.clone()))
        })
    })
}

proptest! {
    #[test]
    fn flatten_is_order_independent(tree in arb_tree()) {
        let flat = tree.flatten();
        let reversed = match tree {
            KeyTree::Threshold { required, mut children } => {
                children.reverse();
                KeyTree::threshold(required, children)
            }
            leaf => leaf,
        };
        prop_assert_eq!(flat, reversed.flatten());
    }

    #[test]
    fn flatten_union_distributes(a in arb_tree(), b in arb_tree()) {
        let mut union = BTreeSet::new();
        a.flatten_into(&mut union);
        b.flatten_into(&mut union);

        let expected: BTreeSet<_> = a.flatten().union(&b.flatten()).cloned().collect();
        prop_assert_eq!(union, expected);
    }

    #[test]
    fn satisfaction_is_monotone(tree in arb_tree(), extra in arb_key()) {
        let members = tree.flatten();
        let partial: BTreeSet<_> = members.iter().take(members.len() / 2).cloned().collect();
        let mut larger = partial.clone();
        larger.insert(extra);
        for key in &members {
            larger.insert(key.clone());
        }
        // Adding signatures never un-satisfies a tree.
        if tree.is_satisfied(&partial) {
            prop_assert!(tree.is_satisfied(&larger));
        }
    }

    #[test]
    fn all_members_signing_satisfies(tree in arb_tree()) {
        let members = tree.flatten();
        prop_assert!(tree.is_satisfied(&members));
    }

    #[test]
    fn blob_codec_round_trips(tree in arb_tree()) {
        let blob = signet_core::encode_key_blob(&tree).expect("encode");
        let back = signet_core::decode_key_blob(&blob).expect("decode");
        prop_assert_eq!(tree, back);
    }
}
