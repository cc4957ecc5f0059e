use std::collections::BTreeMap;

use proptest::prelude::*;
use rag_store::{JsonChunker, Scalar, TravelNode};

/// `(path, canonical leaf json)` for every leaf; array indices become keys.
fn leaves(node: &TravelNode, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, String)>) {
    match node {
        TravelNode::Object(m) if !m.is_empty() => {
            for (k, v) in m {
                path.push(k.clone());
                leaves(v, path, out);
                path.pop();
            }
        }
        TravelNode::Array(a) if !a.is_empty() => {
            for (i, v) in a.iter().enumerate() {
                path.push(i.to_string());
                leaves(v, path, out);
                path.pop();
            }
        }
        leaf => out.push((path.clone(), leaf.to_json())),
    }
}

fn sorted_leaves(node: &TravelNode) -> Vec<(Vec<String>, String)> {
    let mut out = Vec::new();
    leaves(node, &mut Vec::new(), &mut out);
    out.sort();
    out
}

fn scalar() -> impl Strategy<Value = TravelNode> {
    prop_oneof![
        Just(TravelNode::Scalar(Scalar::Null)),
        any::<bool>().prop_map(|b| TravelNode::Scalar(Scalar::Bool(b))),
        (-10_000i64..10_000).prop_map(|n| TravelNode::Scalar(Scalar::Number(n.into()))),
        "[a-zA-Z0-9 :]{0,20}".prop_map(|s| TravelNode::Scalar(Scalar::String(s))),
    ]
}

fn node() -> impl Strategy<Value = TravelNode> {
    scalar().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(TravelNode::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m: BTreeMap<String, TravelNode>| TravelNode::Object(m)),
        ]
    })
}

proptest! {
    #[test]
    fn chunks_respect_ceiling(doc in node(), max in 120usize..600) {
        let chunks = JsonChunker::new(max).split(&doc).unwrap();
        for c in &chunks {
            prop_assert!(c.text.chars().count() <= max, "chunk {} has {} chars", c.ordinal, c.text.len());
            prop_assert_eq!(&c.text, &c.node.to_json());
        }
    }

    #[test]
    fn chunks_partition_leaves(doc in node(), max in 120usize..600) {
        let chunks = JsonChunker::new(max).split(&doc).unwrap();
        let mut from_chunks: Vec<_> = chunks.iter().flat_map(|c| sorted_leaves(&c.node)).collect();
        from_chunks.sort();
        prop_assert_eq!(from_chunks, sorted_leaves(&doc));
    }

    #[test]
    fn ordinals_are_sequential(doc in node(), max in 120usize..600) {
        let chunks = JsonChunker::new(max).split(&doc).unwrap();
        for (i, c) in chunks.iter().enumerate() {
            prop_assert_eq!(c.ordinal, i);
        }
    }

    #[test]
    fn split_is_deterministic(doc in node(), max in 120usize..600) {
        let chunker = JsonChunker::new(max);
        prop_assert_eq!(chunker.split(&doc).unwrap(), chunker.split(&doc).unwrap());
    }
}
