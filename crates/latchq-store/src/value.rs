//! Generic payload trees and the leaf-relocation traversal.
//!
//! The queue store never inspects payload contents. It needs exactly two
//! capabilities from a payload: moving tensor-like leaves between devices
//! before storage/delivery, and serde round-tripping for the disk backend.
//! Both are expressed here over an owned `{map, seq, tuple, scalar, leaf}`
//! tree with a pluggable leaf type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host memory device name. Disk persistence always relocates here first.
pub const HOST_DEVICE: &str = "cpu";

/// Device seam for payload leaves.
///
/// Hosts substitute their own tensor abstraction by implementing this;
/// the store only ever calls these three methods.
pub trait Relocatable {
    /// Strip autodiff/graph history, leaving the value where it is.
    fn detach(self) -> Self;

    /// Move to the named device (`"cpu"`, `"cuda:0"`, ...).
    fn to_device(self, device: &str) -> Self;

    /// The device currently holding this value.
    fn device(&self) -> &str;
}

/// A nested payload structure with tensor-like leaves.
///
/// Mirrors the shapes that flow between graph nodes: maps, sequences, and
/// tuple-like groups with opaque leaves at the bottom. `Scalar` carries
/// plain (non-tensor) values through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTree<L> {
    Map(BTreeMap<String, ValueTree<L>>),
    Seq(Vec<ValueTree<L>>),
    Tuple(Vec<ValueTree<L>>),
    Scalar(serde_json::Value),
    Leaf(L),
}

impl<L> ValueTree<L> {
    /// Apply `f` to every leaf, preserving structure and key order.
    pub fn map_leaves<M>(self, f: &impl Fn(L) -> M) -> ValueTree<M> {
        match self {
            ValueTree::Map(entries) => ValueTree::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.map_leaves(f)))
                    .collect(),
            ),
            ValueTree::Seq(items) => {
                ValueTree::Seq(items.into_iter().map(|item| item.map_leaves(f)).collect())
            }
            ValueTree::Tuple(items) => {
                ValueTree::Tuple(items.into_iter().map(|item| item.map_leaves(f)).collect())
            }
            ValueTree::Scalar(value) => ValueTree::Scalar(value),
            ValueTree::Leaf(leaf) => ValueTree::Leaf(f(leaf)),
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            ValueTree::Map(entries) => entries.values().map(ValueTree::leaf_count).sum(),
            ValueTree::Seq(items) | ValueTree::Tuple(items) => {
                items.iter().map(ValueTree::leaf_count).sum()
            }
            ValueTree::Scalar(_) => 0,
            ValueTree::Leaf(_) => 1,
        }
    }
}

impl<L: Relocatable> ValueTree<L> {
    /// Detach every leaf without moving it.
    pub fn detached(self) -> Self {
        self.map_leaves(&|leaf: L| leaf.detach())
    }

    /// Detach and move every leaf to `device`.
    pub fn relocated(self, device: &str) -> Self {
        self.map_leaves(&|leaf: L| leaf.detach().to_device(device))
    }

    /// Detach and move every leaf to host memory.
    pub fn to_host(self) -> Self {
        self.relocated(HOST_DEVICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FakeLeaf {
        device: String,
        detached: bool,
    }

    impl FakeLeaf {
        fn on(device: &str) -> Self {
            Self {
                device: device.to_string(),
                detached: false,
            }
        }
    }

    impl Relocatable for FakeLeaf {
        fn detach(mut self) -> Self {
            self.detached = true;
            self
        }

        fn to_device(mut self, device: &str) -> Self {
            self.device = device.to_string();
            self
        }

        fn device(&self) -> &str {
            &self.device
        }
    }

    fn nested() -> ValueTree<FakeLeaf> {
        let mut inner = BTreeMap::new();
        inner.insert(
            "samples".to_string(),
            ValueTree::Leaf(FakeLeaf::on("cuda:0")),
        );
        inner.insert("steps".to_string(), ValueTree::Scalar(json!(20)));
        ValueTree::Map(
            [
                ("latent".to_string(), ValueTree::Map(inner)),
                (
                    "cond".to_string(),
                    ValueTree::Seq(vec![ValueTree::Tuple(vec![
                        ValueTree::Leaf(FakeLeaf::on("cuda:0")),
                        ValueTree::Scalar(json!({"strength": 1.0})),
                    ])]),
                ),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn relocated_reaches_every_leaf_through_nesting() {
        let moved = nested().relocated("cpu");
        let mut seen = 0;
        fn walk(tree: &ValueTree<FakeLeaf>, seen: &mut usize) {
            match tree {
                ValueTree::Map(entries) => entries.values().for_each(|v| walk(v, seen)),
                ValueTree::Seq(items) | ValueTree::Tuple(items) => {
                    items.iter().for_each(|v| walk(v, seen))
                }
                ValueTree::Scalar(_) => {}
                ValueTree::Leaf(leaf) => {
                    assert_eq!(leaf.device, "cpu");
                    assert!(leaf.detached);
                    *seen += 1;
                }
            }
        }
        walk(&moved, &mut seen);
        assert_eq!(seen, 2);
    }

    #[test]
    fn detached_leaves_stay_on_their_device() {
        let detached = nested().detached();
        assert_eq!(detached.leaf_count(), 2);
        if let ValueTree::Map(entries) = &detached {
            if let Some(ValueTree::Map(inner)) = entries.get("latent") {
                if let Some(ValueTree::Leaf(leaf)) = inner.get("samples") {
                    assert_eq!(leaf.device, "cuda:0");
                    assert!(leaf.detached);
                    return;
                }
            }
        }
        panic!("expected latent.samples leaf to survive");
    }

    #[test]
    fn scalars_pass_through_untouched() {
        let tree: ValueTree<FakeLeaf> = ValueTree::Scalar(json!({"cfg": 7.5}));
        let moved = tree.clone().relocated("cpu");
        assert_eq!(moved, tree);
        assert_eq!(moved.leaf_count(), 0);
    }

    #[test]
    fn serde_round_trip_preserves_structure() {
        let tree = nested();
        let encoded = serde_json::to_string(&tree).expect("tree should serialize");
        let decoded: ValueTree<FakeLeaf> =
            serde_json::from_str(&encoded).expect("tree should deserialize");
        assert_eq!(decoded, tree);
    }
}
