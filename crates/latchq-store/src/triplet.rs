//! Triplet payloads and stored queue records.

use crate::value::{Relocatable, ValueTree};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a memory-backed enqueue leaves the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePlacement {
    /// Detach and move every leaf to host memory, freeing accelerator
    /// memory while the item waits in the queue.
    Cpu,
    /// Detach only; leaves stay on their current device.
    Keep,
}

/// Where a dequeue delivers the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPlacement {
    /// Deliver to the caller-supplied active compute device.
    Auto,
    /// Deliver to host memory.
    Cpu,
}

/// The unit moved through a queue: a latent plus two conditioning values.
///
/// Serializes as a mapping with exactly these three keys, which is also
/// the disk item container format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triplet<L> {
    pub latent: ValueTree<L>,
    pub positive: ValueTree<L>,
    pub negative: ValueTree<L>,
}

impl<L> Triplet<L> {
    pub fn new(latent: ValueTree<L>, positive: ValueTree<L>, negative: ValueTree<L>) -> Self {
        Self {
            latent,
            positive,
            negative,
        }
    }

    /// Apply `f` to every leaf of all three trees.
    pub fn map_leaves<M>(self, f: &impl Fn(L) -> M) -> Triplet<M> {
        Triplet {
            latent: self.latent.map_leaves(f),
            positive: self.positive.map_leaves(f),
            negative: self.negative.map_leaves(f),
        }
    }
}

impl<L: Relocatable> Triplet<L> {
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
        self.relocated(crate::value::HOST_DEVICE)
    }

    /// Prepare the triplet for storage under `placement`.
    pub fn stored(self, placement: StorePlacement) -> Self {
        match placement {
            StorePlacement::Cpu => self.to_host(),
            StorePlacement::Keep => self.detached(),
        }
    }

    /// Prepare the triplet for delivery under `placement`.
    pub fn delivered(self, placement: LoadPlacement, active_device: &str) -> Self {
        match placement {
            LoadPlacement::Auto => self.relocated(active_device),
            LoadPlacement::Cpu => self.to_host(),
        }
    }
}

/// A queue entry: the triplet plus its creation timestamp.
///
/// The timestamp is display-only. Insertion order alone defines queue
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem<L> {
    pub stored_at: DateTime<Utc>,
    pub triplet: Triplet<L>,
}

impl<L> StoredItem<L> {
    pub fn new(stored_at: DateTime<Utc>, triplet: Triplet<L>) -> Self {
        Self {
            stored_at,
            triplet,
        }
    }
}
