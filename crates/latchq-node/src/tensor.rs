//! Concrete tensor stand-in for hosts without a bound tensor runtime.
//!
//! The store only needs the [`Relocatable`] seam; real deployments bind a
//! tensor runtime's handle type instead. This one records what the
//! runtime would track (shape, dtype, device, grad tracking) and carries
//! flat f32 data so the disk container round-trips something real.

use latchq_store::{Relocatable, Triplet, ValueTree};
use serde::{Deserialize, Serialize};

/// A tensor-like leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorHandle {
    pub shape: Vec<usize>,
    pub dtype: String,
    pub device: String,
    #[serde(default)]
    pub requires_grad: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<f32>,
}

impl TensorHandle {
    /// A zero-filled tensor on `device`.
    pub fn zeros(shape: &[usize], device: &str) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            dtype: "f32".to_string(),
            device: device.to_string(),
            requires_grad: false,
            data: vec![0.0; len],
        }
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

impl Relocatable for TensorHandle {
    fn detach(mut self) -> Self {
        self.requires_grad = false;
        self
    }

    fn to_device(mut self, device: &str) -> Self {
        // A bound runtime would migrate the buffer here; the stand-in
        // only retags, which is all the queue semantics observe.
        self.device = device.to_string();
        self
    }

    fn device(&self) -> &str {
        &self.device
    }
}

/// Payload tree with tensor leaves, as flowing between graph nodes.
pub type TensorTree = ValueTree<TensorHandle>;

/// The three-part payload moved through queues.
pub type TensorTriplet = Triplet<TensorHandle>;
