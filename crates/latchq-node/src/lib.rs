//! # latchq-node
//!
//! Host-facing surface of the latchq pack.
//!
//! This crate provides:
//! - `surface`: declarative node rows (inputs, outputs, display names)
//!   the host introspects to register the pack
//! - `ops`: the operations behind each node, over one shared
//!   [`NodeContext`](ops::NodeContext)
//! - `tensor`: a concrete [`Relocatable`](latchq_store::Relocatable) leaf
//!   standing in for the host's tensor runtime
//! - `fingerprint`: digests of out-of-band state (queue depth, directory
//!   mtimes) for host-side cache invalidation
//! - `http`: the read-only pick preview endpoint
//!
//! The host's execution protocol (registration, wiring, invocation) is
//! external; this crate exposes plain synchronous functions safe to call
//! from any worker thread.

pub mod fingerprint;
pub mod http;
pub mod ops;
pub mod surface;
pub mod tensor;

pub use http::{PreviewServeError, PreviewServerConfig, serve_preview_api};
pub use ops::{
    LoadOutput, LoadRequest, NodeContext, NodeError, PickOutput, PickRequest, SaveOutput,
    SaveRequest, StatusOutput, StatusRequest, StorageBackend,
};
pub use surface::{
    FieldSpec, InputSpec, NODE_CATEGORY, NodeSpec, NodeSurface, OutputSpec, node_surface,
};
pub use tensor::{TensorHandle, TensorTriplet, TensorTree};
