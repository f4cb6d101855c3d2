//! # latchq-pick
//!
//! Indexed filesystem picking for dataset iteration.
//!
//! This crate provides:
//! - filtered, sorted directory snapshots (`listing`)
//! - natural ordering for names with embedded numbers (`natural`)
//! - index resolution with wrap/clamp/error policies (`resolve`)
//! - bounded preview windows around a pick (`preview`)
//!
//! A pick is pure given the directory's current state: no index is
//! persisted between calls, and the same inputs against the same
//! directory always resolve the same entry. Hosts drive iteration by
//! supplying the index externally, one execution at a time.

pub mod error;
pub mod listing;
pub mod natural;
pub mod preview;
pub mod resolve;

pub use error::PickError;
pub use listing::{Entry, EntryKind, ListRequest, SortPolicy, list_entries};
pub use natural::natural_cmp;
pub use preview::preview_window;
pub use resolve::{OutOfRange, Pick, Resolved, resolve, resolve_index};
