//! # latchq-store
//!
//! Named FIFO/cursor queues of latent+conditioning triplets.
//!
//! This crate provides:
//! - queue-name sanitization (`name`)
//! - the generic payload tree and device-relocation seam (`value`,
//!   `triplet`)
//! - an in-process backend (`memory`): per-name queues with one mutex
//!   each, living for the process lifetime
//! - a durable backend (`disk`): one directory per queue, one JSON file
//!   per item, a one-line cursor file
//! - cursor arithmetic shared by callers of the disk layout (`cursor`)
//!
//! Both backends implement [`TripletQueue`], so node surfaces can select a
//! backend per invocation while sharing one contract. A queue is
//! append-only until consumed: items enter at the tail, leave only via a
//! consuming dequeue, and are never reordered.

pub mod cursor;
pub mod disk;
pub mod error;
pub mod memory;
pub mod name;
pub mod status;
pub mod triplet;
pub mod value;

pub use cursor::{encode_cursor, resolve_next_index};
pub use disk::{CURSOR_FILENAME, DISK_SUBDIR, DiskStore, ITEM_EXT};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use name::{DEFAULT_QUEUE_NAME, MAX_QUEUE_NAME_LEN, sanitize_queue_name};
pub use status::QueueStatus;
pub use triplet::{LoadPlacement, StorePlacement, StoredItem, Triplet};
pub use value::{HOST_DEVICE, Relocatable, ValueTree};

use chrono::{DateTime, Utc};

/// How a dequeue selects, delivers, and retires an item.
#[derive(Debug, Clone)]
pub struct DequeueRequest {
    /// Remove the item permanently after reading it.
    pub consume: bool,
    /// Forget prior read progress and start from position 0.
    /// Ignored when `index_override` is present.
    pub reset_cursor: bool,
    /// Start the read at exactly this position; the stored cursor is
    /// updated to match. Wins over `reset_cursor`.
    pub index_override: Option<usize>,
    /// Where the triplet is delivered.
    pub placement: LoadPlacement,
    /// Destination device used when `placement` is
    /// [`LoadPlacement::Auto`].
    pub active_device: String,
}

impl Default for DequeueRequest {
    fn default() -> Self {
        Self {
            consume: true,
            reset_cursor: false,
            index_override: None,
            placement: LoadPlacement::Auto,
            active_device: HOST_DEVICE.to_string(),
        }
    }
}

/// A successful dequeue: the delivered triplet plus the cursor left behind.
#[derive(Debug, Clone)]
pub struct Dequeued<L> {
    pub triplet: Triplet<L>,
    /// Resulting cursor: the read position itself after a consume (the
    /// removal shifts the next item into that position), one past it
    /// otherwise.
    pub cursor: usize,
    /// Creation timestamp when recoverable; display only.
    pub stored_at: Option<DateTime<Utc>>,
}

/// The contract shared by the memory and disk backends.
///
/// Queue names are sanitized inside every method; callers may pass raw
/// user input.
pub trait TripletQueue<L> {
    /// Append one triplet at the tail of the named queue.
    fn enqueue(
        &self,
        queue_name: &str,
        triplet: Triplet<L>,
        placement: StorePlacement,
    ) -> Result<(), StoreError>;

    /// Read (and optionally consume) one item per `request`.
    ///
    /// Fails with [`StoreError::EmptyQueue`] when the queue has zero
    /// items, and with [`StoreError::NoUnreadItems`] when items exist but
    /// the effective start position is at or past the end.
    fn dequeue(&self, queue_name: &str, request: &DequeueRequest)
    -> Result<Dequeued<L>, StoreError>;

    /// Read-only counters. `reset_cursor` interprets the cursor as 0
    /// without persisting anything.
    fn status(&self, queue_name: &str, reset_cursor: bool) -> Result<QueueStatus, StoreError>;

    /// Persistently move the cursor back to position 0.
    fn reset(&self, queue_name: &str) -> Result<(), StoreError>;

    /// Human-readable preview of unread items from `from` (stored cursor
    /// when `None`) to the end, truncated at `max_items`. Pure.
    fn list_unread(
        &self,
        queue_name: &str,
        from: Option<usize>,
        max_items: usize,
    ) -> Result<Vec<String>, StoreError>;
}
