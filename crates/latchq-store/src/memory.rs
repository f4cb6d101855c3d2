//! In-memory queue backend.
//!
//! Process-wide state: one registry mapping sanitized queue names to
//! lazily-created queues. The registry lock is held only for the
//! get-or-create check; each queue then owns a mutex guarding its item
//! sequence and cursor for the duration of one operation. Queues are
//! never destroyed while the process lives.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::error::StoreError;
use crate::name::sanitize_queue_name;
use crate::status::{QueueStatus, format_stored_at, unread_preview};
use crate::triplet::{StorePlacement, StoredItem, Triplet};
use crate::value::Relocatable;
use crate::{Dequeued, DequeueRequest, TripletQueue};

struct QueueState<L> {
    items: VecDeque<StoredItem<L>>,
    cursor: usize,
}

struct MemoryQueue<L> {
    state: Mutex<QueueState<L>>,
}

impl<L> MemoryQueue<L> {
    fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                cursor: 0,
            }),
        }
    }
}

/// In-memory triplet queues, keyed by sanitized name.
///
/// Construct once and share by reference across invocations; all internal
/// state is synchronized.
pub struct MemoryStore<L> {
    queues: Mutex<HashMap<String, Arc<MemoryQueue<L>>>>,
}

/// A poisoned mutex only means another thread panicked mid-operation; the
/// queue structures stay valid, so keep serving.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<L> MemoryStore<L> {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Get or lazily create the queue for `name` (already sanitized).
    ///
    /// The registry lock covers only this lookup, never queue bodies.
    fn queue(&self, name: &str) -> Arc<MemoryQueue<L>> {
        let mut registry = lock(&self.queues);
        Arc::clone(
            registry
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryQueue::new())),
        )
    }

    /// Queue for `name` if one was ever touched, without creating it.
    fn existing_queue(&self, name: &str) -> Option<Arc<MemoryQueue<L>>> {
        lock(&self.queues).get(name).cloned()
    }
}

impl<L> Default for MemoryStore<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Relocatable + Clone> TripletQueue<L> for MemoryStore<L> {
    fn enqueue(
        &self,
        queue_name: &str,
        triplet: Triplet<L>,
        placement: StorePlacement,
    ) -> Result<(), StoreError> {
        let name = sanitize_queue_name(queue_name);
        // Relocation happens outside the lock; the critical section is
        // list mutation only.
        let item = StoredItem::new(Utc::now(), triplet.stored(placement));
        let queue = self.queue(&name);
        let mut state = lock(&queue.state);
        state.items.push_back(item);
        Ok(())
    }

    fn dequeue(
        &self,
        queue_name: &str,
        request: &DequeueRequest,
    ) -> Result<Dequeued<L>, StoreError> {
        let name = sanitize_queue_name(queue_name);
        let queue = self.queue(&name);

        let (item, cursor) = {
            let mut state = lock(&queue.state);
            let total = state.items.len();
            if total == 0 {
                return Err(StoreError::EmptyQueue { queue: name });
            }

            let start = request
                .index_override
                .unwrap_or(if request.reset_cursor { 0 } else { state.cursor });
            if start >= total {
                return Err(StoreError::NoUnreadItems {
                    queue: name,
                    cursor: start,
                    total,
                });
            }

            if request.consume {
                let item = state
                    .items
                    .remove(start)
                    .ok_or(StoreError::NoUnreadItems {
                        queue: name,
                        cursor: start,
                        total,
                    })?;
                // The removal shifts what followed into `start`.
                state.cursor = start;
                (item, start)
            } else {
                let item = state.items[start].clone();
                state.cursor = start + 1;
                (item, start + 1)
            }
        };

        Ok(Dequeued {
            triplet: item
                .triplet
                .delivered(request.placement, &request.active_device),
            cursor,
            stored_at: Some(item.stored_at),
        })
    }

    fn status(&self, queue_name: &str, reset_cursor: bool) -> Result<QueueStatus, StoreError> {
        let name = sanitize_queue_name(queue_name);
        let Some(queue) = self.existing_queue(&name) else {
            return Ok(QueueStatus::new(0, 0));
        };
        let state = lock(&queue.state);
        let cursor = if reset_cursor { 0 } else { state.cursor };
        Ok(QueueStatus::new(state.items.len(), cursor))
    }

    fn reset(&self, queue_name: &str) -> Result<(), StoreError> {
        let name = sanitize_queue_name(queue_name);
        let queue = self.queue(&name);
        lock(&queue.state).cursor = 0;
        Ok(())
    }

    fn list_unread(
        &self,
        queue_name: &str,
        from: Option<usize>,
        max_items: usize,
    ) -> Result<Vec<String>, StoreError> {
        let name = sanitize_queue_name(queue_name);
        let Some(queue) = self.existing_queue(&name) else {
            return Ok(Vec::new());
        };
        let state = lock(&queue.state);
        let start = from.unwrap_or(state.cursor).min(state.items.len());
        let annotations: Vec<(usize, String)> = state
            .items
            .iter()
            .enumerate()
            .skip(start)
            .map(|(index, item)| (index, format!("stored {}", format_stored_at(item.stored_at))))
            .collect();
        Ok(unread_preview(&annotations, max_items))
    }
}
