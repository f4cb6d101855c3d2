//! The operations behind each declared node.
//!
//! One [`NodeContext`] is constructed when the pack loads and shared by
//! reference across every invocation; it owns the in-process queue
//! registry, the disk root, and the host-device probe used to resolve
//! `auto` placement. Hosts may call these from any worker thread.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use latchq_pick::{
    EntryKind, ListRequest, OutOfRange, Pick, PickError, SortPolicy, preview_window, resolve,
};
use latchq_store::{
    DequeueRequest, DiskStore, LoadPlacement, MemoryStore, QueueStatus, StoreError,
    StorePlacement, TripletQueue, sanitize_queue_name,
};

use crate::tensor::{TensorHandle, TensorTriplet};

/// Which queue backend an invocation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Disk,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Disk => "disk",
        }
    }
}

/// Failures surfaced to the host as terminal for the invocation.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pick(#[from] PickError),
}

/// Probe returning the host's active compute device.
pub type DeviceProbe = Box<dyn Fn() -> String + Send + Sync>;

/// Shared state behind every node operation.
pub struct NodeContext {
    memory: MemoryStore<TensorHandle>,
    disk: DiskStore,
    device_probe: DeviceProbe,
}

impl NodeContext {
    /// Context with the default host-device probe (always `"cpu"`).
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self::with_device_probe(output_root, Box::new(|| "cpu".to_string()))
    }

    /// Context with a host-supplied probe for `auto` load placement.
    pub fn with_device_probe(output_root: impl Into<PathBuf>, device_probe: DeviceProbe) -> Self {
        Self {
            memory: MemoryStore::new(),
            disk: DiskStore::new(output_root),
            device_probe,
        }
    }

    pub fn disk(&self) -> &DiskStore {
        &self.disk
    }

    pub(crate) fn memory_backend(&self) -> &MemoryStore<TensorHandle> {
        &self.memory
    }

    fn backend(&self, storage: StorageBackend) -> &dyn TripletQueue<TensorHandle> {
        match storage {
            StorageBackend::Memory => &self.memory,
            StorageBackend::Disk => &self.disk,
        }
    }
}

/// Inputs of the save node.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub storage: StorageBackend,
    pub queue_name: String,
    pub store_device: StorePlacement,
    pub triplet: TensorTriplet,
}

/// Save output: the inputs passed through for downstream wiring, plus a
/// status line.
#[derive(Debug, Clone)]
pub struct SaveOutput {
    pub triplet: TensorTriplet,
    pub status: String,
}

/// Inputs of the load node.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub storage: StorageBackend,
    pub queue_name: String,
    pub consume: bool,
    pub reset_cursor: bool,
    /// Explicit read position; negative means unset.
    pub index: i64,
    pub load_device: LoadPlacement,
}

#[derive(Debug, Clone)]
pub struct LoadOutput {
    pub triplet: TensorTriplet,
    pub cursor: usize,
    pub status: String,
}

/// Inputs of the status node.
#[derive(Debug, Clone)]
pub struct StatusRequest {
    pub storage: StorageBackend,
    pub queue_name: String,
    pub reset_cursor: bool,
    pub max_list_items: usize,
}

#[derive(Debug, Clone)]
pub struct StatusOutput {
    pub status: QueueStatus,
    pub lines: Vec<String>,
    pub text: String,
}

/// Inputs shared by both pick nodes.
#[derive(Debug, Clone)]
pub struct PickRequest {
    pub root_dir: PathBuf,
    pub index: i64,
    pub sort: SortPolicy,
    pub on_out_of_range: OutOfRange,
    pub include: Option<String>,
    pub exclude: Option<String>,
    /// Extension allowlist; only meaningful for the file picker.
    pub extensions: Option<String>,
    pub max_list_items: usize,
}

#[derive(Debug, Clone)]
pub struct PickOutput {
    pub pick: Pick,
    pub lines: Vec<String>,
    pub text: String,
}

fn display_stored_at(stored_at: Option<DateTime<Utc>>) -> String {
    match stored_at {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "unknown time".to_string(),
    }
}

impl NodeContext {
    /// Append the triplet to the selected backend's queue.
    ///
    /// Returns the original triplet untouched so graphs can wire through
    /// this node without re-plumbing the payloads.
    pub fn save_triplet(&self, request: SaveRequest) -> Result<SaveOutput, NodeError> {
        let name = sanitize_queue_name(&request.queue_name);
        let backend = self.backend(request.storage);
        backend.enqueue(&name, request.triplet.clone(), request.store_device)?;
        let status = backend.status(&name, false)?;
        Ok(SaveOutput {
            triplet: request.triplet,
            status: format!(
                "queued item {} on '{name}' ({})",
                status.total.saturating_sub(1),
                request.storage.as_str()
            ),
        })
    }

    /// Read one item per the request's cursor controls.
    pub fn load_triplet(&self, request: LoadRequest) -> Result<LoadOutput, NodeError> {
        let name = sanitize_queue_name(&request.queue_name);
        let dequeue = DequeueRequest {
            consume: request.consume,
            reset_cursor: request.reset_cursor,
            index_override: usize::try_from(request.index).ok(),
            placement: request.load_device,
            active_device: (self.device_probe)(),
        };
        let out = self.backend(request.storage).dequeue(&name, &dequeue)?;
        Ok(LoadOutput {
            status: format!(
                "{} item stored {} from '{name}' ({}); cursor {}",
                if request.consume { "consumed" } else { "read" },
                display_stored_at(out.stored_at),
                request.storage.as_str(),
                out.cursor
            ),
            triplet: out.triplet,
            cursor: out.cursor,
        })
    }

    /// Read-only queue counters plus an unread preview.
    pub fn queue_status(&self, request: StatusRequest) -> Result<StatusOutput, NodeError> {
        let name = sanitize_queue_name(&request.queue_name);
        let backend = self.backend(request.storage);
        let status = backend.status(&name, request.reset_cursor)?;
        let from = request.reset_cursor.then_some(0);
        let lines = backend.list_unread(&name, from, request.max_list_items)?;

        let mut text = format!(
            "queue '{name}' ({}): {} total, cursor {}, {} unread",
            request.storage.as_str(),
            status.total,
            status.cursor,
            status.unread
        );
        for line in &lines {
            text.push('\n');
            text.push_str(line);
        }
        Ok(StatusOutput {
            status,
            lines,
            text,
        })
    }

    /// Persistently rewind the queue's cursor to 0.
    pub fn reset_queue(
        &self,
        storage: StorageBackend,
        queue_name: &str,
    ) -> Result<(), NodeError> {
        Ok(self.backend(storage).reset(queue_name)?)
    }

    /// Resolve an indexed pick over subdirectories.
    pub fn pick_subdirectory(&self, request: &PickRequest) -> Result<PickOutput, NodeError> {
        pick(EntryKind::Dirs, request)
    }

    /// Resolve an indexed pick over files, honoring the extension
    /// allowlist.
    pub fn pick_file_by_index(&self, request: &PickRequest) -> Result<PickOutput, NodeError> {
        pick(EntryKind::Files, request)
    }
}

fn non_empty(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn list_request(kind: EntryKind, request: &PickRequest) -> ListRequest {
    ListRequest {
        root: request.root_dir.clone(),
        kind,
        extensions: match kind {
            EntryKind::Files => non_empty(&request.extensions),
            EntryKind::Dirs => None,
        },
        include: non_empty(&request.include),
        exclude: non_empty(&request.exclude),
        sort: request.sort,
    }
}

/// The shared pick path. Called once for the node result and once for the
/// preview side-channel; both see the same snapshot logic, so identical
/// inputs against unchanged directory state produce identical picks.
pub(crate) fn pick(kind: EntryKind, request: &PickRequest) -> Result<PickOutput, NodeError> {
    let resolved = resolve(
        &list_request(kind, request),
        request.index,
        request.on_out_of_range,
    )?;
    let lines = preview_window(
        &resolved.entries,
        resolved.pick.index,
        request.max_list_items,
    );
    let text = format!(
        "picked [{}/{}] {}\n{}",
        resolved.pick.index,
        resolved.pick.total,
        resolved.pick.name,
        lines.join("\n")
    );
    Ok(PickOutput {
        pick: resolved.pick,
        lines,
        text,
    })
}
