//! Cache-invalidation fingerprints.
//!
//! Hosts cache node outputs keyed by declared inputs. Loads and picks also
//! depend on state the host cannot see: queue depth and cursor, directory
//! contents and mtimes. Each fingerprint digests exactly that out-of-band
//! state; when the digest changes, a cached result is stale even though
//! the declared inputs are not.

use std::path::Path;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};

use latchq_pick::{Entry, EntryKind, PickError, list_entries};
use latchq_store::{QueueStatus, TripletQueue, sanitize_queue_name};

use crate::ops::{NodeContext, NodeError, PickRequest, StorageBackend, list_request};

/// Deterministic field-by-field digest.
struct FingerprintBuilder {
    hasher: Sha256,
}

impl FingerprintBuilder {
    fn new(kind: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(b"\n");
        Self { hasher }
    }

    fn field(mut self, name: &str, value: &str) -> Self {
        self.hasher.update(name.as_bytes());
        self.hasher.update(b":");
        self.hasher.update(value.as_bytes());
        self.hasher.update(b"\n");
        self
    }

    fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

pub(crate) fn queue_fingerprint(
    storage: StorageBackend,
    queue_name: &str,
    status: &QueueStatus,
) -> String {
    FingerprintBuilder::new("latchq.queue.v1")
        .field("backend", storage.as_str())
        .field("queue", &sanitize_queue_name(queue_name))
        .field("total", &status.total.to_string())
        .field("cursor", &status.cursor.to_string())
        .finish()
}

pub(crate) fn directory_fingerprint(root: &Path, entries: &[Entry]) -> String {
    let mut builder = FingerprintBuilder::new("latchq.pick.v1")
        .field("root", &root.display().to_string());
    for entry in entries {
        let mtime = entry
            .modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos().to_string())
            .unwrap_or_default();
        builder = builder.field(&entry.name, &mtime);
    }
    builder.finish()
}

impl NodeContext {
    /// Fingerprint for load/status nodes: backend, queue identity, depth,
    /// and cursor.
    pub fn queue_fingerprint(
        &self,
        storage: StorageBackend,
        queue_name: &str,
    ) -> Result<String, NodeError> {
        let backend: &dyn TripletQueue<crate::tensor::TensorHandle> = match storage {
            StorageBackend::Memory => self.memory_backend(),
            StorageBackend::Disk => self.disk(),
        };
        let status = backend.status(queue_name, false)?;
        Ok(queue_fingerprint(storage, queue_name, &status))
    }

    /// Fingerprint for pick nodes: the filtered listing's names and
    /// mtimes.
    pub fn pick_fingerprint(
        &self,
        kind: EntryKind,
        request: &PickRequest,
    ) -> Result<String, PickError> {
        let entries = list_entries(&list_request(kind, request))?;
        Ok(directory_fingerprint(&request.root_dir, &entries))
    }
}
