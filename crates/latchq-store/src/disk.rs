//! Disk queue backend.
//!
//! Layout per sanitized queue name, under the externally supplied output
//! root:
//!
//! ```text
//! <output_root>/save_load_lat_cond/<queue_name>/
//!   <ns_timestamp>_<pid>.json   one serialized triplet per item
//!   .cursor                     empty | decimal next index | filename marker
//! ```
//!
//! Filenames sort lexicographically in creation order for any correctly
//! functioning clock, so a plain sorted directory listing is the canonical
//! queue order. Queue directories are created lazily and never removed.
//!
//! There is no cross-process lock. Concurrent enqueues from two processes
//! cannot collide on filenames (the pid differs), but two processes racing
//! a dequeue against the same item can both read it before one deletes it.
//! That is an accepted limitation of the layout, not corrected here.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cursor::{encode_cursor, resolve_next_index};
use crate::error::StoreError;
use crate::name::sanitize_queue_name;
use crate::status::{QueueStatus, format_stored_at, unread_preview};
use crate::triplet::{StorePlacement, Triplet};
use crate::value::Relocatable;
use crate::{Dequeued, DequeueRequest, TripletQueue};

/// Subdirectory of the output root holding all disk queues.
pub const DISK_SUBDIR: &str = "save_load_lat_cond";

/// Item file extension. Only files with this suffix count as queue items.
pub const ITEM_EXT: &str = ".json";

/// Cursor filename inside a queue directory.
pub const CURSOR_FILENAME: &str = ".cursor";

/// Disk-backed triplet queues rooted at one output directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.root
    }

    /// Directory for `queue_name` (sanitized). Not created.
    pub fn queue_dir(&self, queue_name: &str) -> PathBuf {
        self.root
            .join(DISK_SUBDIR)
            .join(sanitize_queue_name(queue_name))
    }

    fn ensure_queue_dir(&self, queue_name: &str) -> Result<PathBuf, StoreError> {
        let dir = self.queue_dir(queue_name);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(dir)
    }

    /// Item filenames in canonical queue order.
    fn sorted_item_names(dir: &Path) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // A queue never enqueued to has no directory; treat as empty.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(StoreError::io(dir, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(ITEM_EXT) {
                names.push(name);
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    fn cursor_path(dir: &Path) -> PathBuf {
        dir.join(CURSOR_FILENAME)
    }

    /// Stored cursor string; absent file reads as empty.
    fn read_cursor(dir: &Path) -> Result<String, StoreError> {
        let path = Self::cursor_path(dir);
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    fn write_cursor(dir: &Path, next_index: usize) -> Result<(), StoreError> {
        let path = Self::cursor_path(dir);
        fs::write(&path, encode_cursor(next_index)).map_err(|e| StoreError::io(&path, e))
    }

    /// Fresh item filename: nanosecond wall clock plus pid, so concurrent
    /// processes cannot collide and later names sort after earlier ones.
    fn next_item_name() -> String {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        format!("{stamp}_{}{ITEM_EXT}", std::process::id())
    }

    /// Creation timestamp recovered from an item filename, if it still
    /// carries the standard nanosecond prefix. Display only.
    pub fn item_timestamp(name: &str) -> Option<DateTime<Utc>> {
        let stem = name.strip_suffix(ITEM_EXT)?;
        let (stamp, _pid) = stem.split_once('_')?;
        let nanos: i64 = stamp.parse().ok()?;
        Some(DateTime::from_timestamp_nanos(nanos))
    }
}

impl<L> TripletQueue<L> for DiskStore
where
    L: Relocatable + Serialize + DeserializeOwned,
{
    fn enqueue(
        &self,
        queue_name: &str,
        triplet: Triplet<L>,
        _placement: StorePlacement,
    ) -> Result<(), StoreError> {
        // Accelerator-resident handles cannot be durably serialized, so
        // disk storage always relocates to the host first, whatever the
        // requested placement.
        let payload = triplet.to_host();
        let encoded =
            serde_json::to_vec(&payload).map_err(|e| StoreError::Serialize(e.to_string()))?;

        let dir = self.ensure_queue_dir(queue_name)?;
        let path = dir.join(Self::next_item_name());
        fs::write(&path, encoded).map_err(|e| StoreError::io(&path, e))
    }

    fn dequeue(
        &self,
        queue_name: &str,
        request: &DequeueRequest,
    ) -> Result<Dequeued<L>, StoreError> {
        let name = sanitize_queue_name(queue_name);
        let dir = self.ensure_queue_dir(&name)?;
        let names = Self::sorted_item_names(&dir)?;
        let total = names.len();
        if total == 0 {
            return Err(StoreError::EmptyQueue { queue: name });
        }

        let start = match request.index_override {
            Some(index) => index,
            None if request.reset_cursor => 0,
            None => resolve_next_index(&names, &Self::read_cursor(&dir)?),
        };
        if start >= total {
            return Err(StoreError::NoUnreadItems {
                queue: name,
                cursor: start,
                total,
            });
        }

        let item_path = dir.join(&names[start]);
        let bytes = fs::read(&item_path).map_err(|e| StoreError::io(&item_path, e))?;
        let triplet: Triplet<L> =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::parse(&item_path, e))?;

        // State changes only after the read succeeded: first the cursor,
        // then the consumed item file.
        let cursor = if request.consume { start } else { start + 1 };
        Self::write_cursor(&dir, cursor)?;
        if request.consume {
            match fs::remove_file(&item_path) {
                Ok(()) => {}
                // Another process consumed it first; the read already
                // succeeded, so the delete is idempotent.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(&item_path, e)),
            }
        }

        Ok(Dequeued {
            triplet: triplet.delivered(request.placement, &request.active_device),
            cursor,
            stored_at: Self::item_timestamp(&names[start]),
        })
    }

    fn status(&self, queue_name: &str, reset_cursor: bool) -> Result<QueueStatus, StoreError> {
        let dir = self.queue_dir(queue_name);
        let names = Self::sorted_item_names(&dir)?;
        let cursor = if reset_cursor {
            0
        } else {
            resolve_next_index(&names, &Self::read_cursor(&dir)?)
        };
        Ok(QueueStatus::new(names.len(), cursor))
    }

    fn reset(&self, queue_name: &str) -> Result<(), StoreError> {
        let dir = self.ensure_queue_dir(queue_name)?;
        Self::write_cursor(&dir, 0)
    }

    fn list_unread(
        &self,
        queue_name: &str,
        from: Option<usize>,
        max_items: usize,
    ) -> Result<Vec<String>, StoreError> {
        let dir = self.queue_dir(queue_name);
        let names = Self::sorted_item_names(&dir)?;
        let start = match from {
            Some(index) => index.min(names.len()),
            None => resolve_next_index(&names, &Self::read_cursor(&dir)?),
        };
        let annotations: Vec<(usize, String)> = names
            .iter()
            .enumerate()
            .skip(start)
            .map(|(index, name)| {
                let note = match Self::item_timestamp(name) {
                    Some(stored_at) => {
                        format!("{name} (stored {})", format_stored_at(stored_at))
                    }
                    None => name.clone(),
                };
                (index, note)
            })
            .collect();
        Ok(unread_preview(&annotations, max_items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triplet::LoadPlacement;
    use crate::value::ValueTree;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Leaf {
        tag: u32,
        device: String,
        #[serde(default)]
        detached: bool,
    }

    impl Relocatable for Leaf {
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

    fn triplet(tag: u32) -> Triplet<Leaf> {
        let leaf = |tag| {
            ValueTree::Leaf(Leaf {
                tag,
                device: "cuda:0".to_string(),
                detached: false,
            })
        };
        Triplet::new(leaf(tag), leaf(tag + 1000), leaf(tag + 2000))
    }

    fn tag_of(tree: &ValueTree<Leaf>) -> u32 {
        match tree {
            ValueTree::Leaf(leaf) => leaf.tag,
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    fn temp_store(prefix: &str) -> DiskStore {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!(
            "latchq-disk-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("temp root should be created");
        DiskStore::new(root)
    }

    fn request() -> DequeueRequest {
        DequeueRequest {
            active_device: "cuda:0".to_string(),
            ..DequeueRequest::default()
        }
    }

    #[test]
    fn dequeue_on_empty_directory_reports_empty_not_unread() {
        let store = temp_store("empty");
        let err = <DiskStore as TripletQueue<Leaf>>::dequeue(&store, "nothing", &request())
            .expect_err("empty queue must fail");
        assert!(matches!(err, StoreError::EmptyQueue { queue } if queue == "nothing"));
    }

    #[test]
    fn round_trip_relocates_to_host_on_store() {
        let store = temp_store("rt");
        store
            .enqueue("rt", triplet(5), StorePlacement::Keep)
            .expect("enqueue should succeed");

        let dir = store.queue_dir("rt");
        let names = DiskStore::sorted_item_names(&dir).expect("listing should succeed");
        assert_eq!(names.len(), 1);
        let raw = fs::read_to_string(dir.join(&names[0])).expect("item file should read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("item should be json");
        assert!(value.get("latent").is_some());
        assert!(value.get("positive").is_some());
        assert!(value.get("negative").is_some());

        let out: Dequeued<Leaf> = store
            .dequeue(
                "rt",
                &DequeueRequest {
                    placement: LoadPlacement::Cpu,
                    ..request()
                },
            )
            .expect("dequeue should succeed");
        assert_eq!(tag_of(&out.triplet.latent), 5);
        assert!(out.stored_at.is_some());
        match &out.triplet.latent {
            ValueTree::Leaf(leaf) => assert_eq!(leaf.device, "cpu"),
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn consuming_dequeues_preserve_fifo_order_and_drain() {
        let store = temp_store("fifo");
        for tag in 0..4 {
            store
                .enqueue("fifo", triplet(tag), StorePlacement::Cpu)
                .expect("enqueue should succeed");
            // Distinct nanosecond stamps keep filename order unambiguous.
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        for tag in 0..4 {
            let out: Dequeued<Leaf> = store
                .dequeue("fifo", &request())
                .expect("dequeue should succeed");
            assert_eq!(tag_of(&out.triplet.latent), tag);
            assert_eq!(out.cursor, 0);
        }
        let err = <DiskStore as TripletQueue<Leaf>>::dequeue(&store, "fifo", &request())
            .expect_err("drained queue must fail");
        assert!(matches!(err, StoreError::EmptyQueue { .. }));
    }

    #[test]
    fn non_consuming_walk_persists_the_cursor_across_stores() {
        let store = temp_store("walk");
        for tag in 0..3 {
            store
                .enqueue("walk", triplet(tag), StorePlacement::Cpu)
                .expect("enqueue should succeed");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let read = DequeueRequest {
            consume: false,
            ..request()
        };
        for tag in 0..3 {
            // A fresh handle each pass: progress lives on disk, not in the
            // store value.
            let reopened = DiskStore::new(store.output_root().to_path_buf());
            let out: Dequeued<Leaf> = reopened
                .dequeue("walk", &read)
                .expect("dequeue should succeed");
            assert_eq!(tag_of(&out.triplet.latent), tag);
        }
        let err = <DiskStore as TripletQueue<Leaf>>::dequeue(&store, "walk", &read)
            .expect_err("fourth read must fail");
        assert!(matches!(
            err,
            StoreError::NoUnreadItems { cursor: 3, total: 3, .. }
        ));

        let reset_read = DequeueRequest {
            reset_cursor: true,
            consume: false,
            ..request()
        };
        let again: Dequeued<Leaf> = store
            .dequeue("walk", &reset_read)
            .expect("reset read should succeed");
        assert_eq!(tag_of(&again.triplet.latent), 0);
    }

    #[test]
    fn cursor_file_uses_numeric_encoding() {
        let store = temp_store("numeric");
        store
            .enqueue("numeric", triplet(0), StorePlacement::Cpu)
            .expect("enqueue should succeed");
        let _: Dequeued<Leaf> = store
            .dequeue(
                "numeric",
                &DequeueRequest {
                    consume: false,
                    ..request()
                },
            )
            .expect("dequeue should succeed");

        let cursor = fs::read_to_string(store.queue_dir("numeric").join(CURSOR_FILENAME))
            .expect("cursor file should exist");
        assert_eq!(cursor, "1");
    }

    #[test]
    fn legacy_filename_marker_resumes_after_the_marked_item() {
        let store = temp_store("marker");
        for tag in 0..3 {
            store
                .enqueue("marker", triplet(tag), StorePlacement::Cpu)
                .expect("enqueue should succeed");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let dir = store.queue_dir("marker");
        let names = DiskStore::sorted_item_names(&dir).expect("listing should succeed");
        fs::write(dir.join(CURSOR_FILENAME), &names[1]).expect("marker should write");

        let out: Dequeued<Leaf> = store
            .dequeue(
                "marker",
                &DequeueRequest {
                    consume: false,
                    ..request()
                },
            )
            .expect("dequeue should succeed");
        assert_eq!(tag_of(&out.triplet.latent), 2);
    }

    #[test]
    fn status_counts_and_interprets_reset_without_persisting() {
        let store = temp_store("status");
        for tag in 0..3 {
            store
                .enqueue("status", triplet(tag), StorePlacement::Cpu)
                .expect("enqueue should succeed");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let _: Dequeued<Leaf> = store
            .dequeue(
                "status",
                &DequeueRequest {
                    consume: false,
                    ..request()
                },
            )
            .expect("dequeue should succeed");

        let status = <DiskStore as TripletQueue<Leaf>>::status(&store, "status", false)
            .expect("status should succeed");
        assert_eq!((status.total, status.cursor, status.unread), (3, 1, 2));

        let interpreted = <DiskStore as TripletQueue<Leaf>>::status(&store, "status", true)
            .expect("status should succeed");
        assert_eq!(interpreted.cursor, 0);

        let stored = <DiskStore as TripletQueue<Leaf>>::status(&store, "status", false)
            .expect("status should succeed");
        assert_eq!(stored.cursor, 1, "reset interpretation must not persist");

        <DiskStore as TripletQueue<Leaf>>::reset(&store, "status").expect("reset should succeed");
        let after = <DiskStore as TripletQueue<Leaf>>::status(&store, "status", false)
            .expect("status should succeed");
        assert_eq!(after.cursor, 0);
    }

    #[test]
    fn status_of_missing_queue_is_empty() {
        let store = temp_store("missing");
        let status = <DiskStore as TripletQueue<Leaf>>::status(&store, "never-touched", false)
            .expect("status should succeed");
        assert_eq!((status.total, status.cursor, status.unread), (0, 0, 0));
    }

    #[test]
    fn list_unread_annotates_filenames_with_timestamps() {
        let store = temp_store("list");
        for tag in 0..3 {
            store
                .enqueue("list", triplet(tag), StorePlacement::Cpu)
                .expect("enqueue should succeed");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let lines = <DiskStore as TripletQueue<Leaf>>::list_unread(&store, "list", None, 2)
            .expect("listing should succeed");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[0] "));
        assert!(lines[0].contains("(stored "));
        assert_eq!(lines[2], "… and 1 more");
    }

    #[test]
    fn explicit_index_overrides_and_updates_the_stored_cursor() {
        let store = temp_store("override");
        for tag in 0..4 {
            store
                .enqueue("override", triplet(tag), StorePlacement::Cpu)
                .expect("enqueue should succeed");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let out: Dequeued<Leaf> = store
            .dequeue(
                "override",
                &DequeueRequest {
                    consume: false,
                    reset_cursor: true,
                    index_override: Some(2),
                    ..request()
                },
            )
            .expect("dequeue should succeed");
        assert_eq!(tag_of(&out.triplet.latent), 2);
        assert_eq!(out.cursor, 3);

        let status = <DiskStore as TripletQueue<Leaf>>::status(&store, "override", false)
            .expect("status should succeed");
        assert_eq!(status.cursor, 3);
    }

    #[test]
    fn consume_in_the_middle_leaves_earlier_items_alone() {
        let store = temp_store("middle");
        for tag in 0..3 {
            store
                .enqueue("middle", triplet(tag), StorePlacement::Cpu)
                .expect("enqueue should succeed");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let out: Dequeued<Leaf> = store
            .dequeue(
                "middle",
                &DequeueRequest {
                    index_override: Some(1),
                    ..request()
                },
            )
            .expect("dequeue should succeed");
        assert_eq!(tag_of(&out.triplet.latent), 1);
        assert_eq!(out.cursor, 1);

        let names = DiskStore::sorted_item_names(&store.queue_dir("middle"))
            .expect("listing should succeed");
        assert_eq!(names.len(), 2);

        // The numeric cursor now points at what was item 2.
        let next: Dequeued<Leaf> = store
            .dequeue(
                "middle",
                &DequeueRequest {
                    consume: false,
                    ..request()
                },
            )
            .expect("dequeue should succeed");
        assert_eq!(tag_of(&next.triplet.latent), 2);
    }

    #[test]
    fn scalar_only_payloads_round_trip_through_json() {
        let store = temp_store("scalar");
        let payload: Triplet<Leaf> = Triplet::new(
            ValueTree::Map(
                [("samples".to_string(), ValueTree::Scalar(json!([0.0, 0.5])))]
                    .into_iter()
                    .collect(),
            ),
            ValueTree::Scalar(json!("positive")),
            ValueTree::Scalar(json!("negative")),
        );
        store
            .enqueue("scalar", payload.clone(), StorePlacement::Cpu)
            .expect("enqueue should succeed");
        let out: Dequeued<Leaf> = store
            .dequeue("scalar", &request())
            .expect("dequeue should succeed");
        assert_eq!(out.triplet, payload);
    }

    #[test]
    fn item_timestamp_recovers_the_nanosecond_prefix() {
        let stamp = DiskStore::item_timestamp("1700000000000000000_42.json")
            .expect("standard name should decode");
        assert_eq!(stamp.timestamp(), 1_700_000_000);
        assert!(DiskStore::item_timestamp("notastamp.json").is_none());
        assert!(DiskStore::item_timestamp("123_1.other").is_none());
    }
}
