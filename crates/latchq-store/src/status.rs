//! Queue status snapshots and unread previews.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read-only counters for one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Items currently in the queue.
    pub total: usize,
    /// Next unread position, clamped to `[0, total]`.
    pub cursor: usize,
    /// `total - cursor`.
    pub unread: usize,
}

impl QueueStatus {
    pub fn new(total: usize, cursor: usize) -> Self {
        let cursor = cursor.min(total);
        Self {
            total,
            cursor,
            unread: total - cursor,
        }
    }

    /// `cursor == total`: every item has been read (possibly zero items).
    pub fn is_drained(&self) -> bool {
        self.cursor == self.total
    }
}

/// Render display-only timestamps in one place so both backends agree.
pub(crate) fn format_stored_at(stored_at: DateTime<Utc>) -> String {
    stored_at.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

/// Build index-tagged preview lines from the unread annotations, truncated
/// at `max_items` with a trailing count of what was cut.
pub(crate) fn unread_preview(annotations: &[(usize, String)], max_items: usize) -> Vec<String> {
    let mut lines: Vec<String> = annotations
        .iter()
        .take(max_items)
        .map(|(index, note)| format!("[{index}] {note}"))
        .collect();
    if annotations.len() > max_items {
        lines.push(format!("… and {} more", annotations.len() - max_items));
    }
    lines
}
