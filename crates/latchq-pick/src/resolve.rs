//! Index resolution over a listing snapshot.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PickError;
use crate::listing::{Entry, EntryKind, ListRequest, list_entries};

/// What happens when the requested index misses `[0, total-1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// Euclidean modulo over the total.
    Wrap,
    /// Clamp to the nearest bound.
    Clamp,
    /// Fail with [`PickError::IndexOutOfRange`].
    Error,
}

/// A resolved pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub path: PathBuf,
    pub name: String,
    /// Name with the final extension stripped; equals `name` for
    /// directories.
    pub stem: String,
    /// The index actually used after the out-of-range policy.
    pub index: usize,
    pub total: usize,
}

/// Map a possibly out-of-range index onto `[0, total-1]` per `policy`.
///
/// `total` must be nonzero; listings are rejected as `NoMatches` before
/// this point.
pub fn resolve_index(index: i64, total: usize, policy: OutOfRange) -> Result<usize, PickError> {
    let bound = total as i64;
    if (0..bound).contains(&index) {
        return Ok(index as usize);
    }
    match policy {
        OutOfRange::Wrap => Ok(index.rem_euclid(bound) as usize),
        OutOfRange::Clamp => Ok(if index < 0 { 0 } else { total - 1 }),
        OutOfRange::Error => Err(PickError::IndexOutOfRange { index, total }),
    }
}

fn stem_of(name: &str, kind: EntryKind) -> String {
    match kind {
        EntryKind::Dirs => name.to_string(),
        EntryKind::Files => Path::new(name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string()),
    }
}

/// A pick together with the snapshot it was resolved against, so previews
/// render from the same listing and cannot disagree with the result.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub pick: Pick,
    pub entries: Vec<Entry>,
}

/// List, filter, sort, and resolve one index in a single deterministic
/// step.
pub fn resolve(
    request: &ListRequest,
    index: i64,
    policy: OutOfRange,
) -> Result<Resolved, PickError> {
    let entries = list_entries(request)?;
    let effective = resolve_index(index, entries.len(), policy)?;
    let entry = &entries[effective];
    let pick = Pick {
        path: entry.path.clone(),
        name: entry.name.clone(),
        stem: stem_of(&entry.name, request.kind),
        index: effective,
        total: entries.len(),
    };
    Ok(Resolved { pick, entries })
}
