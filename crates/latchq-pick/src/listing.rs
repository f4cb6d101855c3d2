//! Directory snapshots under a filter/sort policy.
//!
//! A listing is recomputed on every call from the directory's current
//! state; nothing is cached or persisted. Two calls against an unchanged
//! directory produce identical snapshots, which is what lets the pick
//! operation and its preview side-channel agree.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PickError;
use crate::natural::natural_cmp;

/// Which directory children are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Dirs,
    Files,
}

/// Ordering applied to the filtered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    Natural,
    Name,
    NameDesc,
    Mtime,
    MtimeDesc,
}

/// One listed child of the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Everything that shapes a listing snapshot.
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub root: PathBuf,
    pub kind: EntryKind,
    /// Comma-separated extension allowlist, case-insensitive, applied only
    /// to files. `"png, .JPG"` and `".png,.jpg"` are equivalent.
    pub extensions: Option<String>,
    /// Names must match to survive, when present.
    pub include: Option<String>,
    /// Matching names are dropped, when present.
    pub exclude: Option<String>,
    pub sort: SortPolicy,
}

impl ListRequest {
    pub fn new(root: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            root: root.into(),
            kind,
            extensions: None,
            include: None,
            exclude: None,
            sort: SortPolicy::Natural,
        }
    }
}

/// Normalize an allowlist string into lowercase dot-prefixed extensions.
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .collect()
}

/// Lowercased final extension of `name`, including the dot.
fn name_extension(name: &str) -> Option<String> {
    let stem_end = name.rfind('.')?;
    if stem_end == 0 {
        // Dotfiles have no extension.
        return None;
    }
    Some(name[stem_end..].to_lowercase())
}

fn compile(pattern: &Option<String>) -> Result<Option<Regex>, PickError> {
    match pattern.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(pattern) => Ok(Some(Regex::new(pattern)?)),
    }
}

/// Take a filtered, sorted snapshot of the root's immediate children.
///
/// Fails with [`PickError::InvalidRoot`] when the root is missing or not
/// a directory, and with [`PickError::NoMatches`] when filtering leaves
/// nothing.
pub fn list_entries(request: &ListRequest) -> Result<Vec<Entry>, PickError> {
    let root: &Path = &request.root;
    if !root.is_dir() {
        return Err(PickError::InvalidRoot(root.display().to_string()));
    }

    let include = compile(&request.include)?;
    let exclude = compile(&request.exclude)?;
    let extensions = request
        .extensions
        .as_deref()
        .map(parse_extensions)
        .filter(|list| !list.is_empty());

    let mut entries = Vec::new();
    let children = fs::read_dir(root).map_err(|e| PickError::io(root, e))?;
    for child in children {
        let child = child.map_err(|e| PickError::io(root, e))?;
        let file_type = child.file_type().map_err(|e| PickError::io(root, e))?;
        let matches_kind = match request.kind {
            EntryKind::Dirs => file_type.is_dir(),
            EntryKind::Files => file_type.is_file(),
        };
        if !matches_kind {
            continue;
        }

        let name = child.file_name().to_string_lossy().into_owned();
        if request.kind == EntryKind::Files
            && let Some(allowed) = &extensions
        {
            match name_extension(&name) {
                Some(ext) if allowed.contains(&ext) => {}
                _ => continue,
            }
        }
        if let Some(include) = &include
            && !include.is_match(&name)
        {
            continue;
        }
        if let Some(exclude) = &exclude
            && exclude.is_match(&name)
        {
            continue;
        }

        let modified = child
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(UNIX_EPOCH);
        entries.push(Entry {
            name,
            path: child.path(),
            modified,
        });
    }

    if entries.is_empty() {
        return Err(PickError::NoMatches {
            root: root.display().to_string(),
        });
    }

    match request.sort {
        SortPolicy::Natural => entries.sort_by(|a, b| natural_cmp(&a.name, &b.name)),
        SortPolicy::Name => entries.sort_by(|a, b| a.name.cmp(&b.name)),
        SortPolicy::NameDesc => entries.sort_by(|a, b| b.name.cmp(&a.name)),
        SortPolicy::Mtime => {
            entries.sort_by(|a, b| (a.modified, &a.name).cmp(&(b.modified, &b.name)))
        }
        SortPolicy::MtimeDesc => {
            entries.sort_by(|a, b| (b.modified, &b.name).cmp(&(a.modified, &a.name)))
        }
    }
    Ok(entries)
}
