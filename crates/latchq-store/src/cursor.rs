//! Disk cursor decoding and encoding.
//!
//! The cursor file under a queue directory holds one of three states:
//! absent or empty (nothing read yet), a decimal integer (the next unread
//! index), or the filename of the last item read. The filename form is
//! legacy: older deployments recorded resumption by marker filename. Both
//! decodings stay supported against the same on-disk state, but every
//! cursor latchq writes uses the numeric form.

/// Resolve the next unread index against lexicographically sorted item
/// filenames.
///
/// Numeric cursors are taken directly, clamped to `[0, total]`. A filename
/// marker resolves to one past its match; if the marker file was consumed
/// by another process, to the position of the first filename sorting
/// strictly after it; if it sorts after everything, to `total`.
pub fn resolve_next_index(sorted_names: &[String], cursor: &str) -> usize {
    let cursor = cursor.trim();
    if cursor.is_empty() {
        return 0;
    }
    if cursor.bytes().all(|b| b.is_ascii_digit()) {
        let index: usize = cursor.parse().unwrap_or(usize::MAX);
        return index.min(sorted_names.len());
    }
    for (position, name) in sorted_names.iter().enumerate() {
        match name.as_str().cmp(cursor) {
            std::cmp::Ordering::Equal => return position + 1,
            std::cmp::Ordering::Greater => return position,
            std::cmp::Ordering::Less => {}
        }
    }
    sorted_names.len()
}

/// Encode a cursor for persistence. Always the numeric form.
pub fn encode_cursor(next_index: usize) -> String {
    next_index.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_cursor_means_nothing_read() {
        assert_eq!(resolve_next_index(&names(&["1_1.json"]), ""), 0);
        assert_eq!(resolve_next_index(&names(&["1_1.json"]), "  \n"), 0);
        assert_eq!(resolve_next_index(&[], ""), 0);
    }

    #[test]
    fn numeric_cursor_bypasses_name_matching() {
        let items = names(&["1_1.json", "2_1.json", "3_1.json"]);
        assert_eq!(resolve_next_index(&items, "1"), 1);
        assert_eq!(resolve_next_index(&items, "0"), 0);
        assert_eq!(resolve_next_index(&items, "3"), 3);
    }

    #[test]
    fn numeric_cursor_clamps_to_total() {
        let items = names(&["1_1.json", "2_1.json"]);
        assert_eq!(resolve_next_index(&items, "99"), 2);
        assert_eq!(
            resolve_next_index(&items, "99999999999999999999999999999"),
            2
        );
    }

    #[test]
    fn marker_resolves_to_one_past_match() {
        let items = names(&["1_1.json", "2_1.json", "3_1.json"]);
        assert_eq!(resolve_next_index(&items, "2_1.json"), 2);
        assert_eq!(resolve_next_index(&items, "3_1.json"), 3);
    }

    #[test]
    fn deleted_marker_resolves_to_first_later_name() {
        // 2_1.json was consumed by another process; the marker still points
        // between 1 and 3.
        let items = names(&["1_1.json", "3_1.json"]);
        assert_eq!(resolve_next_index(&items, "2_1.json"), 1);
    }

    #[test]
    fn marker_past_everything_means_fully_drained() {
        let items = names(&["1_1.json", "2_1.json"]);
        assert_eq!(resolve_next_index(&items, "9_9.json"), 2);
    }

    #[test]
    fn encode_is_numeric_and_round_trips() {
        let items = names(&["1_1.json", "2_1.json", "3_1.json"]);
        for next in 0..=3 {
            assert_eq!(resolve_next_index(&items, &encode_cursor(next)), next);
        }
    }
}
