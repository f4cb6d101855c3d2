//! Bounded preview windows around a picked entry. Purely presentational.

use crate::listing::Entry;

/// Render at most `max_lines` entries centered on the pick, marking it,
/// with before/after counts when the window cuts the listing.
pub fn preview_window(entries: &[Entry], picked: usize, max_lines: usize) -> Vec<String> {
    let total = entries.len();
    let half = max_lines / 2;
    let start = picked
        .saturating_sub(half)
        .min(total.saturating_sub(max_lines));
    let end = (start + max_lines).min(total);

    let mut lines = Vec::new();
    if start > 0 {
        lines.push(format!("({start} before)"));
    }
    for (index, entry) in entries.iter().enumerate().take(end).skip(start) {
        let marker = if index == picked { '>' } else { ' ' };
        lines.push(format!("{marker} [{index}] {}", entry.name));
    }
    if end < total {
        lines.push(format!("({} after)", total - end));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::UNIX_EPOCH;

    fn entries(count: usize) -> Vec<Entry> {
        (0..count)
            .map(|i| Entry {
                name: format!("item{i}"),
                path: PathBuf::from(format!("/data/item{i}")),
                modified: UNIX_EPOCH,
            })
            .collect()
    }

    #[test]
    fn small_listings_render_whole_with_marker() {
        let lines = preview_window(&entries(3), 1, 10);
        assert_eq!(
            lines,
            vec![
                "  [0] item0".to_string(),
                "> [1] item1".to_string(),
                "  [2] item2".to_string(),
            ]
        );
    }

    #[test]
    fn window_centers_on_the_pick_with_counts() {
        let lines = preview_window(&entries(20), 10, 5);
        assert_eq!(lines.first().expect("before count"), "(8 before)");
        assert_eq!(lines.last().expect("after count"), "(7 after)");
        assert!(lines.contains(&"> [10] item10".to_string()));
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn window_clamps_at_the_listing_edges() {
        let head = preview_window(&entries(10), 0, 4);
        assert_eq!(head.first().expect("first line"), "> [0] item0");
        assert_eq!(head.last().expect("after count"), "(6 after)");

        let tail = preview_window(&entries(10), 9, 4);
        assert_eq!(tail.first().expect("before count"), "(6 before)");
        assert_eq!(tail.last().expect("last line"), "> [9] item9");
    }

    #[test]
    fn zero_budget_renders_only_counts() {
        let lines = preview_window(&entries(5), 2, 0);
        assert_eq!(lines, vec!["(2 before)".to_string(), "(3 after)".to_string()]);
    }
}
