// src/parser/split.rs

//! Notice splitting and page-break continuation merging.

use std::collections::HashMap;

use super::text::find_headers;
use crate::models::{DocumentKind, Notice};

/// Split a corrections region into logical notices.
///
/// Each header starts a block that runs to the next header. A notice that
/// the publisher repeated across a page break shows up as a second block
/// with the same base number; such blocks are appended to the first block
/// with that number, so every base number yields exactly one notice.
pub fn split_notices(region: &str, source: DocumentKind) -> Vec<Notice> {
    let headers = find_headers(region);

    let mut notices: Vec<Notice> = Vec::new();
    let mut by_base: HashMap<u32, usize> = HashMap::new();

    for (i, header) in headers.iter().enumerate() {
        let end = headers.get(i + 1).map_or(region.len(), |next| next.offset);
        let block = &region[header.offset..end];

        if let Some(&idx) = by_base.get(&header.nm.base) {
            let merged = &mut notices[idx];
            if !merged.raw_text.ends_with('\n') {
                merged.raw_text.push('\n');
            }
            merged.raw_text.push_str(block);
            merged.is_new |= header.nm.is_new;
            continue;
        }

        by_base.insert(header.nm.base, notices.len());
        notices.push(Notice {
            nm_number: header.nm.printed.clone(),
            base_number: header.nm.base,
            is_new: header.nm.is_new,
            tp_kind: header.nm.tp_kind,
            raw_text: block.to_string(),
            source,
        });
    }

    log::debug!(
        "Split {} header blocks into {} notices",
        headers.len(),
        notices.len()
    );
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_headers() {
        let region = "770    ENGLAND - East Coast\nChart 1491\n771    WALES - South\nChart 2052\n";
        let notices = split_notices(region, DocumentKind::SectionII);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].nm_number, "770");
        assert!(notices[0].raw_text.contains("Chart 1491"));
        assert!(!notices[0].raw_text.contains("771"));
        assert_eq!(notices[1].base_number, 771);
    }

    #[test]
    fn test_merges_page_break_continuation() {
        let region = "770*   ENGLAND - East Coast\nChart 1491\nWk08/26\nII\n2.40\n770    ENGLAND - East Coast (continued)\nChart 2052\n771    WALES - South\n";
        let notices = split_notices(region, DocumentKind::SectionII);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].nm_number, "770");
        assert!(notices[0].is_new);
        assert!(notices[0].raw_text.contains("Chart 1491"));
        assert!(notices[0].raw_text.contains("Chart 2052"));
    }

    #[test]
    fn test_tp_suffix_kept_on_number() {
        let region = "762(T)/26     WALES - Milford Haven\nCharts affected - 3274\n";
        let notices = split_notices(region, DocumentKind::SectionII);
        assert_eq!(notices[0].nm_number, "762(T)/26");
        assert!(notices[0].is_tp());
    }

    #[test]
    fn test_no_headers_no_notices() {
        assert!(split_notices("just text\n", DocumentKind::WeeklyBulletin).is_empty());
    }
}
