// src/parser/segment.rs

//! Splits a bulletin into its in-force list and its corrections region.

use std::ops::Range;

use super::text::{find_headers, lines_with_offsets};

/// Share of the text after which end-of-corrections markers are searched.
const END_MARKER_FROM: f64 = 0.7;

/// Region boundaries of one bulletin text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub in_force: Range<usize>,
    pub corrections: Range<usize>,
    /// `false` when no notice header was found and both regions fell back
    /// to the whole text
    pub boundary_found: bool,
}

impl Segmentation {
    pub fn in_force_text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.in_force.clone()]
    }

    pub fn corrections_text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.corrections.clone()]
    }
}

/// A line that starts a section after the corrections.
///
/// `A0896 ...` opens the list of lights, `NP3 Africa Pilot` the separate
/// publications.
fn is_end_marker(line: &str) -> bool {
    let bytes = line.as_bytes();
    let lights = bytes.len() >= 5
        && bytes[0].is_ascii_uppercase()
        && bytes[1..5].iter().all(u8::is_ascii_digit);
    if lights {
        return true;
    }
    if let Some(rest) = line.strip_prefix("NP") {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        return digits > 0 && rest[digits..].chars().next().is_none_or(char::is_whitespace);
    }
    false
}

/// Locate the in-force and corrections regions of a bulletin text.
pub fn segment(text: &str) -> Segmentation {
    // Pass one: boundary positions only.
    let Some(start) = find_headers(text).first().map(|h| h.offset) else {
        log::warn!("No notice header found; scanning the whole text");
        return Segmentation {
            in_force: 0..text.len(),
            corrections: 0..text.len(),
            boundary_found: false,
        };
    };

    let mid = (text.len() as f64 * END_MARKER_FROM) as usize;
    let end = lines_with_offsets(text)
        .filter(|(offset, _)| *offset > mid && *offset > start)
        .find(|(_, line)| is_end_marker(line))
        .map_or(text.len(), |(offset, _)| offset);

    // Pass two: slice.
    Segmentation {
        in_force: 0..start,
        corrections: start..end,
        boundary_found: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(lines: usize) -> String {
        (0..lines).map(|i| format!("body line {i}\n")).collect()
    }

    #[test]
    fn test_skips_index_entries() {
        let text = format!(
            "II  Index\n759*2.8         1, 2\n770*2.9    3\n770    ENGLAND - East Coast\nChart 1491\n{}",
            filler(3)
        );
        let seg = segment(&text);
        assert!(seg.boundary_found);
        assert!(seg.corrections_text(&text).starts_with("770    ENGLAND"));
        assert!(seg.in_force_text(&text).contains("759*2.8"));
    }

    #[test]
    fn test_ends_at_lights_marker_after_seventy_percent() {
        let text = format!(
            "770    ENGLAND - East Coast\nChart 1491\n{}A0896 Light list\n",
            filler(20)
        );
        let seg = segment(&text);
        let corrections = seg.corrections_text(&text);
        assert!(!corrections.contains("A0896"));
        assert!(corrections.contains("body line 19"));
    }

    #[test]
    fn test_early_marker_is_ignored() {
        let text = format!(
            "770    ENGLAND - East Coast\nB1234 early\n{}",
            filler(40)
        );
        let seg = segment(&text);
        assert_eq!(seg.corrections.end, text.len());
    }

    #[test]
    fn test_publications_marker() {
        let text = format!(
            "770    ENGLAND - East Coast\n{}NP3 Africa Pilot\nmore\n",
            filler(20)
        );
        let seg = segment(&text);
        assert!(!seg.corrections_text(&text).contains("NP3"));
    }

    #[test]
    fn test_no_header_degrades_to_whole_text() {
        let text = "nothing that looks like a notice\n";
        let seg = segment(text);
        assert!(!seg.boundary_found);
        assert_eq!(seg.corrections, 0..text.len());
        assert_eq!(seg.in_force, 0..text.len());
    }

    #[test]
    fn test_end_marker_shapes() {
        assert!(is_end_marker("A0896 Something"));
        assert!(is_end_marker("NP3 Africa Pilot"));
        assert!(is_end_marker("NP120"));
        assert!(!is_end_marker("NPX"));
        assert!(!is_end_marker("A089"));
        assert!(!is_end_marker("a0896"));
    }
}
