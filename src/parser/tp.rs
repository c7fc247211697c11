// src/parser/tp.rs

//! Temporary and Preliminary notice parsers.
//!
//! Two views of T&P notices exist in a week's documents: the in-force list
//! at the front of the weekly bulletin (one dotted row per notice) and the
//! full text of T&P notices issued this week among the corrections.

use super::text::{affected_charts, parse_chart_list, parse_header_line, parse_nm_token};
use crate::models::{ChartMap, Folio, InForceList, Notice, TpEntry, empty_chart_map};

/// Dots separating the chart list from the subject.
const LIST_LEADER: &str = "...";
/// Dots closing the subject.
const SUBJECT_LEADER: &str = "..";

/// One parsed in-force row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InForceRow {
    nm_number: String,
    charts: Vec<u32>,
    subject: String,
    /// Byte offset just past the row
    end: usize,
}

fn is_list_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_alphabetic() || c.is_whitespace() || c == ',' || c == '_'
}

fn is_subject_char(c: char) -> bool {
    c.is_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '_' | ',' | ';' | ':' | '(' | ')' | '-' | '&' | '\'' | '/')
}

/// Read one row starting at `start`, which must hold a T/P notice number.
///
/// Row shape: `4697(T)/25   1491,  2693.......... ENGLAND, East Coast: Buoyage....`
fn read_row(region: &str, start: usize) -> Option<InForceRow> {
    let nm = parse_nm_token(&region[start..])?;
    nm.tp_kind?;

    let mut pos = start + nm.len;
    let gap = region[pos..]
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum::<usize>();
    if gap == 0 {
        return None;
    }
    pos += gap;

    // Chart list, up to the first run of three dots.
    let list_start = pos;
    loop {
        if region[pos..].starts_with(LIST_LEADER) {
            break;
        }
        let c = region[pos..].chars().next()?;
        if !is_list_char(c) {
            return None;
        }
        pos += c.len_utf8();
    }
    let list = &region[list_start..pos];
    if list.trim().is_empty() {
        return None;
    }

    pos += region[pos..].bytes().take_while(|b| *b == b'.').count();
    pos += region[pos..]
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum::<usize>();

    // Subject: an uppercase start, then up to the next run of two dots.
    let subject_start = pos;
    if !region[pos..].starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    loop {
        if region[pos..].starts_with(SUBJECT_LEADER) {
            break;
        }
        let c = region[pos..].chars().next()?;
        if !is_subject_char(c) {
            return None;
        }
        pos += c.len_utf8();
    }
    let subject = region[subject_start..pos].trim().to_string();
    pos += region[pos..].bytes().take_while(|b| *b == b'.').count();

    Some(InForceRow {
        nm_number: nm.printed,
        charts: parse_chart_list(list),
        subject,
        end: pos,
    })
}

/// Every in-force row in a region, in order.
fn in_force_rows(region: &str) -> Vec<InForceRow> {
    let bytes = region.as_bytes();
    let mut rows = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let starts_number = bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_digit());
        if starts_number {
            if let Some(row) = read_row(region, i) {
                i = row.end;
                rows.push(row);
                continue;
            }
        }
        i += 1;
    }
    rows
}

/// Add an entry under every folio chart it affects, once per notice number.
fn file_entry(map: &mut ChartMap<TpEntry>, folio: &Folio, entry: &TpEntry) {
    for chart in &entry.affected_charts {
        if !folio.contains(*chart) {
            continue;
        }
        let list = map.entry(*chart).or_default();
        if !list.iter().any(|t| t.nm_number == entry.nm_number) {
            list.push(entry.clone());
        }
    }
}

/// Parse the T&P in-force list for a folio.
///
/// A region without a single row means the list is not published in this
/// document: `available` is `false` and no entries are returned.
pub fn parse_in_force(region: &str, folio: &Folio) -> InForceList {
    let rows = in_force_rows(region);
    let mut entries = empty_chart_map(folio);

    for row in &rows {
        let entry = TpEntry {
            nm_number: row.nm_number.clone(),
            affected_charts: row.charts.clone(),
            subject: row.subject.clone(),
        };
        file_entry(&mut entries, folio, &entry);
    }

    log::debug!("Parsed {} in-force T&P rows", rows.len());
    InForceList {
        available: !rows.is_empty(),
        entries,
    }
}

/// The first `limit` characters of `text`.
fn head_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collect T&P notices issued this week that affect folio charts.
///
/// Only the first `lookahead` characters of each notice are searched for
/// its `Charts affected` list.
pub fn parse_new_tp(notices: &[Notice], folio: &Folio, lookahead: usize) -> ChartMap<TpEntry> {
    let mut entries = empty_chart_map(folio);

    for notice in notices.iter().filter(|n| n.is_tp()) {
        let window = head_chars(&notice.raw_text, lookahead);
        let Some(charts) = affected_charts(window) else {
            continue;
        };

        let first_line = notice.header_line();
        let subject = parse_header_line(first_line)
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_else(|| first_line.trim().to_string());

        let entry = TpEntry {
            nm_number: notice.nm_number.clone(),
            affected_charts: charts,
            subject,
        };
        file_entry(&mut entries, folio, &entry);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentKind, TpKind};
    use crate::parser::split::split_notices;

    fn folio(charts: &[u32]) -> Folio {
        Folio::from_charts(charts.iter().copied(), 50).unwrap()
    }

    #[test]
    fn test_in_force_rows() {
        let region = "T&P NOTICES IN FORCE\n4697(T)/25   1491,  2693.......... ENGLAND, East Coast: Buoyage.....\n5012(P)/25   1534,\n 5614_4........ ENGLAND, East Coast: Wreck..\n";
        let list = parse_in_force(region, &folio(&[1491, 5614, 9999]));
        assert!(list.available);
        assert_eq!(list.entries[&1491].len(), 1);
        assert_eq!(list.entries[&1491][0].nm_number, "4697(T)/25");
        assert_eq!(list.entries[&1491][0].subject, "ENGLAND, East Coast: Buoyage");
        assert_eq!(list.entries[&1491][0].affected_charts, vec![1491, 2693]);
        assert_eq!(list.entries[&5614][0].nm_number, "5012(P)/25");
        assert!(list.entries[&9999].is_empty());
    }

    #[test]
    fn test_in_force_dedup() {
        let region = "4697(T)/25   1491.... ENGLAND: Buoyage..\n4697(T)/25   1491.... ENGLAND: Buoyage..\n";
        let list = parse_in_force(region, &folio(&[1491]));
        assert_eq!(list.entries[&1491].len(), 1);
    }

    #[test]
    fn test_in_force_absent() {
        let list = parse_in_force("770    ENGLAND - East Coast\nChart 1491\n", &folio(&[1491]));
        assert!(!list.available);
        assert!(list.entries[&1491].is_empty());
        assert_eq!(list.entries.len(), 1);
    }

    #[test]
    fn test_malformed_row_is_skipped() {
        let region = "4697(T)/25   1491 no leader here\n4698(T)/25   1491.... lowercase subject..\n";
        let list = parse_in_force(region, &folio(&[1491]));
        assert!(!list.available);
    }

    #[test]
    fn test_new_tp_with_int_exclusion() {
        let region = "762(T)/26     WALES - Milford Haven - Buoyage.\nSource: Milford Haven Port Authority\nCharts affected - 152 (INT 1549) - 156\n770    ENGLAND - East Coast\nChart 1491\n";
        let notices = split_notices(region, DocumentKind::SectionII);
        let map = parse_new_tp(&notices, &folio(&[152, 1549, 1491]), 5000);
        assert_eq!(map[&152].len(), 1);
        assert_eq!(map[&152][0].subject, "WALES - Milford Haven - Buoyage.");
        assert_eq!(map[&152][0].affected_charts, vec![152, 156]);
        assert!(map[&1549].is_empty());
        assert!(map[&1491].is_empty());
    }

    #[test]
    fn test_new_tp_lookahead_limit() {
        let filler = "x".repeat(100);
        let region = format!(
            "762(P)/26     WALES - Milford Haven\n{filler}\nCharts affected - 152\n"
        );
        let notices = split_notices(&region, DocumentKind::SectionII);
        assert_eq!(notices[0].tp_kind, Some(TpKind::Preliminary));
        assert!(parse_new_tp(&notices, &folio(&[152]), 50)[&152].is_empty());
        assert_eq!(parse_new_tp(&notices, &folio(&[152]), 5000)[&152].len(), 1);
    }
}
