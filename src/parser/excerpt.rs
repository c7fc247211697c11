// src/parser/excerpt.rs

//! Turns raw notice text into a readable excerpt and structured fields.
//!
//! Text pulled out of a PDF loses its layout: footers land mid-notice,
//! depth subscripts wrap onto their own line, table columns glue together.
//! `format_excerpt` repairs those artefacts; `chart_excerpt` then splits the
//! result into header fields and per-chart sections for one chart.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::text::parse_nm_token;
use crate::models::{ChartId, ChartSection, StructuredExcerpt};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

static PAGE_FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?m)Wk\d{2}/\d{2}[ \t]*(?:\n[ \t]*)?II(?:[ \t]+[\d.]+)*[ \t]*(?:\n[ \t]*[\d.]+[ \t]*)*$\n?")
});
static CONTINUED_HEADER: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\n\d{3,5}[^\n]*\(continued\)[^\n]*"));
static SUB_ITEM_BREAK: LazyLock<Regex> = LazyLock::new(|| re(r"(\([a-z]\))\s*\n\s*"));
static DEPTH_SUBSCRIPT: LazyLock<Regex> = LazyLock::new(|| re(r"(?m)(\d)\n(\d)([^0-9]|$)"));
static GLUED_DEPTH: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?im)(depth,?\s+)(\d)(\d)([\s,.)(]|$)"));
static DEPTH_PAREN: LazyLock<Regex> = LazyLock::new(|| re(r"(\d\.\d)(\()"));
static LEADING_COMMA: LazyLock<Regex> = LazyLock::new(|| re(r"\n\s*,\s*"));
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| re(r",[ \t]*\n\s*"));
static COORD_LINE: LazyLock<Regex> = LazyLock::new(|| re(r"\n\s+(\d{1,3}°)"));
static DEPTH_COORD: LazyLock<Regex> = LazyLock::new(|| re(r"(\d+[·.]?\d*m)(\d{1,3}°)"));
static GLUED_HEADINGS: LazyLock<Regex> =
    LazyLock::new(|| re(r"\b([A-Z][a-z]{3,})([A-Z][a-z]{3,})\b"));
static TRAILING_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| re(r"\n\s*\.?\d{1,2}\.\d{1,2}\s*$"));
static TRAILING_PAGE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| re(r"\n\s*\.\d{1,2}\s*$"));
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t]{2,}"));

static PREVIOUS_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\[\s*previous update\s+([^\]]+)\]"));
static DATUM: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)(ETRS89|WGS84|ED50|OSGB36)\s*(DATUM)?"));
static PANEL_LABEL: LazyLock<Regex> = LazyLock::new(|| re(r"\(([^)]+)\)"));

const INSTRUCTION_VERBS: [&str; 8] = [
    "insert",
    "delete",
    "move",
    "amend",
    "add",
    "remove",
    "substitute",
    "replace",
];

const DATUMS: [&str; 4] = ["ETRS89", "WGS84", "ED50", "OSGB36"];

fn is_instruction(line: &str) -> bool {
    let Some(word) = line.split_whitespace().next() else {
        return false;
    };
    INSTRUCTION_VERBS
        .iter()
        .any(|verb| word.eq_ignore_ascii_case(verb))
}

/// `Chart` plus whitespace plus anything; `Charts affected` does not qualify.
fn chart_heading_token(line: &str) -> Option<&str> {
    let prefix = line.get(..5)?;
    if !prefix.eq_ignore_ascii_case("chart") {
        return None;
    }
    let rest = &line[5..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.split_whitespace().next()
}

fn is_chart_line(line: &str) -> bool {
    chart_heading_token(line).is_some_and(|t| t.starts_with(|c: char| c.is_ascii_digit()))
}

fn is_sub_item(line: &str) -> bool {
    let b = line.as_bytes();
    b.len() >= 3 && b[0] == b'(' && b[1].is_ascii_lowercase() && b[2] == b')'
}

fn starts_with_datum(line: &str) -> bool {
    DATUMS.iter().any(|d| {
        line.get(..d.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(d))
    })
}

fn previous_update_in(line: &str) -> Option<String> {
    PREVIOUS_UPDATE
        .captures(line)
        .map(|c| c[1].trim().to_string())
}

fn datum_in(line: &str) -> Option<String> {
    DATUM.find(line).map(|m| m.as_str().trim().to_string())
}

/// Repair extraction artefacts and lay the notice out for reading.
pub fn format_excerpt(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = PAGE_FOOTER.replace_all(raw, "");
    let text = CONTINUED_HEADER.replace_all(&text, "\n");
    let text = SUB_ITEM_BREAK.replace_all(&text, "${1} ");
    let text = DEPTH_SUBSCRIPT.replace_all(&text, "${1}.${2}${3}");
    let text = GLUED_DEPTH.replace_all(&text, "${1}${2}.${3}${4}");
    let text = DEPTH_PAREN.replace_all(&text, "${1} ${2}");
    let text = LEADING_COMMA.replace_all(&text, ", ");
    let text = TRAILING_COMMA.replace_all(&text, ", ");
    let text = COORD_LINE.replace_all(&text, " ${1}");
    let text = DEPTH_COORD.replace_all(&text, "${1}   ${2}");
    let text = GLUED_HEADINGS.replace_all(&text, "${1}   ${2}");
    let text = TRAILING_PAGE_NUMBER.replace_all(&text, "");
    let text = TRAILING_PAGE_FRAGMENT.replace_all(&text, "");
    let text = MULTI_SPACE.replace_all(&text, " ");

    let mut out: Vec<String> = Vec::new();
    let mut in_instruction = false;
    let mut after_sub_item = false;

    for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
        let instruction = is_instruction(line);
        let chart_ref = is_chart_line(line);

        if (instruction || chart_ref) && !out.is_empty() {
            out.push(String::new());
        }

        if instruction {
            out.push(line.to_string());
            in_instruction = true;
            after_sub_item = false;
        } else if chart_ref {
            out.push(line.to_string());
            in_instruction = false;
            after_sub_item = false;
        } else if is_sub_item(line) {
            if after_sub_item {
                out.push(String::new());
            }
            out.push(format!("    {line}"));
            after_sub_item = true;
        } else if after_sub_item {
            out.push(format!("        {line}"));
        } else if in_instruction {
            out.push(format!("    {line}"));
        } else {
            out.push(line.to_string());
        }
    }

    out.join("\n").trim().to_string()
}

/// Split a formatted body into per-chart sections.
pub fn body_sections(body: &str) -> Vec<ChartSection> {
    let mut sections = Vec::new();
    let mut current = ChartSection::default();
    let mut lines: Vec<&str> = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();

        if let Some(token) = chart_heading_token(trimmed) {
            if !lines.is_empty() || !current.chart_ref.is_empty() {
                current.text = lines.join("\n").trim().to_string();
                sections.push(std::mem::take(&mut current));
            }
            lines.clear();
            current = ChartSection {
                chart_ref: token.to_string(),
                heading: trimmed.to_string(),
                panel: PANEL_LABEL.captures(trimmed).map(|c| c[1].to_string()),
                previous_update: previous_update_in(trimmed),
                datum: datum_in(trimmed),
                text: String::new(),
            };
            continue;
        }

        if lines.is_empty() && PREVIOUS_UPDATE.is_match(trimmed) {
            if current.previous_update.is_none() {
                current.previous_update = previous_update_in(trimmed);
            }
            if current.datum.is_none() {
                current.datum = datum_in(trimmed);
            }
            continue;
        }

        if lines.is_empty() && starts_with_datum(trimmed) {
            if current.datum.is_none() {
                current.datum = Some(trimmed.to_string());
            }
            continue;
        }

        lines.push(line);
    }

    current.text = lines.join("\n").trim().to_string();
    if !current.text.is_empty() || !current.chart_ref.is_empty() {
        sections.push(current);
    }
    sections
}

/// Base chart of a heading token, e.g. `5614` for `5614_4`.
fn heading_chart(token: &str) -> Option<u32> {
    let token = token.trim_end_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_');
    ChartId::parse(token).map(|id| id.base)
}

fn section_chart(section: &ChartSection) -> Option<u32> {
    heading_chart(&section.chart_ref)
}

/// Body lines outside the sections of charts not in `relevant`.
///
/// Lines before the first `Chart` heading are kept, and runs of blank
/// lines left behind by dropped sections collapse to one.
fn scope_body(body: &str, relevant: &BTreeSet<u32>) -> String {
    let mut keep = true;
    let mut out: Vec<&str> = Vec::new();
    for line in body.lines() {
        if let Some(token) = chart_heading_token(line.trim()) {
            keep = heading_chart(token).is_none_or(|base| relevant.contains(&base));
        }
        if !keep || (line.trim().is_empty() && out.last().is_none_or(|l| l.trim().is_empty())) {
            continue;
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

/// Readable excerpt of a notice for one chart, with its structured fields.
///
/// `relevant` holds the base charts whose sections concern the chart; an
/// empty set keeps every section. The excerpt is the notice header followed by the sections kept for
/// `relevant`. A notice with a single chart section, or none that concern
/// the chart, is returned whole.
pub fn chart_excerpt(raw: &str, relevant: &BTreeSet<u32>) -> (String, StructuredExcerpt) {
    let formatted = format_excerpt(raw);
    if formatted.is_empty() {
        return (formatted, StructuredExcerpt::default());
    }

    let lines: Vec<&str> = formatted.lines().collect();
    let body_start = lines
        .iter()
        .position(|l| {
            let t = l.trim();
            is_chart_line(t) || is_instruction(t)
        })
        .unwrap_or(lines.len());

    let mut fields = StructuredExcerpt::default();
    let mut extra: Vec<&str> = Vec::new();

    for line in &lines[..body_start] {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if fields.subject.is_empty() {
            fields.subject = match parse_nm_token(trimmed) {
                Some(nm) => trimmed[nm.len..].trim().to_string(),
                None => trimmed.to_string(),
            };
            continue;
        }
        if trimmed
            .get(..7)
            .is_some_and(|h| h.eq_ignore_ascii_case("source:"))
        {
            fields.source = Some(trimmed[7..].trim().to_string());
            continue;
        }
        if PREVIOUS_UPDATE.is_match(trimmed) {
            fields.previous_update = previous_update_in(trimmed);
            fields.datum = datum_in(trimmed).or(fields.datum.take());
            continue;
        }
        if starts_with_datum(trimmed) {
            fields.datum = Some(trimmed.to_string());
            continue;
        }
        extra.push(line);
    }

    extra.extend_from_slice(&lines[body_start..]);
    fields.body = extra.join("\n").trim().to_string();

    let sections = body_sections(&fields.body);
    let charted = sections.iter().filter(|s| section_chart(s).is_some()).count();
    let kept: Vec<ChartSection> = sections
        .iter()
        .filter(|s| section_chart(s).is_none_or(|base| relevant.contains(&base)))
        .cloned()
        .collect();
    let narrowed = !relevant.is_empty()
        && charted > 1
        && kept.iter().any(|s| section_chart(s).is_some());

    let excerpt = if narrowed {
        fields.body = scope_body(&fields.body, relevant);
        let header = lines[..body_start].join("\n");
        let body = scope_body(&lines[body_start..].join("\n"), relevant);
        format!("{}\n\n{}", header.trim(), body).trim().to_string()
    } else {
        formatted.clone()
    };
    let scoped = if narrowed { kept } else { sections };

    if fields.previous_update.is_none() {
        fields.previous_update = scoped.iter().find_map(|s| s.previous_update.clone());
    }
    if fields.datum.is_none() {
        fields.datum = scoped.iter().find_map(|s| s.datum.clone());
    }
    fields.sections = scoped;
    (excerpt, fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(raw: &str, relevant: &BTreeSet<u32>) -> StructuredExcerpt {
        chart_excerpt(raw, relevant).1
    }

    const NOTICE_770: &str = "770    ENGLAND - East Coast - Lowestoft - Light.\nSource: UKHO\nChart  1491 [ previous update 200/24 ] ETRS89 DATUM\nInsert\n(a)\nabove\n52° 28'·30N., 1° 45'·50E.\n";

    #[test]
    fn test_footer_and_continuation_removed() {
        let raw = "770    ENGLAND - East Coast\nChart 1491\nWk08/26\nII\n2\n.40\n770    ENGLAND - East Coast (continued)\nInsert buoy\n";
        let formatted = format_excerpt(raw);
        assert!(!formatted.contains("Wk08/26"));
        assert!(!formatted.contains("(continued)"));
        assert!(formatted.contains("Insert buoy"));
    }

    #[test]
    fn test_single_line_footer() {
        let formatted = format_excerpt("Chart 1491\nWk08/26 II 2.9\nInsert light\n");
        assert_eq!(formatted, "Chart 1491\n\nInsert light");
    }

    #[test]
    fn test_depth_repairs() {
        assert!(format_excerpt("depth\n9\n8 at").contains("9.8 at"));
        assert!(format_excerpt("Insert depth, 98 here").contains("depth, 9.8 here"));
        assert!(format_excerpt("Insert 7.9(a) here").contains("7.9 (a) here"));
    }

    #[test]
    fn test_joins_and_splits() {
        let formatted = format_excerpt("Insert\n(a)\nabove\nlight, \n buoy\n 52° 28'·30N.");
        assert!(formatted.contains("(a) above"));
        assert!(formatted.contains("light, buoy 52° 28'·30N."));

        let table = format_excerpt("DepthPosition\n8·8m52° 29'·88N.");
        assert!(table.contains("Depth Position"));
        assert!(table.contains("8·8m 52°"));
    }

    #[test]
    fn test_indentation() {
        let formatted = format_excerpt("Chart 1491\nInsert\n(a) light\nfl.R\n(b) buoy\nDelete\nwreck");
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Chart 1491",
                "",
                "Insert",
                "    (a) light",
                "        fl.R",
                "",
                "    (b) buoy",
                "",
                "Delete",
                "    wreck",
            ]
        );
    }

    #[test]
    fn test_structure_header_fields() {
        let fields = structure(NOTICE_770, &BTreeSet::new());
        assert_eq!(fields.subject, "ENGLAND - East Coast - Lowestoft - Light.");
        assert_eq!(fields.source.as_deref(), Some("UKHO"));
        assert_eq!(fields.previous_update.as_deref(), Some("200/24"));
        assert_eq!(fields.datum.as_deref(), Some("ETRS89 DATUM"));
        assert!(fields.body.starts_with("Chart 1491"));
        assert_eq!(fields.sections.len(), 1);
        assert_eq!(fields.sections[0].chart_ref, "1491");
    }

    #[test]
    fn test_structure_scopes_sections() {
        let raw = "771    ENGLAND - East Coast\nChart 1534 [ previous update 10/25 ] WGS84 DATUM\nInsert light\nChart 5614_4 (Panel D, Great Yarmouth) [ previous update 11/25 ]\nDelete buoy\nChart 2052\nMove wreck\n";

        let scoped = structure(raw, &BTreeSet::from([5614]));
        assert_eq!(scoped.sections.len(), 1);
        assert_eq!(scoped.sections[0].panel.as_deref(), Some("Panel D, Great Yarmouth"));
        assert_eq!(scoped.previous_update.as_deref(), Some("11/25"));
        assert_eq!(scoped.datum, None);

        let unmatched = structure(raw, &BTreeSet::from([9999]));
        assert_eq!(unmatched.sections.len(), 3);
    }

    #[test]
    fn test_standalone_previous_update_line() {
        let raw = "772    WALES - South\nChart 2052\n[ previous update 5/26 ]\nOSGB36\nInsert light\n";
        let fields = structure(raw, &BTreeSet::from([2052]));
        let section = &fields.sections[0];
        assert_eq!(section.previous_update.as_deref(), Some("5/26"));
        assert_eq!(section.datum.as_deref(), Some("OSGB36"));
        assert_eq!(section.text, "Insert light");
    }

    #[test]
    fn test_chart_excerpt_keeps_own_section() {
        let raw = "775    ENGLAND - East Coast - Wrecks.\nSource: UKHO\nChart 1491 [ previous update 770/26 ]\nInsert wreck at 52 28N 1 45E\nChart 2052 [ previous update 12/26 ]\nDelete wreck at 52 00N 2 00E\n";

        let (excerpt, fields) = chart_excerpt(raw, &BTreeSet::from([1491]));
        assert!(excerpt.starts_with("775 ENGLAND - East Coast - Wrecks.\nSource: UKHO"));
        assert!(excerpt.contains("Insert wreck at 52 28N 1 45E"));
        assert!(!excerpt.contains("2052"));
        assert!(!fields.body.contains("Delete wreck"));
        assert_eq!(fields.sections.len(), 1);
        assert_eq!(fields.previous_update.as_deref(), Some("770/26"));

        let (other, _) = chart_excerpt(raw, &BTreeSet::from([2052]));
        assert!(other.contains("Delete wreck at 52 00N 2 00E"));
        assert!(!other.contains("1491"));
    }

    #[test]
    fn test_single_section_excerpt_is_whole() {
        let (excerpt, _) = chart_excerpt(NOTICE_770, &BTreeSet::from([1491]));
        assert_eq!(excerpt, format_excerpt(NOTICE_770));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_excerpt("  \n"), "");
        assert_eq!(structure("", &BTreeSet::new()), StructuredExcerpt::default());
    }
}
