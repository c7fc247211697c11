// src/parser/locate.rs

//! Finds where a notice sits on a page.
//!
//! `locate_crop` works on positioned text runs and returns the vertical band
//! holding one chart's part of a notice. `find_page_for_correction` works on
//! per-page plain text and returns the page a notice is printed on.

use std::cmp::Ordering;

use super::text::{chart_references, find_headers, parse_nm_token};
use crate::models::{CropWindow, TextRun};

/// Runs closer than this vertically belong to the same line.
const LINE_TOLERANCE: f64 = 3.0;
const TOP_PADDING: f64 = 20.0;
const BOTTOM_PADDING: f64 = 12.0;

/// One visual line of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub y: f64,
    pub text: String,
}

/// Group runs into lines, top of page first, each line read left to right.
pub fn group_lines(runs: &[TextRun]) -> Vec<Line> {
    let mut sorted: Vec<&TextRun> = runs.iter().collect();
    sorted.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal));

    let mut rows: Vec<(f64, Vec<&TextRun>)> = Vec::new();
    for run in sorted {
        match rows.last_mut() {
            Some((y, row)) if (*y - run.y).abs() <= LINE_TOLERANCE => row.push(run),
            _ => rows.push((run.y, vec![run])),
        }
    }

    rows.into_iter()
        .map(|(y, mut row)| {
            row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
            let text = row.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(" ");
            Line { y, text }
        })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Text after `Chart` and its whitespace, if the line starts that way.
fn after_chart_word(line: &str) -> Option<&str> {
    let head = line.get(..5)?;
    if !head.eq_ignore_ascii_case("chart") {
        return None;
    }
    let rest = &line[5..];
    let trimmed = rest.trim_start();
    (trimmed.len() < rest.len()).then_some(trimmed)
}

/// `Chart <chart>` at the start of a line; `_` in `chart` also matches a space.
fn is_chart_line_for(line: &str, chart: &str) -> bool {
    let Some(rest) = after_chart_word(line) else {
        return false;
    };
    let mut text = rest.chars();
    for want in chart.chars() {
        match text.next() {
            Some(got) if got == want => {}
            Some(' ') if want == '_' => {}
            _ => return false,
        }
    }
    text.next().is_none_or(|c| !is_word_char(c))
}

/// Base number of a notice header line: digits, optional marker, then a blank.
fn line_notice_base(line: &str) -> Option<u32> {
    let nm = parse_nm_token(line)?;
    line[nm.len..]
        .starts_with(char::is_whitespace)
        .then_some(nm.base)
}

fn is_footer(line: &str) -> bool {
    let b = line.as_bytes();
    b.len() >= 7
        && line.starts_with("Wk")
        && b[2].is_ascii_digit()
        && b[3].is_ascii_digit()
        && b[4] == b'/'
        && b[5].is_ascii_digit()
        && b[6].is_ascii_digit()
}

fn nm_base(nm: &str) -> Option<u32> {
    let digits: String = nm.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn window(top_y: f64, bottom_y: Option<f64>, page_height: f64) -> CropWindow {
    CropWindow {
        top: (top_y + TOP_PADDING).min(page_height),
        bottom: bottom_y.map_or(0.0, |y| y + BOTTOM_PADDING),
    }
}

/// Vertical band holding `chart`'s part of notice `nm` on one page.
///
/// Anchors on the `Chart <chart>` line when there is one, otherwise on the
/// notice's own header line. The band ends at the next boundary (another
/// chart line, another notice, or the page footer) or at the page bottom.
pub fn locate_crop(
    runs: &[TextRun],
    nm: &str,
    chart: &str,
    page_height: f64,
) -> Option<CropWindow> {
    let lines = group_lines(runs);
    let base = nm_base(nm);
    let other_notice = |text: &str| line_notice_base(text).is_some_and(|b| Some(b) != base);

    if let Some(idx) = lines
        .iter()
        .position(|l| is_chart_line_for(l.text.trim(), chart))
    {
        let bottom = lines[idx + 1..]
            .iter()
            .find(|l| {
                let text = l.text.trim();
                let other_chart = after_chart_word(text).is_some() && !is_chart_line_for(text, chart);
                other_chart || other_notice(text) || is_footer(text)
            })
            .map(|l| l.y);
        return Some(window(lines[idx].y, bottom, page_height));
    }

    let base = base?;
    let idx = lines.iter().position(|l| {
        let text = l.text.trim();
        parse_nm_token(text).is_some_and(|tok| {
            tok.base == base && text[tok.len..].chars().next().is_none_or(char::is_whitespace)
        })
    })?;
    let bottom = lines[idx + 1..]
        .iter()
        .find(|l| {
            let text = l.text.trim();
            other_notice(text) || is_footer(text)
        })
        .map(|l| l.y);
    Some(window(lines[idx].y, bottom, page_height))
}

/// 1-based page holding notice `nm` and its `Chart <chart>` line.
///
/// Falls back to the first page carrying the notice header.
pub fn find_page_for_correction(pages: &[String], nm: &str, chart: &str) -> Option<usize> {
    let base = nm_base(nm)?;
    let with_header: Vec<usize> = pages
        .iter()
        .enumerate()
        .filter(|(_, page)| find_headers(page).iter().any(|h| h.nm.base == base))
        .map(|(i, _)| i)
        .collect();

    with_header
        .iter()
        .find(|&&i| {
            chart_references(&pages[i])
                .iter()
                .any(|r| r.id.key() == chart)
        })
        .or(with_header.first())
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, y: f64) -> TextRun {
        run_at(text, 50.0, y)
    }

    fn run_at(text: &str, x: f64, y: f64) -> TextRun {
        TextRun {
            text: text.into(),
            x,
            y,
        }
    }

    fn page() -> Vec<TextRun> {
        vec![
            run_at("ENGLAND - East Coast", 90.0, 701.5),
            run_at("764", 50.0, 700.0),
            run("Chart 1534 [ previous update 10/25 ]", 680.0),
            run("Insert light", 665.0),
            run("Chart 5614 4 (Panel D)", 640.0),
            run("Delete buoy", 625.0),
            run("765    WALES - South", 600.0),
            run("Chart 2052", 580.0),
            run("Wk08/26", 40.0),
        ]
    }

    #[test]
    fn test_group_lines() {
        let lines = group_lines(&page());
        assert_eq!(lines[0].text, "764 ENGLAND - East Coast");
        assert_eq!(lines[0].y, 701.5);
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_split_header_anchors_notice() {
        let runs = vec![
            run_at("SCOTLAND - West Coast", 90.0, 780.0),
            run_at("766*", 50.0, 779.0),
            run("Insert wreck", 760.0),
            run("767    SCOTLAND - North Coast", 700.0),
        ];
        let crop = locate_crop(&runs, "766", "9999", 842.0).unwrap();
        assert_eq!(crop.top, 800.0);
        assert_eq!(crop.bottom, 712.0);
    }

    #[test]
    fn test_chart_line_strategy() {
        let crop = locate_crop(&page(), "764", "1534", 842.0).unwrap();
        assert_eq!(crop.top, 700.0);
        assert_eq!(crop.bottom, 652.0);
    }

    #[test]
    fn test_panel_with_space() {
        let crop = locate_crop(&page(), "764", "5614_4", 842.0).unwrap();
        assert_eq!(crop.top, 660.0);
        assert_eq!(crop.bottom, 612.0);
    }

    #[test]
    fn test_bottom_defaults_to_page_bottom() {
        let runs = vec![run("Chart 2052", 100.0), run("Insert light", 90.0)];
        let crop = locate_crop(&runs, "765", "2052", 842.0).unwrap();
        assert_eq!(crop.bottom, 0.0);
        assert_eq!(crop.top, 120.0);
    }

    #[test]
    fn test_notice_line_fallback() {
        let runs = vec![
            run("766*   SCOTLAND - West Coast", 830.0),
            run("Insert wreck", 810.0),
            run("Wk08/26", 40.0),
        ];
        let crop = locate_crop(&runs, "766", "9999", 842.0).unwrap();
        assert_eq!(crop.top, 842.0);
        assert_eq!(crop.bottom, 52.0);
        assert!(locate_crop(&runs, "767", "9999", 842.0).is_none());
    }

    #[test]
    fn test_crop_decision_thresholds() {
        let crop = locate_crop(&page(), "764", "1534", 842.0).unwrap();
        assert!(matches!(
            crop.decide(842.0, 2.0, 20.0),
            crate::models::CropDecision::Crop { .. }
        ));
        let thin = CropWindow {
            top: 100.0,
            bottom: 95.0,
        };
        assert_eq!(
            thin.decide(842.0, 2.0, 20.0),
            crate::models::CropDecision::FullPage
        );
    }

    #[test]
    fn test_find_page_for_correction() {
        let pages = vec![
            "Index\n770*2.9     3\n".to_string(),
            "770    ENGLAND - East Coast\nChart 2052\nInsert\n".to_string(),
            "770    ENGLAND - East Coast (continued)\nChart 1491 [ previous update 200/24 ]\n".to_string(),
        ];
        assert_eq!(find_page_for_correction(&pages, "770", "1491"), Some(3));
        assert_eq!(find_page_for_correction(&pages, "770", "9999"), Some(2));
        assert_eq!(find_page_for_correction(&pages, "771", "1491"), None);
    }
}
