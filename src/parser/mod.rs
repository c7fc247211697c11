// src/parser/mod.rs

//! Extraction engine: from bulletin text and a folio to per-chart results.
//!
//! Everything in this module is pure. A run builds its own matcher and
//! nothing is cached between runs, so the same input always yields the same
//! output.

pub mod excerpt;
pub mod locate;
pub mod matcher;
pub mod segment;
pub mod split;
pub mod text;
pub mod tp;

pub use excerpt::{chart_excerpt, format_excerpt};
pub use locate::{find_page_for_correction, group_lines, locate_crop};
pub use matcher::{ChartMatch, ChartMatcher, geographic_core};
pub use segment::{Segmentation, segment};
pub use split::split_notices;
pub use tp::{parse_in_force, parse_new_tp};

use crate::models::{
    ChartMap, ChartNameLookup, Correction, DocumentKind, Folio, InForceList, Notice, TpEntry,
    empty_chart_map,
};

/// Corrections and new T&P notices read from one text.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub corrections: ChartMap<Correction>,
    pub tp_notices: ChartMap<TpEntry>,
    pub notice_count: usize,
    pub boundary_found: bool,
}

/// Segment a text and split its corrections region into notices.
pub fn extract_notices(text: &str, source: DocumentKind) -> (Segmentation, Vec<Notice>) {
    let segmentation = segment(text);
    let notices = split_notices(segmentation.corrections_text(text), source);
    (segmentation, notices)
}

/// Match notices to folio charts, one correction per chart and notice number.
pub fn find_corrections(
    notices: &[Notice],
    folio: &Folio,
    lookup: &dyn ChartNameLookup,
) -> ChartMap<Correction> {
    let matcher = ChartMatcher::new(folio, lookup);
    let mut corrections = empty_chart_map(folio);

    for notice in notices {
        let matches = matcher.match_notice(notice);
        if matches.is_empty() {
            continue;
        }
        for m in matches {
            let list: &mut Vec<Correction> = corrections.entry(m.chart).or_default();
            if list.iter().any(|c| c.nm_number == notice.nm_number) {
                continue;
            }
            let (excerpt, fields) = chart_excerpt(&notice.raw_text, &m.relevant);
            list.push(Correction {
                nm_number: notice.nm_number.clone(),
                excerpt,
                fields,
                is_block_supplement: false,
                match_kind: m.kind,
                pdf_page: None,
                block_url: None,
                block_filename: None,
            });
        }
    }
    corrections
}

/// Read corrections and new T&P notices from one bulletin text.
pub fn extract(
    text: &str,
    source: DocumentKind,
    folio: &Folio,
    lookup: &dyn ChartNameLookup,
    tp_lookahead: usize,
) -> Extraction {
    let (segmentation, notices) = extract_notices(text, source);
    let corrections = find_corrections(&notices, folio, lookup);
    let tp_notices = parse_new_tp(&notices, folio, tp_lookahead);
    log::debug!(
        "{}: {} notices, {} corrections, {} new T&P",
        source,
        notices.len(),
        corrections.values().map(Vec::len).sum::<usize>(),
        tp_notices.values().map(Vec::len).sum::<usize>()
    );
    Extraction {
        corrections,
        tp_notices,
        notice_count: notices.len(),
        boundary_found: segmentation.boundary_found,
    }
}

/// Read the T&P in-force list from the weekly bulletin text.
pub fn find_tp_in_force(text: &str, folio: &Folio) -> InForceList {
    let segmentation = segment(text);
    parse_in_force(segmentation.in_force_text(text), folio)
}
