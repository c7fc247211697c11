//! Output structures produced by a check run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Folio;

/// How a notice was judged relevant to a folio chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The notice names the chart number itself
    Direct,
    /// A panel of another chart covers the same place
    Geographic,
}

/// One chart sub-section of a notice body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSection {
    /// Chart or panel token after `Chart`, empty for a preamble section
    pub chart_ref: String,
    /// The `Chart ...` line as printed
    pub heading: String,
    pub panel: Option<String>,
    pub previous_update: Option<String>,
    pub datum: Option<String>,
    pub text: String,
}

/// Header fields and body of a formatted notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredExcerpt {
    pub subject: String,
    pub source: Option<String>,
    pub previous_update: Option<String>,
    pub datum: Option<String>,
    pub body: String,
    pub sections: Vec<ChartSection>,
}

/// A permanent correction matched to a folio chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub nm_number: String,
    pub excerpt: String,
    pub fields: StructuredExcerpt,
    pub is_block_supplement: bool,
    pub match_kind: MatchKind,
    /// 1-based page of the Section II document holding the notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_filename: Option<String>,
}

impl Correction {
    pub fn previous_update(&self) -> Option<&str> {
        self.fields.previous_update.as_deref()
    }
}

/// A temporary or preliminary notice matched to a folio chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpEntry {
    pub nm_number: String,
    pub affected_charts: Vec<u32>,
    pub subject: String,
}

impl TpEntry {
    /// Affected charts as a display string, e.g. `1491, 2693`.
    pub fn charts_label(&self) -> String {
        self.affected_charts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Per-chart lists keyed by folio chart number.
pub type ChartMap<T> = BTreeMap<u32, Vec<T>>;

/// Build an empty per-chart map with one key per folio chart.
pub fn empty_chart_map<T>(folio: &Folio) -> ChartMap<T> {
    folio.charts().iter().map(|&c| (c, Vec::new())).collect()
}

/// Result of parsing the in-force list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InForceList {
    /// `false` when the region held no rows at all (list not published)
    pub available: bool,
    pub entries: ChartMap<TpEntry>,
}

/// Bulletin year and week number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekInfo {
    pub year: i32,
    pub week: u32,
}

impl std::fmt::Display for WeekInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wk {:02}/{}", self.week, self.year)
    }
}

/// A downloadable document linked from the weekly page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfLink {
    pub url: String,
    pub filename: String,
}

/// A chart block supplement document (`Chart<N>NM<M>.pdf`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBlock {
    pub link: PdfLink,
    pub chart: u32,
    /// NM number from the file name, when present
    pub nm_number: Option<String>,
}

/// The documents of interest on one weekly page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSet {
    pub weekly: Option<PdfLink>,
    pub section_ii: Option<PdfLink>,
    /// Blocks for charts in the folio
    pub chart_blocks: Vec<ChartBlock>,
    /// Every block on the page
    pub all_chart_blocks: Vec<ChartBlock>,
}

/// Complete result of one check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub week: WeekInfo,
    pub charts: Folio,
    pub corrections: ChartMap<Correction>,
    pub tp_notices: ChartMap<TpEntry>,
    pub tp_in_force: ChartMap<TpEntry>,
    pub total_corrections: usize,
    pub total_tp: usize,
    pub total_tp_in_force: usize,
    pub tp_in_force_available: bool,
    /// Human-readable failures that did not abort the run
    pub failures: Vec<String>,
    pub all_block_charts: Vec<u32>,
    pub matching_blocks: Vec<String>,
    pub pdf_count: usize,
    pub weekly_file: Option<String>,
    pub section_ii_file: Option<String>,
    pub section_ii_url: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_display() {
        let week = WeekInfo { year: 2026, week: 8 };
        assert_eq!(week.to_string(), "Wk 08/2026");
    }

    #[test]
    fn test_charts_label() {
        let entry = TpEntry {
            nm_number: "4697(T)/25".into(),
            affected_charts: vec![1491, 2693],
            subject: "ENGLAND, East Coast: Buoyage".into(),
        };
        assert_eq!(entry.charts_label(), "1491, 2693");
    }
}
