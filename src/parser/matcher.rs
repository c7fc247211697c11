// src/parser/matcher.rs

//! Decides which folio charts a notice applies to.
//!
//! A notice applies to chart `N` directly when it prints `Chart N` or lists
//! `N` under `Charts affected`. It applies geographically when it prints a
//! panel `Chart P_s` whose descriptive name reduces to the same place as
//! chart `N`'s name, e.g. panel "Great Yarmouth" against chart
//! "Approaches to Great Yarmouth".

use std::collections::{BTreeSet, HashMap};

use super::text::{affected_charts, chart_references};
use crate::models::{ChartNameLookup, Folio, MatchKind, Notice};

/// Leading qualifiers removed from a chart name, longest first.
pub const GEO_PREFIXES: &[&str] = &[
    "approaches to the",
    "approaches to",
    "approach to",
    "entrance to the",
    "entrance to",
    "the river",
    "river",
];

/// Trailing qualifiers removed from a chart name.
pub const GEO_SUFFIXES: &[&str] = &[
    "approaches",
    "approach",
    "harbour",
    "harbours",
    "entrance",
    "and",
    "part",
];

/// Cores shorter than this never match.
pub const MIN_CORE_LEN: usize = 5;

/// Reduce a chart name to the place it covers.
///
/// `"Approaches to Great Yarmouth"` and `"Great Yarmouth Harbour"` both
/// become `"great yarmouth"`. The qualifier lists are English-only and
/// best-effort; extend them as new names turn up.
pub fn geographic_core(name: &str) -> String {
    let normalized: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = normalized.split_whitespace().collect();

    'prefix: loop {
        for prefix in GEO_PREFIXES {
            let parts: Vec<&str> = prefix.split(' ').collect();
            if words.len() > parts.len() && words[..parts.len()] == parts[..] {
                words.drain(..parts.len());
                continue 'prefix;
            }
        }
        break;
    }

    loop {
        let n = words.len();
        let drop = if n > 2 && words[n - 2] == "part" {
            2
        } else if n > 1 && GEO_SUFFIXES.contains(&words[n - 1]) {
            1
        } else {
            0
        };
        if drop == 0 {
            break;
        }
        words.truncate(n - drop);
    }

    words.join(" ")
}

/// A folio chart a notice applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartMatch {
    pub chart: u32,
    pub kind: MatchKind,
    /// Base chart numbers whose sections of the notice concern this chart
    pub relevant: BTreeSet<u32>,
}

/// Matches notices against one folio.
///
/// Folio name cores are computed once per matcher, so a matcher lives for
/// one extraction run.
pub struct ChartMatcher<'a> {
    folio: &'a Folio,
    lookup: &'a dyn ChartNameLookup,
    cores: HashMap<u32, String>,
}

impl<'a> ChartMatcher<'a> {
    pub fn new(folio: &'a Folio, lookup: &'a dyn ChartNameLookup) -> Self {
        let cores = folio
            .charts()
            .iter()
            .filter_map(|&chart| {
                let name = lookup.name_of(&chart.to_string())?;
                let core = geographic_core(name);
                (core.chars().count() >= MIN_CORE_LEN).then_some((chart, core))
            })
            .collect();
        Self {
            folio,
            lookup,
            cores,
        }
    }

    /// Every folio chart the notice applies to, in folio order.
    pub fn match_notice(&self, notice: &Notice) -> Vec<ChartMatch> {
        let text = &notice.raw_text;
        let refs = chart_references(text);
        let affected = affected_charts(text).unwrap_or_default();

        let panel_cores: Vec<(u32, String)> = refs
            .iter()
            .filter(|r| r.id.panel.is_some())
            .filter_map(|r| {
                let core = geographic_core(self.lookup.name_of(&r.id.key())?);
                (core.chars().count() >= MIN_CORE_LEN).then_some((r.id.base, core))
            })
            .collect();

        let mut matches = Vec::new();
        for &chart in self.folio.charts() {
            let direct = affected.contains(&chart)
                || refs.iter().any(|r| {
                    r.id.base == chart && (r.id.panel.is_some() || r.is_direct_form())
                });

            let mut relevant = BTreeSet::new();
            if direct {
                relevant.insert(chart);
            }
            if let Some(core) = self.cores.get(&chart) {
                relevant.extend(
                    panel_cores
                        .iter()
                        .filter(|(_, panel_core)| panel_core == core)
                        .map(|(base, _)| *base),
                );
            }

            if relevant.is_empty() {
                continue;
            }
            matches.push(ChartMatch {
                chart,
                kind: if direct {
                    MatchKind::Direct
                } else {
                    MatchKind::Geographic
                },
                relevant,
            });
        }
        matches
    }
}
