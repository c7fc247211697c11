//! Chart numbers, folios and the chart-name reference table.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Largest chart number accepted in a folio.
pub const MAX_CHART_NUMBER: u32 = 99_999;

/// Folio used when the caller has none of their own.
pub const DEFAULT_CHARTS: [u32; 5] = [1491, 1534, 1535, 1543, 2052];

/// A deduplicated, ascending set of chart numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Folio(Vec<u32>);

impl Folio {
    /// Build a folio from loose user input.
    ///
    /// Values that are not numbers in `1..=99999` are dropped; the rest are
    /// deduplicated and sorted. More than `max_charts` charts is an error.
    pub fn from_values<I, S>(values: I, max_charts: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let charts: BTreeSet<u32> = values
            .into_iter()
            .filter_map(|v| v.as_ref().trim().parse::<u32>().ok())
            .filter(|n| (1..=MAX_CHART_NUMBER).contains(n))
            .collect();

        if charts.len() > max_charts {
            return Err(AppError::validation(format!(
                "folio has {} charts, limit is {}",
                charts.len(),
                max_charts
            )));
        }
        Ok(Self(charts.into_iter().collect()))
    }

    /// Build a folio from chart numbers that are already integers.
    pub fn from_charts(charts: impl IntoIterator<Item = u32>, max_charts: usize) -> Result<Self> {
        Self::from_values(charts.into_iter().map(|c| c.to_string()), max_charts)
    }

    pub fn charts(&self) -> &[u32] {
        &self.0
    }

    pub fn contains(&self, chart: u32) -> bool {
        self.0.binary_search(&chart).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for Folio {
    fn default() -> Self {
        Self(DEFAULT_CHARTS.to_vec())
    }
}

/// A chart or panel identifier as printed, e.g. `1491` or `5614_4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChartId {
    pub base: u32,
    pub panel: Option<u32>,
}

impl ChartId {
    /// Parse `1491` or `5614_4`; anything else is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let (base, panel) = match token.split_once('_') {
            Some((base, panel)) => (base, Some(panel)),
            None => (token, None),
        };
        if base.is_empty() || base.len() > 5 || !base.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let panel = match panel {
            Some(p) if !p.is_empty() && p.len() <= 3 && p.bytes().all(|b| b.is_ascii_digit()) => {
                Some(p.parse().ok()?)
            }
            Some(_) => return None,
            None => None,
        };
        Some(Self {
            base: base.parse().ok()?,
            panel,
        })
    }

    /// Key used in the chart-name table.
    pub fn key(&self) -> String {
        match self.panel {
            Some(panel) => format!("{}_{}", self.base, panel),
            None => self.base.to_string(),
        }
    }
}

/// Lookup from chart or panel id to its descriptive name.
pub trait ChartNameLookup: Send + Sync {
    /// Name for a key such as `1534` or `5614_4`.
    fn name_of(&self, key: &str) -> Option<&str>;
}

/// Static chart-name reference data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartCatalog {
    #[serde(default)]
    charts: HashMap<String, String>,
}

impl ChartCatalog {
    pub fn new(charts: HashMap<String, String>) -> Self {
        Self { charts }
    }

    /// Load the table from a TOML file with a `[charts]` section.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load the table, or return an empty one (geographic matching disabled).
    pub fn load_or_empty(path: Option<&str>) -> Self {
        let Some(path) = path else {
            log::debug!("No chart catalog configured; geographic matching disabled");
            return Self::default();
        };
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Chart catalog load failed from {}: {}. Using empty table.", path, e);
            Self::default()
        })
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

impl ChartNameLookup for ChartCatalog {
    fn name_of(&self, key: &str) -> Option<&str> {
        self.charts.get(key).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for ChartCatalog {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
