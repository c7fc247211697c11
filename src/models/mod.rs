// src/models/mod.rs

//! Domain models for the checker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod chart;
mod config;
mod layout;
mod notice;
mod report;

// Re-export all public types
pub use chart::{ChartCatalog, ChartId, ChartNameLookup, DEFAULT_CHARTS, Folio, MAX_CHART_NUMBER};
pub use config::{CatalogConfig, CheckConfig, Config, FetchConfig, LoggingConfig, SourceConfig};
pub use layout::{CropDecision, CropWindow, PageLayout, PixelWindow, TextRun};
pub use notice::{Document, DocumentKind, Notice, TpKind};
pub use report::{
    ChartBlock, ChartMap, ChartSection, CheckReport, Correction, DocumentSet, InForceList,
    MatchKind, PdfLink, StructuredExcerpt, TpEntry, WeekInfo, empty_chart_map,
};
