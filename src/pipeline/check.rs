// src/pipeline/check.rs

//! Check run: weekly page, both bulletins, extraction, report.
//!
//! Document problems never abort a run. A missing, broken or late document
//! becomes a failure string on the report, and whatever the other document
//! yielded is still returned.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future;
use tokio::time::{Instant as Deadline, timeout_at};

use crate::error::{AppError, Result};
use crate::models::{
    ChartBlock, ChartCatalog, ChartMap, ChartNameLookup, CheckReport, Config, Correction,
    Document, DocumentKind, DocumentSet, Folio, MatchKind, PdfLink, StructuredExcerpt, WeekInfo,
    empty_chart_map,
};
use crate::parser::{self, find_page_for_correction};
use crate::services::{
    DocumentLoader, Fetcher, HttpFetcher, PdfTextDecoder, TextDecoder, WeeklyPage,
    WeeklyPageClient, identify_documents, week_info,
};
use crate::utils::elapsed_ms;

/// NM shown for a chart block whose file name carries no notice number.
const UNKNOWN_NM: &str = "—";

/// Result of acquiring one document: absent from the page, failed, or loaded.
pub type Acquired = Option<Result<Document>>;

/// Runs checks against the publisher site.
pub struct CheckService {
    config: Arc<Config>,
    pages: WeeklyPageClient,
    documents: DocumentLoader,
    lookup: Arc<dyn ChartNameLookup>,
}

impl CheckService {
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn Fetcher>,
        decoder: Arc<dyn TextDecoder>,
        lookup: Arc<dyn ChartNameLookup>,
    ) -> Self {
        let pages = WeeklyPageClient::new(
            Arc::clone(&fetcher),
            config.source.clone(),
            std::time::Duration::from_secs(config.check.weeks_cache_ttl_secs),
        );
        Self {
            pages,
            documents: DocumentLoader::new(fetcher, decoder),
            lookup,
            config,
        }
    }

    /// Wire up the HTTP fetcher, the PDF decoder and the configured catalog.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        let catalog = ChartCatalog::load_or_empty(config.catalog.path.as_deref());
        log::debug!("Chart catalog: {} names", catalog.len());
        Ok(Self::new(
            config,
            fetcher,
            Arc::new(PdfTextDecoder),
            Arc::new(catalog),
        ))
    }

    pub fn pages(&self) -> &WeeklyPageClient {
        &self.pages
    }

    async fn acquire(
        &self,
        link: Option<&PdfLink>,
        kind: DocumentKind,
        with_pages: bool,
        deadline: Deadline,
    ) -> Acquired {
        let link = link?;
        let load = self.documents.load(&link.url, kind, with_pages);
        Some(match timeout_at(deadline, load).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout {
                url: link.url.clone(),
                timeout_ms: self.config.check.budget().as_millis() as u64,
            }),
        })
    }

    async fn load_local(&self, path: Option<&Path>, kind: DocumentKind, with_pages: bool) -> Acquired {
        Some(self.documents.load_file(path?, kind, with_pages).await)
    }

    /// Check the current week, or a past week, against a folio.
    pub async fn run(&self, folio: &Folio, week: Option<WeekInfo>) -> Result<CheckReport> {
        if folio.is_empty() {
            return Err(AppError::validation("No valid chart numbers in folio"));
        }
        let started = Instant::now();
        let deadline = Deadline::now() + self.config.check.budget();
        log::info!("Checking {} charts", folio.len());

        let t0 = Instant::now();
        let page = timeout_at(deadline, self.pages.fetch(week))
            .await
            .map_err(|_| AppError::Timeout {
                url: self.config.source.weekly_url(),
                timeout_ms: self.config.check.budget().as_millis() as u64,
            })??;
        log::debug!("perf fetchWeeklyPage: {}ms", elapsed_ms(t0));

        let documents = identify_documents(&page.links, folio);

        let t0 = Instant::now();
        let (section_ii, weekly) = future::join(
            self.acquire(documents.section_ii.as_ref(), DocumentKind::SectionII, true, deadline),
            self.acquire(documents.weekly.as_ref(), DocumentKind::WeeklyBulletin, false, deadline),
        )
        .await;
        log::debug!("perf downloadPDFs (parallel): {}ms", elapsed_ms(t0));

        let mut report = compile_report(
            &page,
            &documents,
            section_ii,
            weekly,
            folio,
            self.lookup.as_ref(),
            self.config.check.tp_lookahead_chars,
        );
        report.duration_ms = elapsed_ms(started);
        log::debug!("perf totalCheck: {}ms", report.duration_ms);
        log::info!(
            "{}: {} corrections, {} new T&P, {} T&P in force",
            report.week,
            report.total_corrections,
            report.total_tp,
            report.total_tp_in_force
        );
        Ok(report)
    }

    /// Check local bulletin files instead of the publisher site.
    pub async fn scan_files(
        &self,
        section_ii: Option<&Path>,
        weekly: Option<&Path>,
        folio: &Folio,
    ) -> Result<CheckReport> {
        if folio.is_empty() {
            return Err(AppError::validation("No valid chart numbers in folio"));
        }
        let started = Instant::now();

        let link = |path: &Path| PdfLink {
            url: path.display().to_string(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let links: Vec<PdfLink> = section_ii.into_iter().chain(weekly).map(link).collect();
        let page = WeeklyPage {
            url: "local files".into(),
            week: week_info("", &links),
            links,
        };
        let documents = DocumentSet {
            weekly: weekly.map(link),
            section_ii: section_ii.map(link),
            ..DocumentSet::default()
        };

        let (snii, wknm) = future::join(
            self.load_local(section_ii, DocumentKind::SectionII, true),
            self.load_local(weekly, DocumentKind::WeeklyBulletin, false),
        )
        .await;

        let mut report = compile_report(
            &page,
            &documents,
            snii,
            wknm,
            folio,
            self.lookup.as_ref(),
            self.config.check.tp_lookahead_chars,
        );
        report.duration_ms = elapsed_ms(started);
        Ok(report)
    }
}

fn failure_text(kind: DocumentKind, error: &AppError) -> String {
    let label = match kind {
        DocumentKind::SectionII => "Section II (corrections)",
        DocumentKind::WeeklyBulletin => "Weekly NtM (T&P in force)",
    };
    match error {
        AppError::Timeout { .. } => format!("{label} PDF timed out"),
        _ => format!("{label} PDF failed to load"),
    }
}

/// Take the loaded document out of an acquisition, recording any failure.
fn take_document(acquired: Acquired, kind: DocumentKind, failures: &mut Vec<String>) -> Option<Document> {
    match acquired {
        Some(Ok(document)) => Some(document),
        Some(Err(e)) => {
            log::error!("{} PDF download/parse failed: {}", kind, e);
            failures.push(failure_text(kind, &e));
            None
        }
        None => {
            log::warn!("{} PDF not found on UKHO page", kind);
            failures.push(format!("{kind} PDF not found on UKHO page"));
            None
        }
    }
}

/// Attach chart block files to their text corrections, or list them on their own.
pub fn attach_chart_blocks(corrections: &mut ChartMap<Correction>, blocks: &[ChartBlock]) {
    for block in blocks {
        let Some(list) = corrections.get_mut(&block.chart) else {
            continue;
        };
        let nm_number = block.nm_number.clone().unwrap_or_else(|| UNKNOWN_NM.to_string());

        if let Some(existing) = list.iter_mut().find(|c| c.nm_number == nm_number) {
            existing.block_url = Some(block.link.url.clone());
            existing.block_filename = Some(block.link.filename.clone());
            continue;
        }

        let excerpt = format!("Chart block correction: {}", block.link.filename);
        list.push(Correction {
            nm_number,
            fields: StructuredExcerpt {
                subject: excerpt.clone(),
                ..StructuredExcerpt::default()
            },
            excerpt,
            is_block_supplement: true,
            match_kind: MatchKind::Direct,
            pdf_page: None,
            block_url: Some(block.link.url.clone()),
            block_filename: Some(block.link.filename.clone()),
        });
    }
}

fn assign_pages(corrections: &mut ChartMap<Correction>, pages: &[String]) {
    for (chart, list) in corrections.iter_mut() {
        let chart = chart.to_string();
        for correction in list.iter_mut() {
            correction.pdf_page = find_page_for_correction(pages, &correction.nm_number, &chart);
        }
    }
}

fn total<T>(map: &ChartMap<T>) -> usize {
    map.values().map(Vec::len).sum()
}

/// Build a report from whatever the two documents yielded.
///
/// Corrections and new T&P notices come from Section II. When Section II is
/// unusable they are read from the weekly bulletin, which reprints it. The
/// in-force list only exists in the weekly bulletin.
pub fn compile_report(
    page: &WeeklyPage,
    documents: &DocumentSet,
    section_ii: Acquired,
    weekly: Acquired,
    folio: &Folio,
    lookup: &dyn ChartNameLookup,
    tp_lookahead: usize,
) -> CheckReport {
    let mut failures = Vec::new();
    let section_ii = take_document(section_ii, DocumentKind::SectionII, &mut failures);
    let weekly = take_document(weekly, DocumentKind::WeeklyBulletin, &mut failures);

    let mut corrections = empty_chart_map(folio);
    let mut tp_notices = empty_chart_map(folio);

    let corrections_source = match (&section_ii, &weekly) {
        (Some(doc), _) => Some(doc),
        (None, Some(doc)) => {
            log::warn!("Reading corrections from the weekly bulletin");
            Some(doc)
        }
        (None, None) => None,
    };

    if let Some(doc) = corrections_source {
        let t0 = Instant::now();
        let extraction = parser::extract(&doc.text, doc.kind, folio, lookup, tp_lookahead);
        if !extraction.boundary_found {
            log::warn!("{}: no notice header found", doc.kind);
        }
        corrections = extraction.corrections;
        tp_notices = extraction.tp_notices;
        if let Some(pages) = &doc.pages {
            assign_pages(&mut corrections, pages);
        }
        log::debug!("perf parse{}: {}ms", doc.kind, elapsed_ms(t0));
    }

    let (tp_in_force, tp_in_force_available) = match &weekly {
        Some(doc) => {
            let t0 = Instant::now();
            let list = parser::find_tp_in_force(&doc.text, folio);
            log::debug!("perf parseWKNM: {}ms", elapsed_ms(t0));
            (list.entries, list.available)
        }
        None => (empty_chart_map(folio), false),
    };

    attach_chart_blocks(&mut corrections, &documents.chart_blocks);

    CheckReport {
        week: page.week,
        charts: folio.clone(),
        total_corrections: total(&corrections),
        total_tp: total(&tp_notices),
        total_tp_in_force: total(&tp_in_force),
        corrections,
        tp_notices,
        tp_in_force,
        tp_in_force_available,
        failures,
        all_block_charts: documents.all_chart_blocks.iter().map(|b| b.chart).collect(),
        matching_blocks: documents
            .chart_blocks
            .iter()
            .map(|b| b.link.filename.clone())
            .collect(),
        pdf_count: page.links.len(),
        weekly_file: documents.weekly.as_ref().map(|l| l.filename.clone()),
        section_ii_file: documents.section_ii.as_ref().map(|l| l.filename.clone()),
        section_ii_url: documents.section_ii.as_ref().map(|l| l.url.clone()),
        checked_at: Utc::now(),
        duration_ms: 0,
        source_url: page.url.clone(),
    }
}
