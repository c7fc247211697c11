// src/services/weekly.rs

//! Weekly notices page: document links, week detection and past weeks.
//!
//! The current week is a plain GET. A past week is a form POST that must
//! carry the page's anti-forgery token and the session cookies handed out
//! with it.

use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use chrono::Datelike;
use regex::Regex;
use scraper::Html;
use url::Url;

use super::fetcher::{FetchRequest, Fetcher};
use crate::error::{AppError, Result};
use crate::models::{ChartBlock, DocumentSet, Folio, PdfLink, SourceConfig, WeekInfo};
use crate::utils::http::{cookie_header, parse_html, parse_selector};
use crate::utils::cache::TimedCache;
use crate::utils::resolve_url;

const DOWNLOAD_MARKER: &str = "downloadfile?filename=";

static PAGE_WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{4})\s*Wk\s*(\d{1,2})").expect("static pattern"));
static LONG_WKNM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)wknm(\d{4})(\d{3})\.pdf").expect("static pattern"));
static SHORT_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{2})(?:wknm|snii)(\d{2})\.pdf").expect("static pattern")
});

/// Links and week of one weekly page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPage {
    pub url: String,
    pub week: WeekInfo,
    pub links: Vec<PdfLink>,
}

/// Every document download link on the page, in page order.
pub fn parse_page_links(document: &Html, base_url: &str) -> Result<Vec<PdfLink>> {
    let base = Url::parse(base_url)?;
    let anchors = parse_selector("a[href]")?;

    let links = document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.to_ascii_lowercase().contains(DOWNLOAD_MARKER))
        .filter_map(|href| {
            let url = resolve_url(&base, href);
            let filename = Url::parse(&url)
                .ok()?
                .query_pairs()
                .find(|(k, _)| k.eq_ignore_ascii_case("fileName"))
                .map(|(_, v)| v.into_owned())?;
            Some(PdfLink { url, filename })
        })
        .collect();
    Ok(links)
}

fn week_from(caps: regex::Captures<'_>, two_digit_year: bool) -> Option<WeekInfo> {
    let (year, week) = if two_digit_year {
        let week: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[2].parse().ok()?;
        (2000 + year, week)
    } else {
        (caps[1].parse().ok()?, caps[2].parse().ok()?)
    };
    Some(WeekInfo { year, week })
}

/// Week of a page, from its text or from its document file names.
///
/// When nothing identifies the week, the current year and week `0` are
/// returned.
pub fn week_info(html: &str, links: &[PdfLink]) -> WeekInfo {
    let from_page = PAGE_WEEK
        .captures(html)
        .or_else(|| LONG_WKNM.captures(html))
        .and_then(|caps| week_from(caps, false));
    if let Some(week) = from_page {
        return week;
    }

    let from_links = links.iter().find_map(|link| {
        LONG_WKNM
            .captures(&link.filename)
            .and_then(|caps| week_from(caps, false))
            .or_else(|| {
                SHORT_FILE
                    .captures(&link.filename)
                    .and_then(|caps| week_from(caps, true))
            })
    });
    from_links.unwrap_or_else(|| WeekInfo {
        year: chrono::Utc::now().year(),
        week: 0,
    })
}

/// Chart number and NM number of a `Chart<N>NM<M>...` block file name.
fn parse_block_filename(filename: &str) -> Option<(u32, Option<String>)> {
    let lower = filename.to_ascii_lowercase();
    let rest = lower.strip_prefix("chart")?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !rest[digits..].starts_with("nm") {
        return None;
    }
    let chart = rest[..digits].parse().ok()?;
    let after = &rest[digits + 2..];
    let nm_digits = after.bytes().take_while(u8::is_ascii_digit).count();
    let nm = (nm_digits > 0).then(|| after[..nm_digits].to_string());
    Some((chart, nm))
}

/// Pick the weekly bulletin, the Section II document and chart blocks.
pub fn identify_documents(links: &[PdfLink], folio: &Folio) -> DocumentSet {
    let mut set = DocumentSet::default();

    for link in links {
        let lower = link.filename.to_ascii_lowercase();
        if set.weekly.is_none() && lower.contains("wknm") {
            set.weekly = Some(link.clone());
        } else if set.section_ii.is_none() && lower.contains("snii") {
            set.section_ii = Some(link.clone());
        }

        if let Some((chart, nm_number)) = parse_block_filename(&link.filename) {
            let block = ChartBlock {
                link: link.clone(),
                chart,
                nm_number,
            };
            if folio.contains(chart) {
                set.chart_blocks.push(block.clone());
            }
            set.all_chart_blocks.push(block);
        }
    }
    set
}

/// Value of the anti-forgery hidden input.
pub fn parse_form_token(document: &Html, field: &str) -> Result<Option<String>> {
    let selector = parse_selector(&format!("input[name=\"{field}\"]"))?;
    Ok(document
        .select(&selector)
        .filter_map(|input| input.value().attr("value"))
        .map(str::to_string)
        .next())
}

/// Weeks offered by the page's week picker, newest first as listed.
///
/// Options reading `2026 Wk 08` carry their own year. Bare week numbers
/// take the year currently selected in the year picker.
pub fn parse_available_weeks(document: &Html, source: &SourceConfig) -> Result<Vec<WeekInfo>> {
    let year_options = parse_selector(&format!("select[name=\"{}\"] option", source.year_field))?;
    let week_options = parse_selector(&format!("select[name=\"{}\"] option", source.week_field))?;

    let year: Option<i32> = {
        let mut options = document.select(&year_options);
        let selected = document
            .select(&year_options)
            .find(|o| o.value().attr("selected").is_some());
        selected
            .or_else(|| options.next())
            .and_then(|o| o.value().attr("value").map(str::to_string))
            .and_then(|v| v.trim().parse().ok())
    };

    let mut weeks = Vec::new();
    for option in document.select(&week_options) {
        let label: String = option.text().collect();
        if let Some(week) = PAGE_WEEK
            .captures(&label)
            .and_then(|caps| week_from(caps, false))
        {
            weeks.push(week);
            continue;
        }
        let value = option.value().attr("value").unwrap_or(label.as_str());
        if let (Some(year), Ok(week)) = (year, value.trim().parse::<u32>()) {
            if (1..=53).contains(&week) {
                weeks.push(WeekInfo { year, week });
            }
        }
    }
    weeks.dedup();
    Ok(weeks)
}

/// Client for the weekly notices page.
pub struct WeeklyPageClient {
    fetcher: Arc<dyn Fetcher>,
    source: SourceConfig,
    weeks_cache: Mutex<TimedCache<Vec<WeekInfo>>>,
}

impl WeeklyPageClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, source: SourceConfig, weeks_ttl: Duration) -> Self {
        Self {
            fetcher,
            source,
            weeks_cache: Mutex::new(TimedCache::new(weeks_ttl)),
        }
    }

    fn page_from_html(&self, html: &str) -> Result<WeeklyPage> {
        let document = parse_html(html);
        let links = parse_page_links(&document, &self.source.base_url)?;
        let week = week_info(html, &links);
        Ok(WeeklyPage {
            url: self.source.weekly_url(),
            week,
            links,
        })
    }

    /// The page as currently published.
    pub async fn fetch_current(&self) -> Result<WeeklyPage> {
        let response = self
            .fetcher
            .fetch(&FetchRequest::get(self.source.weekly_url()))
            .await?;
        self.page_from_html(&response.text())
    }

    /// A past week's page, requested through the page's own form.
    pub async fn fetch_week(&self, week: WeekInfo) -> Result<WeeklyPage> {
        let url = self.source.weekly_url();
        let landing = self.fetcher.fetch(&FetchRequest::get(&url)).await?;

        let token = parse_form_token(&parse_html(&landing.text()), &self.source.token_field)?
            .ok_or_else(|| {
                AppError::validation(format!(
                    "{} not found on weekly page",
                    self.source.token_field
                ))
            })?;

        let fields = vec![
            (self.source.token_field.clone(), token),
            (self.source.year_field.clone(), week.year.to_string()),
            (self.source.week_field.clone(), week.week.to_string()),
        ];
        let request =
            FetchRequest::post_form(&url, fields).with_cookies(cookie_header(&landing.set_cookies));
        let response = self.fetcher.fetch(&request).await?;

        let mut page = self.page_from_html(&response.text())?;
        if page.week.week == 0 {
            page.week = week;
        }
        Ok(page)
    }

    /// Current page, or a past week's page when `week` is given.
    pub async fn fetch(&self, week: Option<WeekInfo>) -> Result<WeeklyPage> {
        match week {
            Some(week) => self.fetch_week(week).await,
            None => self.fetch_current().await,
        }
    }

    /// Weeks offered by the page, cached for the configured lifetime.
    pub async fn available_weeks(&self) -> Result<Vec<WeekInfo>> {
        if let Some(weeks) = self.weeks_cache.lock().ok().and_then(|c| c.get()) {
            log::debug!("Available weeks served from cache");
            return Ok(weeks);
        }

        let response = self
            .fetcher
            .fetch(&FetchRequest::get(self.source.weekly_url()))
            .await?;
        let weeks = parse_available_weeks(&parse_html(&response.text()), &self.source)?;

        if let Ok(mut cache) = self.weeks_cache.lock() {
            cache.put(weeks.clone());
        }
        Ok(weeks)
    }
}
