// src/services/region.rs

//! Keyed crop-window queries for rendering a correction's part of a page.
//!
//! The service never fails outward: anything that goes wrong degrades to
//! showing the full page, or the text excerpt when the page itself cannot
//! be read.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{CheckConfig, CropDecision, PageLayout};
use crate::parser::locate_crop;
use crate::utils::get_domain;

/// Positioned text for a page of a document.
#[async_trait]
pub trait PageLayoutSource: Send + Sync {
    /// Layout of 1-based `page` of the document at `url`.
    async fn page_layout(&self, url: &str, page: usize) -> Result<PageLayout>;
}

/// Layouts read from a JSON dump (`[{"page", "height", "runs": [...]}]`).
#[derive(Debug, Clone, Default)]
pub struct JsonLayoutFile {
    pages: Vec<PageLayout>,
}

impl JsonLayoutFile {
    pub fn new(pages: Vec<PageLayout>) -> Self {
        Self { pages }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl PageLayoutSource for JsonLayoutFile {
    async fn page_layout(&self, _url: &str, page: usize) -> Result<PageLayout> {
        self.pages
            .iter()
            .find(|p| p.page == page)
            .cloned()
            .ok_or_else(|| AppError::validation(format!("page {page} out of range")))
    }
}

/// Answers "which band of this page shows chart X of notice N".
pub struct RegionService {
    layouts: Arc<dyn PageLayoutSource>,
    allowed_host: String,
    render_scale: f64,
    min_crop_height_px: f64,
}

impl RegionService {
    pub fn new(layouts: Arc<dyn PageLayoutSource>, allowed_host: &str, check: &CheckConfig) -> Self {
        Self {
            layouts,
            allowed_host: allowed_host.to_string(),
            render_scale: check.render_scale,
            min_crop_height_px: check.min_crop_height_px,
        }
    }

    /// Only documents from the configured host are served.
    pub fn check_host(&self, url: &str) -> Result<()> {
        match get_domain(url) {
            Some(host) if host.eq_ignore_ascii_case(&self.allowed_host) => Ok(()),
            _ => Err(AppError::Forbidden(url.to_string())),
        }
    }

    /// Crop decision for `chart` of notice `nm` on 1-based `page` of `url`.
    pub async fn crop_window(&self, url: &str, page: usize, chart: &str, nm: &str) -> CropDecision {
        if let Err(e) = self.check_host(url) {
            log::warn!("Region query refused: {}", e);
            return CropDecision::RawText;
        }
        if page == 0 {
            return CropDecision::RawText;
        }

        let layout = match self.layouts.page_layout(url, page).await {
            Ok(layout) => layout,
            Err(e) => {
                log::warn!("Page {} of {} unavailable: {}", page, url, e);
                return CropDecision::RawText;
            }
        };

        match locate_crop(&layout.runs, nm, chart, layout.height) {
            Some(window) => window.decide(layout.height, self.render_scale, self.min_crop_height_px),
            None => {
                log::debug!("No anchor for NM {} chart {} on page {}", nm, chart, page);
                CropDecision::FullPage
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PixelWindow, TextRun};

    const URL: &str = "https://msi.admiralty.co.uk/NoticesToMariners/DownloadFile?fileName=08snii26.pdf";

    fn run(text: &str, y: f64) -> TextRun {
        TextRun {
            text: text.into(),
            x: 0.0,
            y,
        }
    }

    fn service() -> RegionService {
        let layouts = JsonLayoutFile::new(vec![
            PageLayout {
                page: 3,
                height: 842.0,
                runs: vec![
                    run("770    ENGLAND - East Coast", 700.0),
                    run("Chart 1491 [ previous update 200/24 ]", 680.0),
                    run("Insert light", 665.0),
                    run("771    WALES - South", 600.0),
                ],
            },
            PageLayout {
                page: 4,
                height: 842.0,
                runs: vec![run("Chart 2052", 838.0), run("Chart 2693", 830.0)],
            },
        ]);
        RegionService::new(
            Arc::new(layouts),
            "msi.admiralty.co.uk",
            &CheckConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_crop_for_chart() {
        let decision = service().crop_window(URL, 3, "1491", "770").await;
        assert_eq!(
            decision,
            CropDecision::Crop {
                window: PixelWindow { top: 284, bottom: 460 }
            }
        );
    }

    #[tokio::test]
    async fn test_foreign_host_is_refused() {
        let decision = service()
            .crop_window("https://evil.example.com/x.pdf", 3, "1491", "770")
            .await;
        assert_eq!(decision, CropDecision::RawText);
    }

    #[tokio::test]
    async fn test_missing_page_degrades_to_text() {
        assert_eq!(service().crop_window(URL, 9, "1491", "770").await, CropDecision::RawText);
    }

    #[tokio::test]
    async fn test_unlocatable_or_thin_band_is_full_page() {
        assert_eq!(service().crop_window(URL, 3, "9999", "999").await, CropDecision::FullPage);
        // top is clamped to the page edge and the next chart line is right below
        assert_eq!(service().crop_window(URL, 4, "2052", "771").await, CropDecision::FullPage);
    }

    #[test]
    fn test_layout_file_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(
            &path,
            r#"[{"page": 1, "height": 842.0, "runs": [{"text": "Chart 1491", "x": 1.0, "y": 2.0}]}]"#,
        )
        .unwrap();
        assert!(JsonLayoutFile::load(&path).is_ok());
    }
}
