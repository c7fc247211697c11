//! Positioned page text and crop windows.

use serde::{Deserialize, Serialize};

/// A run of text at a position on a page.
///
/// Coordinates are in the page's native space, where `y` grows upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Positioned text for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number
    pub page: usize,
    pub height: f64,
    pub runs: Vec<TextRun>,
}

/// Vertical crop bounds in page-native coordinates (`top > bottom`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropWindow {
    pub top: f64,
    /// `0.0` means the page bottom
    pub bottom: f64,
}

/// Crop bounds in rendered pixel space, `y` growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    pub top: i64,
    pub bottom: i64,
}

impl PixelWindow {
    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }
}

/// What the caller should render for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CropDecision {
    /// Render only this band of the page
    Crop { window: PixelWindow },
    /// Render the whole page
    FullPage,
    /// Show the text excerpt instead of an image
    RawText,
}

impl CropWindow {
    /// Convert to pixel space for a page rendered at `scale`.
    pub fn to_pixels(&self, page_height: f64, scale: f64) -> PixelWindow {
        PixelWindow {
            top: ((page_height - self.top) * scale).round() as i64,
            bottom: ((page_height - self.bottom) * scale).round() as i64,
        }
    }

    /// Crop when the band is tall enough, otherwise show the full page.
    pub fn decide(&self, page_height: f64, scale: f64, min_height_px: f64) -> CropDecision {
        let window = self.to_pixels(page_height, scale);
        if (window.height() as f64) > min_height_px {
            CropDecision::Crop { window }
        } else {
            CropDecision::FullPage
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pixels_flips_axis() {
        let window = CropWindow {
            top: 700.0,
            bottom: 500.0,
        };
        let px = window.to_pixels(800.0, 2.0);
        assert_eq!(px, PixelWindow { top: 200, bottom: 600 });
        assert_eq!(px.height(), 400);
    }

    #[test]
    fn test_small_window_falls_back_to_full_page() {
        let window = CropWindow {
            top: 505.0,
            bottom: 500.0,
        };
        assert_eq!(window.decide(800.0, 2.0, 20.0), CropDecision::FullPage);
    }

    #[test]
    fn test_page_bottom_default() {
        let window = CropWindow {
            top: 300.0,
            bottom: 0.0,
        };
        match window.decide(800.0, 2.0, 20.0) {
            CropDecision::Crop { window } => assert_eq!(window.bottom, 1600),
            other => panic!("unexpected {other:?}"),
        }
    }
}
