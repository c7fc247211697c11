//! Notice and document data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which published bulletin a piece of text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// The weekly omnibus bulletin (in-force list and all sections)
    WeeklyBulletin,
    /// The standalone Section II corrections document
    SectionII,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeeklyBulletin => write!(f, "Weekly NtM"),
            Self::SectionII => write!(f, "Section II"),
        }
    }
}

/// Decoded text of one bulletin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub kind: DocumentKind,
    pub url: String,
    pub text: String,
    /// Per-page text, kept for page continuity lookups.
    pub pages: Option<Vec<String>>,
}

/// Temporary or preliminary marker on a notice number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TpKind {
    Temporary,
    Preliminary,
}

impl TpKind {
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'T' => Some(Self::Temporary),
            'P' => Some(Self::Preliminary),
            _ => None,
        }
    }
}

/// One logical notice from the corrections region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Printed number without the trailing `*`, e.g. `770` or `762(T)/26`
    pub nm_number: String,

    /// Numeric part of the notice number
    pub base_number: u32,

    /// Marked `*` (new this edition)
    pub is_new: bool,

    /// `(T)/YY` or `(P)/YY` suffix
    pub tp_kind: Option<TpKind>,

    /// Text of every fragment, merged in encounter order
    pub raw_text: String,

    pub source: DocumentKind,
}

impl Notice {
    /// Temporary or preliminary notice.
    pub fn is_tp(&self) -> bool {
        self.tp_kind.is_some()
    }

    /// First line of the notice (its header).
    pub fn header_line(&self) -> &str {
        self.raw_text.lines().next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line_and_tp_flag() {
        let notice = Notice {
            nm_number: "762(T)/26".into(),
            base_number: 762,
            is_new: false,
            tp_kind: TpKind::from_letter('T'),
            raw_text: "762(T)/26    WALES - Milford Haven\nCharts affected - 3274".into(),
            source: DocumentKind::SectionII,
        };
        assert!(notice.is_tp());
        assert_eq!(notice.header_line(), "762(T)/26    WALES - Milford Haven");
        assert_eq!(TpKind::from_letter('X'), None);
    }
}
