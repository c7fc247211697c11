//! Service layer: everything that talks to the publisher site or reads
//! documents.
//!
//! - Resilient fetching (`HttpFetcher`, `with_retry`)
//! - Weekly page discovery (`WeeklyPageClient`)
//! - Document download and text decoding (`DocumentLoader`)
//! - Crop-window queries for rendering (`RegionService`)

mod documents;
mod fetcher;
mod region;
mod weekly;

pub use documents::{DocumentLoader, PdfTextDecoder, TextDecoder};
pub use fetcher::{FetchRequest, FetchResponse, Fetcher, HttpFetcher, Method, RetryPolicy, with_retry};
pub use region::{JsonLayoutFile, PageLayoutSource, RegionService};
pub use weekly::{
    WeeklyPage, WeeklyPageClient, identify_documents, parse_available_weeks, parse_form_token,
    parse_page_links, week_info,
};
