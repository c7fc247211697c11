// src/services/documents.rs

//! Document acquisition: download a bulletin and turn it into text.

use std::path::Path;
use std::sync::Arc;

use super::fetcher::{FetchRequest, Fetcher};
use crate::error::{AppError, Result};
use crate::models::{Document, DocumentKind};

/// Turns document bytes into plain text.
pub trait TextDecoder: Send + Sync {
    /// Whole-document text.
    fn decode(&self, bytes: &[u8]) -> Result<String>;

    /// Text of each page, in page order.
    fn decode_pages(&self, bytes: &[u8]) -> Result<Vec<String>>;
}

/// [`TextDecoder`] for PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextDecoder;

impl TextDecoder for PdfTextDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| AppError::decode("PDF", e))
    }

    fn decode_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| AppError::decode("PDF", e))
    }
}

fn decode_bytes(
    decoder: &dyn TextDecoder,
    bytes: &[u8],
    kind: DocumentKind,
    with_pages: bool,
) -> Result<(String, Option<Vec<String>>)> {
    let (text, pages) = if with_pages {
        let pages = decoder.decode_pages(bytes)?;
        (pages.join("\n"), Some(pages))
    } else {
        (decoder.decode(bytes)?, None)
    };
    if text.trim().is_empty() {
        return Err(AppError::decode(kind.to_string(), "no extractable text"));
    }
    Ok((text, pages))
}

/// Downloads and decodes bulletins.
///
/// Decoding is CPU-bound and runs on the blocking pool so two documents
/// can be processed side by side.
pub struct DocumentLoader {
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<dyn TextDecoder>,
}

impl DocumentLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, decoder: Arc<dyn TextDecoder>) -> Self {
        Self { fetcher, decoder }
    }

    async fn decode(
        &self,
        bytes: Vec<u8>,
        kind: DocumentKind,
        with_pages: bool,
    ) -> Result<(String, Option<Vec<String>>)> {
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decode_bytes(decoder.as_ref(), &bytes, kind, with_pages))
            .await
            .map_err(|e| AppError::decode(kind.to_string(), e))?
    }

    /// Fetch `url` and decode it, keeping per-page text when asked.
    pub async fn load(&self, url: &str, kind: DocumentKind, with_pages: bool) -> Result<Document> {
        let response = self.fetcher.fetch(&FetchRequest::get(url)).await?;
        log::debug!("Downloaded {} ({} bytes)", kind, response.body.len());
        let (text, pages) = self.decode(response.body, kind, with_pages).await?;
        Ok(Document {
            kind,
            url: url.to_string(),
            text,
            pages,
        })
    }

    /// Decode a document from disk.
    pub async fn load_file(
        &self,
        path: impl AsRef<Path>,
        kind: DocumentKind,
        with_pages: bool,
    ) -> Result<Document> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let (text, pages) = self.decode(bytes, kind, with_pages).await?;
        Ok(Document {
            kind,
            url: path.display().to_string(),
            text,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fetcher::FetchResponse;
    use async_trait::async_trait;

    /// Treats bytes as UTF-8 with form feeds between pages.
    struct PlainDecoder;

    impl TextDecoder for PlainDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<String> {
            Ok(self.decode_pages(bytes)?.join("\n"))
        }

        fn decode_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
            let text = std::str::from_utf8(bytes).map_err(|e| AppError::decode("test", e))?;
            Ok(text.split('\x0c').map(str::to_string).collect())
        }
    }

    struct StaticFetcher(&'static [u8]);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _request: &FetchRequest) -> Result<FetchResponse> {
            Ok(FetchResponse {
                status: 200,
                body: self.0.to_vec(),
                set_cookies: Vec::new(),
            })
        }
    }

    fn loader(body: &'static [u8]) -> DocumentLoader {
        DocumentLoader::new(Arc::new(StaticFetcher(body)), Arc::new(PlainDecoder))
    }

    #[tokio::test]
    async fn test_load_with_pages() {
        let doc = loader(b"page one\x0cpage two")
            .load("https://example.com/08snii26.pdf", DocumentKind::SectionII, true)
            .await
            .unwrap();
        assert_eq!(doc.pages.as_ref().map(Vec::len), Some(2));
        assert_eq!(doc.text, "page one\npage two");
        assert_eq!(doc.kind, DocumentKind::SectionII);
    }

    #[tokio::test]
    async fn test_empty_text_is_decode_error() {
        let result = loader(b"  \x0c ")
            .load("https://example.com/08wknm26.pdf", DocumentKind::WeeklyBulletin, false)
            .await;
        assert!(matches!(result, Err(AppError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_undecodable_bytes() {
        let result = loader(&[0xff, 0xfe])
            .load("https://example.com/x.pdf", DocumentKind::SectionII, false)
            .await;
        assert!(matches!(result, Err(AppError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("08snii26.pdf");
        std::fs::write(&path, "770    ENGLAND - East Coast\n").unwrap();
        let doc = loader(b"")
            .load_file(&path, DocumentKind::SectionII, false)
            .await
            .unwrap();
        assert!(doc.text.starts_with("770"));
        assert!(doc.pages.is_none());
    }
}
