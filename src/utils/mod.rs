//! Utility functions and helpers.

pub mod cache;
pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the host from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Milliseconds elapsed since `start`, for `perf` log lines.
pub fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://msi.admiralty.co.uk/NoticesToMariners/Weekly").unwrap();
        assert_eq!(
            resolve_url(&base, "/NoticesToMariners/DownloadFile?fileName=08wknm26.pdf"),
            "https://msi.admiralty.co.uk/NoticesToMariners/DownloadFile?fileName=08wknm26.pdf"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_get_domain() {
        assert_eq!(
            get_domain("https://msi.admiralty.co.uk/path"),
            Some("msi.admiralty.co.uk".to_string())
        );
        assert_eq!(get_domain("not a url"), None);
    }
}
