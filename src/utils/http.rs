// src/utils/http.rs

//! HTTP client utilities.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Parse a page body as HTML.
pub fn parse_html(body: &str) -> Html {
    Html::parse_document(body)
}

/// Parse a CSS selector, mapping failures to [`AppError::Selector`].
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Build a `Cookie` request header from `Set-Cookie` response values.
///
/// Only the `name=value` pair of each cookie is kept; attributes such as
/// `Path` or `HttpOnly` are dropped.
pub fn cookie_header<S: AsRef<str>>(set_cookies: &[S]) -> Option<String> {
    let pairs: Vec<&str> = set_cookies
        .iter()
        .filter_map(|c| c.as_ref().split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("a[href]").is_ok());
        assert!(parse_selector("select option").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_cookie_header() {
        let cookies = [
            "ASP.NET_SessionId=abc123; path=/; HttpOnly",
            "__RequestVerificationToken=tok; path=/",
            "garbage",
        ];
        assert_eq!(
            cookie_header(&cookies).as_deref(),
            Some("ASP.NET_SessionId=abc123; __RequestVerificationToken=tok")
        );
        assert_eq!(cookie_header::<&str>(&[]), None);
    }

    #[test]
    fn test_client_builds_from_defaults() {
        assert!(create_async_client(&FetchConfig::default()).is_ok());
    }
}
