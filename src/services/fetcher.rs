// src/services/fetcher.rs

//! Resilient fetch layer.
//!
//! Every attempt is bounded by a timeout. Transient failures (timeouts,
//! connection errors, 5xx) are retried with exponential backoff; terminal
//! ones (4xx, malformed URLs) are returned at once.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;
use crate::utils::http::create_async_client;

/// Request method and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    /// `application/x-www-form-urlencoded` POST
    PostForm(Vec<(String, String)>),
}

/// One outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    /// Value for the `Cookie` header
    pub cookies: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            cookies: None,
        }
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            method: Method::PostForm(fields),
            cookies: None,
        }
    }

    pub fn with_cookies(mut self, cookies: Option<String>) -> Self {
        self.cookies = cookies;
        self
    }
}

/// A successful response.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Raw `Set-Cookie` header values
    pub set_cookies: Vec<String>,
}

impl FetchResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Anything that can perform a [`FetchRequest`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Timeout and backoff settings for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
            retry_base: Duration::from_millis(config.retry_base_ms),
        }
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Run `attempt` until it succeeds, fails terminally, or retries run out.
///
/// The closure receives the zero-based attempt number.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, url: &str, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut n = 0;
    loop {
        let result = match tokio::time::timeout(policy.timeout, attempt(n)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout {
                url: url.to_string(),
                timeout_ms: policy.timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && n < policy.max_retries => {
                let delay = policy.backoff(n);
                log::warn!(
                    "Fetch {} failed (attempt {}/{}): {}. Retrying in {}ms",
                    url,
                    n + 1,
                    policy.max_retries + 1,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                n += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// [`Fetcher`] over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            policy: RetryPolicy::from_config(config),
        })
    }

    async fn send_once(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let url = url::Url::parse(&request.url)?;
        let mut builder = match &request.method {
            Method::Get => self.client.get(url),
            Method::PostForm(fields) => self.client.post(url).form(fields),
        };
        if let Some(cookies) = &request.cookies {
            builder = builder.header(COOKIE, cookies);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            set_cookies,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        with_retry(&self.policy, &request.url, |_| self.send_once(request)).await
    }
}
