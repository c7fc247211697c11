//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Publisher site and weekly page settings
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP fetch behavior settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Extraction run settings
    #[serde(default)]
    pub check: CheckConfig,

    /// Chart-name reference table
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_ms == 0 {
            return Err(AppError::validation("fetch.timeout_ms must be > 0"));
        }
        if self.check.budget_secs == 0 {
            return Err(AppError::validation("check.budget_secs must be > 0"));
        }
        if self.check.max_charts == 0 {
            return Err(AppError::validation("check.max_charts must be > 0"));
        }
        if self.check.render_scale <= 0.0 {
            return Err(AppError::validation("check.render_scale must be > 0"));
        }
        url::Url::parse(&self.source.base_url)
            .map_err(|e| AppError::validation(format!("source.base_url: {e}")))?;
        if self.source.allowed_host.trim().is_empty() {
            return Err(AppError::validation("source.allowed_host is empty"));
        }
        Ok(())
    }
}

/// Publisher site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Site root, e.g. `https://msi.admiralty.co.uk`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Path of the weekly notices page
    #[serde(default = "defaults::weekly_path")]
    pub weekly_path: String,

    /// Only documents on this host are served to the region locator
    #[serde(default = "defaults::allowed_host")]
    pub allowed_host: String,

    /// Hidden anti-forgery input name on the weekly page form
    #[serde(default = "defaults::token_field")]
    pub token_field: String,

    /// Form field carrying the requested year
    #[serde(default = "defaults::year_field")]
    pub year_field: String,

    /// Form field carrying the requested week
    #[serde(default = "defaults::week_field")]
    pub week_field: String,
}

impl SourceConfig {
    /// Absolute URL of the weekly page.
    pub fn weekly_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.weekly_path
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            weekly_path: defaults::weekly_path(),
            allowed_host: defaults::allowed_host(),
            token_field: defaults::token_field(),
            year_field: defaults::year_field(),
            week_field: defaults::week_field(),
        }
    }
}

/// HTTP client and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-attempt timeout in milliseconds
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds
    #[serde(default = "defaults::retry_base_ms")]
    pub retry_base_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_ms: defaults::timeout_ms(),
            max_retries: defaults::max_retries(),
            retry_base_ms: defaults::retry_base_ms(),
        }
    }
}

/// Extraction run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Wall-clock budget for one run in seconds
    #[serde(default = "defaults::budget_secs")]
    pub budget_secs: u64,

    /// Maximum charts accepted in a folio
    #[serde(default = "defaults::max_charts")]
    pub max_charts: usize,

    /// Characters searched after a new T&P header for its affected charts
    #[serde(default = "defaults::tp_lookahead_chars")]
    pub tp_lookahead_chars: usize,

    /// Smallest crop height in rendered pixels before falling back to the full page
    #[serde(default = "defaults::min_crop_height_px")]
    pub min_crop_height_px: f64,

    /// Render scale applied to page-native coordinates
    #[serde(default = "defaults::render_scale")]
    pub render_scale: f64,

    /// Lifetime of the cached available-weeks list in seconds
    #[serde(default = "defaults::weeks_cache_ttl_secs")]
    pub weeks_cache_ttl_secs: u64,
}

impl CheckConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            budget_secs: defaults::budget_secs(),
            max_charts: defaults::max_charts(),
            tp_lookahead_chars: defaults::tp_lookahead_chars(),
            min_crop_height_px: defaults::min_crop_height_px(),
            render_scale: defaults::render_scale(),
            weeks_cache_ttl_secs: defaults::weeks_cache_ttl_secs(),
        }
    }
}

/// Chart-name reference table location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// TOML file mapping chart and panel ids to descriptive names
    #[serde(default)]
    pub path: Option<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Source defaults
    pub fn base_url() -> String {
        "https://msi.admiralty.co.uk".into()
    }
    pub fn weekly_path() -> String {
        "/NoticesToMariners/Weekly".into()
    }
    pub fn allowed_host() -> String {
        "msi.admiralty.co.uk".into()
    }
    pub fn token_field() -> String {
        "__RequestVerificationToken".into()
    }
    pub fn year_field() -> String {
        "SelectedYear".into()
    }
    pub fn week_field() -> String {
        "SelectedWeek".into()
    }

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36".into()
    }
    pub fn timeout_ms() -> u64 {
        20_000
    }
    pub fn max_retries() -> u32 {
        2
    }
    pub fn retry_base_ms() -> u64 {
        1_000
    }

    // Check defaults
    pub fn budget_secs() -> u64 {
        60
    }
    pub fn max_charts() -> usize {
        50
    }
    pub fn tp_lookahead_chars() -> usize {
        5_000
    }
    pub fn min_crop_height_px() -> f64 {
        20.0
    }
    pub fn render_scale() -> f64 {
        2.0
    }
    pub fn weeks_cache_ttl_secs() -> u64 {
        3_600
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetch.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.check.budget_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.source.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_field_defaults() {
        let config: Config = toml::from_str("[fetch]\nmax_retries = 5\n").unwrap();
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.timeout_ms, 20_000);
        assert_eq!(config.check.max_charts, 50);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/definitely/not/here.toml");
        assert_eq!(config.source.weekly_path, "/NoticesToMariners/Weekly");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[check]\nbudget_secs = 5\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.check.budget(), Duration::from_secs(5));
    }

    #[test]
    fn weekly_url_joins_without_double_slash() {
        let mut source = SourceConfig::default();
        source.base_url = "https://example.com/".into();
        assert_eq!(
            source.weekly_url(),
            "https://example.com/NoticesToMariners/Weekly"
        );
    }

    #[test]
    fn shipped_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog.path.as_deref(), Some("data/charts.toml"));
    }
}
