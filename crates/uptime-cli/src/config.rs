//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! default_timeout_secs = 10
//! interval_secs = 60
//! log_format = "pretty"
//! history_file = "uptime_history.jsonl"
//!
//! sites = [
//!   "https://example.com",
//!   { url = "https://api.example.com/health", name = "api",
//!     timeout_secs = 5, expected_status = 204 },
//! ]
//!
//! [[webhook]]
//! url = "https://hooks.example.com/uptime"
//! events = ["site_down", "site_recovered"]
//! secret = "signing-key"
//!
//! [pagerduty]
//! routing_key = "R0UT1NGKEY"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use uptime_core::{CheckerConfig, SiteError, SiteSpec, WebhookConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: f64,

    #[serde(default)]
    pub interval_secs: Option<u64>,

    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default)]
    pub history_file: Option<PathBuf>,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub max_concurrent_checks: Option<usize>,

    #[serde(default)]
    pub sites: Vec<SiteEntry>,

    #[serde(default)]
    pub webhook: Vec<WebhookConfig>,

    #[serde(default)]
    pub pagerduty: Option<PagerDutyConfig>,
}

/// A site is either a bare URL with all defaults applied, or a full record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SiteEntry {
    Url(String),
    Detailed(SiteDef),
}

impl SiteEntry {
    fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Detailed(def) => &def.url,
        }
    }

    fn timeout_secs(&self) -> Option<f64> {
        match self {
            Self::Url(_) => None,
            Self::Detailed(def) => def.timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteDef {
    pub url: String,
    pub name: Option<String>,
    pub timeout_secs: Option<f64>,
    pub expected_status: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagerDutyConfig {
    pub routing_key: String,
}

fn default_timeout_secs() -> f64 {
    10.0
}

fn default_log_format() -> String {
    "pretty".into()
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.sites.is_empty() {
            return Err("No sites configured".into());
        }

        if self.default_timeout_secs <= 0.0 {
            return Err("default_timeout_secs must be greater than zero".into());
        }

        let mut seen = HashSet::new();
        for (i, entry) in self.sites.iter().enumerate() {
            let parsed = url::Url::parse(entry.url())
                .map_err(|e| format!("Invalid site URL at index {}: {} ({})", i, entry.url(), e))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(format!(
                    "Site URL must use http or https: {}",
                    entry.url()
                ));
            }
            if !seen.insert(entry.url()) {
                return Err(format!("Duplicate site URL: {}", entry.url()));
            }
            if let Some(timeout) = entry.timeout_secs() {
                if timeout <= 0.0 {
                    return Err(format!(
                        "Timeout must be greater than zero for {}",
                        entry.url()
                    ));
                }
            }
        }

        for (i, wh) in self.webhook.iter().enumerate() {
            url::Url::parse(&wh.url)
                .map_err(|e| format!("Invalid webhook URL at index {}: {} ({})", i, wh.url, e))?;
        }

        match self.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        Ok(())
    }

    /// Materialize the site list, applying the global default timeout to
    /// entries that do not set their own.
    pub fn to_site_specs(&self) -> Result<Vec<SiteSpec>, SiteError> {
        let default_timeout = Duration::from_secs_f64(self.default_timeout_secs);

        self.sites
            .iter()
            .map(|entry| match entry {
                SiteEntry::Url(url) => SiteSpec::new(url)?.with_timeout(default_timeout),
                SiteEntry::Detailed(def) => {
                    let timeout = def
                        .timeout_secs
                        .map(Duration::from_secs_f64)
                        .unwrap_or(default_timeout);
                    let mut spec = SiteSpec::new(&def.url)?.with_timeout(timeout)?;
                    if let Some(name) = &def.name {
                        spec = spec.with_name(name);
                    }
                    if let Some(code) = def.expected_status {
                        spec = spec.with_expected_status(code);
                    }
                    Ok(spec)
                }
            })
            .collect()
    }

    /// Core checker config, with the CLI's interval override applied last.
    pub fn checker_config(&self, interval_override: Option<u64>) -> CheckerConfig {
        let interval_secs = interval_override.or(self.interval_secs).unwrap_or(60);

        let mut config = CheckerConfig::default()
            .with_default_timeout(Duration::from_secs_f64(self.default_timeout_secs))
            .with_poll_interval(Duration::from_secs(interval_secs));
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(max) = self.max_concurrent_checks {
            config = config.with_max_concurrent_checks(max);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
sites = ["https://example.com"]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.default_timeout_secs, 10.0);
        assert_eq!(config.log_format, "pretty");
        assert!(config.webhook.is_empty());
        assert!(config.pagerduty.is_none());

        let specs = config.to_site_specs().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].timeout(), Duration::from_secs(10));
        assert_eq!(specs[0].expected_status(), 200);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
default_timeout_secs = 5
interval_secs = 30
log_format = "json"
history_file = "history.jsonl"
max_concurrent_checks = 8

sites = [
  "https://example.com",
  { url = "https://api.example.com/health", name = "api", timeout_secs = 2.5, expected_status = 204 },
]

[[webhook]]
url = "https://hooks.example.com/uptime"
events = ["site_down", "site_recovered"]
secret = "my-key"

[pagerduty]
routing_key = "abc123"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.interval_secs, Some(30));
        assert_eq!(config.log_format, "json");
        assert_eq!(
            config.history_file.as_deref(),
            Some(Path::new("history.jsonl"))
        );
        assert_eq!(config.webhook.len(), 1);
        assert_eq!(config.webhook[0].events, vec!["site_down", "site_recovered"]);
        assert_eq!(config.webhook[0].secret.as_deref(), Some("my-key"));
        assert_eq!(
            config.pagerduty.as_ref().map(|p| p.routing_key.as_str()),
            Some("abc123")
        );

        let specs = config.to_site_specs().unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].timeout(), Duration::from_secs(5));
        assert_eq!(specs[0].display_name(), "example.com");
        assert_eq!(specs[1].display_name(), "api");
        assert_eq!(specs[1].timeout(), Duration::from_secs_f64(2.5));
        assert_eq!(specs[1].expected_status(), 204);

        let checker = config.checker_config(None);
        assert_eq!(checker.poll_interval, Duration::from_secs(30));
        assert_eq!(checker.max_concurrent_checks, 8);
    }

    #[test]
    fn interval_flag_overrides_config() {
        let toml = r#"
interval_secs = 300
sites = ["https://example.com"]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let checker = config.checker_config(Some(15));
        assert_eq!(checker.poll_interval, Duration::from_secs(15));
    }

    #[test]
    fn interval_defaults_to_sixty() {
        let toml = r#"
sites = ["https://example.com"]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let checker = config.checker_config(None);
        assert_eq!(checker.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn validate_rejects_empty_sites() {
        let config: AppConfig = toml::from_str("").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("No sites"), "{}", err);
    }

    #[test]
    fn validate_rejects_invalid_url() {
        let toml = r#"
sites = ["not-a-url"]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid site URL"), "{}", err);
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let toml = r#"
sites = ["ftp://example.com/file"]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("must use http or https"), "{}", err);
    }

    #[test]
    fn validate_rejects_duplicate_urls() {
        let toml = r#"
sites = [
  "https://example.com",
  { url = "https://example.com", name = "again" },
]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Duplicate site URL"), "{}", err);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let toml = r#"
sites = [{ url = "https://example.com", timeout_secs = 0 }]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("greater than zero"), "{}", err);
    }

    #[test]
    fn validate_rejects_bad_log_format() {
        let toml = r#"
log_format = "xml"
sites = ["https://example.com"]
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log_format"), "{}", err);
    }

    #[test]
    fn validate_rejects_invalid_webhook_url() {
        let toml = r#"
sites = ["https://example.com"]

[[webhook]]
url = "not-valid"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid webhook URL"), "{}", err);
    }
}
