use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Timeout applied when neither the site entry nor the global config sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP status code considered "up" unless a site overrides it.
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("invalid site URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("site URL must use http or https: {0}")]
    UnsupportedScheme(String),
    #[error("timeout must be greater than zero for {0}")]
    ZeroTimeout(String),
}

/// One monitored HTTP(S) endpoint. Immutable once constructed; read by every
/// poll cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSpec {
    url: Url,
    name: Option<String>,
    timeout: Duration,
    expected_status: u16,
}

impl SiteSpec {
    /// Parse and validate the URL; everything else starts at its default.
    pub fn new(url: &str) -> Result<Self, SiteError> {
        let parsed = Url::parse(url).map_err(|e| SiteError::InvalidUrl {
            url: url.to_string(),
            source: e,
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(SiteError::UnsupportedScheme(url.to_string()));
        }
        Ok(Self {
            url: parsed,
            name: None,
            timeout: DEFAULT_TIMEOUT,
            expected_status: DEFAULT_EXPECTED_STATUS,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, SiteError> {
        if timeout.is_zero() {
            return Err(SiteError::ZeroTimeout(self.url.to_string()));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_expected_status(mut self, code: u16) -> Self {
        self.expected_status = code;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }

    /// The label shown in logs: the explicit name, or the URL's host.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.url.host_str().unwrap_or_else(|| self.url.as_str()),
        }
    }
}
