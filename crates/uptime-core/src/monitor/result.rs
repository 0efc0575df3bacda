use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of one availability check.
///
/// `Error` is deliberately distinct from `Down`: it marks a client-side or
/// transport-library fault where the target's reachability is unknown, not
/// confirmed-bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Up,
    Down,
    Error,
}

impl SiteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one site availability check.
///
/// Field order is a compatibility contract: the file sink serializes this
/// struct verbatim and existing log consumers parse the resulting NDJSON
/// records. Absent options serialize as `null`, never omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub url: String,
    pub status: SiteStatus,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    /// A completed exchange whose status code matched the expectation.
    pub fn up(url: impl Into<String>, status_code: u16, response_time_ms: f64) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Up,
            status_code: Some(status_code),
            response_time_ms: Some(response_time_ms),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// A completed exchange with an unexpected status code.
    pub fn down_with_status(
        url: impl Into<String>,
        status_code: u16,
        response_time_ms: f64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Down,
            status_code: Some(status_code),
            response_time_ms: Some(response_time_ms),
            error_message: Some(error_message.into()),
            timestamp: Utc::now(),
        }
    }

    /// A failure before any response arrived (timeout, connection refused).
    pub fn down(url: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Down,
            status_code: None,
            response_time_ms: None,
            error_message: Some(error_message.into()),
            timestamp: Utc::now(),
        }
    }

    /// A transport-level fault where the target's state is unknown.
    pub fn transport_error(url: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Error,
            status_code: None,
            response_time_ms: None,
            error_message: Some(error_message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == SiteStatus::Up
    }
}
