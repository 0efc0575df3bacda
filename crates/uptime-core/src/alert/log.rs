use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::AlertSink;
use crate::monitor::{CheckResult, SiteStatus};

/// Default sink: reports status changes through `tracing`.
///
/// A new `down` always warns. "Recovered" is announced only for the
/// down-to-up transition; any other transition (including error-to-up) is a
/// plain debug line.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn on_status_change(&self, result: &CheckResult, previous: Option<SiteStatus>) {
        match result.status {
            SiteStatus::Down => {
                let error = result
                    .error_message
                    .clone()
                    .or_else(|| result.status_code.map(|c| format!("HTTP {c}")))
                    .unwrap_or_default();
                warn!(
                    url = %result.url,
                    previous = previous.map(SiteStatus::as_str),
                    error = %error,
                    "ALERT: site is DOWN"
                );
            }
            SiteStatus::Up if previous == Some(SiteStatus::Down) => {
                info!(
                    url = %result.url,
                    response_time_ms = result.response_time_ms,
                    "RECOVERED: site is back UP"
                );
            }
            _ => {
                debug!(
                    url = %result.url,
                    previous = previous.map(SiteStatus::as_str),
                    status = %result.status,
                    "Status changed"
                );
            }
        }
    }
}
