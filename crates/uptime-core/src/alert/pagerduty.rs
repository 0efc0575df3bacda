//! PagerDuty Events API v2 sink.
//!
//! A site going down triggers an incident keyed by its URL; the down-to-up
//! transition resolves the same incident. Other transitions send nothing, so
//! an error-to-up flap never resolves an incident that was not triggered.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use super::AlertSink;
use crate::monitor::{CheckResult, SiteStatus};

const EVENTS_API_URL: &str = "https://events.pagerduty.com/v2/enqueue";

pub struct PagerDutySink {
    routing_key: String,
    api_url: String,
    client: Client,
}

impl PagerDutySink {
    pub fn new(routing_key: impl Into<String>, client: Client) -> Self {
        Self {
            routing_key: routing_key.into(),
            api_url: EVENTS_API_URL.to_string(),
            client,
        }
    }

    /// Point at a different Events API endpoint (tests, proxies).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn dedup_key(url: &str) -> String {
        format!("uptime-{url}")
    }

    async fn enqueue(&self, event: serde_json::Value) {
        let response = self.client.post(&self.api_url).json(&event).send().await;
        match response {
            Ok(resp) if resp.status().is_success() => {
                debug!(api_url = %self.api_url, "PagerDuty event accepted");
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "PagerDuty rejected event");
            }
            Err(e) => {
                warn!(error = %e, "Failed to send PagerDuty event");
            }
        }
    }
}

#[async_trait]
impl AlertSink for PagerDutySink {
    fn name(&self) -> &'static str {
        "pagerduty"
    }

    async fn on_status_change(&self, result: &CheckResult, previous: Option<SiteStatus>) {
        let event = match result.status {
            SiteStatus::Down => {
                let detail = result
                    .error_message
                    .clone()
                    .or_else(|| result.status_code.map(|c| format!("HTTP {c}")))
                    .unwrap_or_default();
                json!({
                    "routing_key": self.routing_key,
                    "event_action": "trigger",
                    "dedup_key": Self::dedup_key(&result.url),
                    "payload": {
                        "summary": format!("{} is DOWN: {}", result.url, detail),
                        "source": "uptime-monitor",
                        "severity": "critical",
                        "custom_details": result,
                    },
                })
            }
            SiteStatus::Up if previous == Some(SiteStatus::Down) => json!({
                "routing_key": self.routing_key,
                "event_action": "resolve",
                "dedup_key": Self::dedup_key(&result.url),
            }),
            _ => return,
        };

        self.enqueue(event).await;
    }
}
