//! Generic JSON webhook sink.
//!
//! POSTs a versioned envelope to one endpoint whenever a site's status
//! changes. Chat backends (Slack, Discord, Mattermost relays) consume the
//! same envelope; a signing secret lets the receiver authenticate payloads.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

use super::AlertSink;
use crate::monitor::{CheckResult, SiteStatus};

/// Configuration for a single webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// The URL to POST payloads to.
    pub url: String,

    /// Which notification types to deliver. Empty means all status-change
    /// types; `check_complete` fires on every poll and must be listed
    /// explicitly.
    #[serde(default)]
    pub events: Vec<String>,

    #[serde(default = "default_webhook_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_webhook_retries")]
    pub max_retries: u32,

    /// Optional HMAC-SHA256 signing secret for the `X-Uptime-Signature-256`
    /// header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

fn default_webhook_timeout_ms() -> u64 {
    5000
}

fn default_webhook_retries() -> u32 {
    2
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            events: Vec::new(),
            timeout_ms: default_webhook_timeout_ms(),
            max_retries: default_webhook_retries(),
            secret: None,
        }
    }

    pub fn accepts(&self, notification_type: &str) -> bool {
        if self.events.is_empty() {
            return notification_type != "check_complete";
        }
        self.events.iter().any(|e| e == notification_type)
    }
}

/// The JSON envelope POSTed to the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub version: u8,
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub url: String,
    pub previous_status: Option<String>,
    pub data: serde_json::Value,
}

impl WebhookPayload {
    fn from_result(
        notification_type: &str,
        result: &CheckResult,
        previous: Option<SiteStatus>,
    ) -> Self {
        Self {
            version: 1,
            id: Uuid::new_v4().to_string(),
            timestamp: result.timestamp,
            notification_type: notification_type.to_string(),
            url: result.url.clone(),
            previous_status: previous.map(|s| s.as_str().to_string()),
            data: serde_json::json!({
                "status": result.status,
                "status_code": result.status_code,
                "response_time_ms": result.response_time_ms,
                "error_message": result.error_message,
            }),
        }
    }
}

/// What a transition is called on the wire. `site_recovered` is reserved for
/// the down-to-up transition; everything else that changed is
/// `status_changed`.
fn change_notification_type(result: &CheckResult, previous: Option<SiteStatus>) -> &'static str {
    match result.status {
        SiteStatus::Down => "site_down",
        SiteStatus::Up if previous == Some(SiteStatus::Down) => "site_recovered",
        _ => "status_changed",
    }
}

pub struct WebhookSink {
    config: WebhookConfig,
    client: Client,
}

impl WebhookSink {
    pub fn new(config: WebhookConfig, client: Client) -> Self {
        Self { config, client }
    }

    async fn send(&self, payload: &WebhookPayload) {
        let json_bytes = match serde_json::to_vec(payload) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Failed to serialize webhook payload");
                return;
            }
        };

        let timeout = Duration::from_millis(self.config.timeout_ms);

        if let Err(e) = deliver(
            &self.client,
            &self.config.url,
            &json_bytes,
            self.config.secret.as_deref(),
            timeout,
            self.config.max_retries,
        )
        .await
        {
            warn!(
                url = %self.config.url,
                notification_type = %payload.notification_type,
                error = %e,
                "Webhook delivery failed"
            );
        } else {
            debug!(
                url = %self.config.url,
                notification_type = %payload.notification_type,
                "Webhook delivered"
            );
        }
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn on_check_complete(&self, result: &CheckResult) {
        if !self.config.accepts("check_complete") {
            return;
        }
        let payload = WebhookPayload::from_result("check_complete", result, None);
        self.send(&payload).await;
    }

    async fn on_status_change(&self, result: &CheckResult, previous: Option<SiteStatus>) {
        let notification_type = change_notification_type(result, previous);
        if !self.config.accepts(notification_type) {
            return;
        }
        let payload = WebhookPayload::from_result(notification_type, result, previous);
        self.send(&payload).await;
    }
}

async fn deliver(
    client: &Client,
    url: &str,
    body: &[u8],
    secret: Option<&str>,
    timeout: Duration,
    max_retries: u32,
) -> Result<(), String> {
    let mut last_error = String::new();

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
            tokio::time::sleep(backoff).await;
        }

        let mut req = client
            .post(url)
            .header("Content-Type", "application/json")
            .header(
                "User-Agent",
                concat!("uptime-monitor/", env!("CARGO_PKG_VERSION")),
            )
            .timeout(timeout)
            .body(body.to_vec());

        if let Some(secret) = secret {
            let signature = sign_payload(body, secret);
            req = req.header("X-Uptime-Signature-256", format!("sha256={}", signature));
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            Ok(resp) => {
                let status = resp.status();
                last_error = format!("HTTP {} from {}", status, url);
                if status.as_u16() >= 400 && status.as_u16() < 500 && status.as_u16() != 429 {
                    return Err(last_error);
                }
            }
            Err(e) => {
                last_error = format!("Request to {} failed: {}", url, e);
            }
        }
    }

    Err(last_error)
}

fn sign_payload(body: &[u8], secret: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
