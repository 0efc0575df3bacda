//! Notification fan-out.
//!
//! Each backend implements the two-method [`AlertSink`] capability; the
//! [`AlertDispatcher`] owns an ordered list of sinks and invokes them for
//! every check result, adding the status-change callback when the new status
//! differs from the previous poll's.

mod file;
mod log;
mod pagerduty;
mod webhook;

pub use file::FileSink;
pub use log::LogSink;
pub use pagerduty::PagerDutySink;
pub use webhook::{WebhookConfig, WebhookSink};

use async_trait::async_trait;
use tracing::debug;

use crate::monitor::{CheckResult, SiteStatus};

/// A notification backend.
///
/// Both methods default to no-ops so a sink implements only what it needs.
/// Implementations handle their own delivery failures (log and move on);
/// nothing propagates back to the dispatcher, so one sink can never block
/// the rest.
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called after every check, regardless of outcome.
    async fn on_check_complete(&self, _result: &CheckResult) {}

    /// Called when a site's classified status differs from the previous
    /// poll's. `previous` is `None` on the first observation of a URL.
    async fn on_status_change(&self, _result: &CheckResult, _previous: Option<SiteStatus>) {}
}

/// Ordered fan-out of check results to registered sinks.
#[derive(Default)]
pub struct AlertDispatcher {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sinks run in registration order.
    pub fn with_sink(mut self, sink: Box<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn register(&mut self, sink: Box<dyn AlertSink>) {
        self.sinks.push(sink);
    }

    /// Invoke `on_check_complete` on every sink, then `on_status_change` on
    /// every sink when a transition occurred. A first observation
    /// (`previous == None`) counts as a transition.
    pub async fn dispatch(&self, result: &CheckResult, previous: Option<SiteStatus>) {
        let changed = previous != Some(result.status);

        for sink in &self.sinks {
            sink.on_check_complete(result).await;

            if changed {
                debug!(
                    sink = sink.name(),
                    url = %result.url,
                    ?previous,
                    status = %result.status,
                    "Dispatching status change"
                );
                sink.on_status_change(result, previous).await;
            }
        }
    }
}
