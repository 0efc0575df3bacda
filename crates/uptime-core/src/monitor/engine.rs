use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, warn};

use super::result::CheckResult;
use super::tracker::StatusTracker;
use crate::alert::AlertDispatcher;
use crate::config::CheckerConfig;
use crate::prober::Prober;
use crate::site::SiteSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Active,
    Stopping,
    Stopped,
}

impl MonitorState {
    pub fn can_transition_to(self, target: MonitorState) -> bool {
        matches!(
            (self, target),
            (MonitorState::Idle, MonitorState::Active)
                | (MonitorState::Active, MonitorState::Stopping)
                | (MonitorState::Stopping, MonitorState::Stopped)
                | (MonitorState::Stopped, MonitorState::Active)
        )
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Run one prober check, tagging the result with its site index so a
/// concurrent, unordered stream of probes can be reordered afterward.
async fn probe_one(
    prober: Arc<dyn Prober>,
    index: usize,
    site: &SiteSpec,
) -> (usize, CheckResult) {
    (index, prober.check(site).await)
}

/// Drives the poll loop over a fixed site list.
///
/// Owns the tracker and dispatcher outright; there is no ambient shared
/// state. Probes within one pass run concurrently up to the configured
/// bound, but transition detection and alert fan-out run sequentially in
/// site order, so per-URL notifications keep their causal order and the
/// returned results match the configured ordering.
pub struct Monitor {
    sites: Vec<SiteSpec>,
    config: CheckerConfig,
    prober: Arc<dyn Prober>,
    tracker: StatusTracker,
    dispatcher: AlertDispatcher,
    state: RwLock<MonitorState>,
    stop_notify: Notify,
}

impl Monitor {
    pub fn new(
        sites: Vec<SiteSpec>,
        config: CheckerConfig,
        prober: Arc<dyn Prober>,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            sites,
            config,
            prober,
            tracker: StatusTracker::new(),
            dispatcher,
            state: RwLock::new(MonitorState::Idle),
            stop_notify: Notify::new(),
        }
    }

    pub fn sites(&self) -> &[SiteSpec] {
        &self.sites
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub async fn state(&self) -> MonitorState {
        *self.state.read().await
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    /// One full poll pass over every configured site.
    pub async fn check_all(&self) -> Vec<CheckResult> {
        let concurrency = self.config.max_concurrent_checks.max(1);

        let mut probes = Vec::with_capacity(self.sites.len());
        for (i, site) in self.sites.iter().enumerate() {
            probes.push(probe_one(Arc::clone(&self.prober), i, site));
        }
        let mut indexed: Vec<(usize, CheckResult)> = stream::iter(probes)
            .buffer_unordered(concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(i, _)| *i);

        let mut results = Vec::with_capacity(indexed.len());
        for (i, result) in indexed {
            let site = &self.sites[i];
            if result.is_up() {
                info!(
                    site = site.display_name(),
                    url = %result.url,
                    code = result.status_code,
                    response_time_ms = result.response_time_ms,
                    "UP"
                );
            } else {
                warn!(
                    site = site.display_name(),
                    url = %result.url,
                    status = %result.status,
                    error = result.error_message.as_deref().unwrap_or_default(),
                    "{}", result.status.as_str().to_uppercase()
                );
            }

            let previous = self.tracker.record(&result).await;
            self.dispatcher.dispatch(&result, previous).await;
            results.push(result);
        }

        results
    }

    /// Poll repeatedly until [`stop`] is called, sleeping `poll_interval`
    /// between the end of one pass and the start of the next.
    ///
    /// Returns immediately if the monitor is already running or stopping.
    ///
    /// [`stop`]: Monitor::stop
    pub async fn run(&self) {
        {
            let mut state = self.state.write().await;
            if !state.can_transition_to(MonitorState::Active) {
                debug!(state = %*state, "run() ignored in current state");
                return;
            }
            *state = MonitorState::Active;
        }

        info!(
            sites = self.sites.len(),
            interval_secs = self.config.poll_interval.as_secs(),
            "Starting uptime monitoring"
        );

        loop {
            if *self.state.read().await != MonitorState::Active {
                break;
            }

            self.check_all().await;

            tokio::select! {
                () = tokio::time::sleep(self.config.poll_interval) => {}
                () = self.stop_notify.notified() => {}
            }
        }

        *self.state.write().await = MonitorState::Stopped;
        info!("Uptime monitoring stopped");
    }

    /// Request a clean stop. A pass in progress finishes first; the
    /// interruptible sleep means the loop exits without waiting out the
    /// interval.
    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        if *state == MonitorState::Active {
            *state = MonitorState::Stopping;
            // notify_one stores a permit, so a stop issued mid-pass is seen
            // by the next sleep.
            self.stop_notify.notify_one();
            info!("Stopping uptime monitor");
        }
    }
}
