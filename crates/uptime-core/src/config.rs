use std::time::Duration;

use crate::site::DEFAULT_TIMEOUT;

/// Configuration for a checker instance.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout applied to sites that do not set one explicitly.
    pub default_timeout: Duration,
    /// Delay between the end of one poll pass and the start of the next.
    pub poll_interval: Duration,
    /// User-Agent header sent with every probe.
    pub user_agent: String,
    /// Upper bound on probes in flight during one pass.
    pub max_concurrent_checks: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::from_secs(60),
            user_agent: concat!("uptime-monitor/", env!("CARGO_PKG_VERSION")).to_string(),
            max_concurrent_checks: 4,
        }
    }
}

impl CheckerConfig {
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_concurrent_checks(mut self, max: usize) -> Self {
        self.max_concurrent_checks = max.max(1);
        self
    }
}
