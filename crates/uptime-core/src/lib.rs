#![forbid(unsafe_code)]

pub mod alert;
pub mod config;
pub mod monitor;
pub mod prober;
pub mod site;

pub use alert::{
    AlertDispatcher, AlertSink, FileSink, LogSink, PagerDutySink, WebhookConfig, WebhookSink,
};
pub use config::CheckerConfig;
pub use monitor::{CheckResult, Monitor, MonitorState, SiteStatus, StatusTracker};
pub use prober::{HttpProber, Prober};
pub use site::{SiteError, SiteSpec};
