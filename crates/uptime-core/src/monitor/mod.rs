mod engine;
mod result;
mod tracker;

pub use engine::{Monitor, MonitorState};
pub use result::{CheckResult, SiteStatus};
pub use tracker::StatusTracker;
