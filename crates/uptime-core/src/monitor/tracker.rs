use std::collections::HashMap;

use tokio::sync::Mutex;

use super::result::{CheckResult, SiteStatus};

/// Last-known status per monitored URL.
///
/// The map lock is held across the lookup and the overwrite in [`record`],
/// so two concurrent checks of the same URL cannot interleave between reading
/// the previous status and storing the new one. Different URLs are
/// independent.
///
/// [`record`]: StatusTracker::record
#[derive(Debug, Default)]
pub struct StatusTracker {
    history: Mutex<HashMap<String, SiteStatus>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the result's status for its URL and return what was stored
    /// before, `None` on the first observation of that URL.
    pub async fn record(&self, result: &CheckResult) -> Option<SiteStatus> {
        self.history
            .lock()
            .await
            .insert(result.url.clone(), result.status)
    }

    /// Current status for a URL, if it has ever been checked.
    pub async fn status_of(&self, url: &str) -> Option<SiteStatus> {
        self.history.lock().await.get(url).copied()
    }
}
