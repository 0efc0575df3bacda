mod http;

pub use http::HttpProber;

use async_trait::async_trait;

use crate::monitor::CheckResult;
use crate::site::SiteSpec;

/// Executes one availability check against one site.
///
/// Implementations make exactly one network call per invocation and never
/// fail past this boundary: transport errors are folded into the returned
/// result's status and error message.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn check(&self, site: &SiteSpec) -> CheckResult;
}

/// Cap on transport error detail carried into `error_message`.
pub(crate) const MAX_ERROR_DETAIL: usize = 100;

/// Truncate on a char boundary so multi-byte detail can't split.
pub(crate) fn truncate_detail(detail: &str) -> String {
    detail.chars().take(MAX_ERROR_DETAIL).collect()
}
