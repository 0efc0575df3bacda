use std::fmt::Write as _;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{truncate_detail, Prober};
use crate::config::CheckerConfig;
use crate::monitor::CheckResult;
use crate::site::SiteSpec;

/// HTTP prober over a pooled `reqwest` client.
///
/// One GET per check, per-site timeout, redirects followed automatically.
/// No retries here: the scheduler's next poll cycle is the retry.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    user_agent: String,
}

impl HttpProber {
    pub fn new(config: &CheckerConfig) -> Self {
        Self::with_client(Self::build_client(config.default_timeout), config)
    }

    /// Reuse an existing client, e.g. one shared with webhook sinks.
    pub fn with_client(client: Client, config: &CheckerConfig) -> Self {
        Self {
            client,
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(20)
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client")
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(&CheckerConfig::default())
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn check(&self, site: &SiteSpec) -> CheckResult {
        let start = Instant::now();

        let response = self
            .client
            .get(site.url().clone())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(site.timeout())
            .send()
            .await;

        match response {
            Ok(resp) => {
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                let code = resp.status().as_u16();
                if code == site.expected_status() {
                    debug!(url = %site.url(), code, elapsed_ms, "Check succeeded");
                    CheckResult::up(site.url_str(), code, elapsed_ms)
                } else {
                    CheckResult::down_with_status(
                        site.url_str(),
                        code,
                        elapsed_ms,
                        format!("Unexpected status code: {code}"),
                    )
                }
            }
            Err(e) if e.is_timeout() => CheckResult::down(
                site.url_str(),
                format!("Timeout after {}s", fmt_secs(site.timeout())),
            ),
            Err(e) if e.is_connect() => CheckResult::down(
                site.url_str(),
                format!("Connection error: {}", truncate_detail(&error_detail(&e))),
            ),
            Err(e) => CheckResult::transport_error(
                site.url_str(),
                format!("Request error: {}", truncate_detail(&error_detail(&e))),
            ),
        }
    }
}

/// `reqwest::Error`'s `Display` is terse; append the source chain so the
/// message carries the underlying cause (DNS, TLS, socket).
fn error_detail(e: &reqwest::Error) -> String {
    let mut detail = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let _ = write!(detail, ": {cause}");
        source = cause.source();
    }
    detail
}

/// Render integral seconds without a fraction: 10 -> "10", 0.5 -> "0.5".
fn fmt_secs(timeout: Duration) -> String {
    let secs = timeout.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}", secs as u64)
    } else {
        format!("{secs}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::SiteStatus;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn site(url: &str) -> SiteSpec {
        SiteSpec::new(url).unwrap()
    }

    #[test]
    fn fmt_secs_drops_fraction_for_whole_seconds() {
        assert_eq!(fmt_secs(Duration::from_secs(10)), "10");
        assert_eq!(fmt_secs(Duration::from_millis(500)), "0.5");
    }

    #[tokio::test]
    async fn expected_status_maps_to_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let prober = HttpProber::default();
        let result = prober.check(&site(&format!("{}/health", server.uri()))).await;

        assert_eq!(result.status, SiteStatus::Up);
        assert_eq!(result.status_code, Some(200));
        assert!(result.response_time_ms.unwrap() >= 0.0);
        assert!(result.error_message.is_none());
    }

    #[tokio::test]
    async fn unexpected_status_maps_to_down_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let prober = HttpProber::default();
        let result = prober.check(&site(&format!("{}/health", server.uri()))).await;

        assert_eq!(result.status, SiteStatus::Down);
        assert_eq!(result.status_code, Some(503));
        assert!(result.response_time_ms.is_some());
        assert_eq!(
            result.error_message.as_deref(),
            Some("Unexpected status code: 503")
        );
    }

    #[tokio::test]
    async fn custom_expected_status_is_honored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let prober = HttpProber::default();
        let spec = site(&format!("{}/ping", server.uri())).with_expected_status(204);
        let result = prober.check(&spec).await;

        assert_eq!(result.status, SiteStatus::Up);
        assert_eq!(result.status_code, Some(204));
    }

    #[tokio::test]
    async fn timeout_maps_to_down_without_code_or_latency() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let prober = HttpProber::default();
        let spec = site(&format!("{}/slow", server.uri()))
            .with_timeout(Duration::from_millis(100))
            .unwrap();
        let result = prober.check(&spec).await;

        assert_eq!(result.status, SiteStatus::Down);
        assert!(result.status_code.is_none());
        assert!(result.response_time_ms.is_none());
        assert_eq!(result.error_message.as_deref(), Some("Timeout after 0.1s"));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_down() {
        // Port 1 is reserved and nothing listens on it.
        let prober = HttpProber::default();
        let spec = site("http://127.0.0.1:1/")
            .with_timeout(Duration::from_secs(2))
            .unwrap();
        let result = prober.check(&spec).await;

        assert_eq!(result.status, SiteStatus::Down);
        assert!(result.status_code.is_none());
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Connection error: "));
    }

    #[tokio::test]
    async fn redirects_are_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", "/new"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let prober = HttpProber::default();
        let result = prober.check(&site(&format!("{}/old", server.uri()))).await;

        assert_eq!(result.status, SiteStatus::Up);
        assert_eq!(result.status_code, Some(200));
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("User-Agent", "uptime-test/9.9"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = CheckerConfig::default().with_user_agent("uptime-test/9.9");
        let prober = HttpProber::new(&config);
        let result = prober.check(&site(&format!("{}/", server.uri()))).await;

        assert_eq!(result.status, SiteStatus::Up);
    }
}
