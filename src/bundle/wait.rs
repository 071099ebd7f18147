use super::parser::BundleStatusParser;
use super::status::BundleStatus;
use crate::config::PackageManagerProperties;
use crate::core::PackMgrResult;
use crate::filter::PatternList;
use crate::http::{Credentials, Transport};
use reqwest::Method;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval between two bundle status samples
pub const WAIT_INTERVAL: Duration = Duration::from_secs(3);

/// Polls the console bundle list until the system is stable
pub struct BundleStatusChecker {
    transport: Transport,
    url: String,
    parser: BundleStatusParser,
    blacklist: PatternList,
    wait_limit: Duration,
    interval: Duration,
}

impl BundleStatusChecker {
    pub fn new(
        transport: Transport,
        url: impl Into<String>,
        parser: BundleStatusParser,
        blacklist: PatternList,
        wait_limit: Duration,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            parser,
            blacklist,
            wait_limit,
            interval: WAIT_INTERVAL,
        }
    }

    /// Build a checker with console credentials; `None` when no bundle status URL is set
    pub fn from_properties(props: &PackageManagerProperties) -> PackMgrResult<Option<Self>> {
        let url = match props.bundle_status_url {
            Some(ref url) if !url.trim().is_empty() => url.clone(),
            _ => return Ok(None),
        };
        let credentials = Credentials::new(props.console_user_id(), props.resolve_console_password()?);
        let transport = Transport::new(props, Some(credentials))?;
        let parser = BundleStatusParser::from_patterns(&props.bundle_status_whitelist_bundle_names)?;
        let blacklist = PatternList::compile(&props.bundle_status_blacklist_bundle_names)?;
        Ok(Some(Self::new(
            transport,
            url,
            parser,
            blacklist,
            Duration::from_secs(props.bundle_status_wait_limit_sec),
        )))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Fetch and parse one bundle list sample
    pub async fn fetch(&self) -> PackMgrResult<BundleStatus> {
        let body = self.transport.execute_text(Method::GET, &self.url, Ok).await?;
        self.parser.parse(&body)
    }

    /// First present bundle matching a blacklist pattern
    pub fn blacklisted_bundle<'a>(&self, status: &'a BundleStatus) -> Option<&'a str> {
        status
            .bundles()
            .iter()
            .map(|b| b.symbolic_name.as_str())
            .find(|name| self.blacklist.matches(name))
    }

    /// All bundles running and no blacklisted bundle present
    pub fn is_ready(&self, status: &BundleStatus) -> bool {
        status.is_all_bundles_running() && self.blacklisted_bundle(status).is_none()
    }

    /// Wait until bundles are active or the wait limit is reached
    ///
    /// Returns the last sample and whether it was ready. Reaching the limit
    /// is not an error; the caller proceeds with a warning.
    pub async fn wait_for_bundles_activation(&self) -> PackMgrResult<(BundleStatus, bool)> {
        let max_checks = (self.wait_limit.as_millis() / self.interval.as_millis().max(1)).max(1);
        info!("Check bundle activation status...");

        let mut check = 1;
        loop {
            let status = self.fetch().await?;
            if self.is_ready(&status) {
                debug!("Bundle status: {}", status.status_line_compact());
                return Ok((status, true));
            }

            info!("{}", status.status_line());
            if let Some(name) = self.blacklisted_bundle(&status) {
                info!("Bundle '{}' is blacklisted and still present", name);
            }

            if check >= max_checks {
                warn!(
                    "Bundles did not become active within {} seconds: {}",
                    self.wait_limit.as_secs(),
                    status.status_line_compact()
                );
                return Ok((status, false));
            }

            info!(
                "Bundles are currently starting/stopping - wait {} seconds (max. {} seconds) ...",
                self.interval.as_secs(),
                self.wait_limit.as_secs()
            );
            tokio::time::sleep(self.interval).await;
            check += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bundles(states: &[(&str, &str)]) -> String {
        let data: Vec<_> = states
            .iter()
            .map(|(name, state)| json!({ "symbolicName": name, "state": state }))
            .collect();
        json!({ "status": "Bundle information", "data": data }).to_string()
    }

    fn checker(server: &MockServer, blacklist: &[&str], limit_ms: u64) -> BundleStatusChecker {
        let transport = Transport::with_client(
            Client::new(),
            Some(Credentials::new("admin", "admin")),
            RetryPolicy::none(),
        );
        BundleStatusChecker::new(
            transport,
            format!("{}/system/console/bundles.json", server.uri()),
            BundleStatusParser::default(),
            PatternList::compile(blacklist).unwrap(),
            Duration::from_millis(limit_ms),
        )
        .with_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_ready_on_first_sample() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/console/bundles.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(bundles(&[("a", "Active")])))
            .expect(1)
            .mount(&server)
            .await;

        let (status, ready) = checker(&server, &[], 1000)
            .wait_for_bundles_activation()
            .await
            .unwrap();
        assert!(ready);
        assert_eq!(status.active(), 1);
    }

    #[tokio::test]
    async fn test_waits_until_bundles_active() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/console/bundles.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(bundles(&[("a", "Active"), ("b", "Resolved")])),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/system/console/bundles.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(bundles(&[("a", "Active"), ("b", "Active")])),
            )
            .mount(&server)
            .await;

        let (status, ready) = checker(&server, &[], 10_000)
            .wait_for_bundles_activation()
            .await
            .unwrap();
        assert!(ready);
        assert_eq!(status.active(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_wait_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/console/bundles.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(bundles(&[("b", "Resolved")])))
            .expect(3)
            .mount(&server)
            .await;

        let (status, ready) = checker(&server, &[], 30)
            .wait_for_bundles_activation()
            .await
            .unwrap();
        assert!(!ready);
        assert_eq!(status.resolved(), 1);
    }

    #[tokio::test]
    async fn test_blacklisted_bundle_blocks_readiness() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/console/bundles.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(bundles(&[("a", "Active"), ("org.apache.sling.installer.core", "Active")])),
            )
            .mount(&server)
            .await;

        let checker = checker(&server, &["org\\.apache\\.sling\\.installer\\..*"], 20);
        let status = checker.fetch().await.unwrap();
        assert!(status.is_all_bundles_running());
        assert_eq!(
            checker.blacklisted_bundle(&status),
            Some("org.apache.sling.installer.core")
        );
        assert!(!checker.is_ready(&status));

        let (_, ready) = checker.wait_for_bundles_activation().await.unwrap();
        assert!(!ready);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/system/console/bundles.json"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let err = checker(&server, &[], 100).fetch().await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
    }

    #[test]
    fn test_from_properties_without_url() {
        let props = PackageManagerProperties::default();
        assert!(BundleStatusChecker::from_properties(&props).unwrap().is_none());
    }
}
