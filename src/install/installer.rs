use super::checker::PackageInstalledChecker;
use super::status::PackageInstalledStatus;
use super::vendor::Vendor;
use super::{InstallOutcome, VendorPackageInstaller};
use crate::bundle::BundleStatusChecker;
use crate::config::PackageManagerProperties;
use crate::core::{PackMgrError, PackMgrResult, PackageCoordinate, PackageFile};
use crate::http::{Credentials, Transport};
use crate::package::properties::read_coordinate;
use std::time::Duration;
use tracing::{debug, info};

/// Deploys package files one after another
pub struct PackageInstaller {
    url: String,
    transport: Transport,
    installer: VendorPackageInstaller,
    bundle_checker: Option<BundleStatusChecker>,
}

impl PackageInstaller {
    /// Build from properties, resolving credentials and the vendor dialect
    pub fn new(props: &PackageManagerProperties) -> PackMgrResult<Self> {
        let credentials = Credentials::new(props.user_id.clone(), props.resolve_password()?);
        let transport = Transport::new(props, Some(credentials))?;
        let bundle_checker = BundleStatusChecker::from_properties(props)?;
        Self::with_transport(&props.package_manager_url, transport, bundle_checker)
    }

    pub fn with_transport(
        url: &str,
        transport: Transport,
        bundle_checker: Option<BundleStatusChecker>,
    ) -> PackMgrResult<Self> {
        Ok(Self {
            url: url.to_string(),
            installer: VendorPackageInstaller::for_url(url)?,
            transport,
            bundle_checker,
        })
    }

    pub fn vendor(&self) -> Vendor {
        self.installer.vendor()
    }

    /// Install all files in order, stopping at the first failure
    pub async fn install_files(&self, files: &[PackageFile]) -> PackMgrResult<Vec<InstallOutcome>> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            outcomes.push(self.install_file(file).await?);
        }
        Ok(outcomes)
    }

    pub async fn install_file(&self, package_file: &PackageFile) -> PackMgrResult<InstallOutcome> {
        let path = package_file.path();
        if !path.is_file() {
            return Err(PackMgrError::Path(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        if self.vendor() == Vendor::Crx && !package_file.force {
            if let Some(outcome) = self.check_already_installed(package_file).await? {
                return Ok(outcome);
            }
        }

        self.wait_for_bundles_activation().await?;

        if package_file.install {
            info!("Upload and install {} to {}", package_file.file_name(), self.url);
        } else {
            info!("Upload {} to {}", package_file.file_name(), self.url);
        }

        let outcome = self
            .installer
            .install_package(package_file, &self.transport)
            .await?;

        if let InstallOutcome::Installed { .. } = outcome {
            delay(package_file.delay_after_install_sec).await;
            self.wait_for_bundles_activation().await?;
        }

        Ok(outcome)
    }

    /// Coordinate of a package file and its installed status on the server
    pub async fn status(
        &self,
        package_file: &PackageFile,
    ) -> PackMgrResult<(PackageCoordinate, PackageInstalledStatus)> {
        let coordinate = read_coordinate(package_file.path())?;
        let checker = PackageInstalledChecker::fetch(&self.transport, &Vendor::base_url(&self.url)?).await?;
        let status = checker.status_of(&coordinate);
        Ok((coordinate, status))
    }

    async fn check_already_installed(
        &self,
        package_file: &PackageFile,
    ) -> PackMgrResult<Option<InstallOutcome>> {
        let coordinate = match read_coordinate(package_file.path()) {
            Ok(coordinate) => coordinate,
            Err(e) => {
                debug!("Skipping installed check for {}: {}", package_file.file_name(), e);
                return Ok(None);
            }
        };

        let checker = PackageInstalledChecker::fetch(&self.transport, &Vendor::base_url(&self.url)?).await?;
        match checker.status_of(&coordinate) {
            PackageInstalledStatus::Installed => {
                info!(
                    "Package skipped because it is already installed: {}",
                    coordinate
                );
                Ok(Some(InstallOutcome::AlreadyInstalled { coordinate }))
            }
            status => {
                debug!("Package {} status: {}", coordinate, status);
                Ok(None)
            }
        }
    }

    async fn wait_for_bundles_activation(&self) -> PackMgrResult<()> {
        match self.bundle_checker {
            Some(ref checker) => checker.wait_for_bundles_activation().await.map(|_| ()),
            None => {
                debug!("Skipping check for bundle activation state because no bundle status URL is defined.");
                Ok(())
            }
        }
    }
}

async fn delay(seconds: u64) {
    if seconds > 0 {
        info!("Wait for {} seconds after package install...", seconds);
        tokio::time::sleep(Duration::from_secs(seconds)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleStatusParser;
    use crate::filter::PatternList;
    use crate::http::RetryPolicy;
    use crate::package::properties::write_test_package;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PACKAGE_PATH: &str = "/etc/packages/g/p-1.0.zip";

    fn transport() -> Transport {
        Transport::with_client(
            reqwest::Client::new(),
            Some(Credentials::new("admin", "admin")),
            RetryPolicy::none(),
        )
    }

    fn installer(server: &MockServer, bundle_checker: Option<BundleStatusChecker>) -> PackageInstaller {
        PackageInstaller::with_transport(
            &format!("{}/crx/packmgr/service", server.uri()),
            transport(),
            bundle_checker,
        )
        .unwrap()
    }

    async fn mount_list(server: &MockServer, results: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/crx/packmgr/list.jsp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .mount(server)
            .await;
    }

    async fn mount_upload(server: &MockServer, body: serde_json::Value, times: u64) {
        Mock::given(method("POST"))
            .and(path("/crx/packmgr/service/.json"))
            .and(query_param("cmd", "upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_install(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(format!("/crx/packmgr/service/console.html{}", PACKAGE_PATH)))
            .and(query_param("cmd", "install"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Package installed."))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_install_new_package() {
        let server = MockServer::start().await;
        mount_list(&server, json!([])).await;
        mount_upload(&server, json!({ "success": true, "path": PACKAGE_PATH }), 1).await;
        mount_install(&server).await;

        let temp = TempDir::new().unwrap();
        let file = write_test_package(temp.path(), &PackageCoordinate::new("g", "p", "1.0"));
        let outcomes = installer(&server, None)
            .install_files(&[PackageFile::new(file)])
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![InstallOutcome::Installed {
                path: PACKAGE_PATH.to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_skip_already_installed() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            json!([{ "group": "g", "name": "p", "version": "1.0", "lastUnpacked": 1700000000000i64 }]),
        )
        .await;
        mount_upload(&server, json!({ "success": true, "path": PACKAGE_PATH }), 0).await;

        let temp = TempDir::new().unwrap();
        let coordinate = PackageCoordinate::new("g", "p", "1.0");
        let file = write_test_package(temp.path(), &coordinate);
        let outcome = installer(&server, None)
            .install_file(&PackageFile::new(file))
            .await
            .unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyInstalled { coordinate });
    }

    #[tokio::test]
    async fn test_force_bypasses_installed_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crx/packmgr/list.jsp"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_upload(&server, json!({ "success": true, "path": PACKAGE_PATH }), 1).await;
        mount_install(&server).await;

        let temp = TempDir::new().unwrap();
        let file = write_test_package(temp.path(), &PackageCoordinate::new("g", "p", "1.0"));
        let outcome = installer(&server, None)
            .install_file(&PackageFile::new(file).with_force(true))
            .await
            .unwrap();
        assert!(matches!(outcome, InstallOutcome::Installed { .. }));
    }

    #[tokio::test]
    async fn test_reupload_without_force_is_skip_not_error() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            json!([{ "group": "g", "name": "p", "version": "1.0", "lastUnpacked": 0 }]),
        )
        .await;
        mount_upload(
            &server,
            json!({ "success": false, "msg": format!("Package already exists: {}", PACKAGE_PATH) }),
            1,
        )
        .await;

        let temp = TempDir::new().unwrap();
        let file = write_test_package(temp.path(), &PackageCoordinate::new("g", "p", "1.0"));
        let outcome = installer(&server, None)
            .install_file(&PackageFile::new(file))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InstallOutcome::AlreadyUploaded {
                path: PACKAGE_PATH.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_waits_for_bundles_before_and_after_install() {
        let server = MockServer::start().await;
        mount_list(&server, json!([])).await;
        mount_upload(&server, json!({ "success": true, "path": PACKAGE_PATH }), 1).await;
        mount_install(&server).await;
        Mock::given(method("GET"))
            .and(path("/system/console/bundles.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "data": [{ "symbolicName": "a", "state": "Active" }]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let checker = BundleStatusChecker::new(
            transport(),
            format!("{}/system/console/bundles.json", server.uri()),
            BundleStatusParser::default(),
            PatternList::default(),
            Duration::from_millis(50),
        )
        .with_interval(Duration::from_millis(10));

        let temp = TempDir::new().unwrap();
        let file = write_test_package(temp.path(), &PackageCoordinate::new("g", "p", "1.0"));
        installer(&server, Some(checker))
            .install_file(&PackageFile::new(file))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let server = MockServer::start().await;
        let err = installer(&server, None)
            .install_file(&PackageFile::new("/nonexistent/p.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, PackMgrError::Path(ref msg) if msg.starts_with("File does not exist")));
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let server = MockServer::start().await;
        mount_list(&server, json!([])).await;
        mount_upload(&server, json!({ "success": false, "msg": "Upload denied" }), 1).await;

        let temp = TempDir::new().unwrap();
        let first = write_test_package(temp.path(), &PackageCoordinate::new("g", "p", "1.0"));
        let second = write_test_package(temp.path(), &PackageCoordinate::new("g", "q", "1.0"));
        let err = installer(&server, None)
            .install_files(&[PackageFile::new(first), PackageFile::new(second)])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Package upload failed: Upload denied");
    }

    #[tokio::test]
    async fn test_status() {
        let server = MockServer::start().await;
        mount_list(
            &server,
            json!([
                { "group": "g", "name": "p", "version": "1.0", "lastUnpacked": 0 },
                { "group": "g", "name": "p", "version": "0.9", "lastUnpacked": 42 }
            ]),
        )
        .await;

        let temp = TempDir::new().unwrap();
        let file = write_test_package(temp.path(), &PackageCoordinate::new("g", "p", "1.0"));
        let (coordinate, status) = installer(&server, None)
            .status(&PackageFile::new(file))
            .await
            .unwrap();
        assert_eq!(coordinate, PackageCoordinate::new("g", "p", "1.0"));
        assert_eq!(status, PackageInstalledStatus::InstalledOtherVersion);
    }
}
