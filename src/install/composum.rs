use super::vendor::{Vendor, COMPOSUM_URL};
use super::{apply_timeout, package_form, read_package, InstallOutcome};
use crate::core::{PackMgrError, PackMgrResult, PackageFile};
use crate::http::{encode_path, ResponseClassifier, ResponseOutcome, Transport};
use reqwest::Method;
use tracing::info;

/// Installer for the Composum package manager (`.../bin/cpm/...`)
///
/// Responses carry an XML `<status code="N">` element instead of a JSON
/// success flag.
#[derive(Debug, Clone)]
pub struct ComposumPackageInstaller {
    url: String,
    classifier: ResponseClassifier,
}

impl ComposumPackageInstaller {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            classifier: ResponseClassifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    fn install_url(&self, path: &str) -> PackMgrResult<String> {
        let base = Vendor::base_url(&self.url)?;
        Ok(format!("{}{}package.install{}", base, COMPOSUM_URL, encode_path(path)))
    }

    pub async fn install_package(
        &self,
        package_file: &PackageFile,
        transport: &Transport,
    ) -> PackMgrResult<InstallOutcome> {
        if package_file.replicate {
            return Err(PackMgrError::Install(
                "Replicating packages not supported for Composum package installer.".to_string(),
            ));
        }

        let bytes = read_package(package_file).await?;
        let body = transport
            .execute_text(Method::POST, &self.url, |request| {
                Ok(apply_timeout(request, package_file).multipart(package_form(
                    "file",
                    package_file,
                    &bytes,
                )?))
            })
            .await?;

        let path = match self.classifier.classify_xml_status(&body)? {
            ResponseOutcome::Success { path, .. } => path,
            ResponseOutcome::AlreadyExists { path, .. } if !package_file.force => {
                info!("Package skipped because it was already uploaded.");
                return Ok(InstallOutcome::AlreadyUploaded { path });
            }
            ResponseOutcome::AlreadyExists { message, .. } | ResponseOutcome::Failure { message } => {
                return Err(PackMgrError::Install(format!("Package upload failed: {}", message)))
            }
        };

        if !package_file.install {
            info!("Package uploaded successfully (without installing).");
            return Ok(InstallOutcome::Uploaded { path });
        }

        let path = path.ok_or_else(|| {
            PackMgrError::Install("Package upload did not report a package path".to_string())
        })?;

        info!("Package uploaded, now installing...");
        let body = transport
            .execute_text(Method::POST, &self.install_url(&path)?, |request| {
                Ok(apply_timeout(request, package_file))
            })
            .await?;

        match self.classifier.classify_xml_status(&body)? {
            ResponseOutcome::Success { .. } => Ok(InstallOutcome::Installed { path }),
            ResponseOutcome::AlreadyExists { message, .. } | ResponseOutcome::Failure { message } => Err(
                PackMgrError::Install(format!("Package installation failed: {}", message)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Credentials, RetryPolicy};
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PACKAGE_PATH: &str = "/my-group/my-package-1.0.zip";

    fn transport() -> Transport {
        Transport::with_client(reqwest::Client::new(), None, RetryPolicy::none())
    }

    fn package(temp: &TempDir) -> PackageFile {
        let file = temp.path().join("my-package-1.0.zip");
        std::fs::write(&file, b"PK-fake-archive").unwrap();
        PackageFile::new(file)
    }

    fn status(code: u16, text: &str, path: Option<&str>) -> String {
        let path = path.map(|p| format!("<path>{}</path>", p)).unwrap_or_default();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><result><status code="{}">{}</status>{}</result>"#,
            code, text, path
        )
    }

    fn installer(server: &MockServer) -> ComposumPackageInstaller {
        ComposumPackageInstaller::new(format!("{}/bin/cpm/package.upload.xml", server.uri()))
    }

    #[tokio::test]
    async fn test_upload_and_install() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bin/cpm/package.upload.xml"))
            .and(body_string_contains("name=\"file\""))
            .respond_with(ResponseTemplate::new(200).set_body_string(status(200, "ok", Some(PACKAGE_PATH))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/bin/cpm/package.install{}", PACKAGE_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_string(status(200, "ok", None)))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let outcome = installer(&server)
            .install_package(&package(&temp), &transport())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InstallOutcome::Installed {
                path: PACKAGE_PATH.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bin/cpm/package.upload.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(status(500, "invalid package", None)))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let err = installer(&server)
            .install_package(&package(&temp), &transport())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Package upload failed: invalid package");
    }

    #[tokio::test]
    async fn test_already_exists_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bin/cpm/package.upload.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(status(
                409,
                &format!("Package already exists: {}", PACKAGE_PATH),
                None,
            )))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let outcome = installer(&server)
            .install_package(&package(&temp), &transport())
            .await
            .unwrap();
        assert!(outcome.is_skipped());
    }

    #[tokio::test]
    async fn test_install_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bin/cpm/package.upload.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(status(200, "ok", Some(PACKAGE_PATH))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/bin/cpm/package.install{}", PACKAGE_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_string(status(500, "install broken", None)))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let err = installer(&server)
            .install_package(&package(&temp), &transport())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Package installation failed: install broken");
    }

    #[tokio::test]
    async fn test_replicate_not_supported() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();
        let mut file = package(&temp);
        file.replicate = true;
        let err = installer(&server).install_package(&file, &transport()).await.unwrap_err();
        assert!(matches!(err, PackMgrError::Install(ref msg) if msg.contains("not supported")));
    }
}
