use super::{apply_timeout, package_form, read_package, InstallOutcome};
use crate::core::{PackMgrError, PackMgrResult, PackageFile};
use crate::http::{encode_path, ResponseClassifier, ResponseOutcome, Transport};
use reqwest::Method;
use tracing::info;

/// Installer for the CRX package manager service (`.../crx/packmgr/service`)
#[derive(Debug, Clone)]
pub struct CrxPackageInstaller {
    url: String,
    classifier: ResponseClassifier,
}

impl CrxPackageInstaller {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            classifier: ResponseClassifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    fn console_url(&self, path: &str, command: &str) -> String {
        format!("{}/console.html{}?cmd={}", self.url, encode_path(path), command)
    }

    pub async fn install_package(
        &self,
        package_file: &PackageFile,
        transport: &Transport,
    ) -> PackMgrResult<InstallOutcome> {
        let bytes = read_package(package_file).await?;
        let upload_url = format!("{}/.json?cmd=upload", self.url);
        let json = transport
            .execute_json(Method::POST, &upload_url, |request| {
                Ok(apply_timeout(request, package_file).multipart(package_form(
                    "package",
                    package_file,
                    &bytes,
                )?))
            })
            .await?;

        let path = match self.classifier.classify_json(&json) {
            ResponseOutcome::Success { path: Some(path), .. } => path,
            ResponseOutcome::Success { path: None, message } => {
                return Err(PackMgrError::Install(format!(
                    "Package upload did not report a package path: {}",
                    message.unwrap_or_default()
                )))
            }
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
            return Ok(InstallOutcome::Uploaded { path: Some(path) });
        }

        info!("Package uploaded, now installing...");
        let command = if package_file.recursive {
            "install&recursive=true"
        } else {
            "install"
        };
        transport
            .execute_html_message(Method::POST, &self.console_url(&path, command), |request| {
                Ok(apply_timeout(request, package_file))
            })
            .await?;

        if package_file.replicate {
            info!("Replicate package...");
            transport
                .execute_html_message(Method::POST, &self.console_url(&path, "replicate"), |request| {
                    Ok(apply_timeout(request, package_file))
                })
                .await?;
        }

        Ok(InstallOutcome::Installed { path })
    }
}
