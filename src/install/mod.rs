//! Package upload and install against CRX or Composum package managers.

pub mod checker;
pub mod composum;
pub mod crx;
pub mod installer;
pub mod status;
pub mod vendor;

pub use checker::PackageInstalledChecker;
pub use composum::ComposumPackageInstaller;
pub use crx::CrxPackageInstaller;
pub use installer::PackageInstaller;
pub use status::PackageInstalledStatus;
pub use vendor::Vendor;

use crate::core::{PackMgrError, PackMgrResult, PackageCoordinate, PackageFile};
use crate::http::Transport;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use std::time::Duration;

/// What an install run did with one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Uploaded and installed at the given remote path
    Installed { path: String },
    /// Uploaded only, install was not requested
    Uploaded { path: Option<String> },
    /// The server already had the package; nothing was uploaded
    AlreadyUploaded { path: String },
    /// The installed package list already lists this exact version as installed
    AlreadyInstalled { coordinate: PackageCoordinate },
}

impl InstallOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            InstallOutcome::AlreadyUploaded { .. } | InstallOutcome::AlreadyInstalled { .. }
        )
    }
}

/// Vendor-specific install dialect behind one interface
#[derive(Debug, Clone)]
pub enum VendorPackageInstaller {
    Crx(CrxPackageInstaller),
    Composum(ComposumPackageInstaller),
}

impl VendorPackageInstaller {
    /// Pick the installer matching the package manager URL
    pub fn for_url(url: &str) -> PackMgrResult<Self> {
        Ok(match Vendor::identify(url)? {
            Vendor::Crx => VendorPackageInstaller::Crx(CrxPackageInstaller::new(url)),
            Vendor::Composum => VendorPackageInstaller::Composum(ComposumPackageInstaller::new(url)),
        })
    }

    pub fn vendor(&self) -> Vendor {
        match self {
            VendorPackageInstaller::Crx(_) => Vendor::Crx,
            VendorPackageInstaller::Composum(_) => Vendor::Composum,
        }
    }

    /// Upload the package and run the vendor install sequence
    pub async fn install_package(
        &self,
        package_file: &PackageFile,
        transport: &Transport,
    ) -> PackMgrResult<InstallOutcome> {
        match self {
            VendorPackageInstaller::Crx(installer) => {
                installer.install_package(package_file, transport).await
            }
            VendorPackageInstaller::Composum(installer) => {
                installer.install_package(package_file, transport).await
            }
        }
    }
}

/// Read the package archive once so each upload attempt can rebuild its form
pub(crate) async fn read_package(package_file: &PackageFile) -> PackMgrResult<Vec<u8>> {
    tokio::fs::read(package_file.path()).await.map_err(|e| {
        PackMgrError::Path(format!(
            "Failed to read package {}: {}",
            package_file.path().display(),
            e
        ))
    })
}

/// Multipart form with the archive under `field` plus the optional force flag
pub(crate) fn package_form(
    field: &str,
    package_file: &PackageFile,
    bytes: &[u8],
) -> PackMgrResult<Form> {
    let part = Part::bytes(bytes.to_vec())
        .file_name(package_file.file_name())
        .mime_str("application/zip")
        .map_err(|e| PackMgrError::Install(format!("Failed to create multipart part: {}", e)))?;
    let form = Form::new().part(field.to_string(), part);
    Ok(if package_file.force {
        form.text("force", "true")
    } else {
        form
    })
}

/// Apply the per-package socket timeout override, if any
pub(crate) fn apply_timeout(request: RequestBuilder, package_file: &PackageFile) -> RequestBuilder {
    match package_file.http_socket_timeout_sec {
        Some(seconds) => request.timeout(Duration::from_secs(seconds)),
        None => request,
    }
}
