//! Package value types shared by installer, downloader and CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies a content package independent of its physical file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageCoordinate {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl PackageCoordinate {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A package archive to deploy plus per-file deployment options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    /// Content package file
    pub file: PathBuf,

    /// Upload and install even if the package manager reports it as already present
    #[serde(default)]
    pub force: bool,

    /// Install (unpack) the package after upload
    #[serde(default = "default_true")]
    pub install: bool,

    /// Install nested packages as well
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Replicate the package to publish instances after install
    #[serde(default)]
    pub replicate: bool,

    /// Wait this many seconds after the install before continuing
    #[serde(default)]
    pub delay_after_install_sec: u64,

    /// Socket timeout override for the calls of this package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_socket_timeout_sec: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl PackageFile {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            force: false,
            install: true,
            recursive: true,
            replicate: false,
            delay_after_install_sec: 0,
            http_socket_timeout_sec: None,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// File name used for multipart uploads
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "package.zip".to_string())
    }
}
