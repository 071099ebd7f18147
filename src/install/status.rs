use std::fmt;

/// Installation state of a package version on the server
///
/// Derived on every check from the current package list; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageInstalledStatus {
    /// Neither this version nor an installed sibling version is known
    NotFound,
    /// This version is uploaded but not installed
    Uploaded,
    /// This version is the installed one
    Installed,
    /// Another version of the package is the installed one
    InstalledOtherVersion,
}

impl fmt::Display for PackageInstalledStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PackageInstalledStatus::NotFound => "NOT_FOUND",
            PackageInstalledStatus::Uploaded => "UPLOADED",
            PackageInstalledStatus::Installed => "INSTALLED",
            PackageInstalledStatus::InstalledOtherVersion => "INSTALLED_OTHER_VERSION",
        };
        f.write_str(label)
    }
}
