use crate::core::{PackMgrError, PackMgrResult};
use std::fmt;

/// Path identifying the CRX package manager service
pub const CRX_URL: &str = "/crx/packmgr/service";

/// Path identifying the Composum package manager
pub const COMPOSUM_URL: &str = "/bin/cpm/";

/// Package manager dialect spoken by the target server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Crx,
    Composum,
}

impl Vendor {
    /// Identify the vendor from the package manager URL
    pub fn identify(url: &str) -> PackMgrResult<Self> {
        match Self::vendor_path_index(url) {
            Some((vendor, _)) => Ok(vendor),
            None => Err(PackMgrError::Config(format!(
                "Given URL is not supported: {}",
                url
            ))),
        }
    }

    /// Server root without the vendor service path
    pub fn base_url(url: &str) -> PackMgrResult<String> {
        match Self::vendor_path_index(url) {
            Some((_, index)) => Ok(url[..index].to_string()),
            None => Err(PackMgrError::Config(format!(
                "Given URL is not supported: {}",
                url
            ))),
        }
    }

    fn vendor_path_index(url: &str) -> Option<(Self, usize)> {
        if let Some(index) = url.find(COMPOSUM_URL).filter(|i| *i > 0) {
            return Some((Vendor::Composum, index));
        }
        url.find(CRX_URL)
            .filter(|i| *i > 0)
            .map(|index| (Vendor::Crx, index))
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Crx => write!(f, "CRX"),
            Vendor::Composum => write!(f, "Composum"),
        }
    }
}
