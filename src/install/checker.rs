use super::status::PackageInstalledStatus;
use crate::core::{PackMgrError, PackMgrResult, PackageCoordinate};
use crate::http::Transport;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Package list service relative to the server root
pub const PACKMGR_LIST_URL: &str = "/crx/packmgr/list.jsp";

/// One known version of a package
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageVersion {
    pub version: String,
    #[serde(default)]
    pub installed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResult {
    #[serde(default)]
    group: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    last_unpacked: Option<i64>,
}

type PackageIndex = BTreeMap<String, BTreeMap<String, Vec<PackageVersion>>>;

/// Classifies a package version against the server's package list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageInstalledChecker {
    packages: PackageIndex,
}

impl PackageInstalledChecker {
    pub fn new(packages: PackageIndex) -> Self {
        Self { packages }
    }

    /// Build from the nested document `{group: {name: [{version, installed}]}}`
    pub fn from_json(json: &Value) -> PackMgrResult<Self> {
        let packages: PackageIndex = serde_json::from_value(json.clone())
            .map_err(|e| PackMgrError::parse("package list", e))?;
        Ok(Self::new(packages))
    }

    /// Build from a `list.jsp` response `{"results": [{group, name, version, lastUnpacked}]}`
    ///
    /// Per group and name, the version unpacked most recently is the installed one.
    pub fn from_list_response(json: &Value) -> PackMgrResult<Self> {
        let results = json.get("results").cloned().ok_or_else(|| {
            PackMgrError::parse(
                format!("JSON response from {}", PACKMGR_LIST_URL),
                "does not contain 'results' array",
            )
        })?;
        let results: Vec<ListResult> = serde_json::from_value(results).map_err(|e| {
            PackMgrError::parse(format!("JSON response from {}", PACKMGR_LIST_URL), e)
        })?;

        let mut unpacked: BTreeMap<(String, String), Vec<(String, i64)>> = BTreeMap::new();
        for item in results {
            if item.version.trim().is_empty() {
                continue;
            }
            unpacked
                .entry((item.group, item.name))
                .or_default()
                .push((item.version, item.last_unpacked.unwrap_or(0)));
        }

        let mut packages = PackageIndex::new();
        for ((group, name), versions) in unpacked {
            // first maximum wins on ties
            let latest = versions
                .iter()
                .filter(|(_, date)| *date > 0)
                .fold(None::<(&str, i64)>, |best, (version, date)| match best {
                    Some((_, best_date)) if best_date >= *date => best,
                    _ => Some((version.as_str(), *date)),
                })
                .map(|(version, _)| version.to_string());

            let entries = versions
                .iter()
                .map(|(version, _)| PackageVersion {
                    version: version.clone(),
                    installed: latest.as_deref() == Some(version.as_str()),
                })
                .collect();
            packages.entry(group).or_default().insert(name, entries);
        }

        Ok(Self::new(packages))
    }

    /// Fetch the package list from the server root
    pub async fn fetch(transport: &Transport, base_url: &str) -> PackMgrResult<Self> {
        let url = format!("{}{}", base_url, PACKMGR_LIST_URL);
        let json = transport.execute_json(Method::GET, &url, Ok).await?;
        Self::from_list_response(&json)
    }

    pub fn get_status(&self, group: &str, name: &str, version: &str) -> PackageInstalledStatus {
        let versions = match self.packages.get(group).and_then(|names| names.get(name)) {
            Some(versions) if !versions.is_empty() => versions,
            _ => return PackageInstalledStatus::NotFound,
        };

        let installed = versions.iter().find(|v| v.installed);
        match installed {
            Some(v) if v.version == version => PackageInstalledStatus::Installed,
            Some(_) => PackageInstalledStatus::InstalledOtherVersion,
            None if versions.iter().any(|v| v.version == version) => PackageInstalledStatus::Uploaded,
            None => PackageInstalledStatus::NotFound,
        }
    }

    pub fn status_of(&self, coordinate: &PackageCoordinate) -> PackageInstalledStatus {
        self.get_status(&coordinate.group, &coordinate.name, &coordinate.version)
    }
}
