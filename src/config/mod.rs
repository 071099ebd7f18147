use crate::core::path::config_file;
use crate::core::{CredentialStore, PackMgrError, PackMgrResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides the configured package manager password
pub const PASSWORD_ENV: &str = "PACKDEPLOY_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Package manager connection and retry settings
    #[serde(default)]
    pub package_manager: PackageManagerProperties,

    /// Exclusion rules applied when unpacking content packages
    #[serde(default)]
    pub unpack: ContentUnpackerProperties,
}

/// Connection settings for the package manager HTTP service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManagerProperties {
    /// URL of the package manager HTTP service
    ///
    /// Examples:
    /// - CRX: http://localhost:4502/crx/packmgr/service
    /// - Composum: http://localhost:9090/bin/cpm/package.service.html
    #[serde(default = "default_package_manager_url")]
    pub package_manager_url: String,

    /// User to authenticate against the package manager
    #[serde(default = "default_user")]
    pub user_id: String,

    /// Password for the package manager (falls back to env and keychain)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// User for the Felix console (falls back to `user_id`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_user_id: Option<String>,

    /// Password for the Felix console (falls back to the package manager password)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_password: Option<String>,

    /// Number of times a failed HTTP call is retried
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Seconds between retry attempts (initial delay of the backoff)
    #[serde(default = "default_retry_delay_sec")]
    pub retry_delay_sec: u64,

    /// Bundle list JSON URL, e.g. http://localhost:4502/system/console/bundles/.json
    ///
    /// When set, installs wait until all bundles are running before and after
    /// each package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_status_url: Option<String>,

    /// Maximum seconds to wait for a positive bundle status
    #[serde(default = "default_bundle_status_wait_limit_sec")]
    pub bundle_status_wait_limit_sec: u64,

    /// Bundles that must not be present; their presence means an earlier
    /// installation is still in progress
    #[serde(default)]
    pub bundle_status_blacklist_bundle_names: Vec<String>,

    /// Bundles whose "resolved" state is tolerated
    #[serde(default)]
    pub bundle_status_whitelist_bundle_names: Vec<String>,

    /// Accept self-signed certificates
    #[serde(default)]
    pub relaxed_ssl_check: bool,

    #[serde(default = "default_http_connect_timeout_sec")]
    pub http_connect_timeout_sec: u64,

    #[serde(default = "default_http_socket_timeout_sec")]
    pub http_socket_timeout_sec: u64,

    /// HTTP proxies
    #[serde(default)]
    pub proxies: Vec<ProxyConfig>,
}

/// HTTP proxy definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_protocol")]
    pub protocol: String,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// `|`-separated host patterns with `*` wildcards that bypass the proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_proxy_hosts: Option<String>,
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    pub fn use_authentication(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Check a host against the `non_proxy_hosts` wildcard list
    pub fn is_non_proxy_host(&self, host: &str) -> bool {
        let Some(hosts) = self.non_proxy_hosts.as_deref() else {
            return false;
        };
        hosts
            .split('|')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .any(|pattern| {
                let regex = format!(
                    "^(?:{})$",
                    regex::escape(pattern).replace("\\*", ".*")
                );
                regex::Regex::new(&regex)
                    .map(|r| r.is_match(host))
                    .unwrap_or(false)
            })
    }
}

/// Exclusion and augmentation rules for `ContentUnpacker`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentUnpackerProperties {
    /// Regex patterns for archive file paths to skip
    #[serde(default)]
    pub exclude_files: Vec<String>,

    /// Regex patterns for repository node paths to drop (with subtree)
    #[serde(default)]
    pub exclude_nodes: Vec<String>,

    /// Regex patterns for property names to drop
    #[serde(default)]
    pub exclude_properties: Vec<String>,

    /// Regex patterns for mixin types to drop from `jcr:mixinTypes`
    #[serde(default)]
    pub exclude_mixins: Vec<String>,

    /// Add replication properties marking content as activated
    #[serde(default)]
    pub mark_replication_activated: bool,

    /// Restrict replication marking to matching node paths
    #[serde(default)]
    pub mark_replication_activated_include_nodes: Vec<String>,

    /// Replication timestamp; defaults to the time of unpacking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_last_replicated: Option<chrono::DateTime<chrono::FixedOffset>>,

    #[serde(default = "default_user")]
    pub replicated_by: String,
}

impl Default for ContentUnpackerProperties {
    fn default() -> Self {
        Self {
            exclude_files: Vec::new(),
            exclude_nodes: Vec::new(),
            exclude_properties: Vec::new(),
            exclude_mixins: Vec::new(),
            mark_replication_activated: false,
            mark_replication_activated_include_nodes: Vec::new(),
            date_last_replicated: None,
            replicated_by: default_user(),
        }
    }
}

fn default_package_manager_url() -> String {
    "http://localhost:4502/crx/packmgr/service".to_string()
}

fn default_user() -> String {
    "admin".to_string()
}

fn default_retry_count() -> u32 {
    24
}

fn default_retry_delay_sec() -> u64 {
    5
}

fn default_bundle_status_wait_limit_sec() -> u64 {
    360
}

fn default_http_connect_timeout_sec() -> u64 {
    10
}

fn default_http_socket_timeout_sec() -> u64 {
    60
}

fn default_proxy_protocol() -> String {
    "http".to_string()
}

impl Default for PackageManagerProperties {
    fn default() -> Self {
        Self {
            package_manager_url: default_package_manager_url(),
            user_id: default_user(),
            password: None,
            console_user_id: None,
            console_password: None,
            retry_count: default_retry_count(),
            retry_delay_sec: default_retry_delay_sec(),
            bundle_status_url: None,
            bundle_status_wait_limit_sec: default_bundle_status_wait_limit_sec(),
            bundle_status_blacklist_bundle_names: Vec::new(),
            bundle_status_whitelist_bundle_names: Vec::new(),
            relaxed_ssl_check: false,
            http_connect_timeout_sec: default_http_connect_timeout_sec(),
            http_socket_timeout_sec: default_http_socket_timeout_sec(),
            proxies: Vec::new(),
        }
    }
}

impl PackageManagerProperties {
    /// Resolve the package manager password
    ///
    /// Order: `PACKDEPLOY_PASSWORD`, config file, OS keychain entry for `user_id`.
    pub fn resolve_password(&self) -> PackMgrResult<String> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(password);
        }
        if let Some(ref password) = self.password {
            return Ok(password.clone());
        }
        CredentialStore::retrieve(&self.user_id)
    }

    pub fn console_user_id(&self) -> &str {
        self.console_user_id.as_deref().unwrap_or(&self.user_id)
    }

    pub fn resolve_console_password(&self) -> PackMgrResult<String> {
        match self.console_password {
            Some(ref password) => Ok(password.clone()),
            None => self.resolve_password(),
        }
    }
}

impl Config {
    /// Load config from the platform config directory; defaults if the file doesn't exist
    ///
    /// Config locations:
    /// - Windows: %APPDATA%\packdeploy\config.yaml
    /// - Linux: ~/.config/packdeploy/config.yaml
    /// - macOS: ~/Library/Application Support/packdeploy/config.yaml
    pub fn load() -> PackMgrResult<Self> {
        let config_path = config_file()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> PackMgrResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PackMgrError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> PackMgrResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| PackMgrError::Config(format!("Failed to parse config: {}", e)))
    }
}
