pub mod bundle_status;
pub mod download;
pub mod install;
pub mod login;
pub mod status;
pub mod unpack;

use packdeploy::config::Config;
use packdeploy::core::PackMgrResult;
use std::path::Path;

/// Load the configuration file and apply command line overrides
pub fn load_config(path: Option<&Path>, url: Option<String>) -> PackMgrResult<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(url) = url {
        config.package_manager.package_manager_url = url;
    }
    Ok(config)
}
