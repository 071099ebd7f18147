use crate::core::error::{PackMgrError, PackMgrResult};
use std::path::{Path, PathBuf};

/// Get the packdeploy home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\packdeploy
/// - Linux: ~/.config/packdeploy
/// - macOS: ~/Library/Application Support/packdeploy
pub fn packdeploy_home() -> PackMgrResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| PackMgrError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("packdeploy"))
}

/// Get the config file path (`<home>/config.yaml`)
pub fn config_file() -> PackMgrResult<PathBuf> {
    Ok(packdeploy_home()?.join("config.yaml"))
}

/// Ensure a directory exists, creating it and its parents if needed
pub fn ensure_dir(path: &Path) -> PackMgrResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Normalize an archive entry name to forward slashes without a leading slash
pub fn normalize_entry_path(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_string()
}
