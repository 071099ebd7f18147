use packdeploy::config::Config;
use packdeploy::core::{PackMgrResult, PackageFile};
use packdeploy::install::PackageInstaller;
use std::path::Path;

pub async fn run(config: &Config, file: &Path) -> PackMgrResult<()> {
    let installer = PackageInstaller::new(&config.package_manager)?;
    let (coordinate, status) = installer.status(&PackageFile::new(file)).await?;
    println!("{}: {}", coordinate, status);
    Ok(())
}
