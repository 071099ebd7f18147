use packdeploy::config::Config;
use packdeploy::core::{PackMgrError, PackMgrResult};
use packdeploy::download::PackageDownloader;
use packdeploy::http::{Credentials, Transport};
use packdeploy::install::Vendor;
use packdeploy::unpack::ContentUnpacker;
use std::path::Path;

pub async fn run(
    config: &Config,
    file: &Path,
    output: &Path,
    unpack_dir: Option<&Path>,
) -> PackMgrResult<()> {
    let props = &config.package_manager;
    if Vendor::identify(&props.package_manager_url)? != Vendor::Crx {
        return Err(PackMgrError::Config(format!(
            "Package download is only supported for the CRX package manager: {}",
            props.package_manager_url
        )));
    }

    let credentials = Credentials::new(props.user_id.clone(), props.resolve_password()?);
    let transport = Transport::new(props, Some(credentials))?;
    let downloaded = PackageDownloader::new(&props.package_manager_url, transport)
        .with_progress(true)
        .download_file(file, output)
        .await?;
    println!("✓ Downloaded {}", downloaded.display());

    if let Some(dir) = unpack_dir {
        let report = ContentUnpacker::from_properties(&config.unpack)?.unpack(&downloaded, dir)?;
        println!(
            "✓ Unpacked {} file(s) to {}",
            report.written.len(),
            dir.display()
        );
    }
    Ok(())
}
