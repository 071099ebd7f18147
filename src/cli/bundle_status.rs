use packdeploy::bundle::BundleStatusChecker;
use packdeploy::config::Config;
use packdeploy::core::{PackMgrError, PackMgrResult};

pub async fn run(config: &Config) -> PackMgrResult<()> {
    let checker = BundleStatusChecker::from_properties(&config.package_manager)?.ok_or_else(|| {
        PackMgrError::Config("No bundle_status_url configured".to_string())
    })?;

    let status = checker.fetch().await?;
    println!("{}", status.status_line());
    println!("  {}", status.status_line_compact());

    if let Some(name) = checker.blacklisted_bundle(&status) {
        println!("  blacklisted bundle present: {}", name);
    }
    if checker.is_ready(&status) {
        println!("✓ All bundles are running");
    } else {
        println!("❌ Bundles are not running yet");
    }
    Ok(())
}
