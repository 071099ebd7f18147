use packdeploy::config::Config;
use packdeploy::core::PackMgrResult;
use packdeploy::unpack::ContentUnpacker;
use std::path::Path;

pub fn run(config: &Config, archive: &Path, output_dir: &Path) -> PackMgrResult<()> {
    let unpacker = ContentUnpacker::from_properties(&config.unpack)?;
    let report = unpacker.unpack(archive, output_dir)?;

    println!(
        "✓ Unpacked {} file(s) to {}",
        report.written.len(),
        output_dir.display()
    );
    if !report.excluded.is_empty() {
        println!("  {} excluded", report.excluded.len());
    }
    for name in &report.malformed {
        println!("  ⚠ {}: malformed descriptor copied unchanged", name);
    }
    Ok(())
}
