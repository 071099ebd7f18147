use packdeploy::config::Config;
use packdeploy::core::{PackMgrResult, PackageFile};
use packdeploy::install::{InstallOutcome, PackageInstaller};
use std::path::PathBuf;

pub struct InstallOptions {
    pub files: Vec<PathBuf>,
    pub force: bool,
    pub install: bool,
    pub recursive: bool,
    pub replicate: bool,
    pub delay: u64,
}

impl InstallOptions {
    fn package_files(&self) -> Vec<PackageFile> {
        self.files
            .iter()
            .map(|file| PackageFile {
                install: self.install,
                recursive: self.recursive,
                replicate: self.replicate,
                delay_after_install_sec: self.delay,
                ..PackageFile::new(file.clone()).with_force(self.force)
            })
            .collect()
    }
}

pub async fn run(config: &Config, options: InstallOptions) -> PackMgrResult<()> {
    let installer = PackageInstaller::new(&config.package_manager)?;
    let files = options.package_files();

    println!(
        "Deploying {} package(s) to {} ({})",
        files.len(),
        config.package_manager.package_manager_url,
        installer.vendor()
    );

    for file in &files {
        let outcome = installer.install_file(file).await?;
        println!("{}", describe(&file.file_name(), &outcome));
    }

    println!("✓ Done");
    Ok(())
}

fn describe(file_name: &str, outcome: &InstallOutcome) -> String {
    match outcome {
        InstallOutcome::Installed { path } => format!("✓ {}: installed {}", file_name, path),
        InstallOutcome::Uploaded { path: Some(path) } => {
            format!("✓ {}: uploaded {}", file_name, path)
        }
        InstallOutcome::Uploaded { path: None } => format!("✓ {}: uploaded", file_name),
        InstallOutcome::AlreadyUploaded { path } => {
            format!("- {}: skipped, already uploaded at {}", file_name, path)
        }
        InstallOutcome::AlreadyInstalled { coordinate } => {
            format!("- {}: skipped, {} is already installed", file_name, coordinate)
        }
    }
}
