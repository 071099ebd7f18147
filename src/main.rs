use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "packdeploy")]
#[command(about = "Deploy content packages to a content repository server")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to <config dir>/packdeploy/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Package manager URL, overrides the configured one
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload and install content packages
    Install {
        /// Package files, deployed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Upload and install even if already present
        #[arg(short, long)]
        force: bool,
        /// Upload only, do not install
        #[arg(long)]
        no_install: bool,
        /// Do not install nested packages
        #[arg(long)]
        no_recursive: bool,
        /// Replicate the package after install
        #[arg(long)]
        replicate: bool,
        /// Seconds to wait after each install
        #[arg(long, default_value_t = 0)]
        delay: u64,
    },
    /// Rebuild a package on the server and download it
    Download {
        /// Local package file identifying the remote package
        file: PathBuf,
        /// Where to write the downloaded package
        #[arg(short, long)]
        output: PathBuf,
        /// Also unpack the downloaded package into this directory
        #[arg(long)]
        unpack_dir: Option<PathBuf>,
    },
    /// Unpack a package archive applying the configured exclusion rules
    Unpack {
        /// Package archive
        archive: PathBuf,
        /// Output directory
        output_dir: PathBuf,
    },
    /// Show the bundle activation status of the server
    BundleStatus,
    /// Show the installed status of a package file
    Status {
        /// Package file
        file: PathBuf,
    },
    /// Store the package manager password in the OS keychain
    Login {
        /// Remove the stored password instead
        #[arg(long)]
        delete: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli::load_config(cli.config.as_deref(), cli.url) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\nError: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Install {
            files,
            force,
            no_install,
            no_recursive,
            replicate,
            delay,
        } => {
            cli::install::run(
                &config,
                cli::install::InstallOptions {
                    files,
                    force,
                    install: !no_install,
                    recursive: !no_recursive,
                    replicate,
                    delay,
                },
            )
            .await
        }
        Commands::Download {
            file,
            output,
            unpack_dir,
        } => cli::download::run(&config, &file, &output, unpack_dir.as_deref()).await,
        Commands::Unpack {
            archive,
            output_dir,
        } => cli::unpack::run(&config, &archive, &output_dir),
        Commands::BundleStatus => cli::bundle_status::run(&config).await,
        Commands::Status { file } => cli::status::run(&config, &file).await,
        Commands::Login { delete } => cli::login::run(&config, delete),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\nError: {}", e);
            ExitCode::FAILURE
        }
    }
}
