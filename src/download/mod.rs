//! Fetch a package back from the server: locate, rebuild, stream to disk.

use crate::core::{PackMgrError, PackMgrResult, PackageFile};
use crate::http::{encode_path, ResponseClassifier, ResponseOutcome, Transport};
use crate::install::{read_package, package_form, Vendor};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Method, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Downloads a package known to the CRX package manager
pub struct PackageDownloader {
    url: String,
    transport: Transport,
    classifier: ResponseClassifier,
    show_progress: bool,
}

impl PackageDownloader {
    pub fn new(url: impl Into<String>, transport: Transport) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            transport,
            classifier: ResponseClassifier::default(),
            show_progress: false,
        }
    }

    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Draw a progress bar while streaming
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Upload (force) the local package to learn its remote path, rebuild it
    /// on the server and download the result to `output`
    pub async fn download_file(&self, package_file: &Path, output: &Path) -> PackMgrResult<PathBuf> {
        if !package_file.is_file() {
            return Err(PackMgrError::Path(format!(
                "File not found: {}",
                package_file.display()
            )));
        }
        info!(
            "Download {} from {}",
            package_file.display(),
            self.url
        );

        let path = self.locate(package_file).await?;
        info!("Package path is: {} - now rebuilding package...", path);
        self.build(&path).await?;
        self.download(&path, output).await
    }

    /// Remote package path, taken from the "already exists" message when needed
    pub async fn locate(&self, package_file: &Path) -> PackMgrResult<String> {
        let package_file = PackageFile::new(package_file).with_force(true);
        let bytes = read_package(&package_file).await?;
        let upload_url = format!("{}/.json?cmd=upload", self.url);
        let json = self
            .transport
            .execute_json(Method::POST, &upload_url, |request| {
                Ok(request.multipart(package_form("package", &package_file, &bytes)?))
            })
            .await?;

        match self.classifier.classify_json(&json) {
            ResponseOutcome::Success { path: Some(path), .. }
            | ResponseOutcome::AlreadyExists { path, .. } => Ok(path),
            ResponseOutcome::Success { path: None, message } => Err(PackMgrError::Install(format!(
                "Package path detection failed: {}",
                message.unwrap_or_default()
            ))),
            ResponseOutcome::Failure { message } => Err(PackMgrError::Install(format!(
                "Package path detection failed: {}",
                message
            ))),
        }
    }

    /// Rebuild the package at `path`
    pub async fn build(&self, path: &str) -> PackMgrResult<()> {
        let url = format!("{}/console.html{}?cmd=build", self.url, encode_path(path));
        self.transport
            .execute_html_message(Method::POST, &url, Ok)
            .await
            .map_err(|e| match e {
                PackMgrError::Transport { .. } => {
                    PackMgrError::Install(format!("Package build failed: {}", e))
                }
                other => other,
            })?;
        Ok(())
    }

    /// Stream the package at `path` into `output`, replacing any existing file
    pub async fn download(&self, path: &str, output: &Path) -> PackMgrResult<PathBuf> {
        let url = format!("{}{}", Vendor::base_url(&self.url)?, encode_path(path));
        let response = self.transport.get_stream(&url).await?;
        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PackMgrError::transport(url, status, &body));
        }

        if output.exists() {
            tokio::fs::remove_file(output).await?;
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Err(e) = self.write_body(response, &url, output).await {
            if let Err(cleanup) = tokio::fs::remove_file(output).await {
                warn!("Failed to remove partial download {}: {}", output.display(), cleanup);
            }
            return Err(e);
        }

        info!("Package downloaded to {}", output.display());
        Ok(output.to_path_buf())
    }

    async fn write_body(&self, mut response: Response, url: &str, output: &Path) -> PackMgrResult<()> {
        let progress = self.progress_bar(response.content_length());
        let mut file = File::create(output).await?;

        loop {
            let chunk = response.chunk().await.map_err(|e| PackMgrError::Network {
                url: url.to_string(),
                message: format!("Download interrupted: {}", e),
            })?;
            match chunk {
                Some(bytes) => {
                    file.write_all(&bytes).await?;
                    progress.inc(bytes.len() as u64);
                }
                None => break,
            }
        }

        file.flush().await?;
        progress.finish_and_clear();
        Ok(())
    }

    fn progress_bar(&self, length: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(length.unwrap_or(0));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    }
}
