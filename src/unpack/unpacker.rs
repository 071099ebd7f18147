use super::docview::{ensure_namespace, process_descriptor, ReplicationMarker};
use super::namespace::{get_namespace_prefix, is_content_descriptor, repository_path};
use super::rules::ExclusionRuleSet;
use crate::config::ContentUnpackerProperties;
use crate::core::path::{ensure_dir, normalize_entry_path};
use crate::core::{PackMgrError, PackMgrResult};
use crate::filter::PatternList;
use crate::xml;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// What an unpack run did with the archive entries
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UnpackReport {
    /// Files written below the output directory
    pub written: Vec<PathBuf>,
    /// Entry paths skipped by file or node rules
    pub excluded: Vec<String>,
    /// Descriptors that could not be parsed and were copied unchanged
    pub malformed: Vec<String>,
}

/// Extracts a content package to a directory, filtering on the way
pub struct ContentUnpacker {
    rules: ExclusionRuleSet,
    marker: Option<ReplicationMarker>,
}

impl ContentUnpacker {
    pub fn new(rules: ExclusionRuleSet) -> Self {
        Self { rules, marker: None }
    }

    pub fn with_replication_marker(mut self, marker: ReplicationMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn from_properties(props: &ContentUnpackerProperties) -> PackMgrResult<Self> {
        let unpacker = Self::new(ExclusionRuleSet::from_properties(props)?);
        if !props.mark_replication_activated {
            return Ok(unpacker);
        }
        let include = PatternList::compile(&props.mark_replication_activated_include_nodes)?;
        let date = props
            .date_last_replicated
            .unwrap_or_else(|| chrono::Local::now().into());
        Ok(unpacker.with_replication_marker(ReplicationMarker::new(
            include,
            date,
            props.replicated_by.clone(),
        )))
    }

    /// Extract `archive` into `output_dir`, replacing files that already exist
    pub fn unpack(&self, archive: &Path, output_dir: &Path) -> PackMgrResult<UnpackReport> {
        let file = File::open(archive).map_err(|e| {
            PackMgrError::Unpack(format!("Unable to read {}: {}", archive.display(), e))
        })?;
        let mut zip = ZipArchive::new(file).map_err(|e| {
            PackMgrError::Unpack(format!("Invalid package archive {}: {}", archive.display(), e))
        })?;

        info!("Unpack {} to {}", archive.display(), output_dir.display());
        ensure_dir(output_dir)?;

        let mut report = UnpackReport::default();
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(|e| {
                PackMgrError::Unpack(format!(
                    "Unable to read entry {} of {}: {}",
                    index,
                    archive.display(),
                    e
                ))
            })?;

            let name = normalize_entry_path(entry.name());
            let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
                warn!("Skipping entry with unsafe path: {}", name);
                report.excluded.push(name);
                continue;
            };

            if self.is_excluded(&name) {
                debug!("Excluded: {}", name);
                report.excluded.push(name);
                continue;
            }

            let target = output_dir.join(&relative);
            if entry.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }

            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).map_err(|e| {
                PackMgrError::Unpack(format!("Unable to extract {}: {}", name, e))
            })?;

            let content = if self.rewrites(&name) {
                match self.rewrite_descriptor(&name, &bytes) {
                    Ok(content) => content.into_bytes(),
                    Err(e) => {
                        warn!("Copying malformed descriptor {} unchanged: {}", name, e);
                        report.malformed.push(name.clone());
                        bytes
                    }
                }
            } else {
                bytes
            };

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            if target.exists() {
                fs::remove_file(&target)?;
            }
            fs::write(&target, content)?;
            report.written.push(target);
        }

        info!(
            "Unpacked {} files ({} excluded)",
            report.written.len(),
            report.excluded.len()
        );
        Ok(report)
    }

    fn is_excluded(&self, name: &str) -> bool {
        if self.rules.exclude_file(name) {
            return true;
        }
        repository_path(name)
            .map(|node_path| self.rules.exclude_node_subtree(&node_path))
            .unwrap_or(false)
    }

    fn rewrites(&self, name: &str) -> bool {
        is_content_descriptor(name) && (self.rules.filters_descriptors() || self.marker.is_some())
    }

    fn rewrite_descriptor(&self, name: &str, bytes: &[u8]) -> PackMgrResult<String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PackMgrError::parse(name.to_string(), e))?;
        let mut root = xml::parse(text)?;
        let node_path = repository_path(name).unwrap_or_else(|| "/".to_string());

        process_descriptor(&mut root, &node_path, &self.rules, self.marker.as_ref());
        if let Some(prefix) = get_namespace_prefix(name) {
            ensure_namespace(&mut root, &prefix);
        }
        Ok(xml::write_docview(&root))
    }
}
