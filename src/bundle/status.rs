use crate::filter::PatternList;
use regex::Regex;

/// One bundle as reported by the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub symbolic_name: String,
    /// State exactly as reported (`Active`, `Resolved`, `32`, ...)
    pub state: String,
}

/// Aggregate health snapshot of a bundle list
///
/// Built once per poll sample by [`BundleStatusParser`](super::BundleStatusParser)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleStatus {
    pub(crate) status_line: Option<String>,
    pub(crate) total: usize,
    pub(crate) active: usize,
    pub(crate) active_fragment: usize,
    pub(crate) resolved: usize,
    pub(crate) installed: usize,
    pub(crate) ignored: usize,
    pub(crate) bundles: Vec<BundleEntry>,
    pub(crate) whitelist: PatternList,
}

impl BundleStatus {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_fragment(&self) -> usize {
        self.active_fragment
    }

    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn installed(&self) -> usize {
        self.installed
    }

    pub fn ignored(&self) -> usize {
        self.ignored
    }

    pub fn bundles(&self) -> &[BundleEntry] {
        &self.bundles
    }

    /// Whitelist patterns applied while parsing
    pub fn whitelist(&self) -> &PatternList {
        &self.whitelist
    }

    /// True when nothing is left resolved or merely installed
    ///
    /// Whitelisted bundles are counted as ignored and never block.
    pub fn is_all_bundles_running(&self) -> bool {
        self.resolved == 0 && self.installed == 0
    }

    /// Exact membership over every reported bundle, whitelisted or not
    pub fn contains_bundle(&self, symbolic_name: &str) -> bool {
        self.bundles.iter().any(|b| b.symbolic_name == symbolic_name)
    }

    /// First bundle (in report order) whose name matches `pattern`
    pub fn get_matching_bundle(&self, pattern: &Regex) -> Option<&str> {
        self.bundles
            .iter()
            .map(|b| b.symbolic_name.as_str())
            .find(|name| pattern.is_match(name))
    }

    /// Raw state of a bundle
    pub fn state_of(&self, symbolic_name: &str) -> Option<&str> {
        self.bundles
            .iter()
            .find(|b| b.symbolic_name == symbolic_name)
            .map(|b| b.state.as_str())
    }

    /// Summary like `597 total, 590 active, 4 fragment, 3 resolved`
    ///
    /// Zero buckets are left out, except total which always leads.
    pub fn status_line_compact(&self) -> String {
        let buckets = [
            (self.active, "active"),
            (self.active_fragment, "fragment"),
            (self.resolved, "resolved"),
            (self.installed, "installed"),
            (self.ignored, "ignored"),
        ];
        let mut parts = vec![format!("{} total", self.total)];
        parts.extend(
            buckets
                .iter()
                .filter(|(count, _)| *count > 0)
                .map(|(count, label)| format!("{} {}", count, label)),
        );
        parts.join(", ")
    }

    /// Status line reported by the console, or the compact summary when absent
    pub fn status_line(&self) -> String {
        match self.status_line {
            Some(ref line) if !line.trim().is_empty() => line.clone(),
            _ => self.status_line_compact(),
        }
    }
}
