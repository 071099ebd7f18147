use super::status::{BundleEntry, BundleStatus};
use crate::core::{PackMgrError, PackMgrResult};
use crate::filter::PatternList;
use serde_json::Value;

const CONTEXT: &str = "bundle list";

/// OSGi numeric bundle states; everything else counts as installed
const STATE_RESOLVED: u64 = 4;
const STATE_ACTIVE: u64 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Active,
    Fragment,
    Resolved,
    Installed,
}

/// Parses bundle list documents into [`BundleStatus`] snapshots
///
/// Stateless apart from the whitelist, so one parser can be reused for
/// every poll.
#[derive(Debug, Clone, Default)]
pub struct BundleStatusParser {
    whitelist: PatternList,
}

impl BundleStatusParser {
    pub fn new(whitelist: PatternList) -> Self {
        Self { whitelist }
    }

    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> PackMgrResult<Self> {
        Ok(Self::new(PatternList::compile(patterns)?))
    }

    /// Parse a Felix console document or a bare array of bundle records
    pub fn parse(&self, json: &str) -> PackMgrResult<BundleStatus> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| PackMgrError::parse(CONTEXT, e))?;

        let (status_line, records) = match document {
            Value::Array(records) => (None, records),
            Value::Object(mut map) => {
                let status_line = map.get("status").and_then(Value::as_str).map(str::to_string);
                match map.remove("data") {
                    Some(Value::Array(records)) => (status_line, records),
                    _ => return Err(PackMgrError::parse(CONTEXT, "missing 'data' array")),
                }
            }
            _ => {
                return Err(PackMgrError::parse(
                    CONTEXT,
                    "expected an object or an array of bundles",
                ))
            }
        };

        let mut status = BundleStatus {
            status_line,
            total: 0,
            active: 0,
            active_fragment: 0,
            resolved: 0,
            installed: 0,
            ignored: 0,
            bundles: Vec::with_capacity(records.len()),
            whitelist: self.whitelist.clone(),
        };

        for (index, record) in records.iter().enumerate() {
            let record = record.as_object().ok_or_else(|| {
                PackMgrError::parse(CONTEXT, format!("bundle #{} is not an object", index))
            })?;
            let symbolic_name = record
                .get("symbolicName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let fragment = record.get("fragment").and_then(Value::as_bool).unwrap_or(false);
            let (state, bucket) = classify_state(record.get("state"), record.get("stateRaw"));
            let bucket = if fragment { Bucket::Fragment } else { bucket };

            status.total += 1;
            match bucket {
                Bucket::Active => status.active += 1,
                Bucket::Fragment => status.active_fragment += 1,
                Bucket::Resolved if self.whitelist.matches(&symbolic_name) => status.ignored += 1,
                Bucket::Resolved => status.resolved += 1,
                Bucket::Installed => status.installed += 1,
            }

            if !symbolic_name.trim().is_empty() {
                status.bundles.push(BundleEntry {
                    symbolic_name,
                    state,
                });
            }
        }

        Ok(status)
    }
}

/// Map a string or numeric state to its bucket
///
/// Starting, stopping and unrecognized states count as installed.
fn classify_state(state: Option<&Value>, state_raw: Option<&Value>) -> (String, Bucket) {
    if let Some(text) = state.and_then(Value::as_str) {
        let bucket = match text.to_ascii_lowercase().as_str() {
            "active" => Bucket::Active,
            "fragment" => Bucket::Fragment,
            "resolved" => Bucket::Resolved,
            _ => Bucket::Installed,
        };
        return (text.to_string(), bucket);
    }

    let raw = state
        .and_then(Value::as_u64)
        .or_else(|| state_raw.and_then(Value::as_u64));
    match raw {
        Some(STATE_ACTIVE) => (STATE_ACTIVE.to_string(), Bucket::Active),
        Some(STATE_RESOLVED) => (STATE_RESOLVED.to_string(), Bucket::Resolved),
        Some(code) => (code.to_string(), Bucket::Installed),
        None => (String::new(), Bucket::Installed),
    }
}
