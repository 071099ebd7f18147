//! Classification of package manager responses.
//!
//! Every installer and downloader step goes through [`ResponseClassifier`] so
//! that the "package already exists" detection lives in exactly one place.
//! The detection matches a literal server message prefix; swap the prefix
//! with [`ResponseClassifier::with_exists_prefix`] for servers that phrase it
//! differently.

use crate::core::{PackMgrError, PackMgrResult};
use crate::xml;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Message prefix the CRX package manager uses when an uploaded package already exists
pub const PACKAGE_EXISTS_PREFIX: &str = "Package already exists: ";

/// Marker text in HTML console responses signalling a failed command
pub const PACKAGE_MANAGER_ERROR_INDICATION: &str = "Error during processing.";

static HTML_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style[^<>]*>[^<>]*</style>").expect("valid regex"));
static HTML_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<script[^<>]*>[^<>]*</script>").expect("valid regex"));
static HTML_ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("valid regex"));

/// What a package manager response means for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The command succeeded; `path` is the remote package path when reported
    Success {
        path: Option<String>,
        message: Option<String>,
    },
    /// The package is already on the server; a designed skip path, not a failure
    AlreadyExists { path: String, message: String },
    /// The command was rejected; `message` is the server text verbatim
    Failure { message: String },
}

#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    exists_prefix: String,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::with_exists_prefix(PACKAGE_EXISTS_PREFIX)
    }
}

impl ResponseClassifier {
    pub fn with_exists_prefix(prefix: impl Into<String>) -> Self {
        Self {
            exists_prefix: prefix.into(),
        }
    }

    /// Classify a success flag plus optional message and path
    pub fn classify(
        &self,
        success: bool,
        message: Option<&str>,
        path: Option<&str>,
    ) -> ResponseOutcome {
        let path = path.filter(|p| !p.trim().is_empty()).map(str::to_string);
        if success {
            return ResponseOutcome::Success {
                path,
                message: message.map(str::to_string),
            };
        }
        match message {
            Some(msg) if msg.starts_with(&self.exists_prefix) => {
                let path = path.unwrap_or_else(|| msg[self.exists_prefix.len()..].trim().to_string());
                ResponseOutcome::AlreadyExists {
                    path,
                    message: msg.to_string(),
                }
            }
            Some(msg) => ResponseOutcome::Failure {
                message: msg.to_string(),
            },
            None => ResponseOutcome::Failure {
                message: "Invalid response (null).".to_string(),
            },
        }
    }

    /// Classify a CRX JSON response `{success, msg, path}`
    pub fn classify_json(&self, json: &Value) -> ResponseOutcome {
        let success = json.get("success").and_then(Value::as_bool).unwrap_or(false);
        let message = json.get("msg").and_then(Value::as_str);
        let path = json.get("path").and_then(Value::as_str);
        self.classify(success, message, path)
    }

    /// Classify an XML response carrying `<status code="N">text</status>`
    ///
    /// An optional `<path>` element reports the remote package path.
    pub fn classify_xml_status(&self, body: &str) -> PackMgrResult<ResponseOutcome> {
        let root = xml::parse(body)?;
        let status = root
            .find("status")
            .ok_or_else(|| PackMgrError::parse("XML status response", "no <status> element"))?;
        let code = status
            .attribute("code")
            .and_then(|c| c.trim().parse::<u16>().ok())
            .ok_or_else(|| PackMgrError::parse("XML status response", "missing status code"))?;
        let message = status.text().trim().to_string();
        let path = root.find("path").map(|p| p.text().trim().to_string());
        Ok(self.classify(code == 200, Some(&message), path.as_deref()))
    }
}

/// Strip styles, scripts and tags from an HTML console response
pub fn html_to_text(html: &str) -> String {
    let text = HTML_STYLE.replace_all(html, "");
    let text = HTML_SCRIPT.replace_all(&text, "");
    let text = HTML_ANY_TAG.replace_all(&text, "");
    text.replace("&nbsp;", " ")
}

/// Whether a stripped HTML message reports a failed command
pub fn html_reports_error(text: &str) -> bool {
    text.contains(PACKAGE_MANAGER_ERROR_INDICATION)
}
