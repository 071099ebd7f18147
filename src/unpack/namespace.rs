//! Mangled namespace segments (`_cq_dialog` for `cq:dialog`) and
//! repository path mapping for archive entries.

use regex::Regex;
use std::sync::LazyLock;

/// Root folder of repository content inside a package
pub const JCR_ROOT: &str = "jcr_root";

/// File name of a content descriptor
pub const CONTENT_XML: &str = ".content.xml";

static MANGLED_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_([a-zA-Z0-9]+)_(.+)$").expect("valid regex"));

const KNOWN_NAMESPACES: [(&str, &str); 10] = [
    ("jcr", "http://www.jcp.org/jcr/1.0"),
    ("nt", "http://www.jcp.org/jcr/nt/1.0"),
    ("mix", "http://www.jcp.org/jcr/mix/1.0"),
    ("sling", "http://sling.apache.org/jcr/sling/1.0"),
    ("cq", "http://www.day.com/jcr/cq/1.0"),
    ("dam", "http://www.day.com/dam/ns/1.0"),
    ("vlt", "http://www.day.com/jcr/vault/1.0"),
    ("granite", "http://www.adobe.com/jcr/granite/1.0"),
    ("oak", "http://jackrabbit.apache.org/oak/ns/1.0"),
    ("rep", "internal"),
];

/// Namespace URI for a well-known prefix
pub fn namespace_uri(prefix: &str) -> Option<&'static str> {
    KNOWN_NAMESPACES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

/// Prefix of the mangled folder holding a content descriptor
///
/// `aaa/_cq_bbb/.content.xml` yields `cq`; a bare folder path yields `None`.
pub fn get_namespace_prefix(path: &str) -> Option<String> {
    let mut segments = path.rsplit('/');
    if segments.next()? != CONTENT_XML {
        return None;
    }
    let folder = segments.next()?;
    MANGLED_SEGMENT
        .captures(folder)
        .map(|caps| caps[1].to_string())
}

/// Decode one platform-safe path segment into a repository node name
pub fn decode_segment(segment: &str) -> String {
    let segment = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    if let Some(rest) = segment.strip_prefix("__") {
        return format!("_{}", rest);
    }
    match MANGLED_SEGMENT.captures(&segment) {
        Some(caps) => format!("{}:{}", &caps[1], &caps[2]),
        None => segment,
    }
}

/// Repository path for an archive entry below `jcr_root/`
///
/// A content descriptor maps to the node of its folder, any other entry to
/// the node named after it. Entries outside `jcr_root/` have no node path.
pub fn repository_path(entry_path: &str) -> Option<String> {
    let relative = entry_path
        .strip_prefix(JCR_ROOT)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))?;

    let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    if segments.last() == Some(&CONTENT_XML) {
        segments.pop();
    }
    let decoded: Vec<String> = segments.into_iter().map(decode_segment).collect();
    Some(format!("/{}", decoded.join("/")))
}

/// Whether an archive entry is a content descriptor below `jcr_root/`
pub fn is_content_descriptor(entry_path: &str) -> bool {
    entry_path.starts_with(&format!("{}/", JCR_ROOT))
        && entry_path.ends_with(&format!("/{}", CONTENT_XML))
}
