use crate::core::{PackMgrError, PackMgrResult};
use regex::Regex;

/// Ordered list of compiled name patterns
///
/// Each pattern must match the whole name, so `jcr:created` does not
/// match `jcr:createdBy`.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
    sources: Vec<String>,
}

impl PatternList {
    /// Compile patterns, failing on the first invalid one
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> PackMgrResult<Self> {
        let mut list = PatternList::default();
        for pattern in patterns {
            let source = pattern.as_ref();
            let regex = Regex::new(&format!("^(?:{})$", source)).map_err(|e| {
                PackMgrError::Config(format!("Invalid regexp pattern: {}: {}", source, e))
            })?;
            list.patterns.push(regex);
            list.sources.push(source.to_string());
        }
        Ok(list)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if any pattern matches the whole name
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }

    /// Patterns as given by the caller
    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

impl PartialEq for PatternList {
    fn eq(&self, other: &Self) -> bool {
        self.sources == other.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_semantics() {
        let list = PatternList::compile(&["jcr\\:created"]).unwrap();
        assert!(list.matches("jcr:created"));
        assert!(!list.matches("jcr:createdBy"));
    }

    #[test]
    fn test_anchored_patterns_still_work() {
        let list = PatternList::compile(&["^META-INF/.*", ".*/sling-ide-tooling/.*"]).unwrap();
        assert!(list.matches("META-INF/vault/filter.xml"));
        assert!(list.matches("jcr_root/apps/sling-ide-tooling/x"));
        assert!(!list.matches("jcr_root/content/.content.xml"));
    }

    #[test]
    fn test_alternation_is_grouped() {
        let list = PatternList::compile(&["a|b"]).unwrap();
        assert!(list.matches("a"));
        assert!(!list.matches("ab"));
    }

    #[test]
    fn test_empty_list_matches_nothing() {
        let list = PatternList::compile::<String>(&[]).unwrap();
        assert!(list.is_empty());
        assert!(!list.matches("anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PatternList::compile(&["("]).unwrap_err();
        assert!(matches!(err, PackMgrError::Config(ref msg) if msg.contains("Invalid regexp pattern: (")));
    }
}
