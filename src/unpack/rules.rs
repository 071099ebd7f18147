use crate::config::ContentUnpackerProperties;
use crate::core::PackMgrResult;
use crate::filter::PatternList;

/// Exclusion and augmentation rules applied while unpacking
///
/// Every list is evaluated independently and an empty list disables its
/// dimension entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionRuleSet {
    /// Archive entry paths (`META-INF/vault/filter.xml`)
    pub files: PatternList,
    /// Repository node paths (`/content/site/jcr:content`)
    pub nodes: PatternList,
    /// Property names (`jcr:created`)
    pub properties: PatternList,
    /// Mixin type names removed from `jcr:mixinTypes`
    pub mixins: PatternList,
}

impl ExclusionRuleSet {
    pub fn new<S: AsRef<str>>(files: &[S], nodes: &[S], properties: &[S]) -> PackMgrResult<Self> {
        Ok(Self {
            files: PatternList::compile(files)?,
            nodes: PatternList::compile(nodes)?,
            properties: PatternList::compile(properties)?,
            mixins: PatternList::default(),
        })
    }

    pub fn with_mixins<S: AsRef<str>>(mut self, mixins: &[S]) -> PackMgrResult<Self> {
        self.mixins = PatternList::compile(mixins)?;
        Ok(self)
    }

    pub fn from_properties(props: &ContentUnpackerProperties) -> PackMgrResult<Self> {
        Self::new(&props.exclude_files, &props.exclude_nodes, &props.exclude_properties)?
            .with_mixins(&props.exclude_mixins)
    }

    pub fn exclude_file(&self, entry_path: &str) -> bool {
        self.files.matches(entry_path)
    }

    /// True if the node or any of its ancestors is excluded
    pub fn exclude_node_subtree(&self, node_path: &str) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        node_path
            .match_indices('/')
            .map(|(index, _)| &node_path[..index])
            .filter(|ancestor| !ancestor.is_empty())
            .chain(std::iter::once(node_path))
            .any(|path| self.nodes.matches(path))
    }

    pub fn exclude_property(&self, name: &str) -> bool {
        self.properties.matches(name)
    }

    pub fn exclude_mixin(&self, mixin: &str) -> bool {
        self.mixins.matches(mixin)
    }

    /// Whether descriptors need to be parsed at all
    pub fn filters_descriptors(&self) -> bool {
        !(self.nodes.is_empty() && self.properties.is_empty() && self.mixins.is_empty())
    }
}
