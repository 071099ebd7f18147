//! Filtering and augmentation of content descriptor trees.

use super::namespace::namespace_uri;
use super::rules::ExclusionRuleSet;
use crate::filter::PatternList;
use crate::xml::{XmlElement, XmlNode};
use chrono::{DateTime, FixedOffset};

const MIXINS_PROPERTY: &str = "jcr:mixinTypes";
const JCR_CONTENT: &str = "jcr:content";

/// Adds synthetic "activated" replication status to `jcr:content` nodes
#[derive(Debug, Clone)]
pub struct ReplicationMarker {
    include_nodes: PatternList,
    last_replicated: String,
    replicated_by: String,
}

impl ReplicationMarker {
    pub fn new(
        include_nodes: PatternList,
        date: DateTime<FixedOffset>,
        replicated_by: impl Into<String>,
    ) -> Self {
        Self {
            include_nodes,
            last_replicated: format!("{{Date}}{}", date.format("%Y-%m-%dT%H:%M:%S%.3f%:z")),
            replicated_by: replicated_by.into(),
        }
    }

    fn applies_to(&self, node_path: &str) -> bool {
        self.include_nodes.is_empty() || self.include_nodes.matches(node_path)
    }

    fn mark(&self, element: &mut XmlElement) {
        element.set_attribute("cq:lastReplicated", self.last_replicated.clone());
        element.set_attribute("cq:lastReplicatedBy", self.replicated_by.clone());
        element.set_attribute("cq:lastReplicationAction", "Activate");
    }
}

/// Apply node, property and mixin rules to a descriptor rooted at `node_path`,
/// then mark replication status when a marker is given
///
/// Returns true if any node was marked.
pub fn process_descriptor(
    root: &mut XmlElement,
    node_path: &str,
    rules: &ExclusionRuleSet,
    marker: Option<&ReplicationMarker>,
) -> bool {
    let marked = process_element(root, node_path, rules, marker);
    if marked {
        ensure_namespace(root, "cq");
    }
    marked
}

fn process_element(
    element: &mut XmlElement,
    node_path: &str,
    rules: &ExclusionRuleSet,
    marker: Option<&ReplicationMarker>,
) -> bool {
    filter_properties(element, rules);

    let mut marked = false;
    element.children.retain_mut(|child| match child {
        XmlNode::Element(child) => {
            let child_path = child_path(node_path, &child.name);
            if rules.nodes.matches(&child_path) {
                return false;
            }
            marked |= process_element(child, &child_path, rules, marker);
            true
        }
        _ => true,
    });

    if let Some(marker) = marker {
        if element.name == JCR_CONTENT && marker.applies_to(node_path) {
            marker.mark(element);
            marked = true;
        }
    }
    marked
}

fn filter_properties(element: &mut XmlElement, rules: &ExclusionRuleSet) {
    element
        .attributes
        .retain(|(name, _)| is_namespace_declaration(name) || !rules.exclude_property(name));

    if rules.mixins.is_empty() {
        return;
    }
    let filtered = element
        .attribute(MIXINS_PROPERTY)
        .map(|value| filter_mixins(value, rules));
    match filtered {
        Some(Some(value)) => element.set_attribute(MIXINS_PROPERTY, value),
        Some(None) => element.attributes.retain(|(name, _)| name != MIXINS_PROPERTY),
        None => {}
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// Declare a well-known namespace on the root element if it is missing
pub fn ensure_namespace(root: &mut XmlElement, prefix: &str) {
    let attribute = format!("xmlns:{}", prefix);
    if root.attribute(&attribute).is_some() {
        return;
    }
    if let Some(uri) = namespace_uri(prefix) {
        root.attributes.push((attribute, uri.to_string()));
    }
}

/// Remove excluded mixins from a docview value like `{Name}[mix:a,cq:b]`
///
/// Returns `None` when no mixin remains.
pub fn filter_mixins(value: &str, rules: &ExclusionRuleSet) -> Option<String> {
    let (type_prefix, body) = match value.strip_prefix('{').and_then(|v| v.split_once('}')) {
        Some((type_name, body)) => (format!("{{{}}}", type_name), body),
        None => (String::new(), value),
    };

    let (multiple, list) = match body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        Some(list) => (true, list),
        None => (false, body),
    };

    let kept: Vec<String> = split_values(list)
        .into_iter()
        .filter(|mixin| !mixin.is_empty() && !rules.exclude_mixin(&unescape(mixin)))
        .collect();

    if kept.is_empty() {
        return None;
    }
    if multiple {
        Some(format!("{}[{}]", type_prefix, kept.join(",")))
    } else {
        Some(format!("{}{}", type_prefix, kept.join(",")))
    }
}

/// Split on commas that are not escaped with a backslash
fn split_values(list: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in list.chars() {
        match c {
            '\\' if !escaped => {
                escaped = true;
                current.push(c);
                continue;
            }
            ',' if !escaped => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
        escaped = false;
    }
    values.push(current);
    values
}

fn unescape(value: &str) -> String {
    value.replace("\\,", ",").replace("\\\\", "\\")
}
