//! Element trees and snapshots
//!
//! A click arrives from the host as a small JSON element tree describing
//! the clicked node and its ancestors. The tree is frozen into an
//! `ElementSnapshot` that supports the ancestor queries and markup
//! serialization the capture policy needs.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Tags serialized without content or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Error building a snapshot from an element tree
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("element tree marks {0} target nodes, expected at most one")]
    MultipleTargets(usize),
}

/// One element in a click payload, as received on the wire
///
/// Ancestors nest via `children`; the clicked node carries `target: true`.
/// A tree with no marked node treats the root as the target.
#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
    #[serde(default)]
    pub target: bool,
}

/// Handle to one node of an [`ElementSnapshot`]
///
/// Ids are only meaningful for the snapshot that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct ElementNode {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// Immutable view of an element tree at the moment of a click
#[derive(Debug, Clone)]
pub struct ElementSnapshot {
    nodes: Vec<ElementNode>,
    target: NodeId,
}

impl ElementSnapshot {
    /// Freeze an element tree, resolving the target node
    pub fn from_spec(spec: &ElementSpec) -> Result<Self, SnapshotError> {
        let mut nodes = Vec::new();
        let mut targets = Vec::new();
        build_node(spec, None, &mut nodes, &mut targets);

        let target = match targets.len() {
            0 => NodeId(0),
            1 => targets[0],
            n => return Err(SnapshotError::MultipleTargets(n)),
        };

        Ok(Self { nodes, target })
    }

    /// The clicked node
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Lowercased tag name of a node
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes[id.0].classes.iter().any(|c| c == class)
    }

    /// Current control value, if the host supplied one
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].value.as_deref()
    }

    /// Whether the node is a text-entry control
    pub fn is_text_input(&self, id: NodeId) -> bool {
        matches!(self.tag(id), "input" | "textarea")
    }

    /// Nearest node matching the predicate, starting from `from` itself
    /// and walking up through its ancestors
    pub fn closest<P>(&self, from: NodeId, matches: P) -> Option<NodeId>
    where
        P: Fn(&Self, NodeId) -> bool,
    {
        let mut current = Some(from);
        while let Some(id) = current {
            if matches(self, id) {
                return Some(id);
            }
            current = self.nodes[id.0].parent;
        }
        None
    }

    /// Serialized markup of a node and everything below it
    ///
    /// Class list first, remaining attributes in name order, text before
    /// children. Void elements get no content and no closing tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        out.push('<');
        out.push_str(&node.tag);
        if !node.classes.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&node.classes.join(" "));
            out.push('"');
        }
        for (name, value) in &node.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
        out.push('>');

        if is_void_element(&node.tag) {
            return;
        }

        out.push_str(&node.text);
        for &child in &node.children {
            self.write_node(child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }
}

fn build_node(
    spec: &ElementSpec,
    parent: Option<NodeId>,
    nodes: &mut Vec<ElementNode>,
    targets: &mut Vec<NodeId>,
) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(ElementNode {
        tag: spec.tag.to_ascii_lowercase(),
        classes: spec.classes.clone(),
        attrs: spec.attrs.clone(),
        text: spec.text.clone(),
        value: spec.value.clone(),
        children: Vec::new(),
        parent,
    });

    if spec.target {
        targets.push(id);
    }

    for child in &spec.children {
        let child_id = build_node(child, Some(id), nodes, targets);
        nodes[id.0].children.push(child_id);
    }

    id
}

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str) -> ElementSpec {
        ElementSpec {
            tag: tag.to_string(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: None,
            children: Vec::new(),
            target: false,
        }
    }

    #[test]
    fn test_root_is_target_when_unmarked() {
        let snapshot = ElementSnapshot::from_spec(&el("div")).unwrap();
        assert_eq!(snapshot.tag(snapshot.target()), "div");
    }

    #[test]
    fn test_marked_child_is_target() {
        let mut root = el("ul");
        let mut item = el("li");
        item.target = true;
        root.children.push(item);

        let snapshot = ElementSnapshot::from_spec(&root).unwrap();
        assert_eq!(snapshot.tag(snapshot.target()), "li");
    }

    #[test]
    fn test_two_marked_nodes_rejected() {
        let mut root = el("div");
        root.target = true;
        let mut child = el("span");
        child.target = true;
        root.children.push(child);

        let err = ElementSnapshot::from_spec(&root).unwrap_err();
        assert!(matches!(err, SnapshotError::MultipleTargets(2)));
    }

    #[test]
    fn test_tags_are_lowercased() {
        let snapshot = ElementSnapshot::from_spec(&el("DIV")).unwrap();
        assert_eq!(snapshot.tag(snapshot.target()), "div");
    }

    #[test]
    fn test_outer_html_nested() {
        let mut root = el("li");
        root.classes = vec!["dropdown".to_string(), "mega-dropdown".to_string()];
        let mut link = el("a");
        link.attrs.insert("href".to_string(), "/sale".to_string());
        link.text = "Sale".to_string();
        root.children.push(link);

        let snapshot = ElementSnapshot::from_spec(&root).unwrap();
        assert_eq!(
            snapshot.outer_html(snapshot.target()),
            r#"<li class="dropdown mega-dropdown"><a href="/sale">Sale</a></li>"#
        );
    }

    #[test]
    fn test_outer_html_attrs_in_name_order() {
        let mut input = el("div");
        input.attrs.insert("id".to_string(), "search".to_string());
        input.attrs.insert("data-kind".to_string(), "box".to_string());

        let snapshot = ElementSnapshot::from_spec(&input).unwrap();
        assert_eq!(
            snapshot.outer_html(snapshot.target()),
            r#"<div data-kind="box" id="search"></div>"#
        );
    }

    #[test]
    fn test_void_element_has_no_closing_tag() {
        let mut input = el("input");
        input.attrs.insert("type".to_string(), "text".to_string());

        let snapshot = ElementSnapshot::from_spec(&input).unwrap();
        assert_eq!(snapshot.outer_html(snapshot.target()), r#"<input type="text">"#);
    }

    #[test]
    fn test_closest_is_self_inclusive() {
        let mut root = el("li");
        root.classes = vec!["dropdown".to_string()];
        let snapshot = ElementSnapshot::from_spec(&root).unwrap();

        let hit = snapshot.closest(snapshot.target(), |s, id| s.has_class(id, "dropdown"));
        assert_eq!(hit, Some(snapshot.target()));
    }

    #[test]
    fn test_closest_walks_ancestors() {
        let mut root = el("li");
        root.classes = vec!["dropdown".to_string(), "mega-dropdown".to_string()];
        let mut link = el("a");
        let mut span = el("span");
        span.target = true;
        link.children.push(span);
        root.children.push(link);

        let snapshot = ElementSnapshot::from_spec(&root).unwrap();
        let target = snapshot.target();
        assert_eq!(snapshot.tag(target), "span");

        let li = snapshot
            .closest(target, |s, id| {
                s.tag(id) == "li" && s.has_class(id, "mega-dropdown")
            })
            .unwrap();
        assert_eq!(snapshot.tag(li), "li");

        let a = snapshot.closest(target, |s, id| s.tag(id) == "a").unwrap();
        assert_eq!(snapshot.tag(a), "a");

        assert!(snapshot.closest(target, |s, id| s.tag(id) == "table").is_none());
    }

    #[test]
    fn test_is_text_input() {
        assert!(ElementSnapshot::from_spec(&el("textarea"))
            .unwrap()
            .is_text_input(NodeId(0)));
        assert!(ElementSnapshot::from_spec(&el("input"))
            .unwrap()
            .is_text_input(NodeId(0)));
        assert!(!ElementSnapshot::from_spec(&el("div"))
            .unwrap()
            .is_text_input(NodeId(0)));
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: ElementSpec = serde_json::from_str(r#"{"tag":"div"}"#).unwrap();
        assert_eq!(spec.tag, "div");
        assert!(spec.classes.is_empty());
        assert!(spec.children.is_empty());
        assert!(spec.value.is_none());
        assert!(!spec.target);
    }
}
