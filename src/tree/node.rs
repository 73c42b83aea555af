//! The property tree node.

use std::collections::HashMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::{Result, TraceError};

use super::formatter::Formatter;
use super::value::PropertyValue;

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    Terminal {
        value: PropertyValue,
        formatter: Formatter,
    },
    Object {
        children: Vec<PropertyTreeNode>,
        index: HashMap<String, usize>,
    },
    Array(Vec<PropertyTreeNode>),
}

/// A named node that is either a terminal value or a container of children.
///
/// Nodes are built bottom-up and never change afterwards. Object nodes keep
/// unique child names in insertion order; array nodes name their children
/// `"0"`, `"1"`, ... in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTreeNode {
    name: String,
    kind: NodeKind,
}

impl PropertyTreeNode {
    pub fn terminal(name: impl Into<String>, value: PropertyValue) -> Self {
        Self::terminal_with(name, value, Formatter::Default)
    }

    pub fn terminal_with(
        name: impl Into<String>,
        value: PropertyValue,
        formatter: Formatter,
    ) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Terminal { value, formatter },
        }
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self::terminal(name, PropertyValue::Null)
    }

    /// Object-like container. A later child replaces an earlier one with the
    /// same name, keeping the earlier position.
    pub fn object(name: impl Into<String>, children: Vec<PropertyTreeNode>) -> Self {
        let mut ordered: Vec<PropertyTreeNode> = Vec::with_capacity(children.len());
        let mut index = HashMap::with_capacity(children.len());
        for child in children {
            match index.get(&child.name) {
                Some(&pos) => ordered[pos] = child,
                None => {
                    index.insert(child.name.clone(), ordered.len());
                    ordered.push(child);
                }
            }
        }
        Self {
            name: name.into(),
            kind: NodeKind::Object {
                children: ordered,
                index,
            },
        }
    }

    /// Array-like container; children are renamed to their positions.
    pub fn array(name: impl Into<String>, items: Vec<PropertyTreeNode>) -> Self {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| item.renamed(i.to_string()))
            .collect();
        Self {
            name: name.into(),
            kind: NodeKind::Array(items),
        }
    }

    /// Append `child` to a container. Object children replace a same-named
    /// child in place; array children are renamed to their position.
    pub fn push_child(&mut self, child: PropertyTreeNode) -> Result<()> {
        match &mut self.kind {
            NodeKind::Terminal { .. } => Err(TraceError::NotAContainer {
                name: self.name.clone(),
            }),
            NodeKind::Object { children, index } => {
                match index.get(&child.name) {
                    Some(&pos) => children[pos] = child,
                    None => {
                        index.insert(child.name.clone(), children.len());
                        children.push(child);
                    }
                }
                Ok(())
            }
            NodeKind::Array(items) => {
                let name = items.len().to_string();
                items.push(child.renamed(name));
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }

    pub fn is_container(&self) -> bool {
        !self.is_terminal()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, NodeKind::Array(_))
    }

    /// Child lookup. Missing names (and any lookup on a terminal) give `None`.
    pub fn child_by_name(&self, name: &str) -> Option<&PropertyTreeNode> {
        match &self.kind {
            NodeKind::Terminal { .. } => None,
            NodeKind::Object { children, index } => index.get(name).map(|&i| &children[i]),
            NodeKind::Array(items) => {
                // "01" or "+1" are not array names
                let canonical = !name.is_empty()
                    && name.bytes().all(|b| b.is_ascii_digit())
                    && !(name.len() > 1 && name.starts_with('0'));
                if !canonical {
                    return None;
                }
                name.parse::<usize>().ok().and_then(|i| items.get(i))
            }
        }
    }

    /// Children in insertion order (objects) or numeric order (arrays).
    pub fn all_children(&self) -> &[PropertyTreeNode] {
        match &self.kind {
            NodeKind::Terminal { .. } => &[],
            NodeKind::Object { children, .. } => children,
            NodeKind::Array(items) => items,
        }
    }

    /// Resolve a dotted path such as `pointer.0.axisValue.1.value`.
    pub fn path(&self, path: &str) -> Option<&PropertyTreeNode> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child_by_name(segment))
    }

    /// The raw terminal value.
    pub fn value(&self) -> Result<&PropertyValue> {
        match &self.kind {
            NodeKind::Terminal { value, .. } => Ok(value),
            _ => Err(TraceError::NotATerminal {
                name: self.name.clone(),
            }),
        }
    }

    pub fn formatter(&self) -> Option<&Formatter> {
        match &self.kind {
            NodeKind::Terminal { formatter, .. } => Some(formatter),
            _ => None,
        }
    }

    /// Human-readable value. Containers render as an empty string.
    pub fn formatted_value(&self) -> String {
        match &self.kind {
            NodeKind::Terminal { value, formatter } => formatter.format(value),
            _ => String::new(),
        }
    }

    /// Raw values as JSON: objects become maps and arrays become lists.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .all_children()
            .iter()
            .map(PropertyTreeNode::node_count)
            .sum::<usize>()
    }
}

impl Serialize for PropertyTreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.kind {
            NodeKind::Terminal { value, .. } => value.serialize(serializer),
            NodeKind::Object { children, .. } => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for child in children {
                    map.serialize_entry(&child.name, child)?;
                }
                map.end()
            }
            NodeKind::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SymbolTable;
    use std::sync::Arc;

    fn pointer_tree() -> PropertyTreeNode {
        let axis = |code: i64, value: f64| {
            PropertyTreeNode::object(
                "",
                vec![
                    PropertyTreeNode::terminal("axis", PropertyValue::Int(code)),
                    PropertyTreeNode::terminal("value", PropertyValue::Float(value)),
                ],
            )
        };
        PropertyTreeNode::object(
            "motionEvent",
            vec![
                PropertyTreeNode::terminal("eventId", PropertyValue::UInt(7)),
                PropertyTreeNode::array(
                    "pointer",
                    vec![PropertyTreeNode::object(
                        "",
                        vec![PropertyTreeNode::array(
                            "axisValue",
                            vec![axis(0, 350.0), axis(1, 370.0)],
                        )],
                    )],
                ),
            ],
        )
    }

    #[test]
    fn test_child_lookup_and_absence() {
        let tree = pointer_tree();
        assert_eq!(
            tree.child_by_name("eventId").unwrap().value().unwrap(),
            &PropertyValue::UInt(7)
        );
        assert!(tree.child_by_name("missing").is_none());
        assert!(tree
            .child_by_name("eventId")
            .unwrap()
            .child_by_name("x")
            .is_none());
    }

    #[test]
    fn test_path_resolution() {
        let tree = pointer_tree();
        let value = tree.path("pointer.0.axisValue.1.value").unwrap();
        assert_eq!(value.value().unwrap().as_f64(), Some(370.0));
        assert!(tree.path("pointer.3.axisValue").is_none());
        assert!(tree.path("pointer.00").is_none());
    }

    #[test]
    fn test_array_children_are_indexed() {
        let tree = pointer_tree();
        let axes = tree.path("pointer.0.axisValue").unwrap();
        assert!(axes.is_array());
        let names: Vec<&str> = axes.all_children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["0", "1"]);
    }

    #[test]
    fn test_terminal_container_exclusivity() {
        let tree = pointer_tree();
        let err = tree.value().unwrap_err();
        assert!(matches!(err, TraceError::NotATerminal { ref name } if name == "motionEvent"));

        let leaf = tree.child_by_name("eventId").unwrap();
        assert!(leaf.all_children().is_empty());
        assert!(leaf.value().is_ok());
    }

    #[test]
    fn test_object_keeps_insertion_order_and_unique_names() {
        let node = PropertyTreeNode::object(
            "root",
            vec![
                PropertyTreeNode::terminal("b", PropertyValue::Int(1)),
                PropertyTreeNode::terminal("a", PropertyValue::Int(2)),
                PropertyTreeNode::terminal("b", PropertyValue::Int(3)),
            ],
        );
        let names: Vec<&str> = node.all_children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(
            node.child_by_name("b").unwrap().value().unwrap(),
            &PropertyValue::Int(3)
        );
    }

    #[test]
    fn test_formatted_value_does_not_change_raw_value() {
        let table = Arc::new(SymbolTable::new("Action", &[(0, "ACTION_DOWN")]));
        let node =
            PropertyTreeNode::terminal_with("action", PropertyValue::Int(0), Formatter::Enum(table));
        assert_eq!(node.formatted_value(), "ACTION_DOWN");
        assert_eq!(node.formatted_value(), "ACTION_DOWN");
        assert_eq!(node.value().unwrap(), &PropertyValue::Int(0));
        assert_eq!(pointer_tree().formatted_value(), "");
    }

    #[test]
    fn test_to_json() {
        let json = pointer_tree().to_json().unwrap();
        assert_eq!(json["eventId"], serde_json::json!(7));
        assert_eq!(json["pointer"][0]["axisValue"][1]["value"], serde_json::json!(370.0));
        assert_eq!(pointer_tree().node_count(), 11);
    }

    #[test]
    fn test_push_child() {
        let mut object = PropertyTreeNode::object("root", vec![]);
        object
            .push_child(PropertyTreeNode::terminal("a", PropertyValue::Int(1)))
            .unwrap();
        object
            .push_child(PropertyTreeNode::terminal("a", PropertyValue::Int(2)))
            .unwrap();
        assert_eq!(object.all_children().len(), 1);
        assert_eq!(object.path("a").unwrap().value().unwrap(), &PropertyValue::Int(2));

        let mut array = PropertyTreeNode::array("items", vec![]);
        array.push_child(PropertyTreeNode::null("ignored")).unwrap();
        array.push_child(PropertyTreeNode::null("ignored")).unwrap();
        assert_eq!(array.all_children()[1].name(), "1");

        let mut terminal = PropertyTreeNode::null("leaf");
        assert!(matches!(
            terminal.push_child(PropertyTreeNode::null("x")),
            Err(TraceError::NotAContainer { .. })
        ));
    }
}
