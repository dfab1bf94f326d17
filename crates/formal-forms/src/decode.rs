//! Decoding flat submissions into nested data.
//!
//! Submitted keys name their place in the form tree either with dots
//! (`address.street`) or with brackets (`address[street]`); both spell the
//! same path. [`DataTree`] holds the result: groups of named nodes whose
//! leaves are transport [`Value`]s.

use std::collections::BTreeMap;

use formal_core::utils::MultiValueDict;
use formal_http::FieldInput;
use serde::Serialize;

use crate::value::Value;

/// A node of a [`DataTree`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(Value),
    Group(DataTree),
}

/// Nested submission data, addressed by dotted keys.
///
/// # Examples
///
/// ```
/// use formal_forms::decode::DataTree;
/// use formal_forms::value::Value;
///
/// let mut data = DataTree::new();
/// data.insert("address.street", Value::from("Main St"));
/// data.insert("name", Value::from("Ada"));
///
/// assert_eq!(data.get("address.street"), Some(&Value::from("Main St")));
/// assert!(data.group("address").is_some());
/// assert_eq!(data.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataTree {
    nodes: BTreeMap<String, Node>,
}

impl DataTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from decoded submission inputs.
    ///
    /// A key with one value becomes a single leaf value, a key with several
    /// becomes a `List`. Keys with no usable path segment are ignored.
    pub fn from_inputs(inputs: MultiValueDict<String, FieldInput>) -> Self {
        let mut tree = Self::new();
        for (key, values) in inputs {
            let path = split_key(&key);
            if path.is_empty() {
                continue;
            }
            let mut values: Vec<Value> = values.into_iter().map(input_value).collect();
            let value = if values.len() == 1 {
                values.swap_remove(0)
            } else {
                Value::List(values)
            };
            tree.insert_path(&path, value);
        }
        tree
    }

    /// Returns the leaf value at a dotted key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.node(key)? {
            Node::Leaf(v) => Some(v),
            Node::Group(_) => None,
        }
    }

    /// Returns the group at a dotted key.
    pub fn group(&self, key: &str) -> Option<&Self> {
        match self.node(key)? {
            Node::Group(g) => Some(g),
            Node::Leaf(_) => None,
        }
    }

    /// Returns the node (leaf or group) at a dotted key.
    pub fn node(&self, key: &str) -> Option<&Node> {
        let path = split_key(key);
        let (last, parents) = path.split_last()?;
        let mut tree = self;
        for part in parents {
            match tree.nodes.get(*part)? {
                Node::Group(g) => tree = g,
                Node::Leaf(_) => return None,
            }
        }
        tree.nodes.get(*last)
    }

    /// Returns `true` if anything is stored at the dotted key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.node(key).is_some()
    }

    /// Stores a leaf value at a dotted key, creating groups along the way.
    pub fn insert(&mut self, key: &str, value: Value) {
        let path = split_key(key);
        if !path.is_empty() {
            self.insert_path(&path, value);
        }
    }

    /// Removes and returns whatever is stored at the dotted key.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let path = split_key(key);
        let (last, parents) = path.split_last()?;
        let mut tree = self;
        for part in parents {
            match tree.nodes.get_mut(*part)? {
                Node::Group(g) => tree = g,
                Node::Leaf(_) => return None,
            }
        }
        tree.nodes.remove(*last)
    }

    /// Returns every leaf with its dotted key, depth first in key order.
    pub fn flatten(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    /// Returns the number of top-level entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert_path(&mut self, path: &[&str], value: Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut tree = self;
        for part in parents {
            let entry = tree
                .nodes
                .entry((*part).to_string())
                .or_insert_with(|| Node::Group(Self::new()));
            if matches!(entry, Node::Leaf(_)) {
                tracing::debug!(key = *part, "Submitted value replaced by a group of the same name");
                *entry = Node::Group(Self::new());
            }
            match entry {
                Node::Group(g) => tree = g,
                Node::Leaf(_) => return,
            }
        }
        if matches!(tree.nodes.get(*last), Some(Node::Group(_))) {
            tracing::debug!(key = *last, "Submitted value ignored, a group of the same name exists");
        } else {
            tree.nodes.insert((*last).to_string(), Node::Leaf(value));
        }
    }

    fn flatten_into<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
        for (name, node) in &self.nodes {
            let key = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match node {
                Node::Leaf(v) => out.push((key, v)),
                Node::Group(g) => g.flatten_into(&key, out),
            }
        }
    }
}

/// Splits `a.b[c][d]` into `["a", "b", "c", "d"]`, dropping empty segments.
fn split_key(key: &str) -> Vec<&str> {
    key.split(['.', '[', ']'])
        .filter(|part| !part.is_empty())
        .collect()
}

fn input_value(input: FieldInput) -> Value {
    match input {
        FieldInput::Text(s) => Value::String(s),
        FieldInput::File(f) => Value::File(f),
    }
}

#[cfg(test)]
mod tests {
    use formal_http::UploadedFile;

    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> MultiValueDict<String, FieldInput> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), FieldInput::Text((*v).to_string())))
            .collect()
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("a.b.c"), ["a", "b", "c"]);
        assert_eq!(split_key("a[b][c]"), ["a", "b", "c"]);
        assert_eq!(split_key("a[b].c"), ["a", "b", "c"]);
        assert_eq!(split_key("tags[]"), ["tags"]);
        assert!(split_key("[]").is_empty());
    }

    #[test]
    fn test_from_inputs_nests_dotted_and_bracketed() {
        let tree = DataTree::from_inputs(inputs(&[
            ("name", "Ada"),
            ("address.street", "Main St"),
            ("address[city]", "London"),
        ]));
        assert_eq!(tree.get("name"), Some(&Value::from("Ada")));
        assert_eq!(tree.get("address.street"), Some(&Value::from("Main St")));
        assert_eq!(tree.get("address.city"), Some(&Value::from("London")));
        assert_eq!(tree.group("address").map(DataTree::len), Some(2));
    }

    #[test]
    fn test_from_inputs_multiple_values_become_list() {
        let tree = DataTree::from_inputs(inputs(&[("tag", "a"), ("tag", "b")]));
        assert_eq!(
            tree.get("tag"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn test_from_inputs_files() {
        let file = UploadedFile::new("a.txt", "text/plain", b"x".to_vec());
        let mut d = MultiValueDict::new();
        d.append("doc".to_string(), FieldInput::File(file.clone()));
        let tree = DataTree::from_inputs(d);
        assert_eq!(tree.get("doc"), Some(&Value::File(file)));
    }

    #[test]
    fn test_group_wins_over_leaf() {
        let tree = DataTree::from_inputs(inputs(&[("when", "x"), ("when.year", "2024")]));
        assert!(tree.get("when").is_none());
        assert_eq!(tree.get("when.year"), Some(&Value::from("2024")));

        let tree = DataTree::from_inputs(inputs(&[("when.year", "2024"), ("when", "x")]));
        assert_eq!(tree.get("when.year"), Some(&Value::from("2024")));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut tree = DataTree::new();
        tree.insert("a.b", Value::Int(1));
        assert!(tree.contains_key("a.b"));
        assert!(matches!(tree.remove("a.b"), Some(Node::Leaf(Value::Int(1)))));
        assert!(!tree.contains_key("a.b"));
        assert!(tree.contains_key("a"));
        assert!(tree.remove("missing.key").is_none());
    }

    #[test]
    fn test_flatten() {
        let tree = DataTree::from_inputs(inputs(&[("b", "2"), ("a.x", "1")]));
        let flat: Vec<_> = tree
            .flatten()
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        assert_eq!(
            flat,
            vec![("a.x".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_serialize() {
        let tree = DataTree::from_inputs(inputs(&[("a.x", "1")]));
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["a"]["x"]["value"], "1");
    }
}
