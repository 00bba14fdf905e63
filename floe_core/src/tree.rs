//! # Config Tree
//!
//! Nested mapping/sequence structure addressed by dotted paths.
//!
//! The tree is the raw-configuration currency of the whole workspace: file
//! loaders produce one, the environment source produces one, the settings
//! pipeline merges them and hands the result to schema validation.
//!
//! # Path Semantics
//! - paths are split on a configurable delimiter (default `.`)
//! - intermediate nodes must be mappings; a segment addressing a sequence
//!   must parse as an integer
//! - writes through or into a sequence segment are unsupported
//! - merge flattens overlays to `(path, leaf)` pairs descending mappings
//!   only, so a sequence value is an opaque leaf and is replaced wholesale,
//!   never merged element-wise

use errors::TreeError;
use serde_json::map::Entry;
use serde_json::{Map, Value};

pub const DEFAULT_DELIMITER: char = '.';

/// Raw configuration: string-keyed mappings and sequences with arbitrary
/// leaf values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    root: Value,
    delimiter: char
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTree {
    /// Creates an empty tree with the default `.` delimiter.
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
            delimiter: DEFAULT_DELIMITER
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Wraps an already-parsed value. The root must be a mapping.
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        if !value.is_object() {
            return Err(TreeError::InvalidPath {
                path: ".".to_string(),
                reason: "root of a config tree must be a mapping".to_string()
            });
        }
        Ok(Self {
            root: value,
            delimiter: DEFAULT_DELIMITER
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_object().is_none_or(|m| m.is_empty())
    }

    fn split<'a>(&self, path: &'a str) -> Result<Vec<&'a str>, TreeError> {
        if path.is_empty() {
            return Err(TreeError::InvalidPath {
                path: path.to_string(),
                reason: "empty path".to_string()
            });
        }
        let segments: Vec<&str> = path.split(self.delimiter).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(TreeError::InvalidPath {
                path: path.to_string(),
                reason: "empty path segment".to_string()
            });
        }
        Ok(segments)
    }

    /// Walks the tree along `path`.
    ///
    /// Returns `Ok(None)` when an intermediate key is absent, when the walk
    /// runs into a scalar, or when a sequence index is out of range. A
    /// sequence segment that does not parse as an integer is an error.
    pub fn get(&self, path: &str) -> Result<Option<&Value>, TreeError> {
        let segments = self.split(path)?;
        let mut node = &self.root;
        for segment in segments {
            match node {
                Value::Object(map) => match map.get(segment) {
                    Some(child) => node = child,
                    None => return Ok(None)
                },
                Value::Array(items) => {
                    let index: usize =
                        segment.parse().map_err(|_| TreeError::IndexExpected {
                            path: path.to_string(),
                            segment: segment.to_string()
                        })?;
                    match items.get(index) {
                        Some(child) => node = child,
                        None => return Ok(None)
                    }
                }
                _ => return Ok(None)
            }
        }
        Ok(Some(node))
    }

    /// Like [`get`](Self::get) but substitutes `default` for an absent node.
    pub fn get_or<'a>(
        &'a self,
        path: &str,
        default: &'a Value
    ) -> Result<&'a Value, TreeError> {
        Ok(self.get(path)?.unwrap_or(default))
    }

    /// Sets the leaf at `path`, creating missing intermediate mappings when
    /// `create_parents` is true.
    ///
    /// Fails when an intermediate node is not a mapping, or when the walk
    /// would pass through (or write into) a sequence.
    pub fn set(
        &mut self,
        path: &str,
        value: Value,
        create_parents: bool
    ) -> Result<(), TreeError> {
        let segments = self.split(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(TreeError::InvalidPath {
                path: path.to_string(),
                reason: "empty path".to_string()
            });
        };

        let mut node = &mut self.root;
        for segment in parents {
            let map = match node {
                Value::Object(map) => map,
                Value::Array(_) => {
                    return Err(TreeError::SequenceUnsupported {
                        path: path.to_string()
                    });
                }
                _ => {
                    return Err(TreeError::NotAMapping {
                        path: path.to_string(),
                        segment: (*segment).to_string()
                    });
                }
            };
            let child = match map.entry((*segment).to_string()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    if !create_parents {
                        return Err(TreeError::MissingParent {
                            path: path.to_string(),
                            segment: (*segment).to_string()
                        });
                    }
                    entry.insert(Value::Object(Map::new()))
                }
            };
            node = child;
        }

        match node {
            Value::Object(map) => {
                map.insert((*last).to_string(), value);
                Ok(())
            }
            Value::Array(_) => Err(TreeError::SequenceUnsupported {
                path: path.to_string()
            }),
            _ => Err(TreeError::NotAMapping {
                path: path.to_string(),
                segment: (*last).to_string()
            })
        }
    }

    /// Applies overlays in order; later overlays' leaves win.
    pub fn merge(&mut self, overlays: &[ConfigTree]) -> Result<(), TreeError> {
        for overlay in overlays {
            self.merge_value(overlay.root())?;
        }
        Ok(())
    }

    /// Flattens `overlay` into `(path, leaf)` pairs and applies each with
    /// `set(path, leaf, create_parents = true)`.
    pub fn merge_value(&mut self, overlay: &Value) -> Result<(), TreeError> {
        for (path, leaf) in flatten(overlay, self.delimiter) {
            self.set(&path, leaf.clone(), true)?;
        }
        Ok(())
    }

    /// The depth-first `(path, leaf)` view used by merge.
    ///
    /// Descends mappings only; sequences and scalars are leaves.
    pub fn flatten(&self) -> Vec<(String, &Value)> {
        flatten(&self.root, self.delimiter)
    }
}

fn flatten(value: &Value, delimiter: char) -> Vec<(String, &Value)> {
    let mut leaves = Vec::new();
    if let Value::Object(map) = value {
        for (key, child) in map {
            flatten_into(key.clone(), child, delimiter, &mut leaves);
        }
    }
    leaves
}

fn flatten_into<'a>(
    prefix: String,
    value: &'a Value,
    delimiter: char,
    leaves: &mut Vec<(String, &'a Value)>
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(
                    format!("{prefix}{delimiter}{key}"),
                    child,
                    delimiter,
                    leaves
                );
            }
        }
        leaf => leaves.push((prefix, leaf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ConfigTree {
        ConfigTree::from_value(value).unwrap()
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut t = ConfigTree::new();
        t.set("a.b.c", json!(5), true).unwrap();
        assert_eq!(t.get("a.b.c").unwrap(), Some(&json!(5)));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let mut t = ConfigTree::new();
        t.set("a.b.c", json!(5), true).unwrap();
        assert_eq!(t.get("a.b.x").unwrap(), None);
        assert_eq!(t.get_or("a.b.x", &json!(9)).unwrap(), &json!(9));
    }

    #[test]
    fn test_get_through_sequence_index() {
        let t = tree(json!({"servers": [{"host": "a"}, {"host": "b"}]}));
        assert_eq!(t.get("servers.1.host").unwrap(), Some(&json!("b")));
        assert_eq!(t.get("servers.5.host").unwrap(), None);
    }

    #[test]
    fn test_get_sequence_segment_must_be_integer() {
        let t = tree(json!({"servers": ["a", "b"]}));
        assert!(matches!(
            t.get("servers.first"),
            Err(TreeError::IndexExpected { .. })
        ));
    }

    #[test]
    fn test_get_into_scalar_is_absent() {
        let t = tree(json!({"a": 1}));
        assert_eq!(t.get("a.b").unwrap(), None);
    }

    #[test]
    fn test_set_without_create_parents() {
        let mut t = ConfigTree::new();
        let err = t.set("a.b.c", json!(1), false).unwrap_err();
        assert!(matches!(err, TreeError::MissingParent { .. }));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut t = tree(json!({"a": 1}));
        let err = t.set("a.b", json!(2), true).unwrap_err();
        assert!(matches!(err, TreeError::NotAMapping { .. }));
    }

    #[test]
    fn test_set_through_sequence_unsupported() {
        let mut t = tree(json!({"items": [1, 2, 3]}));
        let err = t.set("items.0", json!(9), true).unwrap_err();
        assert!(matches!(err, TreeError::SequenceUnsupported { .. }));
        let err = t.set("items.0.x", json!(9), true).unwrap_err();
        assert!(matches!(err, TreeError::SequenceUnsupported { .. }));
    }

    #[test]
    fn test_empty_path_rejected() {
        let t = ConfigTree::new();
        assert!(matches!(t.get(""), Err(TreeError::InvalidPath { .. })));
        assert!(matches!(t.get("a..b"), Err(TreeError::InvalidPath { .. })));
    }

    #[test]
    fn test_merge_leaf_override() {
        let mut t = ConfigTree::new();
        t.merge(&[
            tree(json!({"x": {"y": 1}})),
            tree(json!({"x": {"y": 2, "z": 3}}))
        ])
        .unwrap();
        assert_eq!(t.get("x.y").unwrap(), Some(&json!(2)));
        assert_eq!(t.get("x.z").unwrap(), Some(&json!(3)));
    }

    #[test]
    fn test_merge_replaces_sequences_wholesale() {
        let mut t = tree(json!({"hosts": ["a", "b", "c"]}));
        t.merge(&[tree(json!({"hosts": ["z"]}))]).unwrap();
        assert_eq!(t.get("hosts").unwrap(), Some(&json!(["z"])));
    }

    #[test]
    fn test_merge_scalar_replaces_subtree_leafwise() {
        // Structural differences are only handled at the leaves the
        // traversal reaches: the overlay's scalar at "a.b" is one leaf.
        let mut t = tree(json!({"a": {"b": {"deep": 1}, "keep": true}}));
        t.merge(&[tree(json!({"a": {"b": 5}}))]).unwrap();
        assert_eq!(t.get("a.b").unwrap(), Some(&json!(5)));
        assert_eq!(t.get("a.keep").unwrap(), Some(&json!(true)));
    }

    #[test]
    fn test_flatten_descends_mappings_only() {
        let t = tree(json!({"a": {"b": 1}, "list": [1, 2], "s": "x"}));
        let mut flat: Vec<String> =
            t.flatten().into_iter().map(|(p, _)| p).collect();
        flat.sort();
        assert_eq!(flat, vec!["a.b", "list", "s"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let mut t = ConfigTree::new().with_delimiter('/');
        t.set("a/b", json!(1), true).unwrap();
        assert_eq!(t.get("a/b").unwrap(), Some(&json!(1)));
        // With '/' as the delimiter, a dotted name is a single segment.
        t.set("x.y", json!(2), true).unwrap();
        assert_eq!(t.get("x.y").unwrap(), Some(&json!(2)));
    }

    #[test]
    fn test_from_value_requires_mapping_root() {
        assert!(ConfigTree::from_value(json!([1, 2])).is_err());
        assert!(ConfigTree::from_value(json!({"ok": true})).is_ok());
    }
}
