//! Helpers for walking and rendering state-tree paths.
//!
//! A path is the ordered sequence of object keys from the root of the state
//! document to a node. Module paths and state paths share this representation:
//! a module installed at `["a", "a1"]` owns the state node at `root.a.a1`.

use serde_json::Value;

/// Copy any sequence of string-like segments into an owned path.
pub fn to_path<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    segments.iter().map(|s| s.as_ref().to_string()).collect()
}

/// Render a path as `a/a1/a11`, or `<root>` for the empty path.
pub fn display_path<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a non-empty path into its parent path and final key.
pub fn split_last<S: AsRef<str>>(path: &[S]) -> Option<(&[S], &str)> {
    let (last, parent) = path.split_last()?;
    Some((parent, last.as_ref()))
}

/// Follow `path` from `root` through nested objects.
///
/// Returns `None` as soon as a segment is missing or an intermediate node is
/// not an object. Intermediate nodes are never created.
pub fn walk<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    let mut cursor = root;
    for segment in path {
        cursor = cursor.as_object()?.get(segment.as_ref())?;
    }
    Some(cursor)
}

/// Mutable variant of [`walk`].
pub fn walk_mut<'a, S: AsRef<str>>(root: &'a mut Value, path: &[S]) -> Option<&'a mut Value> {
    let mut cursor = root;
    for segment in path {
        cursor = cursor.as_object_mut()?.get_mut(segment.as_ref())?;
    }
    Some(cursor)
}

/// Collect the path of every node reachable from `value`, rooted at `base`.
///
/// Only object members are descended into; array elements are tracked as part
/// of their containing node.
pub fn collect_paths(base: &[String], value: &Value, out: &mut Vec<Vec<String>>) {
    out.push(base.to_vec());
    if let Value::Object(map) = value {
        for (key, child) in map {
            let mut child_path = base.to_vec();
            child_path.push(key.clone());
            collect_paths(&child_path, child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_path_renders_root_marker() {
        let empty: [&str; 0] = [];
        assert_eq!(display_path(&empty), "<root>");
        assert_eq!(display_path(&["a", "a1"]), "a/a1");
    }

    #[test]
    fn walk_follows_nested_objects() {
        let doc = json!({"a": {"a1": {"name": "deep"}}});
        assert_eq!(walk(&doc, &["a", "a1", "name"]), Some(&json!("deep")));
    }

    #[test]
    fn walk_stops_at_missing_or_scalar_segments() {
        let doc = json!({"a": {"count": 1}});
        assert_eq!(walk(&doc, &["b"]), None);
        assert_eq!(walk(&doc, &["a", "count", "inner"]), None);
    }

    #[test]
    fn walk_mut_never_creates_intermediate_nodes() {
        let mut doc = json!({"a": {}});
        assert!(walk_mut(&mut doc, &["a", "missing"]).is_none());
        assert_eq!(doc, json!({"a": {}}));
    }

    #[test]
    fn collect_paths_lists_every_object_node() {
        let doc = json!({"a": {"x": 1}, "b": [1, 2]});
        let mut out = Vec::new();
        collect_paths(&[], &doc, &mut out);
        out.sort();
        let expected: Vec<Vec<String>> = vec![
            vec![],
            to_path(&["a"]),
            to_path(&["a", "x"]),
            to_path(&["b"]),
        ];
        assert_eq!(out, expected);
    }
}
