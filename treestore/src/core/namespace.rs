//! Namespace bookkeeping for installed modules.
//!
//! The store keeps only the `namespaced` flag of each installed module, arranged
//! in the same shape as the module tree. That is all later registrations need
//! to qualify their handler names through their ancestors.

use std::collections::BTreeMap;

/// One installed module, reduced to its namespace flag and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceNode {
    pub namespaced: bool,
    pub children: BTreeMap<String, NamespaceNode>,
}

impl NamespaceNode {
    pub fn new(namespaced: bool) -> Self {
        Self {
            namespaced,
            children: BTreeMap::new(),
        }
    }

    /// Find the node at `path` (empty path is `self`).
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&NamespaceNode> {
        let mut cursor = self;
        for key in path {
            cursor = cursor.children.get(key.as_ref())?;
        }
        Some(cursor)
    }

    /// Mutable variant of [`NamespaceNode::find`].
    pub fn find_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut NamespaceNode> {
        let mut cursor = self;
        for key in path {
            cursor = cursor.children.get_mut(key.as_ref())?;
        }
        Some(cursor)
    }
}

/// Compute the registration prefix for the module at `path`.
///
/// Every namespaced module on the way down, the target included, contributes
/// `key + "/"`; other modules are walked through without contributing. The root
/// has no incoming key, so its own flag never contributes.
///
/// Returns `None` when a segment of `path` is not installed.
pub fn namespace_prefix<S: AsRef<str>>(root: &NamespaceNode, path: &[S]) -> Option<String> {
    let mut prefix = String::new();
    let mut cursor = root;
    for key in path {
        let key = key.as_ref();
        cursor = cursor.children.get(key)?;
        if cursor.namespaced {
            prefix.push_str(key);
            prefix.push('/');
        }
    }
    Some(prefix)
}

/// Qualify a local handler name with a prefix from [`namespace_prefix`].
pub fn qualify(prefix: &str, local_name: &str) -> String {
    format!("{prefix}{local_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> NamespaceNode {
        // root -> a (ns) -> b (plain) -> c (ns)
        //      -> d (plain)
        let mut c_parent = NamespaceNode::new(false);
        c_parent
            .children
            .insert("c".to_string(), NamespaceNode::new(true));
        let mut a = NamespaceNode::new(true);
        a.children.insert("b".to_string(), c_parent);
        let mut root = NamespaceNode::new(true);
        root.children.insert("a".to_string(), a);
        root.children
            .insert("d".to_string(), NamespaceNode::new(false));
        root
    }

    #[test]
    fn root_prefix_is_empty_even_when_flagged() {
        let empty: [&str; 0] = [];
        assert_eq!(namespace_prefix(&tree(), &empty), Some(String::new()));
    }

    #[test]
    fn plain_modules_contribute_nothing() {
        assert_eq!(namespace_prefix(&tree(), &["d"]), Some(String::new()));
        assert_eq!(namespace_prefix(&tree(), &["a", "b"]), Some("a/".to_string()));
    }

    #[test]
    fn namespaced_target_includes_its_own_key() {
        assert_eq!(
            namespace_prefix(&tree(), &["a", "b", "c"]),
            Some("a/c/".to_string())
        );
    }

    #[test]
    fn unknown_segment_has_no_prefix() {
        assert_eq!(namespace_prefix(&tree(), &["a", "missing"]), None);
    }

    #[test]
    fn qualify_concatenates_prefix_and_name() {
        assert_eq!(qualify("a/c/", "touch"), "a/c/touch");
        assert_eq!(qualify("", "touch"), "touch");
    }
}
