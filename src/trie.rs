//! The main trie implementation.
//!
//! This module contains the `Trie` handle, which provides the primary API for
//! working with the copy-on-write trie.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{TrieError, TrieResult};
use crate::node::{ErasedValue, TrieNode};
use crate::util::find_node;

/// An immutable byte-keyed trie with structural sharing.
///
/// Each key is a sequence of bytes and each stored value may have its own
/// concrete type. Operations that would modify the trie return a new handle
/// instead; the new version copies only the nodes on the path of the edited
/// key and shares everything else with the version it came from via `Arc`.
///
/// Cloning a `Trie` is cheap: it only bumps the reference count of the root.
#[derive(Clone, Default)]
pub struct Trie {
    /// The root node of the trie, `None` for an empty trie
    pub(crate) root: Option<Arc<TrieNode>>,
}

impl Trie {
    /// Creates a new, empty trie.
    ///
    /// # Examples
    ///
    /// ```
    /// use cow_trie::Trie;
    ///
    /// let trie = Trie::new();
    /// assert!(trie.is_empty());
    /// ```
    pub fn new() -> Self {
        Trie { root: None }
    }

    /// Returns the root node, or `None` for an empty trie.
    pub fn root(&self) -> Option<&Arc<TrieNode>> {
        self.root.as_ref()
    }

    /// Returns `true` if both handles point at the very same root node.
    ///
    /// Two empty tries are considered identical.
    pub fn ptr_eq(&self, other: &Trie) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the number of values stored in the trie.
    ///
    /// # Examples
    ///
    /// ```
    /// use cow_trie::Trie;
    ///
    /// let trie = Trie::new();
    /// assert_eq!(trie.len(), 0);
    ///
    /// let trie = trie.put("hello", 42u32).put("help", "me".to_string());
    /// assert_eq!(trie.len(), 2);
    /// ```
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.subtree_size())
    }

    /// Returns `true` if the trie contains no values.
    ///
    /// Valueless nodes are pruned as soon as they lose their last child, so
    /// a trie holds no values exactly when it has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Retrieves a reference to the value of type `T` stored for the given key.
    ///
    /// Returns `None` when nothing is stored under the key and also when the
    /// stored value has a type other than `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cow_trie::Trie;
    ///
    /// let trie = Trie::new().put("hello", 42u32);
    ///
    /// assert_eq!(trie.get::<u32>("hello"), Some(&42));
    /// assert_eq!(trie.get::<u64>("hello"), None);
    /// assert_eq!(trie.get::<u32>("world"), None);
    /// ```
    pub fn get<T: Any>(&self, key: impl AsRef<[u8]>) -> Option<&T> {
        find_node(self.root.as_ref(), key.as_ref())?.value::<T>()
    }

    /// Like [`Trie::get`], but tells a missing key apart from a type mismatch.
    ///
    /// # Examples
    ///
    /// ```
    /// use cow_trie::{Trie, TrieError};
    ///
    /// let trie = Trie::new().put("answer", 42u32);
    ///
    /// assert_eq!(trie.get_checked::<u32>("answer"), Ok(&42));
    /// assert_eq!(trie.get_checked::<u32>("question"), Err(TrieError::NotFound));
    /// assert!(matches!(
    ///     trie.get_checked::<String>("answer"),
    ///     Err(TrieError::TypeMismatch { .. })
    /// ));
    /// ```
    pub fn get_checked<T: Any>(&self, key: impl AsRef<[u8]>) -> TrieResult<&T> {
        let node = find_node(self.root.as_ref(), key.as_ref())
            .filter(|node| node.is_value_node())
            .ok_or(TrieError::NotFound)?;

        node.value::<T>().ok_or(TrieError::TypeMismatch {
            expected: type_name::<T>(),
        })
    }

    /// Returns `true` if a value of any type is stored for the given key.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        find_node(self.root.as_ref(), key.as_ref()).map_or(false, TrieNode::is_value_node)
    }

    /// Stores `value` under `key`, returning a new trie.
    ///
    /// If the key already holds a value, of whatever type, it is replaced.
    /// The value is moved into the trie, so `T` does not need to be `Clone`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cow_trie::Trie;
    ///
    /// let trie1 = Trie::new();
    /// let trie2 = trie1.put("hello", 42u32);
    ///
    /// assert!(trie1.is_empty());
    /// assert_eq!(trie2.get::<u32>("hello"), Some(&42));
    /// ```
    pub fn put<T: Any + Send + Sync>(&self, key: impl AsRef<[u8]>, value: T) -> Self {
        let key = key.as_ref();
        let value: ErasedValue = Arc::new(value);
        let mut replaced = false;

        let root = splice(self.root.as_ref(), key, |target| {
            replaced = target.map_or(false, TrieNode::is_value_node);
            let children = target.map(|node| node.children.clone()).unwrap_or_default();
            Some(TrieNode::with_value(children, value))
        });

        trace!(key_len = key.len(), replaced, "put");
        Trie { root }
    }

    /// Removes the value stored under `key`, returning a new trie.
    ///
    /// Nodes left without a value and without children are pruned, all the
    /// way up to the root if need be. If the key holds no value, the returned
    /// trie shares its root with `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cow_trie::Trie;
    ///
    /// let trie1 = Trie::new().put("ab", 1u32).put("ac", 2u32);
    /// let trie2 = trie1.remove("ab");
    ///
    /// assert_eq!(trie1.get::<u32>("ab"), Some(&1));
    /// assert_eq!(trie2.get::<u32>("ab"), None);
    /// assert_eq!(trie2.get::<u32>("ac"), Some(&2));
    /// ```
    pub fn remove(&self, key: impl AsRef<[u8]>) -> Self {
        let key = key.as_ref();

        if !self.contains_key(key) {
            trace!(key_len = key.len(), "remove: key absent");
            return self.clone();
        }

        let root = splice(self.root.as_ref(), key, |target| target.map(TrieNode::without_value));

        trace!(key_len = key.len(), emptied = root.is_none(), "remove");
        Trie { root }
    }
}

/// Rebuilds the path to `key` below `root`, letting `edit` decide what the
/// node at the end of the path becomes.
///
/// Only nodes on the path are copied; their other children are shared with
/// the old version. Missing nodes along the path start out as empty branches.
/// Any rebuilt node left with neither a value nor children is dropped from its
/// parent, and so on upward, so the result is `None` when nothing remains.
///
/// Keys may be arbitrarily long, so the path is walked with a loop rather
/// than by recursion.
fn splice<F>(root: Option<&Arc<TrieNode>>, key: &[u8], edit: F) -> Option<Arc<TrieNode>>
where
    F: FnOnce(Option<&TrieNode>) -> Option<TrieNode>,
{
    // Old node at each depth of the path, `None` once the path runs out
    let mut path = Vec::with_capacity(key.len());
    let mut current = root;
    for &byte in key {
        path.push(current);
        current = current.and_then(|node| node.child(byte));
    }

    let mut rebuilt = edit(current.map(|n| &**n))
        .filter(|node| !node.is_prunable())
        .map(Arc::new);

    for (&byte, old) in key.iter().zip(path).rev() {
        let mut copy = old.map(|n| TrieNode::clone(n)).unwrap_or_default();

        match rebuilt {
            Some(child) => {
                copy.children.insert(byte, child);
            }
            None => {
                copy.children.remove(&byte);
            }
        }

        rebuilt = if copy.is_prunable() {
            None
        } else {
            Some(Arc::new(copy))
        };
    }

    rebuilt
}

impl fmt::Debug for Trie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trie")
            .field("len", &self.len())
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at<'a>(trie: &'a Trie, key: &[u8]) -> &'a Arc<TrieNode> {
        let mut current = trie.root.as_ref().unwrap();
        for byte in key {
            current = current.child(*byte).unwrap();
        }
        current
    }

    #[test]
    fn test_new_trie() {
        let trie = Trie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.len(), 0);
        assert!(trie.root().is_none());
    }

    #[test]
    fn test_get_nonexistent() {
        let trie = Trie::new();
        assert_eq!(trie.get::<u32>("hello"), None);
        assert_eq!(trie.get::<u32>(""), None);
    }

    #[test]
    fn test_put_and_get() {
        let trie = Trie::new().put("hello", 42u32);

        assert_eq!(trie.len(), 1);
        assert_eq!(trie.get::<u32>("hello"), Some(&42));
        assert_eq!(trie.get::<u32>("hell"), None);
        assert_eq!(trie.get::<u32>("world"), None);
    }

    #[test]
    fn test_put_replace() {
        let trie1 = Trie::new().put("hello", 42u32);
        let trie2 = trie1.put("hello", 100u32);

        assert_eq!(trie1.len(), 1);
        assert_eq!(trie2.len(), 1);
        assert_eq!(trie1.get::<u32>("hello"), Some(&42));
        assert_eq!(trie2.get::<u32>("hello"), Some(&100));
    }

    #[test]
    fn test_put_replace_with_other_type() {
        let trie1 = Trie::new().put("key", 5u32);
        let trie2 = trie1.put("key", "five".to_string());

        assert_eq!(trie2.get::<u32>("key"), None);
        assert_eq!(trie2.get::<String>("key").map(String::as_str), Some("five"));
        assert_eq!(trie1.get::<u32>("key"), Some(&5));
    }

    #[test]
    fn test_put_keeps_children_of_replaced_node() {
        let trie = Trie::new()
            .put("abc", 1u32)
            .put("ab", 2u32)
            .put("ab", 3u32);

        assert_eq!(trie.get::<u32>("abc"), Some(&1));
        assert_eq!(trie.get::<u32>("ab"), Some(&3));
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_put_multiple() {
        let trie1 = Trie::new().put("hello", 42u32);
        let trie2 = trie1.put("world", 100u32);
        let trie3 = trie2.put("hello world", 200u32);

        assert_eq!(trie1.len(), 1);
        assert_eq!(trie2.len(), 2);
        assert_eq!(trie3.len(), 3);

        assert_eq!(trie3.get::<u32>("hello"), Some(&42));
        assert_eq!(trie3.get::<u32>("world"), Some(&100));
        assert_eq!(trie3.get::<u32>("hello world"), Some(&200));
    }

    #[test]
    fn test_empty_key() {
        let trie = Trie::new().put("", 7u64).put("a", 8u64);

        assert_eq!(trie.get::<u64>(""), Some(&7));
        assert_eq!(trie.get::<u64>("a"), Some(&8));

        let removed = trie.remove("");
        assert_eq!(removed.get::<u64>(""), None);
        assert_eq!(removed.get::<u64>("a"), Some(&8));
        assert!(!removed.root().unwrap().is_value_node());
    }

    #[test]
    fn test_get_checked() {
        let trie = Trie::new().put("ab", 1u32);

        assert_eq!(trie.get_checked::<u32>("ab"), Ok(&1));
        assert_eq!(trie.get_checked::<u32>("a"), Err(TrieError::NotFound));
        assert_eq!(trie.get_checked::<u32>("abc"), Err(TrieError::NotFound));
        assert_eq!(
            trie.get_checked::<u64>("ab"),
            Err(TrieError::TypeMismatch {
                expected: type_name::<u64>()
            })
        );
    }

    #[test]
    fn test_contains_key() {
        let trie = Trie::new().put("ab", 1u32).put("xy", "s".to_string());

        assert!(trie.contains_key("ab"));
        assert!(trie.contains_key("xy"));
        assert!(!trie.contains_key("a"));
        assert!(!trie.contains_key(""));
    }

    #[test]
    fn test_structural_sharing() {
        let trie1 = Trie::new().put("hello", 42u32);
        let trie2 = trie1.put("help", 100u32);

        // The root nodes should be different
        assert!(!trie1.ptr_eq(&trie2));

        // The 'h' nodes should be different since we modified this path
        assert!(!Arc::ptr_eq(node_at(&trie1, b"h"), node_at(&trie2, b"h")));

        // The "hell" subtree hangs off the edit path and is shared
        assert!(Arc::ptr_eq(node_at(&trie1, b"hell"), node_at(&trie2, b"hell")));

        // Now insert a completely different prefix
        let trie3 = trie2.put("world", 200u32);

        // The whole "h" subtree should be shared between trie2 and trie3
        assert!(Arc::ptr_eq(node_at(&trie2, b"h"), node_at(&trie3, b"h")));
    }

    #[test]
    fn test_remove_existing() {
        let trie = Trie::new().put("hello", 42u32).put("world", 100u32);

        let trie2 = trie.remove("hello");

        assert_eq!(trie2.len(), 1);
        assert_eq!(trie2.get::<u32>("hello"), None);
        assert_eq!(trie2.get::<u32>("world"), Some(&100));
        assert!(trie2.root().unwrap().child(b'h').is_none());

        // The original trie should be unchanged
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.get::<u32>("hello"), Some(&42));
    }

    #[test]
    fn test_remove_nonexistent() {
        let trie = Trie::new().put("hello", 42u32);

        let trie2 = trie.remove("world");
        assert!(trie2.ptr_eq(&trie));
        assert_eq!(trie2.get::<u32>("hello"), Some(&42));

        // A prefix of a stored key is not itself stored
        let trie3 = trie.remove("hell");
        assert!(trie3.ptr_eq(&trie));

        // Removing from an empty trie
        let empty = Trie::new().remove("anything");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_remove_last_key_empties_trie() {
        let trie = Trie::new().put("abc", 1u32).remove("abc");

        assert!(trie.is_empty());
        assert!(trie.root().is_none());
    }

    #[test]
    fn test_remove_prunes_multiple_levels() {
        let trie = Trie::new().put("a", 1u32).put("abcd", 2u32);

        let trie2 = trie.remove("abcd");

        // "b", "bc" and "bcd" all go; "a" keeps its value and nothing below
        let a = node_at(&trie2, b"a");
        assert!(a.is_leaf());
        assert_eq!(a.value::<u32>(), Some(&1));
        assert_eq!(trie2.len(), 1);
    }

    #[test]
    fn test_remove_demotes_inner_value_node() {
        let trie = Trie::new().put("abc", 1u32).put("abcde", 2u32);

        let trie2 = trie.remove("abc");

        assert_eq!(trie2.get::<u32>("abc"), None);
        assert_eq!(trie2.get::<u32>("abcde"), Some(&2));
        assert!(!node_at(&trie2, b"abc").is_value_node());
        // The subtree below the demoted node is shared
        assert!(Arc::ptr_eq(node_at(&trie, b"abcd"), node_at(&trie2, b"abcd")));
    }

    #[test]
    fn test_remove_structural_sharing() {
        let trie = Trie::new()
            .put("hello", 1u32)
            .put("help", 2u32)
            .put("world", 3u32);

        // Remove a key from one branch
        let trie2 = trie.remove("world");

        // The 'h' nodes should be the same (structural sharing)
        assert!(Arc::ptr_eq(node_at(&trie, b"h"), node_at(&trie2, b"h")));

        // But removing from a branch should create new nodes along that path
        let trie3 = trie.remove("hello");
        assert!(!Arc::ptr_eq(node_at(&trie, b"h"), node_at(&trie3, b"h")));
        assert!(Arc::ptr_eq(node_at(&trie, b"help"), node_at(&trie3, b"help")));
        assert!(node_at(&trie3, b"hel").child(b'l').is_none());
    }

    #[test]
    fn test_trie_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Trie>();
        assert_send_sync::<TrieNode>();
    }
}
