//! Node implementation for the copy-on-write trie.
//!
//! This module contains the `TrieNode` structure that forms the backbone of
//! the trie. `TrieNode` instances are frozen inside an `Arc` as soon as they
//! are built, so that every trie version referencing a subtree shares it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

/// Type-erased value slot of a value-bearing node.
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

/// A single node of the trie.
///
/// A node either carries no value (a branch) or carries exactly one value
/// of some concrete type (a value-node). The concrete type is only known to
/// the caller that stored it and is recovered with [`TrieNode::value`].
pub struct TrieNode {
    /// Child nodes indexed by the next key byte
    pub(crate) children: HashMap<u8, Arc<TrieNode>>,

    /// The value stored at this node, if any
    pub(crate) value: Option<ErasedValue>,

    /// Cached number of values in this subtree
    ///
    /// Filled in lazily the first time it is asked for. Since nodes are never
    /// modified once shared, the cached count stays valid for the node's life.
    cached_size: OnceCell<usize>,
}

impl TrieNode {
    /// Creates a new branch node with no children and no value
    pub fn new() -> Self {
        TrieNode {
            children: HashMap::new(),
            value: None,
            cached_size: OnceCell::new(),
        }
    }

    /// Creates a value-node with the given children
    pub(crate) fn with_value(children: HashMap<u8, Arc<TrieNode>>, value: ErasedValue) -> Self {
        TrieNode {
            children,
            value: Some(value),
            cached_size: OnceCell::new(),
        }
    }

    /// Creates a branch node that keeps this node's children but drops its value
    pub(crate) fn without_value(&self) -> Self {
        TrieNode {
            children: self.children.clone(),
            value: None,
            cached_size: OnceCell::new(),
        }
    }

    /// Returns the children of this node
    pub fn children(&self) -> &HashMap<u8, Arc<TrieNode>> {
        &self.children
    }

    /// Returns the child reached by `byte`, if any
    pub fn child(&self, byte: u8) -> Option<&Arc<TrieNode>> {
        self.children.get(&byte)
    }

    /// Returns whether this node carries a value of any type
    pub fn is_value_node(&self) -> bool {
        self.value.is_some()
    }

    /// Returns whether this node carries a value of type `T`
    pub fn holds<T: Any>(&self) -> bool {
        self.value.as_ref().map_or(false, |v| v.is::<T>())
    }

    /// Returns the stored value as a `T`.
    ///
    /// Gives `None` both for a branch node and for a value-node whose value
    /// has a different concrete type.
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.value.as_ref()?.downcast_ref::<T>()
    }

    /// Returns whether this node is a leaf node (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A valueless leaf must never be reachable from a published version.
    pub(crate) fn is_prunable(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }

    /// Returns the number of values stored in this subtree
    pub fn subtree_size(&self) -> usize {
        if let Some(size) = self.cached_size.get() {
            return *size;
        }

        // Post-order walk over the part of the subtree not yet counted. A
        // node is pushed once to expand it and once more to sum its children.
        let mut stack: Vec<(&TrieNode, bool)> = vec![(self, false)];
        while let Some((node, expanded)) = stack.pop() {
            if node.cached_size.get().is_some() {
                continue;
            }

            if expanded {
                let own = if node.value.is_some() { 1 } else { 0 };
                let below: usize = node
                    .children
                    .values()
                    .map(|child| child.cached_size.get().copied().unwrap_or(0))
                    .sum();
                // Another thread may have filled it in meanwhile, with the same count
                let _ = node.cached_size.set(own + below);
            } else {
                stack.push((node, true));
                for child in node.children.values() {
                    if child.cached_size.get().is_none() {
                        stack.push((&**child, false));
                    }
                }
            }
        }

        self.cached_size.get().copied().unwrap_or(0)
    }
}

impl Default for TrieNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Shallow copy: children and the value are shared, not duplicated.
impl Clone for TrieNode {
    fn clone(&self) -> Self {
        TrieNode {
            children: self.children.clone(),
            value: self.value.clone(),
            cached_size: OnceCell::new(), // Reset cache for the new node
        }
    }
}

/// Tears down long chains without recursing once per level.
///
/// Children still referenced from another version are only released, never
/// walked into.
impl Drop for TrieNode {
    fn drop(&mut self) {
        let mut stack: Vec<Arc<TrieNode>> = self.children.drain().map(|(_, child)| child).collect();

        while let Some(child) = stack.pop() {
            if let Ok(mut node) = Arc::try_unwrap(child) {
                stack.extend(node.children.drain().map(|(_, child)| child));
            }
        }
    }
}

impl fmt::Debug for TrieNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&u8> = self.children.keys().collect();
        keys.sort();

        f.debug_struct("TrieNode")
            .field("has_value", &self.value.is_some())
            .field("children", &keys)
            .finish()
    }
}
