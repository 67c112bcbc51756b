use std::sync::Arc;

use crate::node::TrieNode;

/// Follows `key` byte by byte from `root`.
///
/// Returns the node the whole key leads to, or `None` as soon as a byte has
/// no matching child. The empty key resolves to the root itself.
pub(crate) fn find_node<'a>(root: Option<&'a Arc<TrieNode>>, key: &[u8]) -> Option<&'a TrieNode> {
    let mut current = root?;

    for byte in key {
        current = current.child(*byte)?;
    }

    Some(current)
}
