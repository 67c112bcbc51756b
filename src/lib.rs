//! # Copy-on-write Trie
//!
//! A persistent trie keyed by byte sequences, where every key may hold a value
//! of its own type.
//!
//! Every modifying operation returns a new trie and leaves the one it was
//! called on untouched. The new version copies only the nodes on the path of
//! the key it edits and shares all other subtrees with older versions via
//! `Arc`, so any number of versions can be kept around and read from other
//! threads while new ones are being built.
//!
//! ## Features
//!
//! - **Immutable API**: `put` and `remove` return a new trie instance
//! - **Structural Sharing**: Unchanged subtrees are shared between versions
//! - **Heterogeneous Values**: Values are type-erased and recovered with a checked downcast
//! - **Minimal Shape**: Removal prunes every node left with no value and no children
//!
//! ## Example
//!
//! ```rust
//! use cow_trie::Trie;
//!
//! let t0 = Trie::new();
//! let t1 = t0.put("ab", 1u32);
//! let t2 = t1.put("ac", 2u32);
//! let t3 = t2.remove("ab");
//!
//! assert_eq!(t1.get::<u32>("ab"), Some(&1));
//! assert_eq!(t2.get::<u32>("ab"), Some(&1));
//! assert_eq!(t2.get::<u32>("ac"), Some(&2));
//! assert_eq!(t3.get::<u32>("ab"), None);
//! assert_eq!(t3.get::<u32>("ac"), Some(&2));
//!
//! // Asking for the wrong type is not an error, just a miss
//! assert_eq!(t3.get::<String>("ac"), None);
//! ```

mod error;
mod node;
mod trie;
mod util;

// Re-export public types
pub use crate::error::{TrieError, TrieResult};
pub use crate::node::TrieNode;
pub use crate::trie::Trie;
