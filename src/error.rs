//! Error types for checked lookups.

/// Why a checked lookup did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrieError {
    /// No value is stored under the key.
    #[error("no value stored under the key")]
    NotFound,

    /// A value is stored under the key, but not of the requested type.
    #[error("value stored under the key is not a {expected}")]
    TypeMismatch {
        /// Name of the type the caller asked for
        expected: &'static str,
    },
}

/// Convenience alias for checked lookup results.
pub type TrieResult<T> = Result<T, TrieError>;
