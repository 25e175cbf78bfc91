//! The generator node indexer.
//!
//! During the sizing pass every node's cross-reference token is recorded
//! together with the node's final byte offset in the table under
//! construction. The emission pass resolves reference fields through this
//! index; raw pointers into the table buffer are never held.

use alloc::vec::Vec;

use crate::error::GenError;
use crate::repo::Token;

/// Maps cross-reference tokens to final table offsets.
#[derive(Debug, Default)]
pub struct NodeIndex {
    entries: Vec<(Token, u32)>,
}

impl NodeIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node's token and its offset from the start of the table.
    pub fn insert(&mut self, token: Token, offset: u32) {
        log::debug!("node index: token {token:?} at offset {offset:#x}");
        self.entries.push((token, offset));
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a token to its node's table offset.
    ///
    /// [`Token::NULL`] means "no reference" and resolves to offset zero.
    /// The index is fully populated before emission begins, so a missing
    /// token indicates inconsistent input.
    ///
    /// # Errors
    ///
    /// [`GenError::TokenNotFound`] when no node carries `token`.
    pub fn resolve(&self, token: Token) -> Result<u32, GenError> {
        if token.is_null() {
            return Ok(0);
        }
        self.entries
            .iter()
            .find(|(t, _)| *t == token)
            .map(|&(_, offset)| offset)
            .ok_or_else(|| {
                log::error!("node index: token {token:?} not found");
                GenError::TokenNotFound(token)
            })
    }
}
