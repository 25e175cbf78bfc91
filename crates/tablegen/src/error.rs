//! Generator error types.

use core::fmt;

use crate::repo::{ObjectId, RepoError, Token};

/// Errors that can occur while generating an ACPI table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenError {
    /// The requested table revision is outside the generator's supported
    /// range.
    UnsupportedRevision {
        /// The revision that was requested.
        requested: u8,
        /// Lowest supported revision.
        min: u8,
        /// Highest supported revision.
        max: u8,
    },
    /// A required object kind has no instances in the repository.
    MissingObjects(ObjectId),
    /// An object kind restricted to a single instance had more.
    TooManyObjects(ObjectId),
    /// Two objects carry the same ACPI processor UID.
    DuplicateUid {
        /// Index of the first colliding object.
        first: usize,
        /// Index of the second colliding object.
        second: usize,
        /// The shared UID.
        uid: u32,
    },
    /// A referenced token was not found in the node index.
    TokenNotFound(Token),
    /// A token-keyed object list held fewer entries than its owner
    /// declared.
    ShortObjectList(ObjectId),
    /// A node's packed size exceeds the 16-bit node length field.
    NodeTooLarge {
        /// Name of the node kind.
        kind: &'static str,
        /// The computed size.
        size: u64,
    },
    /// The table's total size exceeds the 32-bit table length field.
    TableTooLarge(u64),
    /// A repository lookup failed.
    Repo(RepoError),
}

impl From<RepoError> for GenError {
    fn from(err: RepoError) -> Self {
        GenError::Repo(err)
    }
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::UnsupportedRevision { requested, min, max } => write!(
                f,
                "requested table revision {requested} is not supported (minimum {min}, maximum {max})"
            ),
            GenError::MissingObjects(id) => {
                write!(f, "required platform objects {id:?} were not provided")
            }
            GenError::TooManyObjects(id) => {
                write!(f, "only one {id:?} object may be present")
            }
            GenError::DuplicateUid { first, second, uid } => write!(
                f,
                "objects {first} and {second} have the same ACPI processor UID 0x{uid:x}"
            ),
            GenError::TokenNotFound(token) => {
                write!(f, "no node carries the referenced token {token:?}")
            }
            GenError::ShortObjectList(id) => {
                write!(f, "fewer {id:?} objects than the referencing node declared")
            }
            GenError::NodeTooLarge { kind, size } => {
                write!(f, "{kind} node size 0x{size:x} exceeds the 16-bit length field")
            }
            GenError::TableTooLarge(size) => {
                write!(f, "table size 0x{size:x} exceeds the 32-bit length field")
            }
            GenError::Repo(err) => write!(f, "repository error: {err}"),
        }
    }
}
