//! The platform-description repository.
//!
//! The repository stores abstract platform objects with no knowledge of
//! ACPI layout. Objects are keyed by an [`ObjectId`] drawn from a
//! namespaced id space and, optionally, by the cross-reference [`Token`]
//! of the owning object, so that a node can attach a private list (its ID
//! mappings, its interrupt array) that other nodes cannot see.

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// Namespaces of the configuration object id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Objects defined for every platform.
    Standard,
    /// Objects specific to Arm platforms.
    Arm,
}

/// Identifies a kind of platform-description object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectId {
    /// Standard: configuration manager identification.
    ConfigurationManagerInfo,
    /// Standard: the list of tables to install.
    AcpiTableList,
    /// Arm: GIC CPU interface description.
    GicCpuInterface,
    /// Arm: GIC distributor description.
    GicDistributor,
    /// Arm: GIC MSI frame description.
    GicMsiFrame,
    /// Arm: GIC redistributor description.
    GicRedistributor,
    /// Arm: GIC interrupt translation service description.
    GicIts,
    /// Arm: IORT ITS group node.
    ItsGroup,
    /// Arm: IORT named component node.
    NamedComponent,
    /// Arm: IORT root complex node.
    RootComplex,
    /// Arm: IORT SMMUv1/v2 node.
    SmmuV1V2,
    /// Arm: IORT SMMUv3 node.
    SmmuV3,
    /// Arm: IORT performance monitoring counter group node.
    Pmcg,
    /// Arm: ID mapping array element.
    IdMapping,
    /// Arm: SMMU interrupt array element.
    SmmuInterrupt,
    /// Arm: GIC ITS identifier array element.
    ItsIdentifier,
    /// Arm: PCI configuration space description.
    PciConfigSpace,
    /// Arm: memory affinity description.
    MemoryAffinity,
    /// Arm: generic initiator affinity description.
    GenericInitiatorAffinity,
    /// Arm: ACPI device handle.
    DeviceHandleAcpi,
    /// Arm: PCI device handle.
    DeviceHandlePci,
}

impl ObjectId {
    /// The namespace this id belongs to.
    #[must_use]
    pub fn namespace(self) -> Namespace {
        match self {
            ObjectId::ConfigurationManagerInfo | ObjectId::AcpiTableList => Namespace::Standard,
            _ => Namespace::Arm,
        }
    }
}

/// Opaque cross-reference token.
///
/// Tokens are assigned at object creation, are monotone, and are the only
/// way platform objects refer to one another. [`Token::NULL`] means "no
/// reference".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    /// The reserved null token.
    pub const NULL: Token = Token(0);

    /// Whether this is the null token.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Allocates monotonically increasing tokens.
#[derive(Debug)]
pub struct TokenAllocator {
    next: AtomicU64,
}

impl TokenAllocator {
    /// A fresh allocator; the first allocated token follows [`Token::NULL`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next token.
    pub fn allocate(&self) -> Token {
        Token(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A typed platform-description object.
///
/// Every object kind maps to one [`ObjectId`] and exposes its own
/// cross-reference token.
pub trait PlatformObject: Clone + 'static {
    /// The object id of this kind.
    const ID: ObjectId;

    /// The object's cross-reference token.
    fn token(&self) -> Token;
}

/// Errors reported by repository lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoError {
    /// No objects with the given id and token exist.
    NotFound {
        /// The requested object kind.
        id: ObjectId,
        /// The requested token.
        token: Token,
    },
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::NotFound { id, token } => {
                write!(f, "no {id:?} objects for token {token:?}")
            }
        }
    }
}

/// The interface table generators consume platform descriptions through.
pub trait Repository {
    /// Number of objects with the given id, across all tokens. An absent
    /// kind counts as zero.
    fn count(&self, id: ObjectId) -> usize;

    /// All objects of a kind, regardless of token, as an owned copy.
    /// Absent kinds yield an empty list.
    fn get_all<T: PlatformObject>(&self) -> Vec<T>;

    /// The objects of a kind attached to a specific token, as an owned
    /// copy.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotFound`] when no such list exists.
    fn get<T: PlatformObject>(&self, token: Token) -> Result<Vec<T>, RepoError>;

    /// Append objects to the list with matching id and token, creating
    /// the list if none exists.
    fn add<T: PlatformObject>(&mut self, token: Option<Token>, objects: &[T]);
}

/// Type-erased storage for one (id, token) object list.
struct Group {
    token: Option<Token>,
    count: usize,
    // Holds a Vec<T> for the T registered under this group's ObjectId.
    data: Box<dyn Any>,
}

/// In-memory reference implementation of [`Repository`].
#[derive(Default)]
pub struct MemoryRepository {
    groups: BTreeMap<ObjectId, Vec<Group>>,
}

impl MemoryRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryRepository {
    fn count(&self, id: ObjectId) -> usize {
        self.groups
            .get(&id)
            .map_or(0, |groups| groups.iter().map(|g| g.count).sum())
    }

    fn get_all<T: PlatformObject>(&self) -> Vec<T> {
        let mut out = Vec::new();
        if let Some(groups) = self.groups.get(&T::ID) {
            for group in groups {
                if let Some(list) = group.data.downcast_ref::<Vec<T>>() {
                    out.extend_from_slice(list);
                }
            }
        }
        out
    }

    fn get<T: PlatformObject>(&self, token: Token) -> Result<Vec<T>, RepoError> {
        let not_found = RepoError::NotFound { id: T::ID, token };
        let groups = self.groups.get(&T::ID).ok_or(not_found)?;
        let group = groups
            .iter()
            .find(|g| g.token == Some(token))
            .ok_or(not_found)?;
        group
            .data
            .downcast_ref::<Vec<T>>()
            .map(Clone::clone)
            .ok_or(not_found)
    }

    fn add<T: PlatformObject>(&mut self, token: Option<Token>, objects: &[T]) {
        let groups = self.groups.entry(T::ID).or_default();

        if let Some(group) = groups.iter_mut().find(|g| g.token == token) {
            if let Some(list) = group.data.downcast_mut::<Vec<T>>() {
                list.extend_from_slice(objects);
                group.count = list.len();
            }
            return;
        }

        groups.push(Group {
            token,
            count: objects.len(),
            data: Box::new(objects.to_vec()),
        });
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::objects::{GicCpuInterface, ItsIdentifier};

    #[test]
    fn tokens_are_monotone_and_never_null() {
        let allocator = TokenAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        assert!(!a.is_null());
        assert!(a < b);
    }

    #[test]
    fn absent_kind_counts_as_zero() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.count(ObjectId::GicCpuInterface), 0);
        assert!(repo.get_all::<GicCpuInterface>().is_empty());
    }

    #[test]
    fn add_appends_to_matching_group() {
        let allocator = TokenAllocator::new();
        let mut repo = MemoryRepository::new();
        let list_token = allocator.allocate();

        let id = |value| ItsIdentifier {
            token: allocator.allocate(),
            its_id: value,
        };

        repo.add(Some(list_token), &[id(1)]);
        repo.add(Some(list_token), &[id(2), id(3)]);

        assert_eq!(repo.count(ObjectId::ItsIdentifier), 3);
        let fetched = repo.get::<ItsIdentifier>(list_token).unwrap();
        assert_eq!(fetched.len(), 3);
        assert_eq!(fetched[2].its_id, 3);
    }

    #[test]
    fn token_lookup_misses_report_not_found() {
        let repo = MemoryRepository::new();
        let err = repo.get::<ItsIdentifier>(Token(42)).unwrap_err();
        assert_eq!(
            err,
            RepoError::NotFound {
                id: ObjectId::ItsIdentifier,
                token: Token(42),
            }
        );
    }

    #[test]
    fn get_all_spans_tokened_and_untokened_groups() {
        let allocator = TokenAllocator::new();
        let mut repo = MemoryRepository::new();
        let t = allocator.allocate();

        let id = |value| ItsIdentifier {
            token: allocator.allocate(),
            its_id: value,
        };

        repo.add(None, &[id(1)]);
        repo.add(Some(t), &[id(2)]);

        assert_eq!(repo.get_all::<ItsIdentifier>().len(), 2);
    }

    #[test]
    fn namespaces_partition_the_id_space() {
        assert_eq!(ObjectId::AcpiTableList.namespace(), Namespace::Standard);
        assert_eq!(ObjectId::GicCpuInterface.namespace(), Namespace::Arm);
    }
}
