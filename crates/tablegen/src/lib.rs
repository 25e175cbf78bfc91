//! `acpi-tablegen` --- builds byte-exact ACPI tables from abstract
//! platform-description objects.
//!
//! A platform describes its hardware as typed objects (GIC CPU interfaces,
//! IORT nodes, PCI configuration spaces, ...) held in a [`Repository`].
//! Objects refer to each other through opaque cross-reference [`Token`]s,
//! never through memory addresses. Each table generator turns the relevant
//! objects into a packed ACPI 6.3 table: a sizing pass computes every
//! node's byte size and records each token's final offset in a
//! [`NodeIndex`], then an emission pass writes headers and bodies,
//! resolving every cross-reference through the index.
//!
//! Unlike the inspector, which reports problems and carries on, every step
//! here returns a [`GenError`]; a failure drops the partially built table.
//!
//! # Usage
//!
//! ```ignore
//! let mut repo = MemoryRepository::new();
//! repo.add(None, &[gicc])?;
//! repo.add(None, &[gicd])?;
//! let table = madt::build(&repo, &TableInfo::new(5))?;
//! ```

#![no_std]

extern crate alloc;

pub mod error;
pub mod index;
pub mod iort;
pub mod madt;
pub mod mcfg;
pub mod objects;
pub mod repo;
pub mod srat;
pub mod table;

pub use error::GenError;
pub use index::NodeIndex;
pub use repo::{MemoryRepository, Namespace, ObjectId, PlatformObject, RepoError, Repository,
    Token, TokenAllocator};
pub use table::TableInfo;
