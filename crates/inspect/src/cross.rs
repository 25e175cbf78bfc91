//! Cross-structure validation.
//!
//! Methods for validating ACPI table contents where an entire table is in
//! scope, e.g. finding duplicate field values across structures of the
//! same type, or resolving the byte offset one structure uses to refer to
//! another. Entries are collected by one walk of the table, queried by the
//! validation routines, then released with the list.

use alloc::vec::Vec;

use crate::trace::{ErrorKind, Trace};
use crate::acpi_error;

/// One collected sample: an owned copy of a structure (or field), its type
/// tag, and its byte offset from the start of the table.
pub struct CrossEntry {
    /// Owned copy of the sampled bytes.
    pub bytes: Vec<u8>,
    /// ACPI-defined type tag of the structure the sample came from.
    pub type_id: u32,
    /// Byte offset of the sample from the start of the table.
    pub offset: u32,
}

/// Accumulates [`CrossEntry`] samples for one validation pass.
#[derive(Default)]
pub struct CrossList {
    entries: Vec<CrossEntry>,
}

impl CrossList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, copying its bytes.
    pub fn add(&mut self, bytes: &[u8], type_id: u32, offset: u32) {
        self.entries.push(CrossEntry {
            bytes: bytes.to_vec(),
            type_id,
            offset,
        });
    }

    /// Number of collected samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no samples have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The collected samples in table order.
    #[must_use]
    pub fn entries(&self) -> &[CrossEntry] {
        &self.entries
    }

    /// The sample whose structure starts at `offset`, if any.
    #[must_use]
    pub fn find(&self, offset: u32) -> Option<&CrossEntry> {
        self.entries.iter().find(|e| e.offset == offset)
    }

    /// Check that no two samples compare equal under `is_duplicate`.
    ///
    /// Every unordered pair is compared; each match emits one
    /// [`ErrorKind::Cross`] error citing both offsets. Returns `true` when
    /// all samples are unique.
    pub fn all_unique(
        &self,
        t: &mut Trace,
        is_duplicate: fn(&CrossEntry, &CrossEntry) -> bool,
        structure_name: &str,
        field_name: &str,
    ) -> bool {
        let mut unique = true;

        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if is_duplicate(a, b) {
                    unique = false;
                    acpi_error!(
                        t,
                        ErrorKind::Cross,
                        "{} structures (table+0x{:x}) and (table+0x{:x}) have the same {}",
                        structure_name,
                        a.offset,
                        b.offset,
                        field_name
                    );
                }
            }
        }

        unique
    }
}
