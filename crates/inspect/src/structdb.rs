//! Per-table registries of sub-structure types.
//!
//! Tables such as the MADT, IORT or PPTT pack a sequence of
//! type-and-length-tagged sub-structures after their fixed header. A
//! [`StructDatabase`] collates, per ACPI-defined type tag, the structure's
//! name, its architecture compatibility, a per-parse instance counter and
//! the handler used to parse it.

use alloc::vec::Vec;

use crate::arch::ArchMask;
use crate::parser::{parse_fields, Captures, FieldDescriptor};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, acpi_fatal, acpi_info};

/// How a sub-structure type is parsed.
///
/// Exhaustively matched everywhere it is consumed, so adding a variant is
/// a compile-time event.
#[derive(Clone, Copy)]
pub enum StructHandler {
    /// Drive the generic parser over a field-descriptor array.
    Fields(&'static [FieldDescriptor]),
    /// A dedicated dispatcher; receives the structure's bytes (the slice
    /// length is the structure's declared length).
    Custom(fn(&mut Trace, &[u8])),
    /// Defined by the specification but not parsed here.
    Unimplemented,
}

/// Registry entry for one sub-structure type.
pub struct StructInfo {
    /// ACPI-defined structure name.
    pub name: &'static str,
    /// ACPI-defined type tag.
    pub type_id: u32,
    /// Architectures this structure is valid for.
    pub compat: ArchMask,
    /// Instances seen in the current parse.
    pub count: u32,
    /// How to parse the structure.
    pub handler: StructHandler,
}

impl StructInfo {
    /// Entry parsed through a field-descriptor array.
    #[must_use]
    pub const fn fields(
        name: &'static str,
        type_id: u32,
        compat: ArchMask,
        fields: &'static [FieldDescriptor],
    ) -> Self {
        Self {
            name,
            type_id,
            compat,
            count: 0,
            handler: StructHandler::Fields(fields),
        }
    }

    /// Entry parsed through a dedicated dispatcher function.
    #[must_use]
    pub const fn custom(
        name: &'static str,
        type_id: u32,
        compat: ArchMask,
        parse: fn(&mut Trace, &[u8]),
    ) -> Self {
        Self {
            name,
            type_id,
            compat,
            count: 0,
            handler: StructHandler::Custom(parse),
        }
    }

    /// Entry defined by the specification but with no parser provided.
    #[must_use]
    pub const fn unimplemented(name: &'static str, type_id: u32, compat: ArchMask) -> Self {
        Self {
            name,
            type_id,
            compat,
            count: 0,
            handler: StructHandler::Unimplemented,
        }
    }
}

/// Registry of every sub-structure type an ACPI table defines.
///
/// Entries are ordered by type tag with no gaps: `entries[i].type_id == i`.
pub struct StructDatabase {
    /// ACPI-defined name for the family of structures ("IORT Node",
    /// "Interrupt Controller Structure", ...).
    pub name: &'static str,
    /// Per-type entries, indexed by type tag.
    pub entries: Vec<StructInfo>,
}

impl StructDatabase {
    /// Build a database, asserting the dense type-tag ordering.
    #[must_use]
    pub fn new(name: &'static str, entries: Vec<StructInfo>) -> Self {
        debug_assert!(entries
            .iter()
            .enumerate()
            .all(|(i, e)| e.type_id as usize == i));
        Self { name, entries }
    }

    /// Set every instance counter to zero.
    pub fn reset_counts(&mut self) {
        for entry in &mut self.entries {
            entry.count = 0;
        }
    }

    /// Sum of all instance counters.
    #[must_use]
    pub fn sum_counts(&self) -> u32 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Whether `type_id` is defined for this table and compatible with the
    /// given architecture set.
    #[must_use]
    pub fn is_type_valid(&self, type_id: u32, arch: ArchMask) -> bool {
        self.entries
            .get(type_id as usize)
            .is_some_and(|e| e.compat.intersects(arch))
    }

    /// Report the per-type instance counts and validate architecture
    /// compatibility.
    ///
    /// Compatible types are listed unconditionally. Incompatible types are
    /// silent at count zero and reported as a [`ErrorKind::Value`] error
    /// otherwise. Returns `true` when every structure seen was compatible.
    pub fn validate_counts(&self, t: &mut Trace) -> bool {
        let arch = t.arch();
        let mut all_valid = true;

        acpi_info!(t, "");
        acpi_info!(t, "Table Breakdown:");
        for entry in &self.entries {
            if entry.compat.intersects(arch) {
                acpi_info!(t, "  {:<34} : {}", entry.name, entry.count);
            } else if entry.count > 0 {
                all_valid = false;
                acpi_error!(
                    t,
                    ErrorKind::Value,
                    "{} Structure is not valid for the target architecture (found {})",
                    entry.name,
                    entry.count
                );
            }
        }

        all_valid
    }

    /// Parse one sub-structure according to its registry entry.
    ///
    /// Logs the `name[index] (+0xoffset)` item heading, increments the
    /// instance counter and dispatches on the handler. Returns `false` for
    /// an undefined type tag or an unimplemented handler.
    pub fn parse_struct(
        &mut self,
        t: &mut Trace,
        indent: u32,
        data: &[u8],
        offset: u32,
        type_id: u32,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(type_id as usize) else {
            acpi_error!(
                t,
                ErrorKind::Value,
                "Unknown {}. Type = {}",
                self.name,
                type_id
            );
            return false;
        };

        t.item_line(
            indent,
            format_args!("{}[{}] (+0x{:x})", entry.name, entry.count, offset),
        );
        entry.count += 1;

        match entry.handler {
            StructHandler::Custom(parse) => {
                parse(t, data);
                true
            }
            StructHandler::Fields(fields) => {
                let mut captures = Captures::new();
                parse_fields(t, true, indent, None, data, fields, &mut captures);
                true
            }
            StructHandler::Unimplemented => {
                acpi_fatal!(t, "Parsing of {} Structure is not implemented", entry.name);
                false
            }
        }
    }
}
