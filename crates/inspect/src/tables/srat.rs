//! System Resource Affinity Table (SRAT) parsing.
//!
//! The SRAT describes NUMA topology by mapping processors, memory ranges
//! and generic initiators to proximity domains. All six resource
//! allocation structure types defined by ACPI 6.3 are parsed; the
//! APIC-model affinities carry x86 architecture masks, the GIC-model
//! affinities Arm ones.

use crate::arch::ArchMask;
use crate::bytes;
use crate::parser::{member_overruns, parse_fields, render_hex_bytes, Captures, FieldDescriptor,
    FieldFormat, Slot, Validator, ValidatorContext};
use crate::structdb::{StructDatabase, StructInfo};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, acpi_warn, with_acpi_header};
use alloc::vec;

/// SRAT table signature.
pub const SIGNATURE: &[u8; 4] = b"SRAT";

/// Processor local APIC/SAPIC affinity type tag.
pub const TYPE_APIC_AFFINITY: u32 = 0;
/// Memory affinity type tag.
pub const TYPE_MEMORY_AFFINITY: u32 = 1;
/// Processor local x2APIC affinity type tag.
pub const TYPE_X2APIC_AFFINITY: u32 = 2;
/// GICC affinity type tag.
pub const TYPE_GICC_AFFINITY: u32 = 3;
/// GIC ITS affinity type tag.
pub const TYPE_GIC_ITS_AFFINITY: u32 = 4;
/// Generic initiator affinity type tag.
pub const TYPE_GENERIC_INITIATOR_AFFINITY: u32 = 5;

/// The first reserved field of the SRAT must be 1 for backward
/// compatibility.
fn validate_srat_reserved(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if bytes::read_u32(field, 0) != Some(1) {
        acpi_warn!(t, "Reserved field must be 1 for backward compatibility");
    }
}

/// A generic initiator's device handle type is 0 (ACPI) or 1 (PCI).
fn validate_device_handle_type(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if let Some(&handle_type) = field.first() {
        if handle_type > 1 {
            acpi_error!(
                t,
                ErrorKind::Value,
                "Device Handle Type must be 0 (ACPI) or 1 (PCI), found {handle_type}"
            );
        }
    }
}

/// Fields of the SRAT, header included.
static SRAT_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("Reserved", 4, 36, FieldFormat::Hex)
        .validate(validate_srat_reserved as Validator),
    FieldDescriptor::new("Reserved", 8, 40, FieldFormat::Hex),
];

/// Fields of the processor local APIC/SAPIC affinity structure (type 0).
static APIC_AFFINITY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Proximity Domain [7:0]", 1, 2, FieldFormat::Hex),
    FieldDescriptor::new("APIC ID", 1, 3, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Local SAPIC EID", 1, 8, FieldFormat::Hex),
    FieldDescriptor::rendered("Proximity Domain [31:8]", 3, 9, render_hex_bytes),
    FieldDescriptor::new("Clock Domain", 4, 12, FieldFormat::Hex),
];

/// Fields of the memory affinity structure (type 1).
static MEMORY_AFFINITY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Proximity Domain", 4, 2, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 2, 6, FieldFormat::Hex),
    FieldDescriptor::new("Base Address Low", 4, 8, FieldFormat::Hex),
    FieldDescriptor::new("Base Address High", 4, 12, FieldFormat::Hex),
    FieldDescriptor::new("Length Low", 4, 16, FieldFormat::Hex),
    FieldDescriptor::new("Length High", 4, 20, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 24, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 28, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 8, 32, FieldFormat::Hex),
];

/// Fields of the processor local x2APIC affinity structure (type 2).
static X2APIC_AFFINITY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("Proximity Domain", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("X2APIC ID", 4, 8, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 12, FieldFormat::Hex),
    FieldDescriptor::new("Clock Domain", 4, 16, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 20, FieldFormat::Hex),
];

/// Fields of the GICC affinity structure (type 3).
static GICC_AFFINITY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Proximity Domain", 4, 2, FieldFormat::Hex),
    FieldDescriptor::new("ACPI Processor UID", 4, 6, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 10, FieldFormat::Hex),
    FieldDescriptor::new("Clock Domain", 4, 14, FieldFormat::Hex),
];

/// Fields of the GIC ITS affinity structure (type 4).
static GIC_ITS_AFFINITY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Proximity Domain", 4, 2, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 2, 6, FieldFormat::Hex),
    FieldDescriptor::new("ITS Id", 4, 8, FieldFormat::Hex),
];

/// Fields of the generic initiator affinity structure (type 5).
static GENERIC_INITIATOR_AFFINITY_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 1, 2, FieldFormat::Hex),
    FieldDescriptor::new("Device Handle Type", 1, 3, FieldFormat::Dec)
        .validate(validate_device_handle_type as Validator),
    FieldDescriptor::new("Proximity Domain", 4, 4, FieldFormat::Hex),
    FieldDescriptor::rendered("Device Handle", 16, 8, render_hex_bytes),
    FieldDescriptor::new("Flags", 4, 24, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 28, FieldFormat::Hex),
];

const STRUCT_TYPE: Slot = Slot(0);
const STRUCT_LENGTH: Slot = Slot(1);

/// Fields of the resource allocation structure header.
static STRUCT_HEADER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::unnamed(1, 0).capture(STRUCT_TYPE),
    FieldDescriptor::unnamed(1, 1).capture(STRUCT_LENGTH),
];

const STRUCT_HEADER_LEN: usize = 2;

const X86: ArchMask = ArchMask::IA32.union(ArchMask::X64);
const GIC: ArchMask = ArchMask::ARM.union(ArchMask::AARCH64);
const ALL: ArchMask = ArchMask::all();

/// The SRAT resource allocation structure registry.
fn database() -> StructDatabase {
    StructDatabase::new(
        "Resource Allocation Structure",
        vec![
            StructInfo::fields(
                "Processor Local APIC/SAPIC Affinity",
                TYPE_APIC_AFFINITY,
                X86,
                APIC_AFFINITY_FIELDS,
            ),
            StructInfo::fields("Memory Affinity", TYPE_MEMORY_AFFINITY, ALL, MEMORY_AFFINITY_FIELDS),
            StructInfo::fields(
                "Processor Local x2APIC Affinity",
                TYPE_X2APIC_AFFINITY,
                X86,
                X2APIC_AFFINITY_FIELDS,
            ),
            StructInfo::fields("GICC Affinity", TYPE_GICC_AFFINITY, GIC, GICC_AFFINITY_FIELDS),
            StructInfo::fields(
                "GIC ITS Affinity",
                TYPE_GIC_ITS_AFFINITY,
                GIC,
                GIC_ITS_AFFINITY_FIELDS,
            ),
            StructInfo::fields(
                "Generic Initiator Affinity",
                TYPE_GENERIC_INITIATOR_AFFINITY,
                ALL,
                GENERIC_INITIATOR_AFFINITY_FIELDS,
            ),
        ],
    )
}

/// Parse the SRAT: reserved header fields then the affinity structures.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut db = database();
    db.reset_counts();

    let mut captures = Captures::new();
    let mut offset =
        parse_fields(t, true, 0, Some("SRAT"), buf, SRAT_FIELDS, &mut captures) as usize;

    while offset < buf.len() {
        let mut header = Captures::new();
        parse_fields(t, false, 0, None, &buf[offset..], STRUCT_HEADER_FIELDS, &mut header);

        let (Some(struct_type), Some(struct_length)) =
            (header.u8_at(STRUCT_TYPE), header.u8_at(STRUCT_LENGTH))
        else {
            acpi_error!(
                t,
                ErrorKind::Parse,
                "Failed to read the Resource Allocation Structure header"
            );
            return;
        };

        let length = struct_length as usize;
        if length < STRUCT_HEADER_LEN {
            acpi_error!(
                t,
                ErrorKind::Length,
                "Resource Allocation Structure at offset 0x{offset:x} is shorter than its \
                 header ({length} < {STRUCT_HEADER_LEN})"
            );
            return;
        }
        if member_overruns(t, "Resource Allocation Structure", offset, length, buf.len()) {
            return;
        }

        db.parse_struct(t, 2, &buf[offset..offset + length], offset as u32, u32::from(struct_type));
        offset += length;
    }

    if t.consistency() {
        db.validate_counts(t);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Trace};
    use std::vec::Vec;

    const SRAT_HEADER_LEN: usize = 48;
    const GICC_AFFINITY_LEN: usize = 18;
    const MEMORY_AFFINITY_LEN: usize = 40;

    fn srat_header(total_len: usize) -> Vec<u8> {
        let mut buf = std::vec![0u8; SRAT_HEADER_LEN];
        buf[..4].copy_from_slice(SIGNATURE);
        buf[4..8].copy_from_slice(&(total_len as u32).to_le_bytes());
        buf[8] = 3;
        buf[36..40].copy_from_slice(&1u32.to_le_bytes());
        buf
    }

    fn gicc_affinity(proximity: u32, uid: u32) -> Vec<u8> {
        let mut s = std::vec![0u8; GICC_AFFINITY_LEN];
        s[0] = TYPE_GICC_AFFINITY as u8;
        s[1] = GICC_AFFINITY_LEN as u8;
        s[2..6].copy_from_slice(&proximity.to_le_bytes());
        s[6..10].copy_from_slice(&uid.to_le_bytes());
        s
    }

    fn memory_affinity(proximity: u32) -> Vec<u8> {
        let mut s = std::vec![0u8; MEMORY_AFFINITY_LEN];
        s[0] = TYPE_MEMORY_AFFINITY as u8;
        s[1] = MEMORY_AFFINITY_LEN as u8;
        s[2..6].copy_from_slice(&proximity.to_le_bytes());
        s
    }

    fn run(buf: &[u8]) -> BufferSink {
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, buf, 3);
        }
        sink
    }

    #[test]
    fn affinity_structures_are_counted() {
        let mut buf = srat_header(SRAT_HEADER_LEN + GICC_AFFINITY_LEN + MEMORY_AFFINITY_LEN);
        buf.extend_from_slice(&gicc_affinity(0, 1));
        buf.extend_from_slice(&memory_affinity(0));

        let sink = run(&buf);
        let text = sink.text();
        assert!(text.contains("GICC Affinity[0] (+0x30)"));
        assert!(text.contains("Memory Affinity[0] (+0x42)"));
        assert!(text.contains("ACPI Processor UID"));
    }

    #[test]
    fn unknown_affinity_type_is_reported() {
        let mut entry = std::vec![0u8; 8];
        entry[0] = 9;
        entry[1] = 8;

        let mut buf = srat_header(SRAT_HEADER_LEN + entry.len());
        buf.extend_from_slice(&entry);

        let sink = run(&buf);
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Unknown Resource Allocation Structure. Type = 9")));
    }

    #[test]
    fn bad_device_handle_type_is_flagged() {
        let mut entry = std::vec![0u8; 32];
        entry[0] = TYPE_GENERIC_INITIATOR_AFFINITY as u8;
        entry[1] = 32;
        entry[3] = 2; // invalid handle type

        let mut buf = srat_header(SRAT_HEADER_LEN + entry.len());
        buf.extend_from_slice(&entry);

        let sink = run(&buf);
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Device Handle Type")));
    }
}
