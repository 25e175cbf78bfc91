//! Multiple APIC Description Table (MADT) parsing.
//!
//! The MADT describes the interrupt controller topology of the system. The
//! APIC-model structures (types 0x0 to 0xA) are registered but not parsed;
//! the GIC-model structures used by Arm platforms are parsed in full.

use crate::arch::ArchMask;
use crate::bytes;
use crate::cross::{CrossEntry, CrossList};
use crate::parser::{member_overruns, parse_fields, render_hex_bytes, Captures, FieldDescriptor,
    FieldFormat, Slot, Validator, ValidatorContext};
use crate::structdb::{StructDatabase, StructInfo};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, acpi_warn, with_acpi_header};
use alloc::vec;

/// MADT table signature.
pub const SIGNATURE: &[u8; 4] = b"APIC";

/// Interrupt controller structure type tag for the GICC.
pub const TYPE_GICC: u32 = 0x0B;
/// Interrupt controller structure type tag for the GICD.
pub const TYPE_GICD: u32 = 0x0C;

// Arm PPI ID ranges, per the GIC architecture specification.
const ARM_PPI_ID_MIN: u16 = 16;
const ARM_PPI_ID_MAX: u16 = 31;
const ARM_PPI_ID_EXTENDED_MIN: u16 = 1056;
const ARM_PPI_ID_EXTENDED_MAX: u16 = 1119;
const ARM_PPI_ID_PMBIRQ: u16 = 21;

/// The GICD System Vector Base is reserved and must be zero.
fn validate_gicd_system_vector_base(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if let Some(base) = bytes::read_u32(field, 0) {
        if base != 0 {
            acpi_error!(
                t,
                ErrorKind::Value,
                "System Vector Base must be zero (found 0x{base:x})"
            );
        }
    }
}

/// The SPE overflow interrupt must be a PPI; SBSA recommends PMBIRQ.
fn validate_spe_overflow_interrupt(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    let Some(spe) = bytes::read_u16(field, 0) else {
        return;
    };

    // SPE not supported by this processor.
    if spe == 0 {
        return;
    }

    let in_ppi = (ARM_PPI_ID_MIN..=ARM_PPI_ID_MAX).contains(&spe);
    let in_extended_ppi = (ARM_PPI_ID_EXTENDED_MIN..=ARM_PPI_ID_EXTENDED_MAX).contains(&spe);
    if !in_ppi && !in_extended_ppi {
        acpi_error!(
            t,
            ErrorKind::Value,
            "SPE Overflow Interrupt {spe} is outside the PPI ID ranges \
             [{ARM_PPI_ID_MIN}-{ARM_PPI_ID_MAX}] and \
             [{ARM_PPI_ID_EXTENDED_MIN}-{ARM_PPI_ID_EXTENDED_MAX}]"
        );
    } else if spe != ARM_PPI_ID_PMBIRQ {
        acpi_warn!(
            t,
            "SBSA recommends using PPI {ARM_PPI_ID_PMBIRQ} (PMBIRQ) for the SPE \
             Overflow Interrupt (found {spe})"
        );
    }
}

/// Fields of the GICC Interrupt Controller Structure.
static GICC_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("CPU Interface Number", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("ACPI Processor UID", 4, 8, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 12, FieldFormat::Hex),
    FieldDescriptor::new("Parking Protocol Version", 4, 16, FieldFormat::Hex),
    FieldDescriptor::new("Performance Interrupt GSIV", 4, 20, FieldFormat::Hex),
    FieldDescriptor::new("Parked Address", 8, 24, FieldFormat::Hex),
    FieldDescriptor::new("Physical Base Address", 8, 32, FieldFormat::Hex),
    FieldDescriptor::new("GICV", 8, 40, FieldFormat::Hex),
    FieldDescriptor::new("GICH", 8, 48, FieldFormat::Hex),
    FieldDescriptor::new("VGIC Maintenance interrupt", 4, 56, FieldFormat::Hex),
    FieldDescriptor::new("GICR Base Address", 8, 60, FieldFormat::Hex),
    FieldDescriptor::new("MPIDR", 8, 68, FieldFormat::Hex),
    FieldDescriptor::new("Processor Power Efficiency Class", 1, 76, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 1, 77, FieldFormat::Hex),
    FieldDescriptor::new("SPE overflow Interrupt", 2, 78, FieldFormat::Hex)
        .validate(validate_spe_overflow_interrupt as Validator),
];

/// Fields of the GICD Interrupt Controller Structure.
static GICD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("GIC ID", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Physical Base Address", 8, 8, FieldFormat::Hex),
    FieldDescriptor::new("System Vector Base", 4, 16, FieldFormat::Hex)
        .validate(validate_gicd_system_vector_base as Validator),
    FieldDescriptor::new("GIC Version", 1, 20, FieldFormat::Dec),
    FieldDescriptor::rendered("Reserved", 3, 21, render_hex_bytes),
];

/// Fields of the GIC MSI Frame Interrupt Controller Structure.
static GIC_MSI_FRAME_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("MSI Frame ID", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Physical Base Address", 8, 8, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 16, FieldFormat::Hex),
    FieldDescriptor::new("SPI Count", 2, 20, FieldFormat::Dec),
    FieldDescriptor::new("SPI Base", 2, 22, FieldFormat::Hex),
];

/// Fields of the GICR Interrupt Controller Structure.
static GICR_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("Discovery Range Base Address", 8, 4, FieldFormat::Hex),
    FieldDescriptor::new("Discovery Range Length", 4, 12, FieldFormat::Hex),
];

/// Fields of the GIC ITS Interrupt Controller Structure.
static GIC_ITS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("GIC ITS ID", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Physical Base Address", 8, 8, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 16, FieldFormat::Hex),
];

/// Fields of the MADT, header included.
static MADT_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("Local Interrupt Controller Address", 4, 36, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 40, FieldFormat::Hex),
];

const IC_TYPE: Slot = Slot(0);
const IC_LENGTH: Slot = Slot(1);

/// Fields of the interrupt controller structure header; type and length
/// are captured to drive the iteration.
static IC_HEADER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::unnamed(1, 0).capture(IC_TYPE),
    FieldDescriptor::unnamed(1, 1).capture(IC_LENGTH),
    FieldDescriptor::unnamed(2, 2),
];

const IC_HEADER_LEN: usize = 2;

const X86: ArchMask = ArchMask::IA32.union(ArchMask::X64);
const GIC: ArchMask = ArchMask::ARM.union(ArchMask::AARCH64);

/// The MADT interrupt controller structure registry.
fn database() -> StructDatabase {
    StructDatabase::new(
        "Interrupt Controller Structure",
        vec![
            StructInfo::unimplemented("Processor Local APIC", 0x0, X86),
            StructInfo::unimplemented("I/O APIC", 0x1, X86),
            StructInfo::unimplemented("Interrupt Source Override", 0x2, X86),
            StructInfo::unimplemented("NMI Source", 0x3, X86),
            StructInfo::unimplemented("Local APIC NMI", 0x4, X86),
            StructInfo::unimplemented("Local APIC Address Override", 0x5, X86),
            StructInfo::unimplemented("I/O SAPIC", 0x6, X86),
            StructInfo::unimplemented("Local SAPIC", 0x7, X86),
            StructInfo::unimplemented("Platform Interrupt Sources", 0x8, X86),
            StructInfo::unimplemented("Processor Local x2APIC", 0x9, X86),
            StructInfo::unimplemented("Local x2APIC NMI", 0xA, X86),
            StructInfo::fields("GICC", TYPE_GICC, GIC, GICC_FIELDS),
            StructInfo::fields("GICD", TYPE_GICD, GIC, GICD_FIELDS),
            StructInfo::fields("GIC MSI Frame", 0xD, GIC, GIC_MSI_FRAME_FIELDS),
            StructInfo::fields("GICR", 0xE, GIC, GICR_FIELDS),
            StructInfo::fields("GIC ITS", 0xF, GIC, GIC_ITS_FIELDS),
        ],
    )
}

fn uid_bytes_equal(a: &CrossEntry, b: &CrossEntry) -> bool {
    a.bytes == b.bytes
}

/// Parse the MADT: fixed header then the interrupt controller structures.
///
/// Under consistency mode the per-type instance counts are validated, at
/// most one GICD may be present, and the ACPI Processor UIDs of all GICC
/// structures must be unique.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut db = database();
    db.reset_counts();

    let mut captures = Captures::new();
    let mut offset =
        parse_fields(t, true, 0, Some("MADT"), buf, MADT_FIELDS, &mut captures) as usize;

    let mut gicc_uids = CrossList::new();

    while offset < buf.len() {
        // Parse the structure header to obtain the type and length.
        let mut header = Captures::new();
        parse_fields(t, false, 0, None, &buf[offset..], IC_HEADER_FIELDS, &mut header);

        let (Some(ic_type), Some(ic_length)) = (header.u8_at(IC_TYPE), header.u8_at(IC_LENGTH))
        else {
            acpi_error!(
                t,
                ErrorKind::Parse,
                "Failed to read the Interrupt Controller Structure header"
            );
            return;
        };

        let length = ic_length as usize;
        if length < IC_HEADER_LEN {
            acpi_error!(
                t,
                ErrorKind::Length,
                "Interrupt Controller Structure at offset 0x{offset:x} is shorter than its \
                 header ({length} < {IC_HEADER_LEN})"
            );
            return;
        }
        if member_overruns(t, "Interrupt Controller Structure", offset, length, buf.len()) {
            return;
        }

        let data = &buf[offset..offset + length];

        // Collect GICC processor UIDs for the post-loop uniqueness check.
        if t.consistency() && u32::from(ic_type) == TYPE_GICC && data.len() >= 12 {
            gicc_uids.add(&data[8..12], TYPE_GICC, offset as u32);
        }

        db.parse_struct(t, 2, data, offset as u32, u32::from(ic_type));
        offset += length;
    }

    if t.consistency() {
        db.validate_counts(t);

        if db.entries[TYPE_GICD as usize].count > 1 {
            acpi_error!(
                t,
                ErrorKind::Cross,
                "Only one {} must be present",
                db.entries[TYPE_GICD as usize].name
            );
        }

        gicc_uids.all_unique(t, uid_bytes_equal, "GICC", "ACPI Processor UID");
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Severity, Trace};
    use std::vec::Vec;

    const GICC_LEN: usize = 80;
    const GICD_LEN: usize = 24;

    fn madt_header(total_len: usize) -> Vec<u8> {
        let mut buf = std::vec![0u8; 44];
        buf[..4].copy_from_slice(SIGNATURE);
        buf[4..8].copy_from_slice(&(total_len as u32).to_le_bytes());
        buf[8] = 5;
        buf[10..16].copy_from_slice(b"ARMLTD");
        buf
    }

    fn gicc(uid: u32) -> Vec<u8> {
        let mut s = std::vec![0u8; GICC_LEN];
        s[0] = TYPE_GICC as u8;
        s[1] = GICC_LEN as u8;
        s[8..12].copy_from_slice(&uid.to_le_bytes());
        s
    }

    fn gicd() -> Vec<u8> {
        let mut s = std::vec![0u8; GICD_LEN];
        s[0] = TYPE_GICD as u8;
        s[1] = GICD_LEN as u8;
        s
    }

    fn run(buf: &[u8]) -> BufferSink {
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, buf, 5);
        }
        sink
    }

    #[test]
    fn one_gicc_one_gicd_counts_and_no_cross_errors() {
        let mut buf = madt_header(44 + GICC_LEN + GICD_LEN);
        buf.extend_from_slice(&gicc(1));
        buf.extend_from_slice(&gicd());

        let sink = run(&buf);
        let text = sink.text();

        assert!(text.contains("GICC[0] (+0x2c)"));
        assert!(text.contains("GICD[0] (+0x7c)"));
        assert!(text.contains(&std::format!("  {:<34} : 1", "GICC")));
        assert!(text.contains(&std::format!("  {:<34} : 1", "GICD")));
        assert!(sink.errors_of(crate::ErrorKind::Cross).is_empty());
    }

    #[test]
    fn two_gicds_report_cross_error() {
        let mut buf = madt_header(44 + GICC_LEN + 2 * GICD_LEN);
        buf.extend_from_slice(&gicc(1));
        buf.extend_from_slice(&gicd());
        buf.extend_from_slice(&gicd());

        let sink = run(&buf);
        let errors = sink.errors_of(crate::ErrorKind::Cross);
        assert!(errors.iter().any(|e| e.contains("Only one GICD must be present")));
    }

    #[test]
    fn duplicate_processor_uids_report_both_offsets() {
        let mut buf = madt_header(44 + 2 * GICC_LEN);
        buf.extend_from_slice(&gicc(7));
        buf.extend_from_slice(&gicc(7));

        let sink = run(&buf);
        let errors = sink.errors_of(crate::ErrorKind::Cross);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("ACPI Processor UID"));
        assert!(errors[0].contains("(table+0x2c)"));
        assert!(errors[0].contains("(table+0x7c)"));
    }

    #[test]
    fn truncated_structure_stops_with_length_error() {
        let mut buf = madt_header(44 + GICC_LEN);
        let mut short = gicc(1);
        short.truncate(40); // declared length 80, only 40 bytes present
        buf.extend_from_slice(&short);

        let sink = run(&buf);
        assert!(!sink.errors_of(crate::ErrorKind::Length).is_empty());
    }

    #[test]
    fn nonzero_gicd_vector_base_is_flagged() {
        let mut buf = madt_header(44 + GICD_LEN);
        let mut d = gicd();
        d[16..20].copy_from_slice(&0x1234u32.to_le_bytes());
        buf.extend_from_slice(&d);

        let sink = run(&buf);
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("System Vector Base")));
    }

    #[test]
    fn parse_is_deterministic() {
        let mut buf = madt_header(44 + GICC_LEN + GICD_LEN);
        buf.extend_from_slice(&gicc(3));
        buf.extend_from_slice(&gicd());

        let first = run(&buf).text();
        let second = run(&buf).text();
        assert_eq!(first, second);
    }

    #[test]
    fn untraced_parse_has_no_output() {
        let buf = madt_header(44);
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, false, &buf, 5);
        }
        assert!(sink.lines().is_empty());
        let _ = Severity::Info;
    }
}
