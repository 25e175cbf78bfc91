//! Memory Mapped Configuration Space (MCFG) table parsing.
//!
//! After the reserved header the MCFG is a flat array of 16-byte enhanced
//! configuration space base address allocation records.

use crate::parser::{member_overruns, parse_fields, Captures, FieldDescriptor, FieldFormat};
use crate::trace::Trace;
use crate::with_acpi_header;

/// MCFG table signature.
pub const SIGNATURE: &[u8; 4] = b"MCFG";

/// Size of one configuration space allocation record.
const ALLOCATION_LEN: usize = 16;

/// Fields of the MCFG, header included.
static MCFG_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("Reserved", 8, 36, FieldFormat::Hex),
];

/// Fields of one configuration space allocation record.
static ALLOCATION_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Base Address", 8, 0, FieldFormat::Hex),
    FieldDescriptor::new("PCI Segment Group Number", 2, 8, FieldFormat::Hex),
    FieldDescriptor::new("Start Bus Number", 1, 10, FieldFormat::Hex),
    FieldDescriptor::new("End Bus Number", 1, 11, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 12, FieldFormat::Hex),
];

/// Parse the MCFG and its configuration space allocation records.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut captures = Captures::new();
    let mut offset =
        parse_fields(t, true, 0, Some("MCFG"), buf, MCFG_FIELDS, &mut captures) as usize;

    let mut index = 0;
    while offset < buf.len() {
        if member_overruns(t, "PCI Configuration Space", offset, ALLOCATION_LEN, buf.len()) {
            return;
        }

        t.item_line(2, format_args!("PCI Configuration Space[{index}] (+0x{offset:x})"));
        let mut entry_captures = Captures::new();
        offset += parse_fields(
            t,
            true,
            4,
            None,
            &buf[offset..offset + ALLOCATION_LEN],
            ALLOCATION_FIELDS,
            &mut entry_captures,
        ) as usize;
        index += 1;
    }
}
