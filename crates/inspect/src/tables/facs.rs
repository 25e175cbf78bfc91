//! Firmware ACPI Control Structure (FACS) parsing.
//!
//! The FACS does not carry the standard description header and has no
//! checksum; it is located through the FADT rather than the XSDT.

use crate::parser::{parse_fields, render_ascii, render_hex_bytes, Captures, FieldDescriptor,
    FieldFormat};
use crate::trace::Trace;

/// FACS table signature.
pub const SIGNATURE: &[u8; 4] = b"FACS";

/// Fields of the FACS.
static FACS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::rendered("Signature", 4, 0, render_ascii),
    FieldDescriptor::new("Length", 4, 4, FieldFormat::Dec),
    FieldDescriptor::new("Hardware Signature", 4, 8, FieldFormat::Hex),
    FieldDescriptor::new("Firmware Waking Vector", 4, 12, FieldFormat::Hex),
    FieldDescriptor::new("Global Lock", 4, 16, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 20, FieldFormat::Hex),
    FieldDescriptor::new("X Firmware Waking Vector", 8, 24, FieldFormat::Hex),
    FieldDescriptor::new("Version", 1, 32, FieldFormat::Dec),
    FieldDescriptor::rendered("Reserved", 3, 33, render_hex_bytes),
    FieldDescriptor::new("OSPM Flags", 4, 36, FieldFormat::Hex),
    FieldDescriptor::rendered("Reserved", 24, 40, render_hex_bytes),
];

/// Parse the FACS.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    let mut captures = Captures::new();
    parse_fields(t, tracing, 0, Some("FACS"), buf, FACS_FIELDS, &mut captures);
}
