//! Root System Description Pointer (RSDP) parsing.
//!
//! The RSDP does not carry the standard description header; it has its
//! own 8-byte signature and two checksums. On 64-bit firmware the XSDT
//! address must be valid, so a zero value is reported.

use crate::bytes;
use crate::parser::{parse_fields, render_ascii, Captures, FieldDescriptor, FieldFormat, Validator,
    ValidatorContext};
use crate::trace::{ErrorKind, Trace};
use crate::acpi_error;

/// RSDP table signature.
pub const SIGNATURE: &[u8; 8] = b"RSD PTR ";

/// The XSDT address must be non-zero; ACPI 2.0+ firmware locates every
/// other table through it.
fn validate_xsdt_address(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if bytes::read_u64(field, 0) == Some(0) {
        acpi_error!(
            t,
            ErrorKind::Value,
            "XSDT Address must be a valid 64-bit pointer (found 0)"
        );
    }
}

/// Fields of the RSDP.
static RSDP_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::rendered("Signature", 8, 0, render_ascii),
    FieldDescriptor::new("Checksum", 1, 8, FieldFormat::Hex),
    FieldDescriptor::rendered("Oem ID", 6, 9, render_ascii),
    FieldDescriptor::new("Revision", 1, 15, FieldFormat::Dec),
    FieldDescriptor::new("RSDT Address", 4, 16, FieldFormat::Hex),
    FieldDescriptor::new("Length", 4, 20, FieldFormat::Dec),
    FieldDescriptor::new("XSDT Address", 8, 24, FieldFormat::Hex)
        .validate(validate_xsdt_address as Validator),
    FieldDescriptor::new("Extended Checksum", 1, 32, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 3, 33, FieldFormat::Hex),
];

/// Parse the RSDP and verify both of its checksums.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    // The first checksum covers the ACPI 1.0 portion (20 bytes), the
    // extended checksum the whole structure.
    if buf.len() >= 20 {
        let first: u8 = buf[..20].iter().fold(0, |sum, &b| sum.wrapping_add(b));
        if first != 0 {
            acpi_error!(t, ErrorKind::Checksum, "RSDP Checksum (0x{first:X} != 0)");
        }
    }
    let extended: u8 = buf.iter().fold(0, |sum, &b| sum.wrapping_add(b));
    if extended != 0 {
        acpi_error!(
            t,
            ErrorKind::Checksum,
            "RSDP Extended Checksum (0x{extended:X} != 0)"
        );
    }

    let mut captures = Captures::new();
    parse_fields(t, true, 0, Some("RSDP"), buf, RSDP_FIELDS, &mut captures);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Trace};
    use std::vec::Vec;

    fn rsdp(xsdt_address: u64) -> Vec<u8> {
        let mut buf = std::vec![0u8; 36];
        buf[..8].copy_from_slice(SIGNATURE);
        buf[9..15].copy_from_slice(b"ARMLTD");
        buf[15] = 2;
        buf[20..24].copy_from_slice(&36u32.to_le_bytes());
        buf[24..32].copy_from_slice(&xsdt_address.to_le_bytes());

        // Balance both checksums.
        let first: u8 = buf[..20].iter().fold(0, |s, &b| s.wrapping_add(b));
        buf[8] = first.wrapping_neg();
        let all: u8 = buf.iter().fold(0, |s, &b| s.wrapping_add(b));
        buf[32] = all.wrapping_neg();
        buf
    }

    fn run(buf: &[u8]) -> BufferSink {
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, buf, 2);
        }
        sink
    }

    #[test]
    fn valid_rsdp_has_no_errors() {
        let sink = run(&rsdp(0x8000_0000));
        assert!(sink.errors_of(crate::ErrorKind::Checksum).is_empty());
        assert!(sink.errors_of(crate::ErrorKind::Value).is_empty());
        assert!(sink.text().contains("RSD PTR"));
    }

    #[test]
    fn zero_xsdt_address_is_reported() {
        let sink = run(&rsdp(0));
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("XSDT Address")));
    }

    #[test]
    fn corrupt_checksum_is_reported() {
        let mut buf = rsdp(0x8000_0000);
        buf[16] ^= 0xFF;
        let sink = run(&buf);
        assert_eq!(sink.errors_of(crate::ErrorKind::Checksum).len(), 2);
    }
}
