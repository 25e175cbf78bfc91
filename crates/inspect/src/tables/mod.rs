//! Per-table dispatchers.
//!
//! One module per supported ACPI table. Each exposes a
//! `parse(trace, tracing, buf, revision)`-shaped function operating on one
//! contiguous table image; [`parse_table`] is the signature-keyed front
//! door.

pub mod bgrt;
pub mod dbg2;
pub mod dsdt;
pub mod facs;
pub mod fadt;
pub mod gtdt;
pub mod iort;
pub mod madt;
pub mod mcfg;
pub mod pptt;
pub mod rsdp;
pub mod slit;
pub mod spcr;
pub mod srat;
pub mod ssdt;
pub mod xsdt;

use alloc::string::String;

use crate::parser::{parse_fields, Captures, ACPI_HEADER_FIELDS};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, acpi_good, acpi_info, acpi_warn};

/// Verify the ACPI byte-sum of a table, optionally logging the outcome.
///
/// Returns `true` when the sum of all bytes is zero modulo 256.
pub fn verify_checksum(t: &mut Trace, log: bool, buf: &[u8]) -> bool {
    let checksum = buf.iter().fold(0u8, |sum, &b| sum.wrapping_add(b));

    if log {
        if checksum == 0 {
            acpi_good!(t, "Table Checksum : OK");
        } else {
            acpi_error!(t, ErrorKind::Checksum, "Table Checksum (0x{checksum:X} != 0)");
        }
    }

    checksum == 0
}

/// Raw hex/ASCII dump of a table buffer.
pub fn dump_raw(t: &mut Trace, buf: &[u8]) {
    acpi_info!(t, "Address  : {:p}", buf.as_ptr());
    acpi_info!(t, "Length   : {}", buf.len());
    acpi_info!(t, "");

    let mut printed = 0usize;
    for chunk in buf.chunks(16) {
        let mut hex = String::new();
        let mut ascii = String::new();
        for (i, &b) in chunk.iter().enumerate() {
            if i == 8 {
                hex.push_str("- ");
            }
            let _ = core::fmt::write(&mut hex, format_args!("{b:02X} "));
            ascii.push(if (b' '..0x7F).contains(&b) { b as char } else { '.' });
        }
        printed += chunk.len();
        acpi_info!(t, "{printed:08X} : {hex:<49} {ascii}");
    }
}

/// Parse one ACPI table image, dispatching on its signature.
///
/// `revision` is the table revision reported by the platform (for tables
/// with a standard header this matches byte 8 of the image). Unknown
/// signatures trace the standard header only.
pub fn parse_table(t: &mut Trace, tracing: bool, buf: &[u8], revision: u8) {
    if buf.len() >= rsdp::SIGNATURE.len() && &buf[..rsdp::SIGNATURE.len()] == rsdp::SIGNATURE {
        rsdp::parse(t, tracing, buf, revision);
        return;
    }

    let Some(signature) = buf.get(..4) else {
        acpi_error!(t, ErrorKind::Length, "Table buffer too short for a signature");
        return;
    };

    match signature {
        sig if sig == madt::SIGNATURE => madt::parse(t, tracing, buf, revision),
        sig if sig == bgrt::SIGNATURE => bgrt::parse(t, tracing, buf, revision),
        sig if sig == dbg2::SIGNATURE => dbg2::parse(t, tracing, buf, revision),
        sig if sig == dsdt::SIGNATURE => dsdt::parse(t, tracing, buf, revision),
        sig if sig == facs::SIGNATURE => facs::parse(t, tracing, buf, revision),
        sig if sig == fadt::SIGNATURE => fadt::parse(t, tracing, buf, revision),
        sig if sig == gtdt::SIGNATURE => gtdt::parse(t, tracing, buf, revision),
        sig if sig == iort::SIGNATURE => iort::parse(t, tracing, buf, revision),
        sig if sig == mcfg::SIGNATURE => mcfg::parse(t, tracing, buf, revision),
        sig if sig == pptt::SIGNATURE => pptt::parse(t, tracing, buf, revision),
        sig if sig == slit::SIGNATURE => slit::parse(t, tracing, buf, revision),
        sig if sig == spcr::SIGNATURE => spcr::parse(t, tracing, buf, revision),
        sig if sig == srat::SIGNATURE => srat::parse(t, tracing, buf, revision),
        sig if sig == ssdt::SIGNATURE => ssdt::parse(t, tracing, buf, revision),
        sig if sig == xsdt::SIGNATURE => xsdt::parse(t, tracing, buf, revision),
        other => {
            if tracing {
                acpi_warn!(
                    t,
                    "No parser registered for signature {:?}",
                    core::str::from_utf8(other).unwrap_or("????")
                );
                let mut captures = Captures::new();
                parse_fields(t, true, 0, None, buf, ACPI_HEADER_FIELDS, &mut captures);
            }
        }
    }
}

/// Verify a table's checksum and parse it.
///
/// The checksum is only defined for tables carrying the standard ACPI
/// description header; the RSDP checks its own checksums and the FACS has
/// none.
pub fn process_table(t: &mut Trace, tracing: bool, buf: &[u8], revision: u8) {
    let has_standard_header = buf.len() >= 4
        && buf[..4] != *facs::SIGNATURE
        && !(buf.len() >= rsdp::SIGNATURE.len() && &buf[..rsdp::SIGNATURE.len()] == rsdp::SIGNATURE);

    if has_standard_header {
        verify_checksum(t, tracing, buf);
    }

    t.reset_counters();
    parse_table(t, tracing, buf, revision);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Severity};

    #[test]
    fn checksum_of_balanced_buffer_is_ok() {
        let buf = [1u8, 2, 3, 250]; // sums to 256 == 0 mod 256
        let mut sink = BufferSink::new();
        let ok = {
            let mut t = Trace::new(&mut sink, Config::default());
            verify_checksum(&mut t, true, &buf)
        };
        assert!(ok);
        assert!(sink
            .lines()
            .iter()
            .any(|(s, _, text)| *s == Severity::Good && text.contains("Checksum : OK")));
    }

    #[test]
    fn checksum_failure_reports_residue() {
        let buf = [1u8, 2, 3];
        let mut sink = BufferSink::new();
        let ok = {
            let mut t = Trace::new(&mut sink, Config::default());
            verify_checksum(&mut t, true, &buf)
        };
        assert!(!ok);
        let errors = sink.errors_of(crate::ErrorKind::Checksum);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("0x6"));
    }

    #[test]
    fn dump_raw_formats_hex_and_ascii() {
        let buf = b"ABCDEFGHIJKLMNOPQ"; // 17 bytes: one full line plus one
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            dump_raw(&mut t, buf);
        }
        let text = sink.text();
        assert!(text.contains("Length   : 17"));
        assert!(text.contains("41 42 43 44 45 46 47 48 - 49 4A 4B 4C 4D 4E 4F 50"));
        assert!(text.contains("ABCDEFGHIJKLMNOP"));
    }

    #[test]
    fn unknown_signature_traces_header_only() {
        let mut buf = [0u8; 36];
        buf[..4].copy_from_slice(b"ZZZZ");
        buf[4..8].copy_from_slice(&36u32.to_le_bytes());

        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse_table(&mut t, true, &buf, 0);
        }
        assert!(sink.text().contains("No parser registered"));
        assert!(sink.text().contains("Signature"));
    }
}
