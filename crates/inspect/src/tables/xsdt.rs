//! Extended System Description Table (XSDT) parsing.
//!
//! The XSDT body is an array of 64-bit physical addresses, one per
//! installed table. The inspector operates on a single table image, so
//! the entries are traced as values; chasing them is the platform's
//! table-installation concern.

use crate::bytes;
use crate::parser::{parse_fields, Captures, FieldDescriptor};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, with_acpi_header};

/// XSDT table signature.
pub const SIGNATURE: &[u8; 4] = b"XSDT";

/// Fields of the XSDT (standard header only).
static XSDT_FIELDS: &[FieldDescriptor] = with_acpi_header![];

/// Parse the XSDT and trace its table entry array.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    let mut captures = Captures::new();
    let mut offset =
        parse_fields(t, tracing, 0, Some("XSDT"), buf, XSDT_FIELDS, &mut captures) as usize;

    if !tracing {
        return;
    }

    let mut index = 0;
    while offset + 8 <= buf.len() {
        let address = bytes::read_u64(buf, offset).unwrap_or(0);
        if address != 0 {
            t.field_line(2, "Entry", format_args!("[{index}] 0x{address:x}"));
        } else {
            t.field_line(2, "Entry", format_args!("[{index}] NULL"));
            acpi_error!(t, ErrorKind::Value, "Invalid table entry");
        }
        offset += 8;
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Trace};
    use std::vec::Vec;

    fn xsdt(entries: &[u64]) -> Vec<u8> {
        let total = 36 + entries.len() * 8;
        let mut buf = std::vec![0u8; 36];
        buf[..4].copy_from_slice(SIGNATURE);
        buf[4..8].copy_from_slice(&(total as u32).to_le_bytes());
        buf[8] = 1;
        for &entry in entries {
            buf.extend_from_slice(&entry.to_le_bytes());
        }
        buf
    }

    fn run(buf: &[u8]) -> BufferSink {
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, buf, 1);
        }
        sink
    }

    #[test]
    fn entries_are_traced_with_addresses() {
        let sink = run(&xsdt(&[0x8000_0000, 0x8000_1000]));
        let text = sink.text();
        assert!(text.contains("[0] 0x80000000"));
        assert!(text.contains("[1] 0x80001000"));
        assert!(sink.errors_of(crate::ErrorKind::Value).is_empty());
    }

    #[test]
    fn null_entry_is_reported() {
        let sink = run(&xsdt(&[0x8000_0000, 0]));
        assert!(sink.text().contains("[1] NULL"));
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Invalid table entry")));
    }
}
