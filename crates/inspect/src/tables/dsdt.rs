//! Differentiated System Description Table (DSDT) parsing.
//!
//! The DSDT body is AML bytecode, which the inspector does not execute or
//! decode; only the standard header is traced.

use crate::parser::{parse_fields, Captures, FieldDescriptor, ACPI_HEADER_LEN};
use crate::trace::Trace;
use crate::{acpi_info, with_acpi_header};

/// DSDT table signature.
pub const SIGNATURE: &[u8; 4] = b"DSDT";

static DSDT_FIELDS: &[FieldDescriptor] = with_acpi_header![];

/// Parse the DSDT header.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }
    let mut captures = Captures::new();
    parse_fields(t, true, 0, Some("DSDT"), buf, DSDT_FIELDS, &mut captures);

    if buf.len() > ACPI_HEADER_LEN {
        acpi_info!(t, "AML byte code : {} bytes (not decoded)", buf.len() - ACPI_HEADER_LEN);
    }
}
