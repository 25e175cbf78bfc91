//! Secondary System Description Table (SSDT) parsing.
//!
//! Like the DSDT, the SSDT body is AML; only the header is traced.

use crate::parser::{parse_fields, Captures, FieldDescriptor, ACPI_HEADER_LEN};
use crate::trace::Trace;
use crate::{acpi_info, with_acpi_header};

/// SSDT table signature.
pub const SIGNATURE: &[u8; 4] = b"SSDT";

static SSDT_FIELDS: &[FieldDescriptor] = with_acpi_header![];

/// Parse the SSDT header.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }
    let mut captures = Captures::new();
    parse_fields(t, true, 0, Some("SSDT"), buf, SSDT_FIELDS, &mut captures);

    if buf.len() > ACPI_HEADER_LEN {
        acpi_info!(t, "AML byte code : {} bytes (not decoded)", buf.len() - ACPI_HEADER_LEN);
    }
}
