//! Boot Graphics Resource Table (BGRT) parsing.

use crate::bytes;
use crate::parser::{parse_fields, Captures, FieldDescriptor, FieldFormat, Validator,
    ValidatorContext};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, with_acpi_header};

/// BGRT table signature.
pub const SIGNATURE: &[u8; 4] = b"BGRT";

/// The only defined BGRT version is 1.
fn validate_version(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    let version = bytes::read_u16(field, 0).unwrap_or(0);
    if version != 1 {
        acpi_error!(t, ErrorKind::Value, "BGRT Version must be 1 (found {version})");
    }
}

/// Status bits [7:3] are reserved.
fn validate_status(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    let status = field.first().copied().unwrap_or(0);
    if status & 0xF8 != 0 {
        acpi_error!(
            t,
            ErrorKind::Value,
            "BGRT Status bits [7:3] are reserved (found 0x{status:x})"
        );
    }
}

/// The only defined image type is 0 (bitmap).
fn validate_image_type(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    let image_type = field.first().copied().unwrap_or(0);
    if image_type != 0 {
        acpi_error!(
            t,
            ErrorKind::Value,
            "BGRT Image Type must be 0 (found {image_type})"
        );
    }
}

/// Fields of the BGRT, header included.
static BGRT_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("Version", 2, 36, FieldFormat::Dec)
        .validate(validate_version as Validator),
    FieldDescriptor::new("Status", 1, 38, FieldFormat::Hex).validate(validate_status as Validator),
    FieldDescriptor::new("Image Type", 1, 39, FieldFormat::Dec)
        .validate(validate_image_type as Validator),
    FieldDescriptor::new("Image Address", 8, 40, FieldFormat::Hex),
    FieldDescriptor::new("Image Offset X", 4, 48, FieldFormat::Dec),
    FieldDescriptor::new("Image Offset Y", 4, 52, FieldFormat::Dec),
];

/// Parse the BGRT.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    let mut captures = Captures::new();
    parse_fields(t, tracing, 0, Some("BGRT"), buf, BGRT_FIELDS, &mut captures);
}
