//! The generic, table-driven field parser.
//!
//! An ACPI structure is described by an array of [`FieldDescriptor`]s, one
//! per packed field, populated from the Field/Byte Length/Byte Offset
//! columns of the ACPI specification tables. [`parse_fields`] walks such an
//! array over a byte buffer, bounds-checking every field, optionally
//! tracing it, optionally invoking its validator, and optionally recording
//! a borrow of the field's bytes in a caller-provided [`Captures`] slot so
//! that dispatchers can read variable-length fields they discover.

use crate::bytes;
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_bad, acpi_error, acpi_warn};

/// Renders one field, including its name column. Used for fields whose
/// representation is more involved than a plain integer (ASCII names,
/// nested Generic Address Structures, reserved byte runs).
pub type Renderer = fn(t: &mut Trace, name: &str, indent: u32, field: &[u8]);

/// Validates one field's data, reporting through the trace. Runs only when
/// both tracing and consistency checks are enabled.
pub type Validator = fn(t: &mut Trace, field: &[u8], ctx: ValidatorContext);

/// Context handed to a field validator alongside the field bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidatorContext {
    /// No context.
    #[default]
    None,
    /// An inclusive numeric bound the validator checks against.
    Limit(u32),
    /// The revision of the enclosing table.
    Revision(u8),
}

/// How to format a plain integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// `0x` prefixed hexadecimal.
    Hex,
    /// Decimal.
    Dec,
}

/// Index of a capture slot within a [`Captures`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(pub usize);

/// Number of capture slots in a [`Captures`] set.
pub const SLOT_COUNT: usize = 12;

/// Capture slots holding borrows into the buffer most recently parsed.
///
/// A captured slice remains valid only while the parsed buffer does; the
/// set is private to one dispatcher invocation and is overwritten on every
/// sub-structure, which is what ties the borrow to the dispatcher's stack
/// frame.
pub struct Captures<'buf> {
    slots: [Option<&'buf [u8]>; SLOT_COUNT],
}

impl<'buf> Captures<'buf> {
    /// A set with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [None; SLOT_COUNT],
        }
    }

    /// The captured bytes for `slot`, if the field was in range.
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&'buf [u8]> {
        self.slots[slot.0]
    }

    pub(crate) fn set(&mut self, slot: Slot, data: &'buf [u8]) {
        self.slots[slot.0] = Some(data);
    }

    pub(crate) fn clear(&mut self, slot: Slot) {
        self.slots[slot.0] = None;
    }

    /// Captured field as a `u8`.
    #[must_use]
    pub fn u8_at(&self, slot: Slot) -> Option<u8> {
        bytes::read_u8(self.get(slot)?, 0)
    }

    /// Captured field as a little-endian `u16`.
    #[must_use]
    pub fn u16_at(&self, slot: Slot) -> Option<u16> {
        bytes::read_u16(self.get(slot)?, 0)
    }

    /// Captured field as a little-endian `u32`.
    #[must_use]
    pub fn u32_at(&self, slot: Slot) -> Option<u32> {
        bytes::read_u32(self.get(slot)?, 0)
    }

    /// Captured field as a little-endian `u64`.
    #[must_use]
    pub fn u64_at(&self, slot: Slot) -> Option<u64> {
        bytes::read_u64(self.get(slot)?, 0)
    }
}

impl Default for Captures<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Describes one packed field of an ACPI structure.
///
/// The name, length and offset come straight from the ACPI specification
/// table for the structure. The remaining members control how the parser
/// reports the field, validates its data, and whether it records a borrow
/// of the field bytes for the dispatcher.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    /// Display name, or `None` for fields only parsed for their captures.
    pub name: Option<&'static str>,
    /// Field length in bytes.
    pub length: u32,
    /// Declared offset from the start of the enclosing structure.
    pub offset: u32,
    /// Plain integer format, if the field is a 1/2/4/8 byte integer.
    pub format: Option<FieldFormat>,
    /// Custom renderer for more complex representations.
    pub render: Option<Renderer>,
    /// Capture slot updated with a borrow of the field bytes.
    pub capture: Option<Slot>,
    /// Field validator, run under trace + consistency mode.
    pub validate: Option<Validator>,
    /// Context forwarded to the validator.
    pub context: ValidatorContext,
}

impl FieldDescriptor {
    /// A plain integer field.
    #[must_use]
    pub const fn new(name: &'static str, length: u32, offset: u32, format: FieldFormat) -> Self {
        Self {
            name: Some(name),
            length,
            offset,
            format: Some(format),
            render: None,
            capture: None,
            validate: None,
            context: ValidatorContext::None,
        }
    }

    /// A field with a custom renderer.
    #[must_use]
    pub const fn rendered(name: &'static str, length: u32, offset: u32, render: Renderer) -> Self {
        Self {
            name: Some(name),
            length,
            offset,
            format: None,
            render: Some(render),
            capture: None,
            validate: None,
            context: ValidatorContext::None,
        }
    }

    /// A nameless field that exists only to be captured or skipped.
    #[must_use]
    pub const fn unnamed(length: u32, offset: u32) -> Self {
        Self {
            name: None,
            length,
            offset,
            format: None,
            render: None,
            capture: None,
            validate: None,
            context: ValidatorContext::None,
        }
    }

    /// Attach a capture slot.
    #[must_use]
    pub const fn capture(mut self, slot: Slot) -> Self {
        self.capture = Some(slot);
        self
    }

    /// Attach a validator.
    #[must_use]
    pub const fn validate(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }

    /// Attach a validator with context.
    #[must_use]
    pub const fn validate_with(mut self, validator: Validator, context: ValidatorContext) -> Self {
        self.validate = Some(validator);
        self.context = context;
        self
    }
}

fn dump_and_validate(
    t: &mut Trace,
    field: &FieldDescriptor,
    data: &[u8],
    descriptor_error_reported: &mut bool,
) {
    let name = field.name.unwrap_or("");

    if let Some(render) = field.render {
        render(t, name, 2, data);
    } else if let Some(format) = field.format {
        match bytes::read_uint(data, 0, data.len()) {
            Some(value) => match format {
                FieldFormat::Hex => t.field_line(2, name, format_args!("0x{value:x}")),
                FieldFormat::Dec => t.field_line(2, name, format_args!("{value}")),
            },
            // A formatted field must be 1, 2, 4 or 8 bytes wide. Anything
            // else is a defect of the descriptor table, not of the data.
            None => {
                if !*descriptor_error_reported {
                    acpi_bad!(t, "<Parse Error>");
                    *descriptor_error_reported = true;
                }
            }
        }
    }

    if t.consistency() {
        if let Some(validate) = field.validate {
            validate(t, data, field.context);
        }
    }
}

/// Parse `buf` according to `fields`, returning the bytes consumed.
///
/// Fields whose declared range extends past the buffer are skipped (their
/// capture slots are cleared) without aborting the walk. Under consistency
/// mode a disagreement between the accumulated offset and a descriptor's
/// declared offset is reported as a [`ErrorKind::Parse`] error; the
/// declared offset stays authoritative for the rest of the walk.
///
/// The return value is the sum of the declared lengths of the descriptors
/// that fully fit in `buf`.
pub fn parse_fields<'buf>(
    t: &mut Trace,
    trace: bool,
    indent: u32,
    name: Option<&str>,
    buf: &'buf [u8],
    fields: &[FieldDescriptor],
    captures: &mut Captures<'buf>,
) -> u32 {
    if buf.is_empty() {
        acpi_warn!(
            t,
            "Will not parse zero-length buffer <{}>",
            name.unwrap_or("Unknown Item")
        );
        return 0;
    }

    t.push_indent(indent);

    if trace {
        if let Some(name) = name {
            t.item_line(0, format_args!("{name}"));
        }
    }

    let mut offset: u32 = 0;
    let mut descriptor_error_reported = false;

    for field in fields {
        let start = field.offset as usize;
        let length = field.length as usize;

        // Fields outside the buffer are not parsed; reset any capture that
        // this call was supposed to update.
        if start.checked_add(length).map_or(true, |end| end > buf.len()) {
            if let Some(slot) = field.capture {
                captures.clear(slot);
            }
            continue;
        }

        if t.consistency() && offset != field.offset {
            acpi_error!(
                t,
                ErrorKind::Parse,
                "{}: Offset Mismatch for {} ({} != {})",
                name.unwrap_or("Unknown Item"),
                field.name.unwrap_or("<unnamed>"),
                offset,
                field.offset
            );
            offset = field.offset;
        }

        let data = &buf[start..start + length];

        if trace {
            dump_and_validate(t, field, data, &mut descriptor_error_reported);
        }

        if let Some(slot) = field.capture {
            captures.set(slot, data);
        }

        offset += field.length;
    }

    t.pop_indent(indent);
    offset
}

/// Report and detect a member that does not lie within its buffer.
///
/// Returns `true` (after logging a [`ErrorKind::Length`] error) when
/// `length` is zero or `offset + length` overruns `buf_len`.
pub fn member_overruns(
    t: &mut Trace,
    what: &str,
    offset: usize,
    length: usize,
    buf_len: usize,
) -> bool {
    if length == 0 {
        acpi_error!(
            t,
            ErrorKind::Length,
            "{what} at offset 0x{offset:x} has zero length"
        );
        return true;
    }
    if offset.checked_add(length).map_or(true, |end| end > buf_len) {
        acpi_error!(
            t,
            ErrorKind::Length,
            "{what} at offset 0x{offset:x} with length {length} overruns its buffer (length {buf_len})"
        );
        return true;
    }
    false
}

// --- Common renderers ------------------------------------------------------

/// Render a field as ASCII characters (table signatures, OEM identifiers).
pub fn render_ascii(t: &mut Trace, name: &str, indent: u32, field: &[u8]) {
    let mut text = alloc::string::String::with_capacity(field.len());
    for &b in field {
        text.push(if (b' '..0x7F).contains(&b) { b as char } else { '.' });
    }
    t.field_line(indent, name, format_args!("{text}"));
}

/// Render a field as space-separated hex bytes (reserved byte runs).
pub fn render_hex_bytes(t: &mut Trace, name: &str, indent: u32, field: &[u8]) {
    let mut text = alloc::string::String::new();
    for (i, &b) in field.iter().enumerate() {
        if i != 0 {
            text.push(' ');
        }
        let _ = core::fmt::write(&mut text, format_args!("{b:x}"));
    }
    t.field_line(indent, name, format_args!("{text}"));
}

// --- Generic Address Structure ---------------------------------------------

/// Size of a packed Generic Address Structure.
pub const GAS_LENGTH: usize = 12;

/// Descriptors for the ACPI Generic Address Structure.
pub static GAS_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Address Space ID", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Register Bit Width", 1, 1, FieldFormat::Hex),
    FieldDescriptor::new("Register Bit Offset", 1, 2, FieldFormat::Hex),
    FieldDescriptor::new("Address Size", 1, 3, FieldFormat::Hex),
    FieldDescriptor::new("Address", 8, 4, FieldFormat::Hex),
];

/// Trace a Generic Address Structure at the given indent.
///
/// Returns the number of bytes parsed.
pub fn dump_gas_struct(t: &mut Trace, indent: u32, buf: &[u8]) -> u32 {
    let mut captures = Captures::new();
    parse_fields(t, true, indent, None, buf, GAS_FIELDS, &mut captures)
}

/// Field renderer that traces a nested Generic Address Structure.
pub fn render_gas(t: &mut Trace, name: &str, indent: u32, field: &[u8]) {
    t.field_line(indent, name, format_args!(""));
    dump_gas_struct(t, indent + 2, field);
}

// --- Standard ACPI description header --------------------------------------

/// Length of the standard ACPI description header.
pub const ACPI_HEADER_LEN: usize = 36;

/// Capture slot for the header signature.
pub const HDR_SIGNATURE: Slot = Slot(0);
/// Capture slot for the header length.
pub const HDR_LENGTH: Slot = Slot(1);
/// Capture slot for the header revision.
pub const HDR_REVISION: Slot = Slot(2);
/// Capture slot for the header checksum.
pub const HDR_CHECKSUM: Slot = Slot(3);
/// Capture slot for the OEM ID.
pub const HDR_OEM_ID: Slot = Slot(4);
/// Capture slot for the OEM table ID.
pub const HDR_OEM_TABLE_ID: Slot = Slot(5);
/// Capture slot for the OEM revision.
pub const HDR_OEM_REVISION: Slot = Slot(6);
/// Capture slot for the creator ID.
pub const HDR_CREATOR_ID: Slot = Slot(7);
/// Capture slot for the creator revision.
pub const HDR_CREATOR_REVISION: Slot = Slot(8);

/// First capture slot free for per-table use once the standard header
/// slots are accounted for.
pub const FIRST_TABLE_SLOT: usize = 9;

/// Splice the standard ACPI header descriptors in front of a table's own
/// field descriptors, forming one contiguous descriptor array.
#[macro_export]
macro_rules! with_acpi_header {
    ($($body:expr),* $(,)?) => {
        &[
            $crate::parser::FieldDescriptor::rendered(
                "Signature", 4, 0, $crate::parser::render_ascii)
                .capture($crate::parser::HDR_SIGNATURE),
            $crate::parser::FieldDescriptor::new(
                "Length", 4, 4, $crate::parser::FieldFormat::Dec)
                .capture($crate::parser::HDR_LENGTH),
            $crate::parser::FieldDescriptor::new(
                "Revision", 1, 8, $crate::parser::FieldFormat::Dec)
                .capture($crate::parser::HDR_REVISION),
            $crate::parser::FieldDescriptor::new(
                "Checksum", 1, 9, $crate::parser::FieldFormat::Hex)
                .capture($crate::parser::HDR_CHECKSUM),
            $crate::parser::FieldDescriptor::rendered(
                "Oem ID", 6, 10, $crate::parser::render_ascii)
                .capture($crate::parser::HDR_OEM_ID),
            $crate::parser::FieldDescriptor::rendered(
                "Oem Table ID", 8, 16, $crate::parser::render_ascii)
                .capture($crate::parser::HDR_OEM_TABLE_ID),
            $crate::parser::FieldDescriptor::new(
                "Oem Revision", 4, 24, $crate::parser::FieldFormat::Hex)
                .capture($crate::parser::HDR_OEM_REVISION),
            $crate::parser::FieldDescriptor::rendered(
                "Creator ID", 4, 28, $crate::parser::render_ascii)
                .capture($crate::parser::HDR_CREATOR_ID),
            $crate::parser::FieldDescriptor::new(
                "Creator Revision", 4, 32, $crate::parser::FieldFormat::Hex)
                .capture($crate::parser::HDR_CREATOR_REVISION),
            $($body),*
        ]
    };
}

/// Descriptors for the standard header alone.
pub static ACPI_HEADER_FIELDS: &[FieldDescriptor] = with_acpi_header![];

/// Captured views of the standard ACPI description header fields.
///
/// Populated as a side effect of parsing any descriptor table spliced
/// together with [`with_acpi_header`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderInfo<'buf> {
    /// Table signature bytes.
    pub signature: Option<&'buf [u8]>,
    /// Declared table length.
    pub length: Option<u32>,
    /// Table revision.
    pub revision: Option<u8>,
    /// Header checksum byte.
    pub checksum: Option<u8>,
    /// OEM identifier bytes.
    pub oem_id: Option<&'buf [u8]>,
    /// OEM table identifier bytes.
    pub oem_table_id: Option<&'buf [u8]>,
    /// OEM revision.
    pub oem_revision: Option<u32>,
    /// Creator identifier bytes.
    pub creator_id: Option<&'buf [u8]>,
    /// Creator revision.
    pub creator_revision: Option<u32>,
}

impl<'buf> HeaderInfo<'buf> {
    /// Assemble the sidecar from a capture set.
    #[must_use]
    pub fn read(captures: &Captures<'buf>) -> Self {
        Self {
            signature: captures.get(HDR_SIGNATURE),
            length: captures.u32_at(HDR_LENGTH),
            revision: captures.u8_at(HDR_REVISION),
            checksum: captures.u8_at(HDR_CHECKSUM),
            oem_id: captures.get(HDR_OEM_ID),
            oem_table_id: captures.get(HDR_OEM_TABLE_ID),
            oem_revision: captures.u32_at(HDR_OEM_REVISION),
            creator_id: captures.get(HDR_CREATOR_ID),
            creator_revision: captures.u32_at(HDR_CREATOR_REVISION),
        }
    }
}

/// Parse a standard ACPI description header without tracing, returning the
/// captured header fields and the bytes consumed.
pub fn parse_header<'buf>(t: &mut Trace, buf: &'buf [u8]) -> (HeaderInfo<'buf>, u32) {
    let mut captures = Captures::new();
    let consumed = parse_fields(t, false, 0, None, buf, ACPI_HEADER_FIELDS, &mut captures);
    (HeaderInfo::read(&captures), consumed)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Severity, Trace};

    fn run_parse<'b>(
        buf: &'b [u8],
        fields: &[FieldDescriptor],
        captures: &mut Captures<'b>,
    ) -> (u32, BufferSink) {
        let mut sink = BufferSink::new();
        let consumed = {
            let mut t = Trace::new(&mut sink, Config::default());
            parse_fields(&mut t, true, 0, Some("Test"), buf, fields, captures)
        };
        (consumed, sink)
    }

    #[test]
    fn gas_parse_consumes_twelve_bytes() {
        // AddrSpace=0, Width=0x40, Offset=0, Size=4, Address=0xF00.
        let gas = [
            0x00, 0x40, 0x00, 0x04, 0x00, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut sink = BufferSink::new();
        let consumed = {
            let mut t = Trace::new(&mut sink, Config::default());
            dump_gas_struct(&mut t, 0, &gas)
        };
        assert_eq!(consumed, 12);

        // Five fields traced in descriptor order.
        let fields: std::vec::Vec<_> = sink
            .lines()
            .iter()
            .filter(|(s, _, _)| *s == Severity::Info)
            .collect();
        assert_eq!(fields.len(), 5);
        assert!(fields[0].2.contains("Address Space ID"));
        assert!(fields[4].2.contains("Address"));
    }

    #[test]
    fn truncated_field_is_skipped_and_capture_cleared() {
        const VALUE: Slot = Slot(0);
        static FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("A", 2, 0, FieldFormat::Hex),
            FieldDescriptor::new("B", 4, 2, FieldFormat::Hex).capture(VALUE),
        ];

        let mut captures = Captures::new();
        // Preload the slot to prove the parser clears it.
        captures.set(VALUE, &[0xFF]);

        let buf = [0x01, 0x02, 0x03]; // B does not fit.
        let (consumed, _) = run_parse(&buf, FIELDS, &mut captures);

        assert_eq!(consumed, 2);
        assert!(captures.get(VALUE).is_none());
    }

    #[test]
    fn offset_mismatch_reports_parse_error() {
        static FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("A", 2, 0, FieldFormat::Hex),
            // Declared offset 4 disagrees with the accumulated offset 2.
            FieldDescriptor::new("B", 2, 4, FieldFormat::Hex),
        ];

        let buf = [0u8; 8];
        let mut captures = Captures::new();
        let (_, sink) = run_parse(&buf, FIELDS, &mut captures);

        let errors = sink.errors_of(crate::ErrorKind::Parse);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Offset Mismatch for B"));
    }

    #[test]
    fn consumed_matches_sum_of_fitting_lengths() {
        static FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("A", 4, 0, FieldFormat::Hex),
            FieldDescriptor::new("B", 8, 4, FieldFormat::Hex),
            FieldDescriptor::new("C", 2, 12, FieldFormat::Hex),
        ];

        let buf = [0u8; 14];
        let mut captures = Captures::new();
        let (consumed, _) = run_parse(&buf, FIELDS, &mut captures);
        assert_eq!(consumed, 14);
    }

    #[test]
    fn header_captures_populate_sidecar() {
        let mut buf = [0u8; 36];
        buf[0..4].copy_from_slice(b"APIC");
        buf[4..8].copy_from_slice(&44u32.to_le_bytes());
        buf[8] = 5;
        buf[9] = 0xAB;
        buf[10..16].copy_from_slice(b"OEMIDX");

        let mut sink = BufferSink::new();
        let mut t = Trace::new(&mut sink, Config::default());
        let (header, consumed) = parse_header(&mut t, &buf);

        assert_eq!(consumed as usize, ACPI_HEADER_LEN);
        assert_eq!(header.signature, Some(&b"APIC"[..]));
        assert_eq!(header.length, Some(44));
        assert_eq!(header.revision, Some(5));
        assert_eq!(header.checksum, Some(0xAB));
        assert_eq!(header.oem_id, Some(&b"OEMIDX"[..]));
    }

    #[test]
    fn zero_length_buffer_warns() {
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            let mut captures = Captures::new();
            let consumed =
                parse_fields(&mut t, true, 0, Some("Empty"), &[], GAS_FIELDS, &mut captures);
            assert_eq!(consumed, 0);
            assert_eq!(t.warning_count(), 1);
        }
    }
}
