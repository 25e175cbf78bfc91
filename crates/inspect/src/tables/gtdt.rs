//! Generic Timer Description Table (GTDT) parsing.
//!
//! The GTDT carries the architected timer interrupt assignments followed
//! by an array of platform timer structures: GT Blocks (each with nested
//! GT Block Timer frames) and SBSA generic watchdogs.

use crate::arch::ArchMask;
use crate::bytes;
use crate::cross::{CrossEntry, CrossList};
use crate::parser::{member_overruns, parse_fields, render_hex_bytes, Captures, FieldDescriptor,
    FieldFormat, Slot, Validator, ValidatorContext};
use crate::structdb::{StructDatabase, StructInfo};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, with_acpi_header};
use alloc::vec;

/// GTDT table signature.
pub const SIGNATURE: &[u8; 4] = b"GTDT";

/// GT Block platform timer type tag.
pub const TYPE_GT_BLOCK: u32 = 0;
/// SBSA generic watchdog platform timer type tag.
pub const TYPE_WATCHDOG: u32 = 1;

/// "The number of GT Block Timers must be less than or equal to 8".
const GT_BLOCK_TIMER_COUNT_MAX: u32 = 8;

/// Size of one GT Block Timer frame structure.
const GT_BLOCK_TIMER_LEN: usize = 40;

/// Bound a count or frame-number field by the context limit.
fn validate_limited(t: &mut Trace, field: &[u8], ctx: ValidatorContext) {
    let ValidatorContext::Limit(limit) = ctx else {
        return;
    };
    if let Some(value) = bytes::read_uint(field, 0, field.len()) {
        if value > u64::from(limit) {
            acpi_error!(
                t,
                ErrorKind::Value,
                "Value {value} exceeds the specification limit {limit}"
            );
        }
    }
}

const TIMER_COUNT: Slot = Slot(9);
const TIMER_OFFSET: Slot = Slot(10);

/// Fields of the GTDT, header included.
static GTDT_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("CntControlBase Physical Address", 8, 36, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 44, FieldFormat::Hex),
    FieldDescriptor::new("Secure EL1 timer GSIV", 4, 48, FieldFormat::Hex),
    FieldDescriptor::new("Secure EL1 timer FLAGS", 4, 52, FieldFormat::Hex),
    FieldDescriptor::new("Non-Secure EL1 timer GSIV", 4, 56, FieldFormat::Hex),
    FieldDescriptor::new("Non-Secure EL1 timer FLAGS", 4, 60, FieldFormat::Hex),
    FieldDescriptor::new("Virtual timer GSIV", 4, 64, FieldFormat::Hex),
    FieldDescriptor::new("Virtual timer FLAGS", 4, 68, FieldFormat::Hex),
    FieldDescriptor::new("Non-Secure EL2 timer GSIV", 4, 72, FieldFormat::Hex),
    FieldDescriptor::new("Non-Secure EL2 timer FLAGS", 4, 76, FieldFormat::Hex),
    FieldDescriptor::new("CntReadBase Physical address", 8, 80, FieldFormat::Hex),
    FieldDescriptor::new("Platform Timer Count", 4, 88, FieldFormat::Dec)
        .capture(TIMER_COUNT),
    FieldDescriptor::new("Platform Timer Offset", 4, 92, FieldFormat::Hex)
        .capture(TIMER_OFFSET),
    FieldDescriptor::new("Virtual EL2 Timer GSIV", 4, 96, FieldFormat::Hex),
    FieldDescriptor::new("Virtual EL2 Timer Flags", 4, 100, FieldFormat::Hex),
];

const PLATFORM_TIMER_TYPE: Slot = Slot(0);
const PLATFORM_TIMER_LENGTH: Slot = Slot(1);

/// Fields of the platform timer structure header.
static PLATFORM_TIMER_HEADER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::unnamed(1, 0).capture(PLATFORM_TIMER_TYPE),
    FieldDescriptor::unnamed(2, 1).capture(PLATFORM_TIMER_LENGTH),
    FieldDescriptor::unnamed(1, 3),
];

const PLATFORM_TIMER_HEADER_LEN: usize = 4;

const BLOCK_TIMER_COUNT: Slot = Slot(0);
const BLOCK_TIMER_OFFSET: Slot = Slot(1);

/// Fields of the GT Block structure.
static GT_BLOCK_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Dec),
    FieldDescriptor::new("Length", 2, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 1, 3, FieldFormat::Hex),
    FieldDescriptor::new("Physical address (CntCtlBase)", 8, 4, FieldFormat::Hex),
    FieldDescriptor::new("Timer Count", 4, 12, FieldFormat::Dec)
        .capture(BLOCK_TIMER_COUNT)
        .validate_with(
            validate_limited as Validator,
            ValidatorContext::Limit(GT_BLOCK_TIMER_COUNT_MAX),
        ),
    FieldDescriptor::new("Timer Offset", 4, 16, FieldFormat::Dec).capture(BLOCK_TIMER_OFFSET),
];

/// Fields of one GT Block Timer frame.
static GT_BLOCK_TIMER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Frame Number", 1, 0, FieldFormat::Dec).validate_with(
        validate_limited as Validator,
        ValidatorContext::Limit(GT_BLOCK_TIMER_COUNT_MAX - 1),
    ),
    FieldDescriptor::rendered("Reserved", 3, 1, render_hex_bytes),
    FieldDescriptor::new("Physical address (CntBaseX)", 8, 4, FieldFormat::Hex),
    FieldDescriptor::new("Physical address (CntEL0BaseX)", 8, 12, FieldFormat::Hex),
    FieldDescriptor::new("Physical Timer GSIV", 4, 20, FieldFormat::Hex),
    FieldDescriptor::new("Physical Timer Flags", 4, 24, FieldFormat::Hex),
    FieldDescriptor::new("Virtual Timer GSIV", 4, 28, FieldFormat::Hex),
    FieldDescriptor::new("Virtual Timer Flags", 4, 32, FieldFormat::Hex),
    FieldDescriptor::new("Common Flags", 4, 36, FieldFormat::Hex),
];

/// Fields of the SBSA generic watchdog structure.
static WATCHDOG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Dec),
    FieldDescriptor::new("Length", 2, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 1, 3, FieldFormat::Hex),
    FieldDescriptor::new("RefreshFrame Physical address", 8, 4, FieldFormat::Hex),
    FieldDescriptor::new("ControlFrame Physical address", 8, 12, FieldFormat::Hex),
    FieldDescriptor::new("Watchdog Timer GSIV", 4, 20, FieldFormat::Hex),
    FieldDescriptor::new("Watchdog Timer Flags", 4, 24, FieldFormat::Hex),
];

fn frame_number_equal(a: &CrossEntry, b: &CrossEntry) -> bool {
    a.bytes == b.bytes
}

/// Check GT Frame Number uniqueness across a GT Block.
fn validate_frame_numbers_unique(
    t: &mut Trace,
    block: &[u8],
    timer_offset: u32,
    timer_count: u32,
) -> bool {
    let mut frames = CrossList::new();
    let mut offset = timer_offset as usize;
    let mut remaining = timer_count;

    while remaining > 0 && offset < block.len() {
        // The frame number is the first byte of each GT Block Timer.
        frames.add(&block[offset..offset + 1], TYPE_GT_BLOCK, offset as u32);
        offset += GT_BLOCK_TIMER_LEN;
        remaining -= 1;
    }

    frames.all_unique(t, frame_number_equal, "GT Block Timer", "GT Frame Number")
}

/// Parse a GT Block and its nested timer frames.
fn dump_gt_block(t: &mut Trace, block: &[u8]) {
    let mut captures = Captures::new();
    parse_fields(t, true, 2, None, block, GT_BLOCK_FIELDS, &mut captures);

    let (Some(timer_count), Some(timer_offset)) = (
        captures.u32_at(BLOCK_TIMER_COUNT),
        captures.u32_at(BLOCK_TIMER_OFFSET),
    ) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse GT Block Structure");
        return;
    };

    let mut offset = timer_offset as usize;
    let mut index = 0;

    // Parse the declared number of timer frames or up to the block
    // length, whichever limit is reached first.
    while index < timer_count && offset < block.len() {
        t.item_line(2, format_args!("GT Block Timer[{index}] (+0x{offset:x})"));
        let mut frame_captures = Captures::new();
        offset += parse_fields(
            t,
            true,
            4,
            None,
            &block[offset..],
            GT_BLOCK_TIMER_FIELDS,
            &mut frame_captures,
        ) as usize;
        index += 1;
    }

    if t.consistency() {
        validate_frame_numbers_unique(t, block, timer_offset, timer_count);
    }
}

const GIC: ArchMask = ArchMask::ARM.union(ArchMask::AARCH64);

/// The GTDT platform timer structure registry.
fn database() -> StructDatabase {
    StructDatabase::new(
        "Platform Timer Structure",
        vec![
            StructInfo::custom("GT Block", TYPE_GT_BLOCK, GIC, dump_gt_block),
            StructInfo::fields("SBSA Generic Watchdog", TYPE_WATCHDOG, GIC, WATCHDOG_FIELDS),
        ],
    )
}

/// Parse the GTDT: fixed timer fields then the platform timer array.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut db = database();
    db.reset_counts();

    let mut captures = Captures::new();
    parse_fields(t, true, 0, Some("GTDT"), buf, GTDT_FIELDS, &mut captures);

    let (Some(timer_count), Some(timer_offset)) = (
        captures.u32_at(TIMER_COUNT),
        captures.u32_at(TIMER_OFFSET),
    ) else {
        acpi_error!(t, ErrorKind::Parse, "Corrupt Platform Timer Table");
        return;
    };

    let mut offset = timer_offset as usize;

    for _ in 0..timer_count {
        if offset >= buf.len() {
            break;
        }

        let mut header = Captures::new();
        parse_fields(
            t,
            false,
            0,
            None,
            &buf[offset..],
            PLATFORM_TIMER_HEADER_FIELDS,
            &mut header,
        );

        let (Some(timer_type), Some(timer_length)) = (
            header.u8_at(PLATFORM_TIMER_TYPE),
            header.u16_at(PLATFORM_TIMER_LENGTH),
        ) else {
            acpi_error!(t, ErrorKind::Parse, "Corrupt Platform Timer Structure");
            return;
        };

        let length = timer_length as usize;
        if length < PLATFORM_TIMER_HEADER_LEN {
            acpi_error!(
                t,
                ErrorKind::Length,
                "Platform Timer Structure at offset 0x{offset:x} is shorter than its \
                 header ({length} < {PLATFORM_TIMER_HEADER_LEN})"
            );
            return;
        }
        if member_overruns(t, "Platform Timer Structure", offset, length, buf.len()) {
            return;
        }

        db.parse_struct(t, 2, &buf[offset..offset + length], offset as u32, u32::from(timer_type));
        offset += length;
    }

    if t.consistency() {
        db.validate_counts(t);
    }
}
