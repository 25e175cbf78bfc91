//! Processor Properties Topology Table (PPTT) parsing.
//!
//! The PPTT is parsed in two passes. The first pass walks the table
//! untraced and indexes every processor topology structure into a
//! cross-reference list. The second pass traces each structure and, under
//! consistency mode, resolves the `Parent` and `Next Level of Cache`
//! references against the index: references must land on an existing
//! structure of the same kind, must not target a leaf processor node, and
//! chains must terminate within one hop per indexed structure.

use crate::arch::ArchMask;
use crate::bytes;
use crate::cross::CrossList;
use crate::parser::{member_overruns, parse_fields, render_ascii, Captures, FieldDescriptor,
    FieldFormat, Slot, Validator, ValidatorContext};
use crate::structdb::{StructDatabase, StructInfo};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, acpi_warn, with_acpi_header};
use alloc::vec;

/// PPTT table signature.
pub const SIGNATURE: &[u8; 4] = b"PPTT";

/// Processor hierarchy node structure type tag.
pub const TYPE_PROCESSOR: u32 = 0;
/// Cache type structure type tag.
pub const TYPE_CACHE: u32 = 1;
/// ID structure type tag.
pub const TYPE_ID: u32 = 2;

/// Processor hierarchy node flag bit: the node is a leaf.
const FLAG_NODE_IS_A_LEAF: u32 = 1 << 3;

/// Offset of the reference field (`Parent` / `Next Level of Cache`) shared
/// by processor hierarchy nodes and cache structures.
const REFERENCE_OFFSET: usize = 8;

// Arm cache geometry bounds (CCSIDR_EL1).
const ARM_CACHE_LINE_SIZE_MIN: u16 = 16;
const ARM_CACHE_LINE_SIZE_MAX: u16 = 2048;
const ARM_CACHE_NUMBER_OF_SETS_MAX: u32 = 1 << 24;

fn arm_build(t: &Trace) -> bool {
    t.arch() == ArchMask::ARM.union(ArchMask::AARCH64)
}

/// 'Number of sets' must be non-zero and within the CCIDX bound on Arm.
fn validate_cache_number_of_sets(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    let Some(sets) = bytes::read_u32(field, 0) else {
        return;
    };
    if sets == 0 {
        acpi_error!(t, ErrorKind::Value, "Cache number of sets must not be zero");
        return;
    }
    if arm_build(t) && sets > ARM_CACHE_NUMBER_OF_SETS_MAX {
        acpi_error!(
            t,
            ErrorKind::Value,
            "Cache number of sets {sets} exceeds the ARMv8.3-CCIDX limit \
             {ARM_CACHE_NUMBER_OF_SETS_MAX}"
        );
    }
}

/// 'Associativity' must be non-zero.
fn validate_cache_associativity(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if field.first() == Some(&0) {
        acpi_error!(t, ErrorKind::Value, "Cache associativity must not be zero");
    }
}

/// Bits 5..7 of the cache attributes are reserved.
fn validate_cache_attributes(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if let Some(&attributes) = field.first() {
        if attributes & 0xE0 != 0 {
            acpi_error!(
                t,
                ErrorKind::Value,
                "Cache attributes bits [7:5] are reserved (found 0x{attributes:x})"
            );
        }
    }
}

/// On Arm the cache line size is a power of two between 16 and 2048.
fn validate_cache_line_size(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if !arm_build(t) {
        return;
    }
    let Some(line_size) = bytes::read_u16(field, 0) else {
        return;
    };
    if !(ARM_CACHE_LINE_SIZE_MIN..=ARM_CACHE_LINE_SIZE_MAX).contains(&line_size) {
        acpi_error!(
            t,
            ErrorKind::Value,
            "Cache line size {line_size} is outside \
             [{ARM_CACHE_LINE_SIZE_MIN}-{ARM_CACHE_LINE_SIZE_MAX}]"
        );
    }
    if line_size.count_ones() != 1 {
        acpi_error!(
            t,
            ErrorKind::Value,
            "Cache line size {line_size} is not a power of two"
        );
    }
}

const PRIVATE_RESOURCE_COUNT: Slot = Slot(0);

/// Fields of the processor hierarchy node structure (type 0).
static PROCESSOR_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Parent", 4, 8, FieldFormat::Hex),
    FieldDescriptor::new("ACPI Processor ID", 4, 12, FieldFormat::Hex),
    FieldDescriptor::new("Number of private resources", 4, 16, FieldFormat::Dec)
        .capture(PRIVATE_RESOURCE_COUNT),
];

/// Fields of the cache type structure (type 1).
static CACHE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Next Level of Cache", 4, 8, FieldFormat::Hex),
    FieldDescriptor::new("Size", 4, 12, FieldFormat::Hex),
    FieldDescriptor::new("Number of sets", 4, 16, FieldFormat::Dec)
        .validate(validate_cache_number_of_sets as Validator),
    FieldDescriptor::new("Associativity", 1, 20, FieldFormat::Dec)
        .validate(validate_cache_associativity as Validator),
    FieldDescriptor::new("Attributes", 1, 21, FieldFormat::Hex)
        .validate(validate_cache_attributes as Validator),
    FieldDescriptor::new("Line size", 2, 22, FieldFormat::Dec)
        .validate(validate_cache_line_size as Validator),
];

/// Fields of the ID structure (type 2).
static ID_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 1, 1, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 2, 2, FieldFormat::Hex),
    FieldDescriptor::rendered("VENDOR_ID", 4, 4, render_ascii),
    FieldDescriptor::new("LEVEL_1_ID", 8, 8, FieldFormat::Hex),
    FieldDescriptor::new("LEVEL_2_ID", 8, 16, FieldFormat::Hex),
    FieldDescriptor::new("MAJOR_REV", 2, 24, FieldFormat::Hex),
    FieldDescriptor::new("MINOR_REV", 2, 26, FieldFormat::Hex),
    FieldDescriptor::new("SPIN_REV", 2, 28, FieldFormat::Hex),
];

/// Fields of the PPTT itself (standard header only).
static PPTT_FIELDS: &[FieldDescriptor] = with_acpi_header![];

const STRUCT_TYPE: Slot = Slot(0);
const STRUCT_LENGTH: Slot = Slot(1);

/// Fields of the processor topology structure header.
static STRUCT_HEADER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::unnamed(1, 0).capture(STRUCT_TYPE),
    FieldDescriptor::unnamed(1, 1).capture(STRUCT_LENGTH),
    FieldDescriptor::unnamed(2, 2),
];

const STRUCT_HEADER_LEN: usize = 4;

/// Trace a processor hierarchy node, including its private resource
/// reference array.
fn dump_processor_node(t: &mut Trace, data: &[u8]) {
    let mut captures = Captures::new();
    let mut offset = parse_fields(t, true, 2, None, data, PROCESSOR_FIELDS, &mut captures) as usize;

    let Some(resource_count) = captures.u32_at(PRIVATE_RESOURCE_COUNT) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse processor hierarchy");
        return;
    };

    // Trace the declared number of private resource references or up to
    // the node length, whichever limit is reached first.
    for index in 0..resource_count {
        if member_overruns(t, "Private resource", offset, 4, data.len()) {
            return;
        }
        let resource = bytes::read_u32(data, offset).unwrap_or(0);
        t.field_line(4, "Private resources", format_args!("[{index}] 0x{resource:x}"));
        offset += 4;
    }
}

/// Validate a `Parent` / `Next Level of Cache` reference and follow the
/// chain it starts, bounding the walk by the number of indexed structures.
///
/// A reference of zero is a terminator and always valid.
pub(crate) fn validate_reference(t: &mut Trace, index: &CrossList, from_type: u32, reference: u32) {
    if reference == 0 {
        return;
    }

    let Some(target) = index.find(reference) else {
        acpi_error!(
            t,
            ErrorKind::Cross,
            "Referenced offset 0x{reference:x} does not contain a structure"
        );
        return;
    };

    if target.type_id != from_type {
        acpi_error!(
            t,
            ErrorKind::Cross,
            "type {} structure cannot reference type {} structure",
            from_type,
            target.type_id
        );
        return;
    }

    if target.type_id == TYPE_PROCESSOR {
        let flags = bytes::read_u32(&target.bytes, 4).unwrap_or(0);
        if flags & FLAG_NODE_IS_A_LEAF != 0 {
            acpi_error!(
                t,
                ErrorKind::Cross,
                "May not reference a leaf Processor Hierarchy Node"
            );
            return;
        }
    }

    // Follow the reference chain. Reaching a structure that references
    // nothing terminates the walk; making as many hops as there are
    // indexed structures means the chain loops.
    let mut current = target;
    for _ in 0..index.len() {
        let next = bytes::read_u32(&current.bytes, REFERENCE_OFFSET).unwrap_or(0);
        if next == 0 {
            return;
        }
        match index.find(next) {
            Some(entry) => current = entry,
            None => return,
        }
    }

    acpi_error!(t, ErrorKind::Cross, "Reference loop detected");
}

/// A private resource must reference an existing Cache or ID structure.
pub(crate) fn validate_private_resource(t: &mut Trace, index: &CrossList, resource: u32) {
    let Some(target) = index.find(resource) else {
        acpi_error!(
            t,
            ErrorKind::Cross,
            "PPTT structure (offset=0x{resource:x}) does not exist"
        );
        return;
    };

    if target.type_id != TYPE_CACHE && target.type_id != TYPE_ID {
        acpi_error!(
            t,
            ErrorKind::Cross,
            "Private resource (offset=0x{:x}) has bad type={} (expected {} or {})",
            resource,
            target.type_id,
            TYPE_CACHE,
            TYPE_ID
        );
    }
}

const ALL: ArchMask = ArchMask::all();

/// The PPTT processor topology structure registry.
fn database() -> StructDatabase {
    StructDatabase::new(
        "Processor Topology Structure",
        vec![
            StructInfo::custom("Processor", TYPE_PROCESSOR, ALL, dump_processor_node),
            StructInfo::fields("Cache", TYPE_CACHE, ALL, CACHE_FIELDS),
            StructInfo::fields("ID", TYPE_ID, ALL, ID_FIELDS),
        ],
    )
}

/// Run the consistency checks one structure's reference fields imply.
fn check_structure_references(t: &mut Trace, index: &CrossList, data: &[u8], struct_type: u32) {
    match struct_type {
        TYPE_PROCESSOR => {
            let parent = bytes::read_u32(data, REFERENCE_OFFSET).unwrap_or(0);
            validate_reference(t, index, TYPE_PROCESSOR, parent);

            let resource_count = bytes::read_u32(data, 16).unwrap_or(0);
            for i in 0..resource_count as usize {
                let offset = 20 + i * 4;
                let Some(resource) = bytes::read_u32(data, offset) else {
                    break;
                };
                validate_private_resource(t, index, resource);
            }
        }
        TYPE_CACHE => {
            let next_level = bytes::read_u32(data, REFERENCE_OFFSET).unwrap_or(0);
            validate_reference(t, index, TYPE_CACHE, next_level);
        }
        _ => {}
    }
}

/// Parse the PPTT: index every structure, then trace and validate.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut db = database();
    db.reset_counts();

    let mut index = CrossList::new();

    // First pass: fatal structural checks, and populate the reference
    // index for the validation pass.
    let mut captures = Captures::new();
    let mut offset = parse_fields(t, false, 0, None, buf, PPTT_FIELDS, &mut captures) as usize;

    while offset < buf.len() {
        let mut header = Captures::new();
        parse_fields(t, false, 0, None, &buf[offset..], STRUCT_HEADER_FIELDS, &mut header);

        let (Some(struct_type), Some(struct_length)) =
            (header.u8_at(STRUCT_TYPE), header.u8_at(STRUCT_LENGTH))
        else {
            acpi_error!(t, ErrorKind::Parse, "Failed to parse processor topology");
            return;
        };

        let length = struct_length as usize;
        if length < STRUCT_HEADER_LEN {
            acpi_error!(
                t,
                ErrorKind::Length,
                "Processor Topology Structure at offset 0x{offset:x} is shorter than its \
                 header ({length} < {STRUCT_HEADER_LEN})"
            );
            return;
        }
        if member_overruns(t, "Processor Topology Structure", offset, length, buf.len()) {
            return;
        }

        index.add(
            &buf[offset..offset + length],
            u32::from(struct_type),
            offset as u32,
        );
        offset += length;
    }

    // Second pass: trace every structure and validate its references.
    let mut captures = Captures::new();
    let mut offset = parse_fields(t, true, 0, Some("PPTT"), buf, PPTT_FIELDS, &mut captures) as usize;

    while offset < buf.len() {
        let mut header = Captures::new();
        parse_fields(t, false, 0, None, &buf[offset..], STRUCT_HEADER_FIELDS, &mut header);

        let (Some(struct_type), Some(struct_length)) =
            (header.u8_at(STRUCT_TYPE), header.u8_at(STRUCT_LENGTH))
        else {
            // The first pass accepted this offset; running out of data
            // here means the buffer changed under us.
            acpi_warn!(t, "Processor topology header unreadable on second pass");
            return;
        };

        let length = struct_length as usize;
        let data = &buf[offset..offset + length];

        db.parse_struct(t, 2, data, offset as u32, u32::from(struct_type));

        if t.consistency() {
            check_structure_references(t, &index, data, u32::from(struct_type));
        }

        offset += length;
    }

    if t.consistency() {
        db.validate_counts(t);
    }
}
