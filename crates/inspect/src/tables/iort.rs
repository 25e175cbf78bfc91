//! I/O Remapping Table (IORT) parsing.
//!
//! Layout per "IO Remapping Table, Platform Design Document, Revision D".
//! Every node kind carries the common node header; most kinds append an
//! array of ID mappings at the offset the header declares. SMMUv1/2 nodes
//! additionally carry context and PMU interrupt arrays.

use crate::arch::ArchMask;
use crate::bytes;
use crate::parser::{member_overruns, parse_fields, Captures, FieldDescriptor, FieldFormat, Slot,
    Validator, ValidatorContext};
use crate::structdb::{StructDatabase, StructInfo};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, with_acpi_header};
use alloc::vec;

/// IORT table signature.
pub const SIGNATURE: &[u8; 4] = b"IORT";

/// ITS group node type tag.
pub const TYPE_ITS_GROUP: u32 = 0;
/// Named component node type tag.
pub const TYPE_NAMED_COMPONENT: u32 = 1;
/// Root complex node type tag.
pub const TYPE_ROOT_COMPLEX: u32 = 2;
/// SMMUv1 or SMMUv2 node type tag.
pub const TYPE_SMMU_V1_V2: u32 = 3;
/// SMMUv3 node type tag.
pub const TYPE_SMMU_V3: u32 = 4;
/// PMCG node type tag.
pub const TYPE_PMCG: u32 = 5;

const NODE_TYPE: Slot = Slot(0);
const NODE_LENGTH: Slot = Slot(1);
const ID_MAPPING_COUNT: Slot = Slot(2);
const ID_MAPPING_OFFSET: Slot = Slot(3);
const CONTEXT_COUNT: Slot = Slot(4);
const CONTEXT_OFFSET: Slot = Slot(5);
const PMU_COUNT: Slot = Slot(6);
const PMU_OFFSET: Slot = Slot(7);
const ITS_COUNT: Slot = Slot(4);

const NODE_HEADER_LEN: usize = 16;
const ID_MAPPING_LEN: u32 = 20;

/// An ID-mapping count constrained by the node kind (zero for ITS nodes,
/// at most one for PMCG nodes).
fn validate_id_mapping_count(t: &mut Trace, field: &[u8], ctx: ValidatorContext) {
    let ValidatorContext::Limit(limit) = ctx else {
        return;
    };
    if let Some(count) = bytes::read_u32(field, 0) {
        if count > limit {
            acpi_error!(
                t,
                ErrorKind::Value,
                "Number of ID mappings must be at most {limit} for this node kind (found {count})"
            );
        }
    }
}

/// ITS nodes have no ID mapping array, so the array reference must be 0.
fn validate_its_id_array_reference(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if let Some(reference) = bytes::read_u32(field, 0) {
        if reference != 0 {
            acpi_error!(
                t,
                ErrorKind::Value,
                "Reference to ID Array must be zero for an ITS node (found 0x{reference:x})"
            );
        }
    }
}

/// Splice the common IORT node header in front of a node's own fields.
/// `$count_validator` applies to "Number of ID mappings".
macro_rules! iort_node_header {
    (@counted $count_validator:expr; $($body:expr),* $(,)?) => {
        &[
            FieldDescriptor::new("Type", 1, 0, FieldFormat::Dec).capture(NODE_TYPE),
            FieldDescriptor::new("Length", 2, 1, FieldFormat::Dec).capture(NODE_LENGTH),
            FieldDescriptor::new("Revision", 1, 3, FieldFormat::Dec),
            FieldDescriptor::new("Reserved", 4, 4, FieldFormat::Hex),
            $count_validator,
            FieldDescriptor::new("Reference to ID Array", 4, 12, FieldFormat::Hex)
                .capture(ID_MAPPING_OFFSET),
            $($body),*
        ]
    };
    ($($body:expr),* $(,)?) => {
        iort_node_header![@counted
            FieldDescriptor::new("Number of ID mappings", 4, 8, FieldFormat::Dec)
                .capture(ID_MAPPING_COUNT);
            $($body),*
        ]
    };
}

const NODE_COUNT: Slot = Slot(9);
const NODE_ARRAY_OFFSET: Slot = Slot(10);

/// Fields of the IORT table, header included.
static IORT_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("Number of IORT Nodes", 4, 36, FieldFormat::Dec)
        .capture(NODE_COUNT),
    FieldDescriptor::new("Offset to Array of IORT Nodes", 4, 40, FieldFormat::Hex)
        .capture(NODE_ARRAY_OFFSET),
    FieldDescriptor::new("Reserved", 4, 44, FieldFormat::Hex),
];

/// Fields of the common node header alone.
static NODE_HEADER_FIELDS: &[FieldDescriptor] = iort_node_header![];

/// Fields of the SMMUv1/2 node, interrupt array offsets captured.
static SMMU_V1_V2_FIELDS: &[FieldDescriptor] = iort_node_header![
    FieldDescriptor::new("Base Address", 8, 16, FieldFormat::Hex),
    FieldDescriptor::new("Span", 8, 24, FieldFormat::Hex),
    FieldDescriptor::new("Model", 4, 32, FieldFormat::Dec),
    FieldDescriptor::new("Flags", 4, 36, FieldFormat::Hex),
    FieldDescriptor::new("Reference to Global Interrupt Array", 4, 40, FieldFormat::Hex),
    FieldDescriptor::new("Number of context interrupts", 4, 44, FieldFormat::Dec)
        .capture(CONTEXT_COUNT),
    FieldDescriptor::new("Reference to Context Interrupt Array", 4, 48, FieldFormat::Hex)
        .capture(CONTEXT_OFFSET),
    FieldDescriptor::new("Number of PMU Interrupts", 4, 52, FieldFormat::Dec)
        .capture(PMU_COUNT),
    FieldDescriptor::new("Reference to PMU Interrupt Array", 4, 56, FieldFormat::Hex)
        .capture(PMU_OFFSET),
    // Global interrupt array.
    FieldDescriptor::new("SMMU_NSgIrpt", 4, 60, FieldFormat::Hex),
    FieldDescriptor::new("SMMU_NSgIrpt interrupt flags", 4, 64, FieldFormat::Hex),
    FieldDescriptor::new("SMMU_NSgCfgIrpt", 4, 68, FieldFormat::Hex),
    FieldDescriptor::new("SMMU_NSgCfgIrpt interrupt flags", 4, 72, FieldFormat::Hex),
];

/// Fields of one interrupt array element.
static INTERRUPT_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Interrupt GSIV", 4, 0, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 4, FieldFormat::Hex),
];

/// Fields of one ID mapping.
static ID_MAPPING_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Input base", 4, 0, FieldFormat::Hex),
    FieldDescriptor::new("Number of IDs", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Output base", 4, 8, FieldFormat::Hex),
    FieldDescriptor::new("Output reference", 4, 12, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 16, FieldFormat::Hex),
];

/// Fields of the SMMUv3 node.
static SMMU_V3_FIELDS: &[FieldDescriptor] = iort_node_header![
    FieldDescriptor::new("Base Address", 8, 16, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 24, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 28, FieldFormat::Hex),
    FieldDescriptor::new("VATOS Address", 8, 32, FieldFormat::Hex),
    FieldDescriptor::new("Model", 4, 40, FieldFormat::Dec),
    FieldDescriptor::new("Event", 4, 44, FieldFormat::Hex),
    FieldDescriptor::new("PRI", 4, 48, FieldFormat::Hex),
    FieldDescriptor::new("GERR", 4, 52, FieldFormat::Hex),
    FieldDescriptor::new("Sync", 4, 56, FieldFormat::Hex),
    FieldDescriptor::new("Proximity domain", 4, 60, FieldFormat::Hex),
    FieldDescriptor::new("Device ID mapping index", 4, 64, FieldFormat::Dec),
];

/// Fields of the ITS group node. The ITS count drives the identifier
/// array iteration; ITS nodes carry no ID mapping array, so the header's
/// mapping count and array reference must both be zero.
static ITS_GROUP_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Type", 1, 0, FieldFormat::Dec).capture(NODE_TYPE),
    FieldDescriptor::new("Length", 2, 1, FieldFormat::Dec).capture(NODE_LENGTH),
    FieldDescriptor::new("Revision", 1, 3, FieldFormat::Dec),
    FieldDescriptor::new("Reserved", 4, 4, FieldFormat::Hex),
    FieldDescriptor::new("Number of ID mappings", 4, 8, FieldFormat::Dec)
        .capture(ID_MAPPING_COUNT)
        .validate_with(validate_id_mapping_count as Validator, ValidatorContext::Limit(0)),
    FieldDescriptor::new("Reference to ID Array", 4, 12, FieldFormat::Hex)
        .capture(ID_MAPPING_OFFSET)
        .validate(validate_its_id_array_reference as Validator),
    FieldDescriptor::new("Number of ITSs", 4, 16, FieldFormat::Dec).capture(ITS_COUNT),
];

/// Fields of one GIC ITS identifier.
static ITS_ID_FIELDS: &[FieldDescriptor] =
    &[FieldDescriptor::new("GIC ITS Identifier", 4, 0, FieldFormat::Dec)];

/// Fields of the named component node.
static NAMED_COMPONENT_FIELDS: &[FieldDescriptor] = iort_node_header![
    FieldDescriptor::new("Node Flags", 4, 16, FieldFormat::Dec),
    FieldDescriptor::new("Memory access properties", 8, 20, FieldFormat::Hex),
    FieldDescriptor::new("Device memory address size limit", 1, 28, FieldFormat::Dec),
];

/// Fields of the root complex node.
static ROOT_COMPLEX_FIELDS: &[FieldDescriptor] = iort_node_header![
    FieldDescriptor::new("Memory access properties", 8, 16, FieldFormat::Hex),
    FieldDescriptor::new("ATS Attribute", 4, 24, FieldFormat::Hex),
    FieldDescriptor::new("PCI Segment number", 4, 28, FieldFormat::Hex),
    FieldDescriptor::new("Memory access size limit", 1, 32, FieldFormat::Hex),
    FieldDescriptor::rendered("Reserved", 3, 33, crate::parser::render_hex_bytes),
];

/// Fields of the PMCG node.
static PMCG_FIELDS: &[FieldDescriptor] = iort_node_header![@counted
    FieldDescriptor::new("Number of ID mappings", 4, 8, FieldFormat::Dec)
        .capture(ID_MAPPING_COUNT)
        .validate_with(validate_id_mapping_count as Validator, ValidatorContext::Limit(1));
    FieldDescriptor::new("Page 0 Base Address", 8, 16, FieldFormat::Hex),
    FieldDescriptor::new("Overflow interrupt GSIV", 4, 24, FieldFormat::Hex),
    FieldDescriptor::new("Node reference", 4, 28, FieldFormat::Hex),
    FieldDescriptor::new("Page 1 Base Address", 8, 32, FieldFormat::Hex),
];

/// Trace a node's ID mapping array.
fn dump_id_mappings(t: &mut Trace, node: &[u8], array_offset: u32, count: u32) {
    let mut offset = array_offset as usize;
    for index in 0..count {
        if member_overruns(t, "ID Mapping", offset, 1, node.len()) {
            return;
        }
        t.item_line(4, format_args!("ID Mapping[{index}] (+0x{offset:x})"));
        let mut captures = Captures::new();
        offset += parse_fields(
            t,
            true,
            4,
            None,
            &node[offset..],
            ID_MAPPING_FIELDS,
            &mut captures,
        ) as usize;
    }
}

/// Parse an ITS group node and its GIC ITS identifier array.
fn dump_its_group(t: &mut Trace, node: &[u8]) {
    let mut captures = Captures::new();
    let mut offset = parse_fields(t, true, 2, None, node, ITS_GROUP_FIELDS, &mut captures) as usize;

    let Some(its_count) = captures.u32_at(ITS_COUNT) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse ITS node");
        return;
    };

    for index in 0..its_count {
        if member_overruns(t, "GIC ITS Identifier", offset, 1, node.len()) {
            return;
        }
        t.item_line(4, format_args!("GIC ITS Identifier Array[{index}] (+0x{offset:x})"));
        let mut id_captures = Captures::new();
        offset += parse_fields(
            t,
            true,
            4,
            None,
            &node[offset..],
            ITS_ID_FIELDS,
            &mut id_captures,
        ) as usize;
    }

    // ITS nodes do not carry an ID mapping array.
}

/// Parse a named component node: fields, inline object name, ID mappings.
fn dump_named_component(t: &mut Trace, node: &[u8]) {
    let mut captures = Captures::new();
    let offset =
        parse_fields(t, true, 2, None, node, NAMED_COMPONENT_FIELDS, &mut captures) as usize;

    // The device object name is a NUL-terminated ASCII string that follows
    // the fixed fields.
    let name_bytes = &node[offset.min(node.len())..];
    let name_len = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
    let name = core::str::from_utf8(&name_bytes[..name_len]).unwrap_or("<invalid>");
    t.field_line(2, "Device Object Name", format_args!("{name}"));

    dump_node_id_mappings(t, node, &captures);
}

/// Parse a root complex node and its ID mappings.
fn dump_root_complex(t: &mut Trace, node: &[u8]) {
    let mut captures = Captures::new();
    parse_fields(t, true, 2, None, node, ROOT_COMPLEX_FIELDS, &mut captures);
    dump_node_id_mappings(t, node, &captures);
}

/// Parse an SMMUv1/2 node: fields, interrupt arrays, ID mappings.
fn dump_smmu_v1_v2(t: &mut Trace, node: &[u8]) {
    let mut captures = Captures::new();
    parse_fields(t, true, 2, None, node, SMMU_V1_V2_FIELDS, &mut captures);

    let (Some(context_count), Some(context_offset), Some(pmu_count), Some(pmu_offset)) = (
        captures.u32_at(CONTEXT_COUNT),
        captures.u32_at(CONTEXT_OFFSET),
        captures.u32_at(PMU_COUNT),
        captures.u32_at(PMU_OFFSET),
    ) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse the SMMUv1/2 node");
        return;
    };

    let mut offset = context_offset as usize;
    for index in 0..context_count {
        if member_overruns(t, "Context Interrupt", offset, 1, node.len()) {
            break;
        }
        t.item_line(4, format_args!("Context Interrupts Array[{index}] (+0x{offset:x})"));
        let mut entry_captures = Captures::new();
        offset += parse_fields(
            t,
            true,
            4,
            None,
            &node[offset..],
            INTERRUPT_FIELDS,
            &mut entry_captures,
        ) as usize;
    }

    let mut offset = pmu_offset as usize;
    for index in 0..pmu_count {
        if member_overruns(t, "PMU Interrupt", offset, 1, node.len()) {
            break;
        }
        t.item_line(4, format_args!("PMU Interrupts Array[{index}] (+0x{offset:x})"));
        let mut entry_captures = Captures::new();
        offset += parse_fields(
            t,
            true,
            4,
            None,
            &node[offset..],
            INTERRUPT_FIELDS,
            &mut entry_captures,
        ) as usize;
    }

    dump_node_id_mappings(t, node, &captures);
}

/// Parse an SMMUv3 node and its ID mappings.
fn dump_smmu_v3(t: &mut Trace, node: &[u8]) {
    let mut captures = Captures::new();
    parse_fields(t, true, 2, None, node, SMMU_V3_FIELDS, &mut captures);
    dump_node_id_mappings(t, node, &captures);
}

/// Parse a PMCG node and its ID mappings.
fn dump_pmcg(t: &mut Trace, node: &[u8]) {
    let mut captures = Captures::new();
    parse_fields(t, true, 2, None, node, PMCG_FIELDS, &mut captures);
    dump_node_id_mappings(t, node, &captures);
}

/// Dump the ID mapping array a node header declares, if any.
fn dump_node_id_mappings(t: &mut Trace, node: &[u8], captures: &Captures) {
    let (Some(count), Some(offset)) = (
        captures.u32_at(ID_MAPPING_COUNT),
        captures.u32_at(ID_MAPPING_OFFSET),
    ) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse the IORT node header");
        return;
    };

    if count > 0 {
        dump_id_mappings(t, node, offset, count);
    }
}

const GIC: ArchMask = ArchMask::ARM.union(ArchMask::AARCH64);

/// The IORT node registry.
fn database() -> StructDatabase {
    StructDatabase::new(
        "IORT Node",
        vec![
            StructInfo::custom("ITS Group", TYPE_ITS_GROUP, GIC, dump_its_group),
            StructInfo::custom("Named Component", TYPE_NAMED_COMPONENT, GIC, dump_named_component),
            StructInfo::custom("Root Complex", TYPE_ROOT_COMPLEX, GIC, dump_root_complex),
            StructInfo::custom("SMMUv1 or SMMUv2", TYPE_SMMU_V1_V2, GIC, dump_smmu_v1_v2),
            StructInfo::custom("SMMUv3", TYPE_SMMU_V3, GIC, dump_smmu_v3),
            StructInfo::custom("PMCG", TYPE_PMCG, GIC, dump_pmcg),
        ],
    )
}

/// Parse the IORT: table header then the declared number of nodes.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut db = database();
    db.reset_counts();

    let mut captures = Captures::new();
    parse_fields(t, true, 0, Some("IORT"), buf, IORT_FIELDS, &mut captures);

    let (Some(node_count), Some(node_offset)) = (
        captures.u32_at(NODE_COUNT),
        captures.u32_at(NODE_ARRAY_OFFSET),
    ) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse the IORT table header");
        return;
    };

    let mut offset = node_offset as usize;

    // Parse the declared number of nodes or up to the table length,
    // whichever limit is reached first.
    for _ in 0..node_count {
        if offset >= buf.len() {
            break;
        }

        let mut header = Captures::new();
        parse_fields(t, false, 0, None, &buf[offset..], NODE_HEADER_FIELDS, &mut header);

        let (Some(node_type), Some(node_length)) =
            (header.u8_at(NODE_TYPE), header.u16_at(NODE_LENGTH))
        else {
            acpi_error!(t, ErrorKind::Parse, "Failed to parse the IORT node header");
            return;
        };

        let length = node_length as usize;
        if length < NODE_HEADER_LEN {
            acpi_error!(
                t,
                ErrorKind::Length,
                "IORT node at offset 0x{offset:x} is shorter than its header \
                 ({length} < {NODE_HEADER_LEN})"
            );
            return;
        }
        if member_overruns(t, "IORT Node", offset, length, buf.len()) {
            return;
        }

        db.parse_struct(t, 2, &buf[offset..offset + length], offset as u32, u32::from(node_type));
        offset += length;
    }

    if t.consistency() {
        db.validate_counts(t);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Trace};
    use std::vec::Vec;

    const TABLE_HEADER_LEN: usize = 48;

    fn iort_header(total_len: usize, node_count: u32) -> Vec<u8> {
        let mut buf = std::vec![0u8; TABLE_HEADER_LEN];
        buf[..4].copy_from_slice(SIGNATURE);
        buf[4..8].copy_from_slice(&(total_len as u32).to_le_bytes());
        buf[36..40].copy_from_slice(&node_count.to_le_bytes());
        buf[40..44].copy_from_slice(&(TABLE_HEADER_LEN as u32).to_le_bytes());
        buf
    }

    fn node_header(node_type: u8, length: u16, mappings: u32, mapping_offset: u32) -> Vec<u8> {
        let mut node = std::vec![0u8; NODE_HEADER_LEN];
        node[0] = node_type;
        node[1..3].copy_from_slice(&length.to_le_bytes());
        node[8..12].copy_from_slice(&mappings.to_le_bytes());
        node[12..16].copy_from_slice(&mapping_offset.to_le_bytes());
        node
    }

    fn run(buf: &[u8]) -> BufferSink {
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, buf, 0);
        }
        sink
    }

    #[test]
    fn its_group_with_two_identifiers() {
        // ITS group: 16-byte header + 4-byte count + 2 identifiers.
        let node_len = 28u16;
        let mut buf = iort_header(TABLE_HEADER_LEN + node_len as usize, 1);
        let mut node = node_header(TYPE_ITS_GROUP as u8, node_len, 0, 0);
        node.extend_from_slice(&2u32.to_le_bytes()); // Number of ITSs
        node.extend_from_slice(&1u32.to_le_bytes());
        node.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&node);

        let sink = run(&buf);
        let text = sink.text();
        assert!(text.contains("ITS Group[0] (+0x30)"));
        assert!(text.contains("GIC ITS Identifier Array[0] (+0x14)"));
        assert!(text.contains("GIC ITS Identifier Array[1] (+0x18)"));
        assert!(sink.errors_of(crate::ErrorKind::Value).is_empty());
    }

    #[test]
    fn its_group_with_mappings_is_flagged() {
        let node_len = 24u16;
        let mut buf = iort_header(TABLE_HEADER_LEN + node_len as usize, 1);
        let mut node = node_header(TYPE_ITS_GROUP as u8, node_len, 1, 0);
        node.extend_from_slice(&0u32.to_le_bytes());
        node.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&node);

        let sink = run(&buf);
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Number of ID mappings must be at most 0")));
    }

    #[test]
    fn root_complex_dumps_id_mappings() {
        // Root complex: 36 fixed bytes + one 20-byte mapping at offset 36.
        let node_len = 56u16;
        let mut buf = iort_header(TABLE_HEADER_LEN + node_len as usize, 1);
        let mut node = node_header(TYPE_ROOT_COMPLEX as u8, node_len, 1, 36);
        node.resize(36, 0);
        node.extend_from_slice(&0u32.to_le_bytes()); // Input base
        node.extend_from_slice(&0x100u32.to_le_bytes()); // Number of IDs
        node.extend_from_slice(&0u32.to_le_bytes()); // Output base
        node.extend_from_slice(&0x30u32.to_le_bytes()); // Output reference
        node.extend_from_slice(&0u32.to_le_bytes()); // Flags
        buf.extend_from_slice(&node);

        let sink = run(&buf);
        let text = sink.text();
        assert!(text.contains("Root Complex[0] (+0x30)"));
        assert!(text.contains("ID Mapping[0] (+0x24)"));
        assert!(text.contains("Output reference"));
    }

    #[test]
    fn unknown_node_type_reports_value_error() {
        let node_len = 16u16;
        let mut buf = iort_header(TABLE_HEADER_LEN + node_len as usize, 1);
        buf.extend_from_slice(&node_header(9, node_len, 0, 0));

        let sink = run(&buf);
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Unknown IORT Node. Type = 9")));
    }

    #[test]
    fn named_component_prints_object_name() {
        // Named component: 29 fixed bytes + "\\_SB.PCI0" + pad.
        let name = b"\\_SB.PCI0\0";
        let fixed = 29usize;
        let node_len = (fixed + name.len() + 1) as u16; // padded
        let mut buf = iort_header(TABLE_HEADER_LEN + node_len as usize, 1);
        let mut node = node_header(TYPE_NAMED_COMPONENT as u8, node_len, 0, 0);
        node.resize(fixed, 0);
        node.extend_from_slice(name);
        node.resize(node_len as usize, 0);
        buf.extend_from_slice(&node);

        let sink = run(&buf);
        assert!(sink.text().contains("\\_SB.PCI0"));
    }
}
