//! IORT (I/O Remapping Table) generator, Arm profile.
//!
//! Layout per "IO Remapping Table, Platform Design Document, Revision D".
//!
//! Generation is two-pass. The sizing pass walks each node kind in region
//! order (ITS group, named component, root complex, SMMUv1/2, SMMUv3,
//! PMCG), computes every node's packed size and records the node's token
//! and final offset in the [`NodeIndex`]. The emission pass writes node
//! headers and bodies at the precomputed offsets and resolves every ID
//! mapping output reference and PMCG node reference through the index;
//! offsets are never recomputed.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::GenError;
use crate::index::NodeIndex;
use crate::objects::{IdMapping, ItsGroup, ItsIdentifier, NamedComponent, Pmcg, RootComplex,
    SmmuInterrupt, SmmuV1V2, SmmuV3};
use crate::repo::{PlatformObject, Repository, Token};
use crate::table::{self, align4, put_u16, put_u32, put_u64, put_u8, RevisionRange, TableInfo};

/// IORT table signature.
pub const SIGNATURE: &[u8; 4] = b"IORT";

/// Supported IORT revision (IO Remapping Table, revision D).
pub const REVISIONS: RevisionRange = RevisionRange { min: 0, max: 0 };

const TABLE_HEADER_LEN: usize = 48;
const NODE_HEADER_LEN: usize = 16;
const ID_MAPPING_LEN: usize = 20;
const SMMU_INTERRUPT_LEN: usize = 8;

const ITS_GROUP_FIXED_LEN: usize = NODE_HEADER_LEN + 4;
const NAMED_COMPONENT_FIXED_LEN: usize = NODE_HEADER_LEN + 13;
const ROOT_COMPLEX_FIXED_LEN: usize = NODE_HEADER_LEN + 20;
const SMMU_V1_V2_FIXED_LEN: usize = NODE_HEADER_LEN + 60;
const SMMU_V3_FIXED_LEN: usize = NODE_HEADER_LEN + 52;
const PMCG_FIXED_LEN: usize = NODE_HEADER_LEN + 24;

const TYPE_ITS_GROUP: u8 = 0;
const TYPE_NAMED_COMPONENT: u8 = 1;
const TYPE_ROOT_COMPLEX: u8 = 2;
const TYPE_SMMU_V1_V2: u8 = 3;
const TYPE_SMMU_V3: u8 = 4;
const TYPE_PMCG: u8 = 5;

/// SMMUv3 flag: the proximity domain field is valid.
const SMMU_V3_FLAG_PROXIMITY_DOMAIN: u32 = 1 << 3;

fn its_group_size(node: &ItsGroup) -> usize {
    ITS_GROUP_FIXED_LEN + 4 * node.its_id_count as usize
}

fn named_component_size(node: &NamedComponent) -> usize {
    NAMED_COMPONENT_FIXED_LEN
        + align4(node.object_name.len() + 1)
        + ID_MAPPING_LEN * node.id_mapping_count as usize
}

fn root_complex_size(node: &RootComplex) -> usize {
    ROOT_COMPLEX_FIXED_LEN + ID_MAPPING_LEN * node.id_mapping_count as usize
}

fn smmu_v1_v2_size(node: &SmmuV1V2) -> usize {
    SMMU_V1_V2_FIXED_LEN
        + SMMU_INTERRUPT_LEN
            * (node.context_interrupt_count + node.pmu_interrupt_count) as usize
        + ID_MAPPING_LEN * node.id_mapping_count as usize
}

fn smmu_v3_size(node: &SmmuV3) -> usize {
    SMMU_V3_FIXED_LEN + ID_MAPPING_LEN * node.id_mapping_count as usize
}

fn pmcg_size(node: &Pmcg) -> usize {
    PMCG_FIXED_LEN + ID_MAPPING_LEN * node.id_mapping_count as usize
}

/// Index one kind's nodes and return the total size of its region.
///
/// Each node's token and cumulative offset is appended to the index; the
/// size function must match the emission pass byte-for-byte.
fn index_nodes<T: PlatformObject>(
    kind: &'static str,
    nodes: &[T],
    region_offset: usize,
    node_size: fn(&T) -> usize,
    index: &mut NodeIndex,
) -> Result<usize, GenError> {
    let mut region_size = 0usize;
    for node in nodes {
        let size = node_size(node);
        if size > u16::MAX as usize {
            log::error!("IORT: {kind} node size {size:#x} exceeds the 16-bit length field");
            return Err(GenError::NodeTooLarge {
                kind,
                size: size as u64,
            });
        }
        index.insert(node.token(), (region_offset + region_size) as u32);
        region_size += size;
    }
    Ok(region_size)
}

/// Write the common node header.
fn write_node_header(
    table: &mut [u8],
    offset: usize,
    node_type: u8,
    length: usize,
    revision: u8,
    id_mapping_count: u32,
    id_mapping_offset: usize,
) {
    put_u8(table, offset, node_type);
    put_u16(table, offset + 1, length as u16);
    put_u8(table, offset + 3, revision);
    put_u32(table, offset + 8, id_mapping_count);
    put_u32(table, offset + 12, id_mapping_offset as u32);
}

/// Resolve and write a node's ID mapping array.
fn write_id_mappings(
    repo: &impl Repository,
    index: &NodeIndex,
    table: &mut [u8],
    offset: usize,
    count: u32,
    token: Token,
) -> Result<(), GenError> {
    if count == 0 || token.is_null() {
        return Ok(());
    }

    let mappings: Vec<IdMapping> = repo.get(token)?;
    if mappings.len() < count as usize {
        log::error!("IORT: failed to get the required number of ID mappings");
        return Err(GenError::ShortObjectList(IdMapping::ID));
    }

    for (i, mapping) in mappings.iter().take(count as usize).enumerate() {
        let entry = offset + i * ID_MAPPING_LEN;
        let output_reference = index.resolve(mapping.output_reference_token)?;
        put_u32(table, entry, mapping.input_base);
        put_u32(table, entry + 4, mapping.num_ids);
        put_u32(table, entry + 8, mapping.output_base);
        put_u32(table, entry + 12, output_reference);
        put_u32(table, entry + 16, mapping.flags);
    }

    Ok(())
}

/// Resolve and write an SMMUv1/2 interrupt array.
fn write_interrupt_array(
    repo: &impl Repository,
    table: &mut [u8],
    offset: usize,
    count: u32,
    token: Token,
) -> Result<(), GenError> {
    if count == 0 || token.is_null() {
        return Ok(());
    }

    let interrupts: Vec<SmmuInterrupt> = repo.get(token)?;
    if interrupts.len() < count as usize {
        log::error!("IORT: failed to get the required number of SMMU interrupts");
        return Err(GenError::ShortObjectList(SmmuInterrupt::ID));
    }

    for (i, interrupt) in interrupts.iter().take(count as usize).enumerate() {
        let entry = offset + i * SMMU_INTERRUPT_LEN;
        put_u32(table, entry, interrupt.interrupt);
        put_u32(table, entry + 4, interrupt.flags);
    }

    Ok(())
}

fn write_its_groups(
    repo: &impl Repository,
    table: &mut [u8],
    region_offset: usize,
    nodes: &[ItsGroup],
) -> Result<(), GenError> {
    let mut offset = region_offset;
    for node in nodes {
        let size = its_group_size(node);
        // ITS nodes carry no ID mapping array.
        write_node_header(table, offset, TYPE_ITS_GROUP, size, 0, 0, 0);
        put_u32(table, offset + 16, node.its_id_count);

        let identifiers: Vec<ItsIdentifier> = repo.get(node.its_id_token)?;
        if identifiers.len() < node.its_id_count as usize {
            log::error!("IORT: failed to get the required number of ITS identifiers");
            return Err(GenError::ShortObjectList(ItsIdentifier::ID));
        }
        for (i, identifier) in identifiers
            .iter()
            .take(node.its_id_count as usize)
            .enumerate()
        {
            put_u32(table, offset + ITS_GROUP_FIXED_LEN + i * 4, identifier.its_id);
        }

        offset += size;
    }
    Ok(())
}

fn write_named_components(
    repo: &impl Repository,
    index: &NodeIndex,
    table: &mut [u8],
    region_offset: usize,
    nodes: &[NamedComponent],
) -> Result<(), GenError> {
    let mut offset = region_offset;
    for node in nodes {
        let size = named_component_size(node);
        let name_size = node.object_name.len() + 1;
        let id_mapping_offset = NAMED_COMPONENT_FIXED_LEN + align4(name_size);

        write_node_header(
            table,
            offset,
            TYPE_NAMED_COMPONENT,
            size,
            2,
            node.id_mapping_count,
            id_mapping_offset,
        );
        put_u32(table, offset + 16, node.flags);
        put_u32(table, offset + 20, node.cache_coherent);
        put_u8(table, offset + 24, node.allocation_hints);
        put_u8(table, offset + 27, node.memory_access_flags);
        put_u8(table, offset + 28, node.address_size_limit);

        // NUL-terminated object name, padded to a 4-byte boundary.
        table::put_bytes(
            table,
            offset + NAMED_COMPONENT_FIXED_LEN,
            node.object_name.as_bytes(),
        );

        write_id_mappings(
            repo,
            index,
            table,
            offset + id_mapping_offset,
            node.id_mapping_count,
            node.id_mapping_token,
        )?;

        offset += size;
    }
    Ok(())
}

fn write_root_complexes(
    repo: &impl Repository,
    index: &NodeIndex,
    table: &mut [u8],
    region_offset: usize,
    nodes: &[RootComplex],
) -> Result<(), GenError> {
    let mut offset = region_offset;
    for node in nodes {
        let size = root_complex_size(node);
        write_node_header(
            table,
            offset,
            TYPE_ROOT_COMPLEX,
            size,
            1,
            node.id_mapping_count,
            ROOT_COMPLEX_FIXED_LEN,
        );
        put_u32(table, offset + 16, node.cache_coherent);
        put_u8(table, offset + 20, node.allocation_hints);
        put_u8(table, offset + 23, node.memory_access_flags);
        put_u32(table, offset + 24, node.ats_attribute);
        put_u32(table, offset + 28, node.pci_segment_number);
        put_u8(table, offset + 32, node.memory_address_size);

        write_id_mappings(
            repo,
            index,
            table,
            offset + ROOT_COMPLEX_FIXED_LEN,
            node.id_mapping_count,
            node.id_mapping_token,
        )?;

        offset += size;
    }
    Ok(())
}

fn write_smmu_v1_v2_nodes(
    repo: &impl Repository,
    index: &NodeIndex,
    table: &mut [u8],
    region_offset: usize,
    nodes: &[SmmuV1V2],
) -> Result<(), GenError> {
    let mut offset = region_offset;
    for node in nodes {
        let size = smmu_v1_v2_size(node);
        let context_offset = SMMU_V1_V2_FIXED_LEN;
        let pmu_offset =
            context_offset + SMMU_INTERRUPT_LEN * node.context_interrupt_count as usize;
        let id_mapping_offset = pmu_offset + SMMU_INTERRUPT_LEN * node.pmu_interrupt_count as usize;

        write_node_header(
            table,
            offset,
            TYPE_SMMU_V1_V2,
            size,
            0,
            node.id_mapping_count,
            id_mapping_offset,
        );
        put_u64(table, offset + 16, node.base_address);
        put_u64(table, offset + 24, node.span);
        put_u32(table, offset + 32, node.model);
        put_u32(table, offset + 36, node.flags);
        // The global interrupt array is part of the fixed node layout.
        put_u32(table, offset + 40, 60);
        put_u32(table, offset + 44, node.context_interrupt_count);
        put_u32(table, offset + 48, context_offset as u32);
        put_u32(table, offset + 52, node.pmu_interrupt_count);
        put_u32(table, offset + 56, pmu_offset as u32);
        put_u32(table, offset + 60, node.smmu_ns_g_irpt);
        put_u32(table, offset + 64, node.smmu_ns_g_irpt_flags);
        put_u32(table, offset + 68, node.smmu_ns_g_cfg_irpt);
        put_u32(table, offset + 72, node.smmu_ns_g_cfg_irpt_flags);

        write_interrupt_array(
            repo,
            table,
            offset + context_offset,
            node.context_interrupt_count,
            node.context_interrupt_token,
        )?;
        write_interrupt_array(
            repo,
            table,
            offset + pmu_offset,
            node.pmu_interrupt_count,
            node.pmu_interrupt_token,
        )?;
        write_id_mappings(
            repo,
            index,
            table,
            offset + id_mapping_offset,
            node.id_mapping_count,
            node.id_mapping_token,
        )?;

        offset += size;
    }
    Ok(())
}

fn write_smmu_v3_nodes(
    repo: &impl Repository,
    index: &NodeIndex,
    table: &mut [u8],
    region_offset: usize,
    nodes: &[SmmuV3],
) -> Result<(), GenError> {
    let mut offset = region_offset;
    for node in nodes {
        let size = smmu_v3_size(node);
        write_node_header(
            table,
            offset,
            TYPE_SMMU_V3,
            size,
            2,
            node.id_mapping_count,
            SMMU_V3_FIXED_LEN,
        );
        put_u64(table, offset + 16, node.base_address);
        put_u32(table, offset + 24, node.flags);
        put_u64(table, offset + 32, node.vatos_address);
        put_u32(table, offset + 40, node.model);
        put_u32(table, offset + 44, node.event_interrupt);
        put_u32(table, offset + 48, node.pri_interrupt);
        put_u32(table, offset + 52, node.gerr_interrupt);
        put_u32(table, offset + 56, node.sync_interrupt);

        if node.flags & SMMU_V3_FLAG_PROXIMITY_DOMAIN != 0 {
            put_u32(table, offset + 60, node.proximity_domain);
        }

        // When every control interrupt is GSIV based the device ID
        // mapping index is ignored.
        let all_gsiv = node.event_interrupt != 0
            && node.pri_interrupt != 0
            && node.gerr_interrupt != 0
            && node.sync_interrupt != 0;
        if !all_gsiv {
            put_u32(table, offset + 64, node.device_id_mapping_index);
        }

        write_id_mappings(
            repo,
            index,
            table,
            offset + SMMU_V3_FIXED_LEN,
            node.id_mapping_count,
            node.id_mapping_token,
        )?;

        offset += size;
    }
    Ok(())
}

fn write_pmcg_nodes(
    repo: &impl Repository,
    index: &NodeIndex,
    table: &mut [u8],
    region_offset: usize,
    nodes: &[Pmcg],
) -> Result<(), GenError> {
    let mut offset = region_offset;
    for node in nodes {
        let size = pmcg_size(node);
        write_node_header(
            table,
            offset,
            TYPE_PMCG,
            size,
            1,
            node.id_mapping_count,
            PMCG_FIXED_LEN,
        );
        put_u64(table, offset + 16, node.base_address);
        put_u32(table, offset + 24, node.overflow_interrupt);
        put_u32(table, offset + 28, index.resolve(node.reference_token)?);
        put_u64(table, offset + 32, node.page1_base_address);

        write_id_mappings(
            repo,
            index,
            table,
            offset + PMCG_FIXED_LEN,
            node.id_mapping_count,
            node.id_mapping_token,
        )?;

        offset += size;
    }
    Ok(())
}

/// Build an IORT from the repository's remapping node objects.
///
/// # Errors
///
/// Fails for an unsupported revision, a node or table exceeding its
/// length field, a dangling cross-reference token, or an object list
/// shorter than its owning node declared.
pub fn build(repo: &impl Repository, info: &TableInfo) -> Result<Vec<u8>, GenError> {
    REVISIONS.check(info.revision)?;

    let its_groups: Vec<ItsGroup> = repo.get_all();
    let named_components: Vec<NamedComponent> = repo.get_all();
    let root_complexes: Vec<RootComplex> = repo.get_all();
    let smmu_v1_v2_nodes: Vec<SmmuV1V2> = repo.get_all();
    let smmu_v3_nodes: Vec<SmmuV3> = repo.get_all();
    let pmcg_nodes: Vec<Pmcg> = repo.get_all();

    let node_count = its_groups.len()
        + named_components.len()
        + root_complexes.len()
        + smmu_v1_v2_nodes.len()
        + smmu_v3_nodes.len()
        + pmcg_nodes.len();

    let mut index = NodeIndex::new();

    // Sizing pass: region offsets and the token index.
    let mut table_size = TABLE_HEADER_LEN;

    let its_group_offset = table_size;
    table_size += index_nodes("ITS group", &its_groups, its_group_offset, its_group_size, &mut index)?;

    let named_component_offset = table_size;
    table_size += index_nodes(
        "named component",
        &named_components,
        named_component_offset,
        named_component_size,
        &mut index,
    )?;

    let root_complex_offset = table_size;
    table_size += index_nodes(
        "root complex",
        &root_complexes,
        root_complex_offset,
        root_complex_size,
        &mut index,
    )?;

    let smmu_v1_v2_offset = table_size;
    table_size += index_nodes(
        "SMMUv1/v2",
        &smmu_v1_v2_nodes,
        smmu_v1_v2_offset,
        smmu_v1_v2_size,
        &mut index,
    )?;

    let smmu_v3_offset = table_size;
    table_size += index_nodes("SMMUv3", &smmu_v3_nodes, smmu_v3_offset, smmu_v3_size, &mut index)?;

    let pmcg_offset = table_size;
    table_size += index_nodes("PMCG", &pmcg_nodes, pmcg_offset, pmcg_size, &mut index)?;

    if table_size as u64 > u64::from(u32::MAX) {
        log::error!("IORT: table size {table_size:#x} exceeds the 32-bit length field");
        return Err(GenError::TableTooLarge(table_size as u64));
    }

    log::debug!("IORT: {node_count} nodes, table size {table_size:#x}");

    // Emission pass: every offset comes from the sizing pass above.
    let mut table = vec![0u8; table_size];
    table::write_header(&mut table, SIGNATURE, info);
    put_u32(&mut table, 36, node_count as u32);
    put_u32(&mut table, 40, TABLE_HEADER_LEN as u32);

    write_its_groups(repo, &mut table, its_group_offset, &its_groups)?;
    write_named_components(repo, &index, &mut table, named_component_offset, &named_components)?;
    write_root_complexes(repo, &index, &mut table, root_complex_offset, &root_complexes)?;
    write_smmu_v1_v2_nodes(repo, &index, &mut table, smmu_v1_v2_offset, &smmu_v1_v2_nodes)?;
    write_smmu_v3_nodes(repo, &index, &mut table, smmu_v3_offset, &smmu_v3_nodes)?;
    write_pmcg_nodes(repo, &index, &mut table, pmcg_offset, &pmcg_nodes)?;

    table::update_checksum(&mut table);
    Ok(table)
}
