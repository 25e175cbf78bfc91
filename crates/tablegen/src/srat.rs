//! SRAT (System Resource Affinity Table) generator, Arm profile.
//!
//! Requires at least one [`GicCpuInterface`]; GIC ITS, memory and generic
//! initiator affinities are optional. Regions are emitted in fixed order:
//! GICC affinity, GIC ITS affinity, memory affinity, generic initiator
//! affinity. Generic initiators resolve their ACPI or PCI device handle
//! objects through the handle token.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::GenError;
use crate::objects::{DeviceHandleAcpi, DeviceHandlePci, DeviceHandleType,
    GenericInitiatorAffinity, GicCpuInterface, GicIts, MemoryAffinity};
use crate::repo::{PlatformObject, Repository};
use crate::table::{self, put_u16, put_u32, put_u64, put_u8, RevisionRange, TableInfo};

/// SRAT table signature.
pub const SIGNATURE: &[u8; 4] = b"SRAT";

/// Supported SRAT revision (ACPI 6.3).
pub const REVISIONS: RevisionRange = RevisionRange { min: 3, max: 3 };

const SRAT_HEADER_LEN: usize = 48;
const GICC_AFFINITY_LEN: usize = 18;
const GIC_ITS_AFFINITY_LEN: usize = 12;
const MEMORY_AFFINITY_LEN: usize = 40;
const GENERIC_INITIATOR_AFFINITY_LEN: usize = 32;

const TYPE_MEMORY_AFFINITY: u8 = 1;
const TYPE_GICC_AFFINITY: u8 = 3;
const TYPE_GIC_ITS_AFFINITY: u8 = 4;
const TYPE_GENERIC_INITIATOR_AFFINITY: u8 = 5;

const DEVICE_HANDLE_ACPI: u8 = 0;
const DEVICE_HANDLE_PCI: u8 = 1;

fn write_gicc_affinity(table: &mut [u8], offset: usize, gicc: &GicCpuInterface) {
    put_u8(table, offset, TYPE_GICC_AFFINITY);
    put_u8(table, offset + 1, GICC_AFFINITY_LEN as u8);
    put_u32(table, offset + 2, gicc.proximity_domain);
    put_u32(table, offset + 6, gicc.acpi_processor_uid);
    put_u32(table, offset + 10, gicc.affinity_flags);
    put_u32(table, offset + 14, gicc.clock_domain);
}

fn write_its_affinity(table: &mut [u8], offset: usize, its: &GicIts) {
    put_u8(table, offset, TYPE_GIC_ITS_AFFINITY);
    put_u8(table, offset + 1, GIC_ITS_AFFINITY_LEN as u8);
    put_u32(table, offset + 2, its.proximity_domain);
    put_u32(table, offset + 8, its.gic_its_id);
}

fn write_memory_affinity(table: &mut [u8], offset: usize, memory: &MemoryAffinity) {
    put_u8(table, offset, TYPE_MEMORY_AFFINITY);
    put_u8(table, offset + 1, MEMORY_AFFINITY_LEN as u8);
    put_u32(table, offset + 2, memory.proximity_domain);
    put_u32(table, offset + 8, (memory.base_address & 0xFFFF_FFFF) as u32);
    put_u32(table, offset + 12, (memory.base_address >> 32) as u32);
    put_u32(table, offset + 16, (memory.length & 0xFFFF_FFFF) as u32);
    put_u32(table, offset + 20, (memory.length >> 32) as u32);
    put_u32(table, offset + 28, memory.flags);
}

fn write_generic_initiator(
    repo: &impl Repository,
    table: &mut [u8],
    offset: usize,
    initiator: &GenericInitiatorAffinity,
) -> Result<(), GenError> {
    put_u8(table, offset, TYPE_GENERIC_INITIATOR_AFFINITY);
    put_u8(table, offset + 1, GENERIC_INITIATOR_AFFINITY_LEN as u8);
    put_u32(table, offset + 4, initiator.proximity_domain);

    // The 16-byte device handle lives at +8.
    match initiator.device_handle_type {
        DeviceHandleType::Acpi => {
            put_u8(table, offset + 3, DEVICE_HANDLE_ACPI);
            let handles: Vec<DeviceHandleAcpi> = repo.get(initiator.device_handle_token)?;
            let Some(handle) = handles.first() else {
                return Err(GenError::ShortObjectList(DeviceHandleAcpi::ID));
            };
            put_u64(table, offset + 8, handle.hid);
            put_u32(table, offset + 16, handle.uid);
        }
        DeviceHandleType::Pci => {
            put_u8(table, offset + 3, DEVICE_HANDLE_PCI);
            let handles: Vec<DeviceHandlePci> = repo.get(initiator.device_handle_token)?;
            let Some(handle) = handles.first() else {
                return Err(GenError::ShortObjectList(DeviceHandlePci::ID));
            };
            put_u16(table, offset + 8, handle.segment_number);
            put_u16(table, offset + 10, handle.bdf());
        }
    }

    put_u32(table, offset + 24, initiator.flags);
    Ok(())
}

/// Build a SRAT from the repository's affinity description objects.
///
/// # Errors
///
/// Fails for an unsupported revision, a missing GICC list, or a generic
/// initiator whose device handle cannot be resolved.
pub fn build(repo: &impl Repository, info: &TableInfo) -> Result<Vec<u8>, GenError> {
    REVISIONS.check(info.revision)?;

    let gicc_list: Vec<GicCpuInterface> = repo.get_all();
    if gicc_list.is_empty() {
        log::error!("SRAT: GIC CPU interface information not provided");
        return Err(GenError::MissingObjects(GicCpuInterface::ID));
    }

    let its_list: Vec<GicIts> = repo.get_all();
    let memory_list: Vec<MemoryAffinity> = repo.get_all();
    let initiator_list: Vec<GenericInitiatorAffinity> = repo.get_all();

    let gicc_offset = SRAT_HEADER_LEN;
    let its_offset = gicc_offset + GICC_AFFINITY_LEN * gicc_list.len();
    let memory_offset = its_offset + GIC_ITS_AFFINITY_LEN * its_list.len();
    let initiator_offset = memory_offset + MEMORY_AFFINITY_LEN * memory_list.len();
    let table_size = initiator_offset + GENERIC_INITIATOR_AFFINITY_LEN * initiator_list.len();

    log::debug!("SRAT: table size {table_size:#x}");

    let mut table = vec![0u8; table_size];
    table::write_header(&mut table, SIGNATURE, info);

    // Reserved1 must be 1 for backward compatibility; Reserved2 is zero.
    put_u32(&mut table, 36, 1);

    for (i, gicc) in gicc_list.iter().enumerate() {
        write_gicc_affinity(&mut table, gicc_offset + i * GICC_AFFINITY_LEN, gicc);
    }
    for (i, its) in its_list.iter().enumerate() {
        write_its_affinity(&mut table, its_offset + i * GIC_ITS_AFFINITY_LEN, its);
    }
    for (i, memory) in memory_list.iter().enumerate() {
        write_memory_affinity(&mut table, memory_offset + i * MEMORY_AFFINITY_LEN, memory);
    }
    for (i, initiator) in initiator_list.iter().enumerate() {
        write_generic_initiator(
            repo,
            &mut table,
            initiator_offset + i * GENERIC_INITIATOR_AFFINITY_LEN,
            initiator,
        )?;
    }

    table::update_checksum(&mut table);
    Ok(table)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::repo::{MemoryRepository, Token, TokenAllocator};

    fn repo_with_cpu(allocator: &TokenAllocator) -> MemoryRepository {
        let mut repo = MemoryRepository::new();
        repo.add(
            None,
            &[GicCpuInterface {
                token: allocator.allocate(),
                acpi_processor_uid: 4,
                proximity_domain: 2,
                clock_domain: 1,
                affinity_flags: 1,
                ..Default::default()
            }],
        );
        repo
    }

    #[test]
    fn gicc_affinity_layout() {
        let allocator = TokenAllocator::new();
        let repo = repo_with_cpu(&allocator);
        let table = build(&repo, &TableInfo::new(3)).unwrap();

        assert_eq!(table.len(), 48 + 18);
        // Reserved1 == 1.
        assert_eq!(u32::from_le_bytes(table[36..40].try_into().unwrap()), 1);
        assert_eq!(table[48], TYPE_GICC_AFFINITY);
        assert_eq!(table[49], 18);
        assert_eq!(u32::from_le_bytes(table[50..54].try_into().unwrap()), 2); // proximity
        assert_eq!(u32::from_le_bytes(table[54..58].try_into().unwrap()), 4); // UID

        let sum: u8 = table.iter().fold(0, |s, &b| s.wrapping_add(b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn pci_initiator_resolves_its_device_handle() {
        let allocator = TokenAllocator::new();
        let mut repo = repo_with_cpu(&allocator);

        let handle_token = allocator.allocate();
        repo.add(
            Some(handle_token),
            &[DeviceHandlePci {
                token: allocator.allocate(),
                segment_number: 1,
                bus_number: 2,
                device_number: 3,
                function_number: 4,
            }],
        );
        repo.add(
            None,
            &[GenericInitiatorAffinity {
                token: allocator.allocate(),
                proximity_domain: 7,
                flags: 1,
                device_handle_type: DeviceHandleType::Pci,
                device_handle_token: handle_token,
            }],
        );

        let table = build(&repo, &TableInfo::new(3)).unwrap();
        let offset = 48 + 18;
        assert_eq!(table[offset], TYPE_GENERIC_INITIATOR_AFFINITY);
        assert_eq!(table[offset + 3], DEVICE_HANDLE_PCI);
        assert_eq!(
            u16::from_le_bytes(table[offset + 8..offset + 10].try_into().unwrap()),
            1
        );
        // BDF: bus 2, device 3, function 4.
        assert_eq!(
            u16::from_le_bytes(table[offset + 10..offset + 12].try_into().unwrap()),
            0x021C
        );
    }

    #[test]
    fn initiator_with_dangling_handle_token_fails() {
        let allocator = TokenAllocator::new();
        let mut repo = repo_with_cpu(&allocator);
        repo.add(
            None,
            &[GenericInitiatorAffinity {
                token: allocator.allocate(),
                device_handle_type: DeviceHandleType::Acpi,
                device_handle_token: Token::NULL,
                ..Default::default()
            }],
        );

        assert!(matches!(
            build(&repo, &TableInfo::new(3)),
            Err(GenError::Repo(_))
        ));
    }
}
