//! MADT (Multiple APIC Description Table) generator, GIC interrupt model.
//!
//! Requires at least one [`GicCpuInterface`] and exactly one
//! [`GicDistributor`]; MSI frames, redistributors and ITS objects are
//! optional. Structures are emitted in fixed region order: GICC, GICD,
//! GIC MSI frame, GICR, GIC ITS.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::GenError;
use crate::objects::{GicCpuInterface, GicDistributor, GicIts, GicMsiFrame, GicRedistributor};
use crate::repo::{PlatformObject, Repository};
use crate::table::{self, put_u16, put_u32, put_u64, put_u8, RevisionRange, TableInfo};

/// MADT table signature.
pub const SIGNATURE: &[u8; 4] = b"APIC";

/// Supported MADT revisions: 4 (ACPI 6.2) to 5 (ACPI 6.3).
pub const REVISIONS: RevisionRange = RevisionRange { min: 4, max: 5 };

/// The last MADT revision without the SPE overflow interrupt field.
const LAST_REVISION_WITHOUT_SPE: u8 = 4;

const MADT_HEADER_LEN: usize = 44;
const GICC_LEN: usize = 80;
const GICD_LEN: usize = 24;
const GIC_MSI_FRAME_LEN: usize = 24;
const GICR_LEN: usize = 16;
const GIC_ITS_LEN: usize = 20;

const TYPE_GICC: u8 = 0x0B;
const TYPE_GICD: u8 = 0x0C;
const TYPE_GIC_MSI_FRAME: u8 = 0x0D;
const TYPE_GICR: u8 = 0x0E;
const TYPE_GIC_ITS: u8 = 0x0F;

/// Reject GICC lists carrying duplicate ACPI processor UIDs.
fn check_unique_uids(gicc_list: &[GicCpuInterface]) -> Result<(), GenError> {
    for (i, a) in gicc_list.iter().enumerate() {
        for (j, b) in gicc_list.iter().enumerate().skip(i + 1) {
            if a.acpi_processor_uid == b.acpi_processor_uid {
                log::error!(
                    "MADT: GICC objects {} and {} share ACPI processor UID {:#x}",
                    i,
                    j,
                    a.acpi_processor_uid
                );
                return Err(GenError::DuplicateUid {
                    first: i,
                    second: j,
                    uid: a.acpi_processor_uid,
                });
            }
        }
    }
    Ok(())
}

fn write_gicc(table: &mut [u8], offset: usize, gicc: &GicCpuInterface, revision: u8) {
    put_u8(table, offset, TYPE_GICC);
    put_u8(table, offset + 1, GICC_LEN as u8);
    put_u32(table, offset + 4, gicc.cpu_interface_number);
    put_u32(table, offset + 8, gicc.acpi_processor_uid);
    put_u32(table, offset + 12, gicc.flags);
    put_u32(table, offset + 16, gicc.parking_protocol_version);
    put_u32(table, offset + 20, gicc.performance_interrupt_gsiv);
    put_u64(table, offset + 24, gicc.parked_address);
    put_u64(table, offset + 32, gicc.physical_base_address);
    put_u64(table, offset + 40, gicc.gicv);
    put_u64(table, offset + 48, gicc.gich);
    put_u32(table, offset + 56, gicc.vgic_maintenance_interrupt);
    put_u64(table, offset + 60, gicc.gicr_base_address);
    put_u64(table, offset + 68, gicc.mpidr);
    put_u8(table, offset + 76, gicc.processor_power_efficiency_class);

    // Revisions up to ACPI 6.2 reserve these two bytes; writing zero
    // keeps the layout bit-for-bit compatible with both revisions.
    if revision > LAST_REVISION_WITHOUT_SPE {
        put_u16(table, offset + 78, gicc.spe_overflow_interrupt);
    } else {
        put_u16(table, offset + 78, 0);
    }
}

fn write_gicd(table: &mut [u8], offset: usize, gicd: &GicDistributor) {
    put_u8(table, offset, TYPE_GICD);
    put_u8(table, offset + 1, GICD_LEN as u8);
    // One, and only one, GIC distributor is present, so its ID is 0.
    put_u32(table, offset + 4, 0);
    put_u64(table, offset + 8, gicd.physical_base_address);
    // The system vector base is reserved and must be zero.
    put_u32(table, offset + 16, 0);
    put_u8(table, offset + 20, gicd.gic_version);
}

fn write_msi_frame(table: &mut [u8], offset: usize, frame: &GicMsiFrame) {
    put_u8(table, offset, TYPE_GIC_MSI_FRAME);
    put_u8(table, offset + 1, GIC_MSI_FRAME_LEN as u8);
    put_u32(table, offset + 4, frame.gic_msi_frame_id);
    put_u64(table, offset + 8, frame.physical_base_address);
    put_u32(table, offset + 16, frame.flags);
    put_u16(table, offset + 20, frame.spi_count);
    put_u16(table, offset + 22, frame.spi_base);
}

fn write_gicr(table: &mut [u8], offset: usize, gicr: &GicRedistributor) {
    put_u8(table, offset, TYPE_GICR);
    put_u8(table, offset + 1, GICR_LEN as u8);
    put_u64(table, offset + 4, gicr.discovery_range_base_address);
    put_u32(table, offset + 12, gicr.discovery_range_length);
}

fn write_gic_its(table: &mut [u8], offset: usize, its: &GicIts) {
    put_u8(table, offset, TYPE_GIC_ITS);
    put_u8(table, offset + 1, GIC_ITS_LEN as u8);
    put_u32(table, offset + 4, its.gic_its_id);
    put_u64(table, offset + 8, its.physical_base_address);
}

/// Build a MADT from the repository's GIC description objects.
///
/// # Errors
///
/// Fails for unsupported revisions, a missing GICC or GICD, more than one
/// GICD, or duplicate ACPI processor UIDs.
pub fn build(repo: &impl Repository, info: &TableInfo) -> Result<Vec<u8>, GenError> {
    REVISIONS.check(info.revision)?;

    let gicc_list: Vec<GicCpuInterface> = repo.get_all();
    if gicc_list.is_empty() {
        log::error!("MADT: GIC CPU interface information not provided");
        return Err(GenError::MissingObjects(GicCpuInterface::ID));
    }

    let gicd_list: Vec<GicDistributor> = repo.get_all();
    if gicd_list.is_empty() {
        log::error!("MADT: GIC distributor information not provided");
        return Err(GenError::MissingObjects(GicDistributor::ID));
    }
    if gicd_list.len() > 1 {
        log::error!("MADT: one, and only one, GIC distributor must be present");
        return Err(GenError::TooManyObjects(GicDistributor::ID));
    }

    check_unique_uids(&gicc_list)?;

    let msi_frames: Vec<GicMsiFrame> = repo.get_all();
    let redistributors: Vec<GicRedistributor> = repo.get_all();
    let its_list: Vec<GicIts> = repo.get_all();

    let gicc_offset = MADT_HEADER_LEN;
    let gicd_offset = gicc_offset + GICC_LEN * gicc_list.len();
    let msi_offset = gicd_offset + GICD_LEN;
    let gicr_offset = msi_offset + GIC_MSI_FRAME_LEN * msi_frames.len();
    let its_offset = gicr_offset + GICR_LEN * redistributors.len();
    let table_size = its_offset + GIC_ITS_LEN * its_list.len();

    log::debug!("MADT: table size {table_size:#x}");

    let mut table = vec![0u8; table_size];
    table::write_header(&mut table, SIGNATURE, info);

    for (i, gicc) in gicc_list.iter().enumerate() {
        write_gicc(&mut table, gicc_offset + i * GICC_LEN, gicc, info.revision);
    }
    write_gicd(&mut table, gicd_offset, &gicd_list[0]);
    for (i, frame) in msi_frames.iter().enumerate() {
        write_msi_frame(&mut table, msi_offset + i * GIC_MSI_FRAME_LEN, frame);
    }
    for (i, gicr) in redistributors.iter().enumerate() {
        write_gicr(&mut table, gicr_offset + i * GICR_LEN, gicr);
    }
    for (i, its) in its_list.iter().enumerate() {
        write_gic_its(&mut table, its_offset + i * GIC_ITS_LEN, its);
    }

    table::update_checksum(&mut table);
    Ok(table)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::repo::{MemoryRepository, TokenAllocator};

    fn gicc(allocator: &TokenAllocator, uid: u32) -> GicCpuInterface {
        GicCpuInterface {
            token: allocator.allocate(),
            acpi_processor_uid: uid,
            mpidr: u64::from(uid),
            spe_overflow_interrupt: 21,
            ..Default::default()
        }
    }

    fn basic_repo() -> MemoryRepository {
        let allocator = TokenAllocator::new();
        let mut repo = MemoryRepository::new();
        repo.add(None, &[gicc(&allocator, 0), gicc(&allocator, 1)]);
        repo.add(
            None,
            &[GicDistributor {
                token: allocator.allocate(),
                physical_base_address: 0x2F00_0000,
                gic_version: 3,
            }],
        );
        repo
    }

    #[test]
    fn table_layout_and_checksum() {
        let repo = basic_repo();
        let table = build(&repo, &TableInfo::new(5)).unwrap();

        assert_eq!(table.len(), 44 + 2 * 80 + 24);
        assert_eq!(&table[..4], b"APIC");
        assert_eq!(
            u32::from_le_bytes(table[4..8].try_into().unwrap()) as usize,
            table.len()
        );

        // First GICC structure.
        assert_eq!(table[44], 0x0B);
        assert_eq!(table[45], 80);
        // GICD follows the GICC region.
        assert_eq!(table[44 + 160], 0x0C);
        assert_eq!(table[44 + 161], 24);

        let sum: u8 = table.iter().fold(0, |s, &b| s.wrapping_add(b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn spe_interrupt_zeroed_for_acpi_6_2() {
        let repo = basic_repo();

        let v5 = build(&repo, &TableInfo::new(5)).unwrap();
        assert_eq!(u16::from_le_bytes(v5[44 + 78..44 + 80].try_into().unwrap()), 21);

        let v4 = build(&repo, &TableInfo::new(4)).unwrap();
        assert_eq!(u16::from_le_bytes(v4[44 + 78..44 + 80].try_into().unwrap()), 0);
    }

    #[test]
    fn duplicate_uids_are_rejected() {
        let allocator = TokenAllocator::new();
        let mut repo = MemoryRepository::new();
        repo.add(None, &[gicc(&allocator, 7), gicc(&allocator, 7)]);
        repo.add(
            None,
            &[GicDistributor {
                token: allocator.allocate(),
                ..Default::default()
            }],
        );

        assert_eq!(
            build(&repo, &TableInfo::new(5)),
            Err(GenError::DuplicateUid {
                first: 0,
                second: 1,
                uid: 7
            })
        );
    }

    #[test]
    fn missing_distributor_is_rejected() {
        let allocator = TokenAllocator::new();
        let mut repo = MemoryRepository::new();
        repo.add(None, &[gicc(&allocator, 0)]);

        assert!(matches!(
            build(&repo, &TableInfo::new(5)),
            Err(GenError::MissingObjects(_))
        ));
    }

    #[test]
    fn two_distributors_are_rejected() {
        let allocator = TokenAllocator::new();
        let mut repo = basic_repo();
        repo.add(
            None,
            &[GicDistributor {
                token: allocator.allocate(),
                ..Default::default()
            }],
        );

        assert!(matches!(
            build(&repo, &TableInfo::new(5)),
            Err(GenError::TooManyObjects(_))
        ));
    }

    #[test]
    fn unsupported_revision_is_rejected() {
        let repo = basic_repo();
        assert!(matches!(
            build(&repo, &TableInfo::new(3)),
            Err(GenError::UnsupportedRevision { .. })
        ));
    }
}
