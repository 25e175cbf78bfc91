//! MCFG (Memory Mapped Configuration Space) table generator.
//!
//! One 16-byte enhanced configuration space allocation record per
//! [`PciConfigSpace`] object.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::GenError;
use crate::objects::PciConfigSpace;
use crate::repo::{PlatformObject, Repository};
use crate::table::{self, put_u16, put_u64, put_u8, RevisionRange, TableInfo};

/// MCFG table signature.
pub const SIGNATURE: &[u8; 4] = b"MCFG";

/// Supported MCFG revision (PCI Firmware Specification 3.2).
pub const REVISIONS: RevisionRange = RevisionRange { min: 1, max: 1 };

const MCFG_HEADER_LEN: usize = 44;
const ALLOCATION_LEN: usize = 16;

fn write_allocation(table: &mut [u8], offset: usize, space: &PciConfigSpace) {
    put_u64(table, offset, space.base_address);
    put_u16(table, offset + 8, space.segment_group_number);
    put_u8(table, offset + 10, space.start_bus_number);
    put_u8(table, offset + 11, space.end_bus_number);
}

/// Build an MCFG from the repository's PCI configuration space objects.
///
/// # Errors
///
/// Fails for an unsupported revision or when no configuration spaces are
/// provided.
pub fn build(repo: &impl Repository, info: &TableInfo) -> Result<Vec<u8>, GenError> {
    REVISIONS.check(info.revision)?;

    let spaces: Vec<PciConfigSpace> = repo.get_all();
    if spaces.is_empty() {
        log::error!("MCFG: PCI configuration space information not provided");
        return Err(GenError::MissingObjects(PciConfigSpace::ID));
    }

    let table_size = MCFG_HEADER_LEN + ALLOCATION_LEN * spaces.len();
    log::debug!("MCFG: {} configuration spaces, table size {table_size:#x}", spaces.len());

    let mut table = vec![0u8; table_size];
    table::write_header(&mut table, SIGNATURE, info);

    for (i, space) in spaces.iter().enumerate() {
        write_allocation(&mut table, MCFG_HEADER_LEN + i * ALLOCATION_LEN, space);
    }

    table::update_checksum(&mut table);
    Ok(table)
}
