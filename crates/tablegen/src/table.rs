//! Packed table assembly helpers.
//!
//! Little-endian field stores over a zeroed table buffer, the standard
//! description header writer and the checksum patcher shared by every
//! generator.

use crate::error::GenError;

/// Length of the standard ACPI description header.
pub const HEADER_LEN: usize = 36;

/// Offset of the checksum byte within the standard header.
pub const CHECKSUM_OFFSET: usize = 9;

/// Identification carried in the header of every generated table.
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// Table revision to generate.
    pub revision: u8,
    /// OEM identifier.
    pub oem_id: [u8; 6],
    /// OEM table identifier.
    pub oem_table_id: [u8; 8],
    /// OEM revision.
    pub oem_revision: u32,
    /// Creator identifier.
    pub creator_id: [u8; 4],
    /// Creator revision.
    pub creator_revision: u32,
}

impl TableInfo {
    /// A `TableInfo` with placeholder identification for the given
    /// revision.
    #[must_use]
    pub fn new(revision: u8) -> Self {
        Self {
            revision,
            oem_id: *b"OEMID ",
            oem_table_id: *b"OEMTABLE",
            oem_revision: 1,
            creator_id: *b"DYNT",
            creator_revision: 1,
        }
    }
}

/// Supported table revision range of one generator.
#[derive(Debug, Clone, Copy)]
pub struct RevisionRange {
    /// Lowest supported revision.
    pub min: u8,
    /// Highest supported revision.
    pub max: u8,
}

impl RevisionRange {
    /// Fail with [`GenError::UnsupportedRevision`] when `requested` is
    /// out of range.
    pub fn check(self, requested: u8) -> Result<(), GenError> {
        if requested < self.min || requested > self.max {
            log::error!(
                "requested table revision {} not supported (minimum {}, maximum {})",
                requested,
                self.min,
                self.max
            );
            return Err(GenError::UnsupportedRevision {
                requested,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

pub(crate) fn put_u8(table: &mut [u8], offset: usize, value: u8) {
    table[offset] = value;
}

pub(crate) fn put_u16(table: &mut [u8], offset: usize, value: u16) {
    table[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u32(table: &mut [u8], offset: usize, value: u32) {
    table[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u64(table: &mut [u8], offset: usize, value: u64) {
    table[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_bytes(table: &mut [u8], offset: usize, value: &[u8]) {
    table[offset..offset + value.len()].copy_from_slice(value);
}

/// Populate the standard ACPI description header at the start of `table`.
///
/// The length field is taken from the buffer length; the checksum byte is
/// left zero for [`update_checksum`].
pub fn write_header(table: &mut [u8], signature: &[u8; 4], info: &TableInfo) {
    put_bytes(table, 0, signature);
    put_u32(table, 4, table.len() as u32);
    put_u8(table, 8, info.revision);
    put_u8(table, CHECKSUM_OFFSET, 0);
    put_bytes(table, 10, &info.oem_id);
    put_bytes(table, 16, &info.oem_table_id);
    put_u32(table, 24, info.oem_revision);
    put_bytes(table, 28, &info.creator_id);
    put_u32(table, 32, info.creator_revision);
}

/// Set the checksum byte so the whole table sums to zero modulo 256.
pub fn update_checksum(table: &mut [u8]) {
    table[CHECKSUM_OFFSET] = 0;
    let sum: u8 = table.iter().fold(0, |sum, &b| sum.wrapping_add(b));
    table[CHECKSUM_OFFSET] = sum.wrapping_neg();
}

/// Round `value` up to the next multiple of four.
pub(crate) fn align4(value: usize) -> usize {
    (value + 3) & !3
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn header_is_fully_populated() {
        let mut table = std::vec![0u8; 44];
        write_header(&mut table, b"APIC", &TableInfo::new(5));

        assert_eq!(&table[..4], b"APIC");
        assert_eq!(u32::from_le_bytes(table[4..8].try_into().unwrap()), 44);
        assert_eq!(table[8], 5);
        assert_eq!(&table[10..16], b"OEMID ");
        assert_eq!(&table[16..24], b"OEMTABLE");
        assert_eq!(&table[28..32], b"DYNT");
    }

    #[test]
    fn checksum_balances_the_table() {
        let mut table = std::vec![0u8; 44];
        write_header(&mut table, b"MCFG", &TableInfo::new(1));
        table[40] = 0xAB;
        update_checksum(&mut table);

        let sum: u8 = table.iter().fold(0, |s, &b| s.wrapping_add(b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn revision_range_rejects_out_of_range() {
        let range = RevisionRange { min: 4, max: 5 };
        assert!(range.check(4).is_ok());
        assert!(range.check(5).is_ok());
        assert_eq!(
            range.check(6),
            Err(GenError::UnsupportedRevision {
                requested: 6,
                min: 4,
                max: 5
            })
        );
    }

    #[test]
    fn align4_rounds_up() {
        assert_eq!(align4(0), 0);
        assert_eq!(align4(1), 4);
        assert_eq!(align4(4), 4);
        assert_eq!(align4(9), 12);
    }
}
