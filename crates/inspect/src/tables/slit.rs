//! System Locality Information Table (SLIT) parsing.
//!
//! The SLIT is a square matrix of relative distances between system
//! localities. The matrix is printed for small locality counts and always
//! validated: diagonal entries must be the normalized distance 10 and the
//! matrix must be symmetric.

use alloc::string::String;

use crate::parser::{member_overruns, parse_fields, Captures, FieldDescriptor, FieldFormat, Slot};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, acpi_info, with_acpi_header};

/// SLIT table signature.
pub const SIGNATURE: &[u8; 4] = b"SLIT";

/// Largest locality count the 32-bit table length can represent.
const LOCALITY_COUNT_MAX: u64 = u16::MAX as u64;

/// Locality counts below this limit have their matrix printed; larger
/// matrices are left to the raw dump.
const LOCALITY_PRINT_LIMIT: u64 = 16;

const LOCALITY_COUNT: Slot = Slot(9);

/// Fields of the SLIT, header included.
static SLIT_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("Number of System Localities", 8, 36, FieldFormat::Hex)
        .capture(LOCALITY_COUNT),
];

fn matrix_entry(matrix: &[u8], count: usize, row: usize, column: usize) -> u8 {
    matrix[row * count + column]
}

/// Parse the SLIT and validate the locality matrix.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut captures = Captures::new();
    let offset = parse_fields(t, true, 0, Some("SLIT"), buf, SLIT_FIELDS, &mut captures) as usize;

    let Some(locality_count) = captures.u64_at(LOCALITY_COUNT) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse the SLIT table");
        return;
    };

    // The locality count is a 64-bit field, but the number of localities
    // that fits the 32-bit table length caps at sqrt(u32::MAX) = 65535.
    if locality_count > LOCALITY_COUNT_MAX {
        acpi_error!(
            t,
            ErrorKind::Value,
            "Number of System Localities 0x{locality_count:x} exceeds 0x{LOCALITY_COUNT_MAX:x}"
        );
        return;
    }

    let count = locality_count as usize;
    if member_overruns(t, "System Locality matrix", offset, count * count, buf.len()) {
        return;
    }

    let matrix = &buf[offset..offset + count * count];

    if locality_count < LOCALITY_PRINT_LIMIT {
        t.field_line(
            0,
            "Entry",
            format_args!("[0x{locality_count:x}][0x{locality_count:x}]"),
        );

        let mut heading = String::from("       ");
        for column in 0..count {
            let _ = core::fmt::write(&mut heading, format_args!(" ({column:3}) "));
        }
        acpi_info!(t, "{heading}");

        for row in 0..count {
            let mut line = String::new();
            let _ = core::fmt::write(&mut line, format_args!(" ({row:3}) "));
            for column in 0..count {
                let _ = core::fmt::write(
                    &mut line,
                    format_args!("  {:3}  ", matrix_entry(matrix, count, row, column)),
                );
            }
            acpi_info!(t, "{line}");
        }
    }

    // Diagonal distances are normalized to 10 and the matrix must be
    // symmetric.
    for row in 0..count {
        if matrix_entry(matrix, count, row, row) != 10 {
            acpi_error!(t, ErrorKind::Value, "SLIT Element[{row}][{row}] != 10");
        }
        for column in 0..row {
            let forward = matrix_entry(matrix, count, row, column);
            let reverse = matrix_entry(matrix, count, column, row);
            if forward != reverse {
                acpi_error!(
                    t,
                    ErrorKind::Value,
                    "SLIT Element[{row}][{column}] != SLIT Element[{column}][{row}]"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Trace};
    use std::vec::Vec;

    const SLIT_HEADER_LEN: usize = 44;

    fn slit(matrix: &[u8], count: u64) -> Vec<u8> {
        let mut buf = std::vec![0u8; SLIT_HEADER_LEN];
        buf[..4].copy_from_slice(SIGNATURE);
        buf[4..8].copy_from_slice(&((SLIT_HEADER_LEN + matrix.len()) as u32).to_le_bytes());
        buf[8] = 1;
        buf[36..44].copy_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(matrix);
        buf
    }

    fn run(buf: &[u8]) -> BufferSink {
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, buf, 1);
        }
        sink
    }

    #[test]
    fn symmetric_matrix_passes() {
        let matrix = [10, 20, 20, 10];
        let sink = run(&slit(&matrix, 2));
        assert!(sink.errors_of(crate::ErrorKind::Value).is_empty());
        assert!(sink.text().contains("  10  "));
    }

    #[test]
    fn bad_diagonal_is_reported() {
        let matrix = [11, 20, 20, 10];
        let sink = run(&slit(&matrix, 2));
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Element[0][0] != 10")));
    }

    #[test]
    fn asymmetry_is_reported() {
        let matrix = [10, 20, 30, 10];
        let sink = run(&slit(&matrix, 2));
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Element[1][0] != SLIT Element[0][1]")));
    }

    #[test]
    fn matrix_overrunning_table_is_reported() {
        let matrix = [10, 20, 20]; // one byte short of 2x2
        let sink = run(&slit(&matrix, 2));
        assert!(!sink.errors_of(crate::ErrorKind::Length).is_empty());
    }
}
