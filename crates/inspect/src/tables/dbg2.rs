//! Debug Port Table 2 (DBG2) parsing.
//!
//! The DBG2 describes one or more debug devices, each with an array of
//! Generic Address Structures, a matching array of address sizes, a
//! namespace string and optional OEM data.

use crate::bytes;
use crate::parser::{dump_gas_struct, member_overruns, parse_fields, Captures, FieldDescriptor,
    FieldFormat, Slot, Validator, ValidatorContext};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, acpi_info, with_acpi_header};

/// DBG2 table signature.
pub const SIGNATURE: &[u8; 4] = b"DBG2";

/// A namespace string must at least hold "." plus its terminator.
fn validate_namespace_string_length(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    let length = bytes::read_u16(field, 0).unwrap_or(0);
    if length <= 1 {
        acpi_error!(
            t,
            ErrorKind::Value,
            "NameSpace String Length must be greater than 1 (found {length})"
        );
        acpi_info!(t, "With no namespace, NamespaceString[] must be a period '.'");
    }
}

const DEVICE_INFO_OFFSET: Slot = Slot(9);
const DEVICE_INFO_COUNT: Slot = Slot(10);

/// Fields of the DBG2, header included.
static DBG2_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("OffsetDbgDeviceInfo", 4, 36, FieldFormat::Hex)
        .capture(DEVICE_INFO_OFFSET),
    FieldDescriptor::new("NumberDbgDeviceInfo", 4, 40, FieldFormat::Dec)
        .capture(DEVICE_INFO_COUNT),
];

const DEVICE_LENGTH: Slot = Slot(0);

/// Fields of the debug device information structure header.
static DEVICE_HEADER_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::unnamed(1, 0),
    FieldDescriptor::unnamed(2, 1).capture(DEVICE_LENGTH),
];

const GAS_COUNT: Slot = Slot(0);
const NAMESPACE_LENGTH: Slot = Slot(1);
const NAMESPACE_OFFSET: Slot = Slot(2);
const OEM_DATA_LENGTH: Slot = Slot(3);
const OEM_DATA_OFFSET: Slot = Slot(4);
const BASE_ADDRESS_OFFSET: Slot = Slot(5);
const ADDRESS_SIZE_OFFSET: Slot = Slot(6);

/// Fields of the debug device information structure.
static DEVICE_INFO_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new("Revision", 1, 0, FieldFormat::Hex),
    FieldDescriptor::new("Length", 2, 1, FieldFormat::Dec),
    FieldDescriptor::new("Generic Address Registers Count", 1, 3, FieldFormat::Hex)
        .capture(GAS_COUNT),
    FieldDescriptor::new("NameSpace String Length", 2, 4, FieldFormat::Dec)
        .capture(NAMESPACE_LENGTH)
        .validate(validate_namespace_string_length as Validator),
    FieldDescriptor::new("NameSpace String Offset", 2, 6, FieldFormat::Hex)
        .capture(NAMESPACE_OFFSET),
    FieldDescriptor::new("OEM Data Length", 2, 8, FieldFormat::Dec).capture(OEM_DATA_LENGTH),
    FieldDescriptor::new("OEM Data Offset", 2, 10, FieldFormat::Hex).capture(OEM_DATA_OFFSET),
    FieldDescriptor::new("Port Type", 2, 12, FieldFormat::Hex),
    FieldDescriptor::new("Port SubType", 2, 14, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 2, 16, FieldFormat::Hex),
    FieldDescriptor::new("Base Address Register Offset", 2, 18, FieldFormat::Hex)
        .capture(BASE_ADDRESS_OFFSET),
    FieldDescriptor::new("Address Size Offset", 2, 20, FieldFormat::Hex)
        .capture(ADDRESS_SIZE_OFFSET),
];

/// Parse one debug device information structure.
fn dump_device_info(t: &mut Trace, device: &[u8]) {
    let mut captures = Captures::new();
    parse_fields(t, true, 2, Some("Debug Device Info"), device, DEVICE_INFO_FIELDS, &mut captures);

    let (
        Some(gas_count),
        Some(namespace_length),
        Some(namespace_offset),
        Some(oem_data_length),
        Some(oem_data_offset),
        Some(base_address_offset),
        Some(address_size_offset),
    ) = (
        captures.u8_at(GAS_COUNT),
        captures.u16_at(NAMESPACE_LENGTH),
        captures.u16_at(NAMESPACE_OFFSET),
        captures.u16_at(OEM_DATA_LENGTH),
        captures.u16_at(OEM_DATA_OFFSET),
        captures.u16_at(BASE_ADDRESS_OFFSET),
        captures.u16_at(ADDRESS_SIZE_OFFSET),
    )
    else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse DbgDevInfo Structure");
        return;
    };

    // Base address registers.
    let mut offset = base_address_offset as usize;
    for index in 0..gas_count {
        if member_overruns(t, "BaseAddressRegister", offset, 1, device.len()) {
            break;
        }
        t.field_line(4, "BaseAddressRegister", format_args!("[{index}]"));
        offset += dump_gas_struct(t, 4, &device[offset..]) as usize;
    }

    // The array of address sizes parallels the GAS array.
    if member_overruns(
        t,
        "Address Size array",
        address_size_offset as usize,
        gas_count as usize * 4,
        device.len(),
    ) {
        return;
    }
    let mut offset = address_size_offset as usize;
    for index in 0..gas_count {
        let size = bytes::read_u32(device, offset).unwrap_or(0);
        t.field_line(4, "Address Size", format_args!("[{index}] 0x{size:x}"));
        offset += 4;
    }

    // NameSpace string.
    if !member_overruns(
        t,
        "NameSpace String",
        namespace_offset as usize,
        namespace_length as usize,
        device.len(),
    ) {
        let start = namespace_offset as usize;
        let end = start + namespace_length as usize;
        let text = &device[start..end.saturating_sub(1)]; // strip the NUL
        let name = core::str::from_utf8(text).unwrap_or("<invalid>");
        t.field_line(4, "NameSpace String", format_args!("{name}"));
    }

    // OEM data.
    if oem_data_offset != 0
        && !member_overruns(
            t,
            "OEM Data",
            oem_data_offset as usize,
            oem_data_length as usize,
            device.len(),
        )
    {
        acpi_info!(t, "OEM Data");
        let start = oem_data_offset as usize;
        super::dump_raw(t, &device[start..start + oem_data_length as usize]);
    }
}

/// Parse the DBG2 and its debug device information array.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    if !tracing {
        return;
    }

    let mut captures = Captures::new();
    parse_fields(t, true, 0, Some("DBG2"), buf, DBG2_FIELDS, &mut captures);

    let (Some(info_offset), Some(info_count)) = (
        captures.u32_at(DEVICE_INFO_OFFSET),
        captures.u32_at(DEVICE_INFO_COUNT),
    ) else {
        acpi_error!(t, ErrorKind::Parse, "Failed to parse DbgDevInfo array");
        return;
    };

    let mut offset = info_offset as usize;
    for _ in 0..info_count {
        if offset >= buf.len() {
            break;
        }

        let mut header = Captures::new();
        parse_fields(t, false, 0, None, &buf[offset..], DEVICE_HEADER_FIELDS, &mut header);

        let Some(device_length) = header.u16_at(DEVICE_LENGTH) else {
            acpi_error!(t, ErrorKind::Parse, "Failed to parse DbgDevInfo length");
            return;
        };

        let length = device_length as usize;
        if member_overruns(t, "Debug Device Info", offset, length, buf.len()) {
            return;
        }

        dump_device_info(t, &buf[offset..offset + length]);
        offset += length;
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Trace};
    use std::vec::Vec;

    const DBG2_HEADER_LEN: usize = 44;
    const DEVICE_FIXED_LEN: usize = 22;

    /// One device: fixed fields + 1 GAS + 1 address size + ".\0" namespace.
    fn device() -> Vec<u8> {
        let gas_offset = DEVICE_FIXED_LEN;
        let size_offset = gas_offset + 12;
        let namespace_offset = size_offset + 4;
        let length = namespace_offset + 2;

        let mut d = std::vec![0u8; DEVICE_FIXED_LEN];
        d[0] = 0; // revision
        d[1..3].copy_from_slice(&(length as u16).to_le_bytes());
        d[3] = 1; // one GAS
        d[4..6].copy_from_slice(&2u16.to_le_bytes()); // namespace length
        d[6..8].copy_from_slice(&(namespace_offset as u16).to_le_bytes());
        d[18..20].copy_from_slice(&(gas_offset as u16).to_le_bytes());
        d[20..22].copy_from_slice(&(size_offset as u16).to_le_bytes());

        d.extend_from_slice(&[0u8; 12]); // GAS
        d.extend_from_slice(&0x1000u32.to_le_bytes()); // address size
        d.extend_from_slice(b".\0");
        d
    }

    fn dbg2() -> Vec<u8> {
        let dev = device();
        let mut buf = std::vec![0u8; DBG2_HEADER_LEN];
        buf[..4].copy_from_slice(SIGNATURE);
        buf[4..8].copy_from_slice(&((DBG2_HEADER_LEN + dev.len()) as u32).to_le_bytes());
        buf[36..40].copy_from_slice(&(DBG2_HEADER_LEN as u32).to_le_bytes());
        buf[40..44].copy_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&dev);
        buf
    }

    #[test]
    fn device_info_is_fully_traced() {
        let buf = dbg2();
        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, &buf, 0);
        }

        let text = sink.text();
        assert!(text.contains("Debug Device Info"));
        assert!(text.contains("BaseAddressRegister"));
        assert!(text.contains("Address Size"));
        assert!(text.contains("NameSpace String"));
        assert!(sink.errors_of(crate::ErrorKind::Value).is_empty());
    }

    #[test]
    fn empty_namespace_string_is_flagged() {
        let mut buf = dbg2();
        // Namespace length 1: just the terminator.
        let device_start = DBG2_HEADER_LEN;
        buf[device_start + 4..device_start + 6].copy_from_slice(&1u16.to_le_bytes());

        let mut sink = BufferSink::new();
        {
            let mut t = Trace::new(&mut sink, Config::default());
            parse(&mut t, true, &buf, 0);
        }
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("NameSpace String Length")));
    }
}
