//! Serial Port Console Redirection (SPCR) table parsing.

use crate::arch::ArchMask;
use crate::parser::{parse_fields, render_gas, render_hex_bytes, Captures, FieldDescriptor,
    FieldFormat, Validator, ValidatorContext};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, with_acpi_header};

/// SPCR table signature.
pub const SIGNATURE: &[u8; 4] = b"SPCR";

/// Interrupt type bit: ARMH GIC interrupt (GSIV field is used).
const INTERRUPT_TYPE_GIC: u8 = 1 << 3;

fn arm_build(t: &Trace) -> bool {
    t.arch() == ArchMask::ARM.union(ArchMask::AARCH64)
}

/// Arm platforms deliver the console interrupt through the GIC.
fn validate_interrupt_type(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if !arm_build(t) {
        return;
    }
    let interrupt_type = field.first().copied().unwrap_or(0);
    if interrupt_type & INTERRUPT_TYPE_GIC == 0 {
        acpi_error!(
            t,
            ErrorKind::Value,
            "Interrupt Type must declare an ARMH GIC interrupt on Arm platforms \
             (found 0x{interrupt_type:x})"
        );
    }
}

/// The IRQ field only applies to PC-AT interrupt hardware.
fn validate_irq(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if !arm_build(t) {
        return;
    }
    if field.first().copied().unwrap_or(0) != 0 {
        acpi_error!(t, ErrorKind::Value, "IRQ must be zero on Arm platforms");
    }
}

/// Defined baud rate selector values are 0 and 3..=7.
fn validate_baud_rate(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    let baud = field.first().copied().unwrap_or(0);
    if !(baud == 0 || (3..=7).contains(&baud)) {
        acpi_error!(t, ErrorKind::Value, "Undefined Baud Rate selector {baud}");
    }
}

/// Parity must be 0 (none).
fn validate_parity(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if field.first().copied().unwrap_or(0) != 0 {
        acpi_error!(t, ErrorKind::Value, "Parity must be 0 (no parity)");
    }
}

/// Stop bits must be 1 (one stop bit).
fn validate_stop_bits(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if field.first().copied().unwrap_or(0) != 1 {
        acpi_error!(t, ErrorKind::Value, "Stop Bits must be 1 (one stop bit)");
    }
}

/// Fields of the SPCR, header included.
static SPCR_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("Interface Type", 1, 36, FieldFormat::Hex),
    FieldDescriptor::rendered("Reserved", 3, 37, render_hex_bytes),
    FieldDescriptor::rendered("Base Address", 12, 40, render_gas),
    FieldDescriptor::new("Interrupt Type", 1, 52, FieldFormat::Hex)
        .validate(validate_interrupt_type as Validator),
    FieldDescriptor::new("IRQ", 1, 53, FieldFormat::Dec).validate(validate_irq as Validator),
    FieldDescriptor::new("Global System Interrupt", 4, 54, FieldFormat::Hex),
    FieldDescriptor::new("Baud Rate", 1, 58, FieldFormat::Dec)
        .validate(validate_baud_rate as Validator),
    FieldDescriptor::new("Parity", 1, 59, FieldFormat::Dec).validate(validate_parity as Validator),
    FieldDescriptor::new("Stop Bits", 1, 60, FieldFormat::Dec)
        .validate(validate_stop_bits as Validator),
    FieldDescriptor::new("Flow Control", 1, 61, FieldFormat::Hex),
    FieldDescriptor::new("Terminal Type", 1, 62, FieldFormat::Dec),
    FieldDescriptor::new("Language", 1, 63, FieldFormat::Hex),
    FieldDescriptor::new("PCI Device ID", 2, 64, FieldFormat::Hex),
    FieldDescriptor::new("PCI Vendor ID", 2, 66, FieldFormat::Hex),
    FieldDescriptor::new("PCI Bus Number", 1, 68, FieldFormat::Hex),
    FieldDescriptor::new("PCI Device Number", 1, 69, FieldFormat::Hex),
    FieldDescriptor::new("PCI Function Number", 1, 70, FieldFormat::Hex),
    FieldDescriptor::new("PCI Flags", 4, 71, FieldFormat::Hex),
    FieldDescriptor::new("PCI Segment", 1, 75, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 4, 76, FieldFormat::Hex),
];

/// Parse the SPCR.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    let mut captures = Captures::new();
    parse_fields(t, tracing, 0, Some("SPCR"), buf, SPCR_FIELDS, &mut captures);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::trace::{BufferSink, Config, Trace};
    use std::vec::Vec;

    const SPCR_LEN: usize = 80;

    fn spcr() -> Vec<u8> {
        let mut buf = std::vec![0u8; SPCR_LEN];
        buf[..4].copy_from_slice(SIGNATURE);
        buf[4..8].copy_from_slice(&(SPCR_LEN as u32).to_le_bytes());
        buf[8] = 2;
        buf[52] = INTERRUPT_TYPE_GIC;
        buf[58] = 7; // 115200
        buf[60] = 1; // one stop bit
        buf
    }

    fn run(buf: &[u8], arch: ArchMask) -> BufferSink {
        let mut sink = BufferSink::new();
        {
            let config = Config {
                arch,
                ..Config::default()
            };
            let mut t = Trace::new(&mut sink, config);
            parse(&mut t, true, buf, 2);
        }
        sink
    }

    #[test]
    fn well_formed_spcr_passes() {
        let sink = run(&spcr(), ArchMask::ARM | ArchMask::AARCH64);
        assert!(sink.errors_of(crate::ErrorKind::Value).is_empty());
        assert!(sink.text().contains("Baud Rate"));
    }

    #[test]
    fn non_gic_interrupt_type_flagged_on_arm() {
        let mut buf = spcr();
        buf[52] = 1; // PC-AT 8259
        buf[53] = 4;
        let sink = run(&buf, ArchMask::ARM | ArchMask::AARCH64);
        let errors = sink.errors_of(crate::ErrorKind::Value);
        assert!(errors.iter().any(|e| e.contains("ARMH GIC")));
        assert!(errors.iter().any(|e| e.contains("IRQ must be zero")));
    }

    #[test]
    fn undefined_baud_rate_flagged() {
        let mut buf = spcr();
        buf[58] = 2;
        let sink = run(&buf, ArchMask::all());
        assert!(sink
            .errors_of(crate::ErrorKind::Value)
            .iter()
            .any(|e| e.contains("Baud Rate selector 2")));
    }
}
