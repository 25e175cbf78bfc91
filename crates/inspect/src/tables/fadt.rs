//! Fixed ACPI Description Table (FADT) parsing.
//!
//! The complete ACPI 6.3 field layout, including the extended 64-bit
//! register blocks rendered as nested Generic Address Structures. On Arm
//! builds the legacy 32-bit FACS/DSDT pointers must be zero and the
//! hardware-reduced flag must be set.

use crate::arch::ArchMask;
use crate::bytes;
use crate::parser::{parse_fields, render_gas, Captures, FieldDescriptor, FieldFormat, Validator,
    ValidatorContext};
use crate::trace::{ErrorKind, Trace};
use crate::{acpi_error, with_acpi_header};

/// FADT table signature.
pub const SIGNATURE: &[u8; 4] = b"FACP";

/// Fixed feature flag: the platform is hardware-reduced ACPI.
const HW_REDUCED_ACPI: u32 = 1 << 20;

fn arm_build(t: &Trace) -> bool {
    t.arch() == ArchMask::ARM.union(ArchMask::AARCH64)
}

/// Legacy 32-bit pointers are not used on hardware-reduced Arm platforms.
fn validate_legacy_pointer(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if !arm_build(t) {
        return;
    }
    if bytes::read_u32(field, 0).unwrap_or(0) != 0 {
        acpi_error!(
            t,
            ErrorKind::Value,
            "Legacy 32-bit pointer must be zero on Arm platforms"
        );
    }
}

/// Arm platforms must set the HW_REDUCED_ACPI fixed feature flag.
fn validate_fixed_flags(t: &mut Trace, field: &[u8], _ctx: ValidatorContext) {
    if !arm_build(t) {
        return;
    }
    let flags = bytes::read_u32(field, 0).unwrap_or(0);
    if flags & HW_REDUCED_ACPI == 0 {
        acpi_error!(
            t,
            ErrorKind::Value,
            "HW_REDUCED_ACPI flag must be set on Arm platforms"
        );
    }
}

/// Fields of the FADT, header included.
static FADT_FIELDS: &[FieldDescriptor] = with_acpi_header![
    FieldDescriptor::new("FIRMWARE_CTRL", 4, 36, FieldFormat::Hex)
        .validate(validate_legacy_pointer as Validator),
    FieldDescriptor::new("DSDT", 4, 40, FieldFormat::Hex)
        .validate(validate_legacy_pointer as Validator),
    FieldDescriptor::new("Reserved", 1, 44, FieldFormat::Hex),
    FieldDescriptor::new("Preferred_PM_Profile", 1, 45, FieldFormat::Hex),
    FieldDescriptor::new("SCI_INT", 2, 46, FieldFormat::Hex),
    FieldDescriptor::new("SMI_CMD", 4, 48, FieldFormat::Hex),
    FieldDescriptor::new("ACPI_ENABLE", 1, 52, FieldFormat::Hex),
    FieldDescriptor::new("ACPI_DISABLE", 1, 53, FieldFormat::Hex),
    FieldDescriptor::new("S4BIOS_REQ", 1, 54, FieldFormat::Hex),
    FieldDescriptor::new("PSTATE_CNT", 1, 55, FieldFormat::Hex),
    FieldDescriptor::new("PM1a_EVT_BLK", 4, 56, FieldFormat::Hex),
    FieldDescriptor::new("PM1b_EVT_BLK", 4, 60, FieldFormat::Hex),
    FieldDescriptor::new("PM1a_CNT_BLK", 4, 64, FieldFormat::Hex),
    FieldDescriptor::new("PM1b_CNT_BLK", 4, 68, FieldFormat::Hex),
    FieldDescriptor::new("PM2_CNT_BLK", 4, 72, FieldFormat::Hex),
    FieldDescriptor::new("PM_TMR_BLK", 4, 76, FieldFormat::Hex),
    FieldDescriptor::new("GPE0_BLK", 4, 80, FieldFormat::Hex),
    FieldDescriptor::new("GPE1_BLK", 4, 84, FieldFormat::Hex),
    FieldDescriptor::new("PM1_EVT_LEN", 1, 88, FieldFormat::Dec),
    FieldDescriptor::new("PM1_CNT_LEN", 1, 89, FieldFormat::Dec),
    FieldDescriptor::new("PM2_CNT_LEN", 1, 90, FieldFormat::Dec),
    FieldDescriptor::new("PM_TMR_LEN", 1, 91, FieldFormat::Dec),
    FieldDescriptor::new("GPE0_BLK_LEN", 1, 92, FieldFormat::Dec),
    FieldDescriptor::new("GPE1_BLK_LEN", 1, 93, FieldFormat::Dec),
    FieldDescriptor::new("GPE1_BASE", 1, 94, FieldFormat::Hex),
    FieldDescriptor::new("CST_CNT", 1, 95, FieldFormat::Hex),
    FieldDescriptor::new("P_LVL2_LAT", 2, 96, FieldFormat::Dec),
    FieldDescriptor::new("P_LVL3_LAT", 2, 98, FieldFormat::Dec),
    FieldDescriptor::new("FLUSH_SIZE", 2, 100, FieldFormat::Dec),
    FieldDescriptor::new("FLUSH_STRIDE", 2, 102, FieldFormat::Dec),
    FieldDescriptor::new("DUTY_OFFSET", 1, 104, FieldFormat::Dec),
    FieldDescriptor::new("DUTY_WIDTH", 1, 105, FieldFormat::Dec),
    FieldDescriptor::new("DAY_ALRM", 1, 106, FieldFormat::Hex),
    FieldDescriptor::new("MON_ALRM", 1, 107, FieldFormat::Hex),
    FieldDescriptor::new("CENTURY", 1, 108, FieldFormat::Hex),
    FieldDescriptor::new("IAPC_BOOT_ARCH", 2, 109, FieldFormat::Hex),
    FieldDescriptor::new("Reserved", 1, 111, FieldFormat::Hex),
    FieldDescriptor::new("Flags", 4, 112, FieldFormat::Hex)
        .validate(validate_fixed_flags as Validator),
    FieldDescriptor::rendered("RESET_REG", 12, 116, render_gas),
    FieldDescriptor::new("RESET_VALUE", 1, 128, FieldFormat::Hex),
    FieldDescriptor::new("ARM_BOOT_ARCH", 2, 129, FieldFormat::Hex),
    FieldDescriptor::new("FADT Minor Version", 1, 131, FieldFormat::Dec),
    FieldDescriptor::new("X_FIRMWARE_CTRL", 8, 132, FieldFormat::Hex),
    FieldDescriptor::new("X_DSDT", 8, 140, FieldFormat::Hex),
    FieldDescriptor::rendered("X_PM1a_EVT_BLK", 12, 148, render_gas),
    FieldDescriptor::rendered("X_PM1b_EVT_BLK", 12, 160, render_gas),
    FieldDescriptor::rendered("X_PM1a_CNT_BLK", 12, 172, render_gas),
    FieldDescriptor::rendered("X_PM1b_CNT_BLK", 12, 184, render_gas),
    FieldDescriptor::rendered("X_PM2_CNT_BLK", 12, 196, render_gas),
    FieldDescriptor::rendered("X_PM_TMR_BLK", 12, 208, render_gas),
    FieldDescriptor::rendered("X_GPE0_BLK", 12, 220, render_gas),
    FieldDescriptor::rendered("X_GPE1_BLK", 12, 232, render_gas),
    FieldDescriptor::rendered("SLEEP_CONTROL_REG", 12, 244, render_gas),
    FieldDescriptor::rendered("SLEEP_STATUS_REG", 12, 256, render_gas),
    FieldDescriptor::new("Hypervisor VendorIdentity", 8, 268, FieldFormat::Hex),
];

/// Parse the FADT.
pub fn parse(t: &mut Trace, tracing: bool, buf: &[u8], _revision: u8) {
    let mut captures = Captures::new();
    parse_fields(t, tracing, 0, Some("FADT"), buf, FADT_FIELDS, &mut captures);
}
