//! Architecture compatibility masks.
//!
//! Some ACPI tables define structures which are only valid in a particular
//! CPU context. The MADT, for instance, describes both APIC and GIC
//! interrupt models. Each structure registry entry carries a mask of the
//! architectures it is defined for, and reporting compares that mask
//! against the build's own architecture set.

use bitflags::bitflags;

bitflags! {
    /// Architectures an ACPI structure type may appear on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ArchMask: u32 {
        /// 32-bit x86.
        const IA32 = 1 << 0;
        /// x86-64.
        const X64 = 1 << 1;
        /// 32-bit Arm.
        const ARM = 1 << 2;
        /// AArch64.
        const AARCH64 = 1 << 3;
        /// 64-bit RISC-V.
        const RISCV64 = 1 << 4;
    }
}

/// The architecture set this build reports for.
///
/// On Arm targets only GIC-model structures are expected; elsewhere the
/// inspector is assumed to be examining foreign tables (e.g. on a developer
/// host), so every structure type is accepted.
pub fn build_arch() -> ArchMask {
    #[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
    {
        ArchMask::ARM | ArchMask::AARCH64
    }
    #[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
    {
        ArchMask::all()
    }
}
