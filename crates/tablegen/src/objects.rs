//! Abstract platform-description objects.
//!
//! Plain typed records with no knowledge of ACPI layout; the table
//! generators translate them into packed structures. Relationships
//! between objects use cross-reference tokens. Every object carries its
//! own token as the first field.

use alloc::string::String;

use crate::repo::{ObjectId, PlatformObject, Token};

macro_rules! platform_object {
    ($ty:ty, $id:expr) => {
        impl PlatformObject for $ty {
            const ID: ObjectId = $id;

            fn token(&self) -> Token {
                self.token
            }
        }
    };
}

/// GIC CPU interface description; becomes a MADT GICC structure and a
/// SRAT GICC affinity structure.
#[derive(Debug, Clone, Default)]
pub struct GicCpuInterface {
    /// Cross-reference token of this object.
    pub token: Token,
    /// GIC CPU interface number.
    pub cpu_interface_number: u32,
    /// ACPI processor UID; unique per CPU.
    pub acpi_processor_uid: u32,
    /// GICC flags.
    pub flags: u32,
    /// Parking protocol version.
    pub parking_protocol_version: u32,
    /// Performance monitoring interrupt GSIV.
    pub performance_interrupt_gsiv: u32,
    /// Parked address (parking protocol).
    pub parked_address: u64,
    /// Physical base address of the CPU interface.
    pub physical_base_address: u64,
    /// Virtual GIC CPU interface base address.
    pub gicv: u64,
    /// Hypervisor GIC CPU interface base address.
    pub gich: u64,
    /// Virtual GIC maintenance interrupt.
    pub vgic_maintenance_interrupt: u32,
    /// Redistributor base address (GICv3+).
    pub gicr_base_address: u64,
    /// The processor's MPIDR.
    pub mpidr: u64,
    /// Processor power efficiency class.
    pub processor_power_efficiency_class: u8,
    /// Statistical profiling extension overflow interrupt (PPI).
    pub spe_overflow_interrupt: u16,
    /// Proximity domain for the SRAT GICC affinity structure.
    pub proximity_domain: u32,
    /// Clock domain for the SRAT GICC affinity structure.
    pub clock_domain: u32,
    /// Affinity structure flags for the SRAT.
    pub affinity_flags: u32,
}
platform_object!(GicCpuInterface, ObjectId::GicCpuInterface);

/// GIC distributor description.
#[derive(Debug, Clone, Default)]
pub struct GicDistributor {
    /// Cross-reference token of this object.
    pub token: Token,
    /// Physical base address of the distributor.
    pub physical_base_address: u64,
    /// GIC version (1-4).
    pub gic_version: u8,
}
platform_object!(GicDistributor, ObjectId::GicDistributor);

/// GIC MSI frame description.
#[derive(Debug, Clone, Default)]
pub struct GicMsiFrame {
    /// Cross-reference token of this object.
    pub token: Token,
    /// MSI frame identifier.
    pub gic_msi_frame_id: u32,
    /// Physical base address of the frame.
    pub physical_base_address: u64,
    /// MSI frame flags.
    pub flags: u32,
    /// Number of SPIs the frame can generate.
    pub spi_count: u16,
    /// First SPI number the frame can generate.
    pub spi_base: u16,
}
platform_object!(GicMsiFrame, ObjectId::GicMsiFrame);

/// GIC redistributor discovery range.
#[derive(Debug, Clone, Default)]
pub struct GicRedistributor {
    /// Cross-reference token of this object.
    pub token: Token,
    /// Base of the redistributor discovery range.
    pub discovery_range_base_address: u64,
    /// Length of the discovery range in bytes.
    pub discovery_range_length: u32,
}
platform_object!(GicRedistributor, ObjectId::GicRedistributor);

/// GIC interrupt translation service description.
#[derive(Debug, Clone, Default)]
pub struct GicIts {
    /// Cross-reference token of this object.
    pub token: Token,
    /// GIC ITS identifier.
    pub gic_its_id: u32,
    /// Physical base address of the ITS.
    pub physical_base_address: u64,
    /// Proximity domain for the SRAT ITS affinity structure.
    pub proximity_domain: u32,
}
platform_object!(GicIts, ObjectId::GicIts);

/// IORT ITS group node.
#[derive(Debug, Clone, Default)]
pub struct ItsGroup {
    /// Cross-reference token of this node.
    pub token: Token,
    /// Number of ITS identifiers in the group.
    pub its_id_count: u32,
    /// Token of the [`ItsIdentifier`] list.
    pub its_id_token: Token,
}
platform_object!(ItsGroup, ObjectId::ItsGroup);

/// IORT named component node.
#[derive(Debug, Clone, Default)]
pub struct NamedComponent {
    /// Cross-reference token of this node.
    pub token: Token,
    /// Number of ID mappings.
    pub id_mapping_count: u32,
    /// Token of the [`IdMapping`] list.
    pub id_mapping_token: Token,
    /// Node flags.
    pub flags: u32,
    /// Memory access properties: cache coherence.
    pub cache_coherent: u32,
    /// Memory access properties: allocation hints.
    pub allocation_hints: u8,
    /// Memory access properties: access flags.
    pub memory_access_flags: u8,
    /// Device memory address size limit.
    pub address_size_limit: u8,
    /// ACPI namespace path of the device, e.g. `\\_SB.USB0`.
    pub object_name: String,
}
platform_object!(NamedComponent, ObjectId::NamedComponent);

/// IORT root complex node.
#[derive(Debug, Clone, Default)]
pub struct RootComplex {
    /// Cross-reference token of this node.
    pub token: Token,
    /// Number of ID mappings.
    pub id_mapping_count: u32,
    /// Token of the [`IdMapping`] list.
    pub id_mapping_token: Token,
    /// Memory access properties: cache coherence.
    pub cache_coherent: u32,
    /// Memory access properties: allocation hints.
    pub allocation_hints: u8,
    /// Memory access properties: access flags.
    pub memory_access_flags: u8,
    /// ATS attributes.
    pub ats_attribute: u32,
    /// PCI segment number.
    pub pci_segment_number: u32,
    /// Memory address size limit.
    pub memory_address_size: u8,
}
platform_object!(RootComplex, ObjectId::RootComplex);

/// IORT SMMUv1/v2 node.
#[derive(Debug, Clone, Default)]
pub struct SmmuV1V2 {
    /// Cross-reference token of this node.
    pub token: Token,
    /// Number of ID mappings.
    pub id_mapping_count: u32,
    /// Token of the [`IdMapping`] list.
    pub id_mapping_token: Token,
    /// SMMU base address.
    pub base_address: u64,
    /// Length of the memory range covered by the SMMU.
    pub span: u64,
    /// SMMU model.
    pub model: u32,
    /// SMMU flags.
    pub flags: u32,
    /// Number of context interrupts.
    pub context_interrupt_count: u32,
    /// Token of the context [`SmmuInterrupt`] list.
    pub context_interrupt_token: Token,
    /// Number of PMU interrupts.
    pub pmu_interrupt_count: u32,
    /// Token of the PMU [`SmmuInterrupt`] list.
    pub pmu_interrupt_token: Token,
    /// SMMU_NSgIrpt interrupt number.
    pub smmu_ns_g_irpt: u32,
    /// SMMU_NSgIrpt flags.
    pub smmu_ns_g_irpt_flags: u32,
    /// SMMU_NSgCfgIrpt interrupt number.
    pub smmu_ns_g_cfg_irpt: u32,
    /// SMMU_NSgCfgIrpt flags.
    pub smmu_ns_g_cfg_irpt_flags: u32,
}
platform_object!(SmmuV1V2, ObjectId::SmmuV1V2);

/// IORT SMMUv3 node.
#[derive(Debug, Clone, Default)]
pub struct SmmuV3 {
    /// Cross-reference token of this node.
    pub token: Token,
    /// Number of ID mappings.
    pub id_mapping_count: u32,
    /// Token of the [`IdMapping`] list.
    pub id_mapping_token: Token,
    /// SMMU base address.
    pub base_address: u64,
    /// SMMU flags (bit 3: proximity domain valid).
    pub flags: u32,
    /// VATOS address.
    pub vatos_address: u64,
    /// SMMU model.
    pub model: u32,
    /// Event queue interrupt GSIV.
    pub event_interrupt: u32,
    /// PRI queue interrupt GSIV.
    pub pri_interrupt: u32,
    /// Global error interrupt GSIV.
    pub gerr_interrupt: u32,
    /// Sync complete interrupt GSIV.
    pub sync_interrupt: u32,
    /// Proximity domain; written only when the flag is set.
    pub proximity_domain: u32,
    /// Index into the ID mapping array for the device ID; ignored when
    /// all four control interrupts are GSIV based.
    pub device_id_mapping_index: u32,
}
platform_object!(SmmuV3, ObjectId::SmmuV3);

/// IORT performance monitoring counter group node.
#[derive(Debug, Clone, Default)]
pub struct Pmcg {
    /// Cross-reference token of this node.
    pub token: Token,
    /// Number of ID mappings.
    pub id_mapping_count: u32,
    /// Token of the [`IdMapping`] list.
    pub id_mapping_token: Token,
    /// Page 0 base address.
    pub base_address: u64,
    /// Overflow interrupt GSIV.
    pub overflow_interrupt: u32,
    /// Page 1 base address.
    pub page1_base_address: u64,
    /// Token of the node the counter group observes.
    pub reference_token: Token,
}
platform_object!(Pmcg, ObjectId::Pmcg);

/// One IORT ID mapping.
#[derive(Debug, Clone, Default)]
pub struct IdMapping {
    /// Cross-reference token of this object.
    pub token: Token,
    /// First ID in the input range.
    pub input_base: u32,
    /// Number of IDs in the range.
    pub num_ids: u32,
    /// First ID in the output range.
    pub output_base: u32,
    /// Token of the node the output range targets.
    pub output_reference_token: Token,
    /// Mapping flags.
    pub flags: u32,
}
platform_object!(IdMapping, ObjectId::IdMapping);

/// One SMMU interrupt array element.
#[derive(Debug, Clone, Default)]
pub struct SmmuInterrupt {
    /// Cross-reference token of this object.
    pub token: Token,
    /// Interrupt GSIV.
    pub interrupt: u32,
    /// Interrupt flags.
    pub flags: u32,
}
platform_object!(SmmuInterrupt, ObjectId::SmmuInterrupt);

/// One GIC ITS identifier array element.
#[derive(Debug, Clone, Default)]
pub struct ItsIdentifier {
    /// Cross-reference token of this object.
    pub token: Token,
    /// The ITS identifier.
    pub its_id: u32,
}
platform_object!(ItsIdentifier, ObjectId::ItsIdentifier);

/// PCI configuration space description; becomes an MCFG allocation record.
#[derive(Debug, Clone, Default)]
pub struct PciConfigSpace {
    /// Cross-reference token of this object.
    pub token: Token,
    /// ECAM base address.
    pub base_address: u64,
    /// PCI segment group number.
    pub segment_group_number: u16,
    /// First bus number decoded.
    pub start_bus_number: u8,
    /// Last bus number decoded.
    pub end_bus_number: u8,
}
platform_object!(PciConfigSpace, ObjectId::PciConfigSpace);

/// Memory affinity description; becomes a SRAT memory affinity structure.
#[derive(Debug, Clone, Default)]
pub struct MemoryAffinity {
    /// Cross-reference token of this object.
    pub token: Token,
    /// Proximity domain of the range.
    pub proximity_domain: u32,
    /// Base physical address of the range.
    pub base_address: u64,
    /// Length of the range in bytes.
    pub length: u64,
    /// Memory affinity flags.
    pub flags: u32,
}
platform_object!(MemoryAffinity, ObjectId::MemoryAffinity);

/// Device handle types for generic initiator affinity structures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceHandleType {
    /// An ACPI device handle.
    #[default]
    Acpi,
    /// A PCI device handle.
    Pci,
}

/// Generic initiator affinity description.
#[derive(Debug, Clone, Default)]
pub struct GenericInitiatorAffinity {
    /// Cross-reference token of this object.
    pub token: Token,
    /// Proximity domain of the initiator.
    pub proximity_domain: u32,
    /// Affinity structure flags.
    pub flags: u32,
    /// Which kind of device handle `device_handle_token` resolves to.
    pub device_handle_type: DeviceHandleType,
    /// Token of the [`DeviceHandleAcpi`] or [`DeviceHandlePci`] object.
    pub device_handle_token: Token,
}
platform_object!(GenericInitiatorAffinity, ObjectId::GenericInitiatorAffinity);

/// ACPI device handle for a generic initiator.
#[derive(Debug, Clone, Default)]
pub struct DeviceHandleAcpi {
    /// Cross-reference token of this object.
    pub token: Token,
    /// The device's _HID, packed as 8 ASCII bytes.
    pub hid: u64,
    /// The device's _UID.
    pub uid: u32,
}
platform_object!(DeviceHandleAcpi, ObjectId::DeviceHandleAcpi);

/// PCI device handle for a generic initiator.
#[derive(Debug, Clone, Default)]
pub struct DeviceHandlePci {
    /// Cross-reference token of this object.
    pub token: Token,
    /// PCI segment number.
    pub segment_number: u16,
    /// PCI bus number.
    pub bus_number: u8,
    /// PCI device number.
    pub device_number: u8,
    /// PCI function number.
    pub function_number: u8,
}
platform_object!(DeviceHandlePci, ObjectId::DeviceHandlePci);

impl DeviceHandlePci {
    /// The device address in BDF format: bus in bits [15:8], device in
    /// bits [7:3], function in bits [2:0].
    #[must_use]
    pub fn bdf(&self) -> u16 {
        u16::from(self.bus_number) << 8
            | u16::from(self.device_number & 0x1F) << 3
            | u16::from(self.function_number & 0x7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bdf_packs_bus_device_function() {
        let handle = DeviceHandlePci {
            bus_number: 0x20,
            device_number: 0x1F,
            function_number: 0x7,
            ..Default::default()
        };
        assert_eq!(handle.bdf(), 0x20FF);
    }
}
