//! Round-trip tests: every table the generator accepts must parse under
//! the inspector with a valid checksum and zero errors in consistency
//! mode.

use acpi_inspect::tables;
use acpi_inspect::{BufferSink, Config, Trace};
use acpi_tablegen::objects::{GicCpuInterface, GicDistributor, GicIts, IdMapping, ItsGroup,
    ItsIdentifier, MemoryAffinity, NamedComponent, PciConfigSpace, Pmcg, RootComplex,
    SmmuInterrupt, SmmuV1V2, SmmuV3};
use acpi_tablegen::repo::Repository;
use acpi_tablegen::{iort, madt, mcfg, srat};
use acpi_tablegen::{MemoryRepository, TableInfo, TokenAllocator};

/// Parse a generated table and return the sink plus the error/warning
/// counters.
fn inspect(table: &[u8]) -> (BufferSink, u32, u32) {
    let mut sink = BufferSink::new();
    let (errors, warnings) = {
        let mut trace = Trace::new(&mut sink, Config::default());
        assert!(
            tables::verify_checksum(&mut trace, true, table),
            "generated table checksum must be zero"
        );
        let revision = table[8];
        tables::parse_table(&mut trace, true, table, revision);
        (trace.error_count(), trace.warning_count())
    };
    (sink, errors, warnings)
}

fn assert_clean(table: &[u8]) -> BufferSink {
    let (sink, errors, warnings) = inspect(table);
    assert_eq!(errors, 0, "inspector errors:\n{}", sink.text());
    assert_eq!(warnings, 0, "inspector warnings:\n{}", sink.text());
    sink
}

fn gicc(allocator: &TokenAllocator, uid: u32) -> GicCpuInterface {
    GicCpuInterface {
        token: allocator.allocate(),
        cpu_interface_number: uid,
        acpi_processor_uid: uid,
        flags: 1,
        mpidr: u64::from(uid) << 8,
        physical_base_address: 0x2C00_0000,
        gicr_base_address: 0x2F10_0000,
        spe_overflow_interrupt: 21,
        proximity_domain: 0,
        clock_domain: 0,
        affinity_flags: 1,
        ..Default::default()
    }
}

#[test]
fn generated_madt_parses_cleanly() {
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
    repo.add(
        None,
        &[GicIts {
            token: allocator.allocate(),
            gic_its_id: 0,
            physical_base_address: 0x2F02_0000,
            proximity_domain: 0,
        }],
    );

    let table = madt::build(&repo, &TableInfo::new(5)).unwrap();
    let sink = assert_clean(&table);

    let text = sink.text();
    assert!(text.contains("GICC[0]"));
    assert!(text.contains("GICC[1]"));
    assert!(text.contains("GICD[0]"));
    assert!(text.contains("GIC ITS[0]"));
}

#[test]
fn generated_madt_is_stable_across_runs() {
    let allocator = TokenAllocator::new();
    let mut repo = MemoryRepository::new();
    repo.add(None, &[gicc(&allocator, 0)]);
    repo.add(
        None,
        &[GicDistributor {
            token: allocator.allocate(),
            gic_version: 3,
            ..Default::default()
        }],
    );

    let table = madt::build(&repo, &TableInfo::new(5)).unwrap();
    let first = inspect(&table).0.text();
    let second = inspect(&table).0.text();
    assert_eq!(first, second);
}

#[test]
fn generated_mcfg_parses_cleanly() {
    let allocator = TokenAllocator::new();
    let mut repo = MemoryRepository::new();
    repo.add(
        None,
        &[
            PciConfigSpace {
                token: allocator.allocate(),
                base_address: 0xE000_0000,
                segment_group_number: 0,
                start_bus_number: 0,
                end_bus_number: 0xFF,
            },
            PciConfigSpace {
                token: allocator.allocate(),
                base_address: 0xF000_0000,
                segment_group_number: 1,
                start_bus_number: 0,
                end_bus_number: 0x7F,
            },
        ],
    );

    let table = mcfg::build(&repo, &TableInfo::new(1)).unwrap();
    let sink = assert_clean(&table);
    assert!(sink.text().contains("PCI Configuration Space[1]"));
}

#[test]
fn generated_srat_parses_cleanly() {
    let allocator = TokenAllocator::new();
    let mut repo = MemoryRepository::new();
    repo.add(None, &[gicc(&allocator, 0), gicc(&allocator, 1)]);
    repo.add(
        None,
        &[GicIts {
            token: allocator.allocate(),
            gic_its_id: 0,
            proximity_domain: 0,
            ..Default::default()
        }],
    );
    repo.add(
        None,
        &[MemoryAffinity {
            token: allocator.allocate(),
            proximity_domain: 0,
            base_address: 0x8000_0000,
            length: 0x8000_0000,
            flags: 1,
        }],
    );

    let table = srat::build(&repo, &TableInfo::new(3)).unwrap();
    let sink = assert_clean(&table);

    let text = sink.text();
    assert!(text.contains("GICC Affinity[0]"));
    assert!(text.contains("GICC Affinity[1]"));
    assert!(text.contains("GIC ITS Affinity[0]"));
    assert!(text.contains("Memory Affinity[0]"));
}

/// A platform with every IORT node kind cross-referencing through tokens.
fn full_iort_repo() -> MemoryRepository {
    let allocator = TokenAllocator::new();
    let mut repo = MemoryRepository::new();

    // ITS group with two identifiers.
    let its_group = allocator.allocate();
    let its_ids = allocator.allocate();
    repo.add(
        Some(its_ids),
        &[
            ItsIdentifier {
                token: allocator.allocate(),
                its_id: 1,
            },
            ItsIdentifier {
                token: allocator.allocate(),
                its_id: 2,
            },
        ],
    );
    repo.add(
        None,
        &[ItsGroup {
            token: its_group,
            its_id_count: 2,
            its_id_token: its_ids,
        }],
    );

    // SMMUv3 mapping its stream IDs to the ITS group.
    let smmu_v3 = allocator.allocate();
    let smmu_v3_maps = allocator.allocate();
    repo.add(
        Some(smmu_v3_maps),
        &[IdMapping {
            token: allocator.allocate(),
            input_base: 0,
            num_ids: 0xFFFF,
            output_base: 0,
            output_reference_token: its_group,
            flags: 0,
        }],
    );
    repo.add(
        None,
        &[SmmuV3 {
            token: smmu_v3,
            id_mapping_count: 1,
            id_mapping_token: smmu_v3_maps,
            base_address: 0x2B40_0000,
            event_interrupt: 0x6A,
            pri_interrupt: 0x6B,
            gerr_interrupt: 0x6C,
            sync_interrupt: 0x6D,
            ..Default::default()
        }],
    );

    // Root complex routed through the SMMUv3.
    let rc_maps = allocator.allocate();
    repo.add(
        Some(rc_maps),
        &[IdMapping {
            token: allocator.allocate(),
            input_base: 0,
            num_ids: 0xFFFF,
            output_base: 0,
            output_reference_token: smmu_v3,
            flags: 0,
        }],
    );
    repo.add(
        None,
        &[RootComplex {
            token: allocator.allocate(),
            id_mapping_count: 1,
            id_mapping_token: rc_maps,
            cache_coherent: 1,
            pci_segment_number: 0,
            memory_address_size: 48,
            ..Default::default()
        }],
    );

    // Named component behind an SMMUv1/2 with one context interrupt.
    let smmu_v1 = allocator.allocate();
    let context_ints = allocator.allocate();
    repo.add(
        Some(context_ints),
        &[SmmuInterrupt {
            token: allocator.allocate(),
            interrupt: 0x90,
            flags: 1,
        }],
    );
    repo.add(
        None,
        &[SmmuV1V2 {
            token: smmu_v1,
            base_address: 0x2B00_0000,
            span: 0x10000,
            model: 2,
            context_interrupt_count: 1,
            context_interrupt_token: context_ints,
            smmu_ns_g_irpt: 0x91,
            smmu_ns_g_irpt_flags: 1,
            smmu_ns_g_cfg_irpt: 0x92,
            smmu_ns_g_cfg_irpt_flags: 1,
            ..Default::default()
        }],
    );

    let nc_maps = allocator.allocate();
    repo.add(
        Some(nc_maps),
        &[IdMapping {
            token: allocator.allocate(),
            input_base: 0,
            num_ids: 1,
            output_base: 0x100,
            output_reference_token: smmu_v1,
            flags: 0,
        }],
    );
    repo.add(
        None,
        &[NamedComponent {
            token: allocator.allocate(),
            id_mapping_count: 1,
            id_mapping_token: nc_maps,
            address_size_limit: 44,
            object_name: String::from("\\_SB.USB0"),
            ..Default::default()
        }],
    );

    // PMCG observing the SMMUv3.
    repo.add(
        None,
        &[Pmcg {
            token: allocator.allocate(),
            base_address: 0x2B42_0000,
            overflow_interrupt: 0x80,
            reference_token: smmu_v3,
            ..Default::default()
        }],
    );

    repo
}

#[test]
fn generated_iort_parses_cleanly() {
    let repo = full_iort_repo();
    let table = iort::build(&repo, &TableInfo::new(0)).unwrap();
    let sink = assert_clean(&table);

    let text = sink.text();
    assert!(text.contains("ITS Group[0]"));
    assert!(text.contains("Named Component[0]"));
    assert!(text.contains("\\_SB.USB0"));
    assert!(text.contains("Root Complex[0]"));
    assert!(text.contains("SMMUv1 or SMMUv2[0]"));
    assert!(text.contains("SMMUv3[0]"));
    assert!(text.contains("PMCG[0]"));
    assert!(text.contains("ID Mapping[0]"));
    assert!(text.contains("Context Interrupts Array[0]"));
}

#[test]
fn iort_id_mappings_stay_within_node_lengths() {
    let repo = full_iort_repo();
    let table = iort::build(&repo, &TableInfo::new(0)).unwrap();

    // Walk the emitted nodes and check the invariant on each header:
    // mapping offset + count * mapping size <= node length.
    let node_offset = u32::from_le_bytes(table[40..44].try_into().unwrap()) as usize;
    let node_count = u32::from_le_bytes(table[36..40].try_into().unwrap()) as usize;

    let mut offset = node_offset;
    for _ in 0..node_count {
        let length = u16::from_le_bytes(table[offset + 1..offset + 3].try_into().unwrap()) as usize;
        let count =
            u32::from_le_bytes(table[offset + 8..offset + 12].try_into().unwrap()) as usize;
        let mapping_offset =
            u32::from_le_bytes(table[offset + 12..offset + 16].try_into().unwrap()) as usize;
        if count > 0 {
            assert!(mapping_offset + count * 20 <= length);
        }
        offset += length;
    }
    assert_eq!(offset, table.len());
}
