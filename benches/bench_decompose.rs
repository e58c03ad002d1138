//! Decomposition and builtin resolution benchmarks.
//!
//! Geometries: 1D/2D/3D walker splits with and without remainders.
//! Builtins: misaligned buffer copy and aux translation over many objects,
//! resolved through an in-memory embedded storage.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use builtin_dispatch::resource::{resource_name, EmbeddedStorage};
use builtin_dispatch::{
    decompose, AuxTranslationDirection, BuiltinCode, BuiltinOp, BuiltinOpParams, BuiltinResolver, CodeKind,
    ContextId, Device, DeviceCapabilities, DispatchConfig, EmbeddedRegistry, HardwareFamily, KernelInstance,
    MemoryTarget, RegionBinding, ResourceCache, SplitPolicy, Storage, WorkGeometry,
};

const GEOMETRIES: &[(&str, [usize; 3], [usize; 3])] = &[
    ("1d_even", [1 << 20, 0, 0], [256, 0, 0]),
    ("1d_remainder", [1_000_003, 0, 0], [256, 0, 0]),
    ("2d_remainder", [1920, 1081, 0], [16, 16, 0]),
    ("3d_remainder", [257, 129, 65], [8, 8, 4]),
];

fn bench_walker_split(c: &mut Criterion) {
    let kernel = KernelInstance::new("user", BuiltinCode::new(CodeKind::Binary, vec![0u8; 64]));
    let mut group = c.benchmark_group("walker_split");
    for (name, global, local) in GEOMETRIES {
        let binding = [RegionBinding::whole(WorkGeometry::new(*global, *local, [0, 0, 0]), kernel.clone())];
        group.bench_with_input(BenchmarkId::from_parameter(name), &binding, |b, binding| {
            b.iter(|| decompose(black_box(SplitPolicy::WalkerSplit), black_box(binding)))
        });
    }
    group.finish();
}

fn resolver() -> BuiltinResolver {
    let _ = env_logger::try_init();
    let device = Arc::new(
        Device::new(DeviceCapabilities::for_family(HardwareFamily::Gen12Lp)).expect("registered family"),
    );
    let registry = Arc::new(EmbeddedRegistry::new());
    for op in BuiltinOp::ALL {
        let name = resource_name(
            op.resource_name(),
            device.addressing_mode(op.is_stateless()),
            CodeKind::Binary,
            None,
        );
        registry.store(name, vec![0u8; 256]);
    }
    let storages: Vec<Box<dyn Storage>> = vec![Box::new(EmbeddedStorage::with_registry("", registry))];
    BuiltinResolver::new(device, Arc::new(ResourceCache::new(storages)), DispatchConfig::default())
}

fn bench_builtins(c: &mut Criterion) {
    let resolver = resolver();
    let mut group = c.benchmark_group("builtins");

    let copy = BuiltinOpParams::copy_buffer(
        MemoryTarget::new(1, 0x10_0006, 1 << 20),
        MemoryTarget::new(2, 0x20_0005, 1 << 20),
        0,
        0,
        1 << 19,
    );
    group.bench_function("copy_buffer_misaligned", |b| {
        b.iter(|| resolver.resolve(BuiltinOp::CopyBufferToBuffer, black_box(&copy), ContextId(0)))
    });

    for count in [4usize, 32, 128] {
        let targets = (0..count as u64)
            .map(|id| MemoryTarget::new(id, id << 24, 1 << 16).compressed())
            .collect();
        let aux = BuiltinOpParams::aux_translation(targets, AuxTranslationDirection::AuxToNonAux);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("aux_translation", count), &aux, |b, aux| {
            b.iter(|| resolver.resolve(BuiltinOp::AuxTranslation, black_box(aux), ContextId(0)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walker_split, bench_builtins);
criterion_main!(benches);
