//! Builtin resolution end to end: embedded and file storages, resolver,
//! kernel patching and decomposition.

use std::sync::Arc;

use builtin_dispatch::dispatch::RegionX;
use builtin_dispatch::resource::{resource_name, EmbeddedStorage, FileStorage};
use builtin_dispatch::{
    AuxTranslationDirection, BuiltinOp, BuiltinOpParams, BuiltinOwnership, BuiltinResolver, CodeKind, ContextId,
    Device, DeviceCapabilities, DispatchConfig, DispatchError, EmbeddedRegistry, HardwareFamily, MemoryTarget,
    ResourceCache, Storage, Vec3,
};

const CTX: ContextId = ContextId(1);

/// `RUST_LOG=builtin_dispatch=debug` shows resolver and cache decisions.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn device(caps: DeviceCapabilities) -> Arc<Device> {
    init_logging();
    Arc::new(Device::new(caps).unwrap())
}

/// Resolver whose embedded table holds a binary for every operation.
fn resolver_with_all(caps: DeviceCapabilities) -> BuiltinResolver {
    let device = device(caps);
    let registry = Arc::new(EmbeddedRegistry::new());
    for op in BuiltinOp::ALL {
        let addressing = device.addressing_mode(op.is_stateless());
        let name = resource_name(op.resource_name(), addressing, CodeKind::Binary, None);
        registry.store(name, vec![0x7F, b'E', b'L', b'F']);
    }
    let storages: Vec<Box<dyn Storage>> = vec![Box::new(EmbeddedStorage::with_registry("", registry))];
    BuiltinResolver::new(device, Arc::new(ResourceCache::new(storages)), DispatchConfig::default())
}

fn gen12() -> DeviceCapabilities {
    DeviceCapabilities::for_family(HardwareFamily::Gen12Lp)
}

// ============================================================================
// Buffer copy and fill
// ============================================================================

#[test]
fn test_copy_misaligned_destination_and_source() {
    let resolver = resolver_with_all(gen12());
    let src = MemoryTarget::new(1, 0x2_0000 + 6, 4096);
    let dst = MemoryTarget::new(2, 0x1_0000 + 5, 4096);
    let params = BuiltinOpParams::copy_buffer(src, dst, 0, 0, 1000);

    let seq = resolver.resolve(BuiltinOp::CopyBufferToBuffer, &params, CTX).unwrap();
    assert_eq!(seq.op(), Some(BuiltinOp::CopyBufferToBuffer));
    assert_eq!(seq.len(), 3);

    let names: Vec<&str> = seq.iter().map(|d| d.kernel.name()).collect();
    assert_eq!(
        names,
        vec![
            "CopyBufferToBufferLeftLeftover",
            "CopyBufferToBufferMiddleMisaligned",
            "CopyBufferToBufferRightLeftover",
        ]
    );

    let (left, middle, right) = (&seq.descriptors()[0], &seq.descriptors()[1], &seq.descriptors()[2]);
    assert_eq!(left.region.x, RegionX::Left);
    assert_eq!(left.global_size.x, 59);
    assert_eq!(middle.global_size.x, 896 / 16);
    assert_eq!(right.global_size.x, 45);

    assert_eq!(middle.kernel.scalar_arg::<u32>(4), Some(8));
    assert_eq!(middle.kernel.scalar_arg::<u32>(2), Some(59));
    assert_eq!(middle.kernel.scalar_arg::<u32>(3), Some(59));
    assert_eq!(right.kernel.scalar_arg::<u32>(2), Some(59 + 896));
    assert_eq!(left.kernel.buffer_arg(0), Some(&src));
    assert_eq!(left.kernel.buffer_arg(1), Some(&dst));
}

#[test]
fn test_copy_aligned_uses_bulk_kernel_only() {
    let resolver = resolver_with_all(gen12());
    let src = MemoryTarget::new(1, 0x2_0000, 8192);
    let dst = MemoryTarget::new(2, 0x4_0000, 8192);
    let params = BuiltinOpParams::copy_buffer(src, dst, 0, 0, 4096);

    let seq = resolver.resolve(BuiltinOp::CopyBufferToBuffer, &params, CTX).unwrap();
    assert_eq!(seq.len(), 1);
    let middle = &seq.descriptors()[0];
    assert_eq!(middle.kernel.name(), "CopyBufferToBufferMiddle");
    assert_eq!(middle.global_size.x, 256);
    assert_eq!(middle.kernel.scalar_arg::<u32>(4), None);
}

#[test]
fn test_copy_covers_every_byte() {
    let resolver = resolver_with_all(gen12());
    let src = MemoryTarget::new(1, 0x1000, 4096);
    let dst = MemoryTarget::new(2, 0x2000, 4096);
    for size in [104, 1000, 4000] {
        let params = BuiltinOpParams::copy_buffer(src, dst, 0, 0, size);
        let seq = resolver.resolve(BuiltinOp::CopyBufferToBuffer, &params, CTX).unwrap();
        let covered: usize = seq
            .iter()
            .map(|d| match d.kernel.name() {
                "CopyBufferToBufferMiddle" | "CopyBufferToBufferMiddleMisaligned" => d.global_size.x * 16,
                _ => d.global_size.x,
            })
            .sum();
        assert_eq!(covered, size, "size {}", size);
    }
}

#[test]
fn test_device_rejects_cache_line_splitting_elements() {
    let mut caps = gen12();
    caps.cache_line_size = 8;
    assert!(matches!(Device::new(caps), Err(DispatchError::Config(_))));
}

#[test]
fn test_copy_zero_size_is_empty() {
    let resolver = resolver_with_all(gen12());
    let params = BuiltinOpParams::copy_buffer(MemoryTarget::new(1, 0, 64), MemoryTarget::new(2, 0, 64), 0, 0, 0);
    let seq = resolver.resolve(BuiltinOp::CopyBufferToBuffer, &params, CTX).unwrap();
    assert!(seq.is_empty());
}

#[test]
fn test_copy_to_system_memory_flags_kernels() {
    let resolver = resolver_with_all(gen12());
    let src = MemoryTarget::new(1, 0x2_0003, 4096);
    let dst = MemoryTarget::new(2, 0x8_0001, 4096).in_system_memory();
    let params = BuiltinOpParams::copy_buffer(src, dst, 0, 0, 500);

    let seq = resolver.resolve(BuiltinOp::CopyBufferToBuffer, &params, CTX).unwrap();
    assert!(!seq.is_empty());
    assert!(seq.iter().all(|d| d.kernel.flags().destination_in_system_memory));
}

#[test]
fn test_force_stateless_binds_64bit_offsets() {
    let mut caps = gen12();
    caps.force_stateless = true;
    let resolver = resolver_with_all(caps);
    let src = MemoryTarget::new(1, 0x2_0000, 8192);
    let dst = MemoryTarget::new(2, 0x4_0000 + 8, 8192);
    let params = BuiltinOpParams::copy_buffer(src, dst, 0, 16, 1024);

    let seq = resolver.resolve(BuiltinOp::CopyBufferToBuffer, &params, CTX).unwrap();
    assert_eq!(seq.op(), Some(BuiltinOp::CopyBufferToBufferStateless));
    let left = &seq.descriptors()[0];
    assert_eq!(left.kernel.scalar_arg::<u64>(3), Some(16));
    assert_eq!(left.kernel.scalar_arg::<u32>(3), None);
}

#[test]
fn test_fill_aligned_range() {
    let resolver = resolver_with_all(gen12());
    let pattern = MemoryTarget::new(9, 0x100, 4);
    let dst = MemoryTarget::new(2, 0x4000, 1024);
    let params = BuiltinOpParams::fill_buffer(pattern, dst, 0, 256);

    let seq = resolver.resolve(BuiltinOp::FillBuffer, &params, CTX).unwrap();
    assert_eq!(seq.len(), 1);
    let middle = &seq.descriptors()[0];
    assert_eq!(middle.kernel.name(), "FillBufferMiddle");
    assert_eq!(middle.global_size.x, 64);
    assert_eq!(middle.kernel.scalar_arg::<u32>(3), Some(1));
    assert_eq!(middle.kernel.buffer_arg(2), Some(&pattern));
}

#[test]
fn test_fill_unaligned_has_leftovers() {
    let resolver = resolver_with_all(gen12());
    let pattern = MemoryTarget::new(9, 0x100, 4);
    let dst = MemoryTarget::new(2, 0x4000, 1024);
    let params = BuiltinOpParams::fill_buffer(pattern, dst, 12, 200);

    let seq = resolver.resolve(BuiltinOp::FillBuffer, &params, CTX).unwrap();
    let extents: Vec<usize> = seq.iter().map(|d| d.global_size.x).collect();
    // 52 bytes to the first line, 128 bytes of dwords, 20 bytes after.
    assert_eq!(extents, vec![52, 32, 20]);
    assert_eq!(seq.descriptors()[0].kernel.scalar_arg::<u32>(3), Some(4));
    assert_eq!(seq.descriptors()[2].kernel.scalar_arg::<u32>(1), Some(12 + 52 + 128));
}

#[test]
fn test_descriptors_keep_their_snapshot() {
    let resolver = resolver_with_all(gen12());
    let pattern = MemoryTarget::new(9, 0x100, 4);
    let first = resolver
        .resolve(
            BuiltinOp::FillBuffer,
            &BuiltinOpParams::fill_buffer(pattern, MemoryTarget::new(2, 0x4000, 4096), 0, 256),
            CTX,
        )
        .unwrap();
    resolver
        .resolve(
            BuiltinOp::FillBuffer,
            &BuiltinOpParams::fill_buffer(pattern, MemoryTarget::new(3, 0x8000, 4096), 0, 256),
            CTX,
        )
        .unwrap();
    assert_eq!(first.descriptors()[0].kernel.buffer_arg(0).map(|t| t.id.0), Some(2));
}

// ============================================================================
// Rect and image operations
// ============================================================================

#[test]
fn test_rect_copy_2d() {
    let resolver = resolver_with_all(gen12());
    let params = BuiltinOpParams {
        src: Some(MemoryTarget::new(1, 0x1000, 1 << 16)),
        dst: Some(MemoryTarget::new(2, 0x9000, 1 << 16)),
        src_offset: Vec3::new(4, 2, 0),
        size: Vec3::new(16, 8, 1),
        src_row_pitch: 64,
        src_slice_pitch: 64 * 32,
        dst_row_pitch: 32,
        dst_slice_pitch: 32 * 8,
        ..BuiltinOpParams::default()
    };

    let seq = resolver.resolve(BuiltinOp::CopyBufferRect, &params, CTX).unwrap();
    assert_eq!(seq.len(), 1);
    let d = &seq.descriptors()[0];
    assert_eq!(d.kernel.name(), "CopyBufferRectBytes2d");
    assert_eq!(d.dim, 2);
    assert_eq!(d.global_size, Vec3::new(16, 8, 1));
    assert_eq!(d.kernel.scalar_arg::<[u32; 4]>(2), Some([4, 2, 0, 0]));
    assert_eq!(d.kernel.scalar_arg::<[u32; 2]>(5), Some([32, 256]));
}

#[test]
fn test_buffer_to_image_picks_pixel_variant() {
    let resolver = resolver_with_all(gen12());
    let params = BuiltinOpParams {
        src: Some(MemoryTarget::new(1, 0x1000, 1 << 16)),
        dst: Some(MemoryTarget::new(2, 0x9000, 1 << 16)),
        dst_offset: Vec3::new(1, 2, 0),
        size: Vec3::new(32, 16, 1),
        bytes_per_pixel: 4,
        ..BuiltinOpParams::default()
    };

    let seq = resolver.resolve(BuiltinOp::CopyBufferToImage3d, &params, CTX).unwrap();
    let d = &seq.descriptors()[0];
    assert_eq!(d.kernel.name(), "CopyBufferToImage3d4Bytes");
    assert_eq!(d.dim, 3);
    assert_eq!(d.kernel.scalar_arg::<[u32; 4]>(3), Some([1, 2, 0, 0]));
    assert_eq!(d.kernel.scalar_arg::<[u32; 2]>(4), Some([128, 128 * 16]));
}

#[test]
fn test_bad_pixel_size_is_invalid() {
    let resolver = resolver_with_all(gen12());
    let params = BuiltinOpParams {
        src: Some(MemoryTarget::new(1, 0x1000, 4096)),
        dst: Some(MemoryTarget::new(2, 0x9000, 4096)),
        size: Vec3::new(4, 4, 1),
        bytes_per_pixel: 3,
        ..BuiltinOpParams::default()
    };
    assert!(matches!(
        resolver.resolve(BuiltinOp::CopyImage3dToBuffer, &params, CTX),
        Err(DispatchError::InvalidParams { .. })
    ));
}

#[test]
fn test_fill_image_binds_color() {
    let resolver = resolver_with_all(gen12());
    let params = BuiltinOpParams {
        dst: Some(MemoryTarget::new(2, 0x9000, 4096)),
        size: Vec3::new(8, 8, 2),
        fill_color: [1, 2, 3, 4],
        ..BuiltinOpParams::default()
    };
    let seq = resolver.resolve(BuiltinOp::FillImage3d, &params, CTX).unwrap();
    let d = &seq.descriptors()[0];
    assert_eq!(d.kernel.scalar_arg::<[u32; 4]>(1), Some([1, 2, 3, 4]));
    assert_eq!(d.global_size, Vec3::new(8, 8, 2));
}

#[test]
fn test_images_unsupported_on_xe_hpc() {
    let resolver = resolver_with_all(DeviceCapabilities::for_family(HardwareFamily::XeHpc));
    let params = BuiltinOpParams {
        dst: Some(MemoryTarget::new(2, 0x9000, 4096)),
        size: Vec3::new(8, 8, 1),
        ..BuiltinOpParams::default()
    };
    assert!(matches!(
        resolver.resolve(BuiltinOp::FillImage3d, &params, CTX),
        Err(DispatchError::UnsupportedOperation(_))
    ));
}

// ============================================================================
// Aux translation
// ============================================================================

fn aux_targets(ids: &[u64]) -> Vec<MemoryTarget> {
    ids.iter()
        .map(|&id| MemoryTarget::new(id, 0x100_0000 * id, 4096).compressed())
        .collect()
}

#[test]
fn test_aux_translation_one_dispatch_per_object() {
    let resolver = resolver_with_all(gen12());
    let params = BuiltinOpParams::aux_translation(aux_targets(&[1, 2, 1, 3]), AuxTranslationDirection::NonAuxToAux);

    let seq = resolver.resolve(BuiltinOp::AuxTranslation, &params, CTX).unwrap();
    assert_eq!(seq.len(), 3);
    let ids: Vec<u64> = seq.aux_targets().iter().map(|t| t.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    for d in &seq {
        assert_eq!(d.kernel.name(), "fullCopy");
        assert_eq!(d.global_size.x, 1024);
        assert!(d.kernel.flags().output_compressed);
    }
}

#[test]
fn test_aux_pool_grows_and_stays() {
    let resolver = resolver_with_all(gen12());
    let many = BuiltinOpParams::aux_translation(aux_targets(&[1, 2, 3, 4, 5, 6, 7]), AuxTranslationDirection::AuxToNonAux);
    let few = BuiltinOpParams::aux_translation(aux_targets(&[1]), AuxTranslationDirection::AuxToNonAux);

    let seq = resolver.resolve(BuiltinOp::AuxTranslation, &many, CTX).unwrap();
    assert_eq!(seq.len(), 7);
    assert_eq!(seq.descriptors()[0].global_size.x, 256);
    resolver.resolve(BuiltinOp::AuxTranslation, &few, CTX).unwrap();

    let builder = resolver.builder(BuiltinOp::AuxTranslation).unwrap();
    let ownership = BuiltinOwnership::new(&builder, CTX);
    let pool = ownership.state().and_then(|s| s.aux_pool.as_ref()).unwrap();
    assert_eq!(pool.len(), 7);
}

#[test]
#[should_panic(expected = "unset direction")]
fn test_aux_unset_direction_panics() {
    let resolver = resolver_with_all(gen12());
    let params = BuiltinOpParams::aux_translation(aux_targets(&[1]), AuxTranslationDirection::None);
    let _ = resolver.resolve(BuiltinOp::AuxTranslation, &params, CTX);
}

#[test]
fn test_aux_unsupported_on_gen9() {
    let resolver = resolver_with_all(DeviceCapabilities::for_family(HardwareFamily::Gen9));
    let params = BuiltinOpParams::aux_translation(aux_targets(&[1]), AuxTranslationDirection::AuxToNonAux);
    assert!(matches!(
        resolver.resolve(BuiltinOp::AuxTranslation, &params, CTX),
        Err(DispatchError::UnsupportedOperation(_))
    ));
}

// ============================================================================
// Ownership and code lookup
// ============================================================================

#[test]
#[should_panic(expected = "already owned")]
fn test_resolve_while_owned_panics() {
    let resolver = resolver_with_all(gen12());
    let builder = resolver.builder(BuiltinOp::FillBuffer).unwrap();
    let _held = BuiltinOwnership::new(&builder, ContextId(7));
    let pattern = MemoryTarget::new(9, 0x100, 4);
    let params = BuiltinOpParams::fill_buffer(pattern, MemoryTarget::new(2, 0x4000, 1024), 0, 64);
    let _ = resolver.resolve(BuiltinOp::FillBuffer, &params, CTX);
}

#[test]
fn test_unknown_operation_id() {
    let resolver = resolver_with_all(gen12());
    assert!(matches!(
        resolver.builder_by_id(42),
        Err(DispatchError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_missing_code_reported() {
    let device = device(gen12());
    let storages: Vec<Box<dyn Storage>> = vec![Box::new(EmbeddedStorage::with_registry(
        "",
        Arc::new(EmbeddedRegistry::new()),
    ))];
    let resolver = BuiltinResolver::new(device, Arc::new(ResourceCache::new(storages)), DispatchConfig::default());
    assert!(matches!(
        resolver.builder(BuiltinOp::FillBuffer),
        Err(DispatchError::MissingBuiltinCode { .. })
    ));
}

#[test]
fn test_source_from_file_tree() {
    let dir = tempfile::tempdir().unwrap();
    let device = device(DeviceCapabilities::for_family(HardwareFamily::Gen9));
    let ip = device.ip_identity();
    let name = resource_name("fill_buffer", device.addressing_mode(false), CodeKind::Source, Some(ip.as_str()));
    std::fs::write(dir.path().join(&name), b"kernel void FillBufferMiddle() {}").unwrap();

    let storages: Vec<Box<dyn Storage>> = vec![Box::new(FileStorage::new(dir.path()))];
    let resolver = BuiltinResolver::new(device, Arc::new(ResourceCache::new(storages)), DispatchConfig::default());
    let builder = resolver.builder(BuiltinOp::FillBuffer).unwrap();
    assert_eq!(builder.code().kind, CodeKind::Source);
    assert_eq!(builder.kernel_names().len(), 3);
}
