//! Buffer to buffer copy.
//!
//! The destination range is cut at cache-line boundaries: byte-granular
//! leftover kernels handle the unaligned head and tail, and the bulk kernel
//! copies whole 16-byte elements in between.

use super::builder::{BuildEnv, BuilderState, BuiltinOperation};
use super::{set_offset_arg, BuiltinOp, BuiltinOpParams};
use crate::dispatch::{DispatchBuilder, DispatchSequence, RegionCoord, RegionX, SplitPolicy, Vec3};
use crate::error::DispatchResult;

/// Byte ranges of an alignment split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedSplit {
    /// Bytes before the first aligned boundary.
    pub left: usize,
    pub middle_bytes: usize,
    /// `middle_bytes` in bulk elements.
    pub middle_elements: usize,
    /// Bytes after the last aligned boundary.
    pub right: usize,
}

/// Split `[start, start + size)` at `alignment` boundaries.
///
/// Both leftovers are clamped so that `left + middle_bytes + right == size`.
/// The middle is always a whole number of elements; bytes that do not fill
/// an element move to the right leftover.
pub fn split_aligned_range(start: u64, size: usize, alignment: usize, element_size: usize) -> AlignedSplit {
    let alignment = alignment.max(1) as u64;
    let element_size = element_size.max(1);
    let head = (start % alignment) as usize;
    let left = (if head > 0 { alignment as usize - head } else { 0 }).min(size);
    let right = ((start + size as u64) % alignment) as usize;
    let right = right.min(size - left);
    let unaligned_middle = size - left - right;
    let tail = unaligned_middle % element_size;
    let middle_bytes = unaligned_middle - tail;

    AlignedSplit {
        left,
        middle_bytes,
        middle_elements: middle_bytes / element_size,
        right: right + tail,
    }
}

const LEFT: usize = 0;
const MIDDLE: usize = 1;
const MIDDLE_MISALIGNED: usize = 2;
const RIGHT: usize = 3;

/// Bulk kernel reads whole dwords.
const MIDDLE_SOURCE_ALIGNMENT: u64 = 4;

pub struct CopyBufferToBuffer {
    op: BuiltinOp,
}

impl CopyBufferToBuffer {
    pub fn new(stateless: bool) -> Self {
        Self {
            op: if stateless {
                BuiltinOp::CopyBufferToBufferStateless
            } else {
                BuiltinOp::CopyBufferToBuffer
            },
        }
    }
}

impl BuiltinOperation for CopyBufferToBuffer {
    fn op(&self) -> BuiltinOp {
        self.op
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &[
            "CopyBufferToBufferLeftLeftover",
            "CopyBufferToBufferMiddle",
            "CopyBufferToBufferMiddleMisaligned",
            "CopyBufferToBufferRightLeftover",
        ]
    }

    fn build(
        &self,
        state: &mut BuilderState,
        params: &BuiltinOpParams,
        env: &BuildEnv<'_>,
    ) -> DispatchResult<DispatchSequence> {
        let src = params.require_src(self.op)?;
        let dst = params.require_dst(self.op)?;
        let stateless = self.op.is_stateless();
        let size = params.size.x;
        let (src_offset, dst_offset) = (params.src_offset.x, params.dst_offset.x);

        let start = dst.address + dst_offset as u64;
        let split = split_aligned_range(
            start,
            size,
            env.device.cache_line_size(),
            env.device.helper().bulk_copy_element_size(),
        );

        let src_middle_start = src.address + (src_offset + split.left) as u64;
        let misalignment = (src_middle_start % MIDDLE_SOURCE_ALIGNMENT) as u32;
        let middle = if misalignment != 0 { MIDDLE_MISALIGNED } else { MIDDLE };
        let in_system = params.destination_in_system_memory();

        let kernels = &mut state.kernels;
        for index in [LEFT, middle, RIGHT] {
            let kernel = &mut kernels[index];
            kernel.set_arg_buffer(0, src);
            kernel.set_arg_buffer(1, dst);
            kernel.set_destination_in_system_memory(in_system);
        }

        set_offset_arg(&mut kernels[LEFT], 2, src_offset, stateless);
        set_offset_arg(&mut kernels[middle], 2, src_offset + split.left, stateless);
        set_offset_arg(&mut kernels[RIGHT], 2, src_offset + split.left + split.middle_bytes, stateless);

        set_offset_arg(&mut kernels[LEFT], 3, dst_offset, stateless);
        set_offset_arg(&mut kernels[middle], 3, dst_offset + split.left, stateless);
        set_offset_arg(&mut kernels[RIGHT], 3, dst_offset + split.left + split.middle_bytes, stateless);

        if misalignment != 0 {
            kernels[MIDDLE_MISALIGNED].set_arg_scalar(4, misalignment * 8);
        }

        let mut builder = DispatchBuilder::new(1, SplitPolicy::KernelSplit, env.max_workgroup_size);
        for (region, index, extent) in [
            (RegionX::Left, LEFT, split.left),
            (RegionX::Middle, middle, split.middle_elements),
            (RegionX::Right, RIGHT, split.right),
        ] {
            let region = RegionCoord::x(region);
            builder.set_kernel(region, &kernels[index]);
            builder.set_dispatch_geometry(region, Vec3::new(extent, 0, 0), Vec3::ZERO, Vec3::ZERO);
        }

        let mut sequence = DispatchSequence::new(self.op, params.clone());
        sequence.extend(builder.bake());
        Ok(sequence)
    }
}
