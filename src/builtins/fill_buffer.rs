//! Buffer fill with a repeating pattern.

use super::builder::{BuildEnv, BuilderState, BuiltinOperation};
use super::copy_buffer::split_aligned_range;
use super::{set_offset_arg, BuiltinOp, BuiltinOpParams};
use crate::dispatch::{DispatchBuilder, DispatchSequence, RegionCoord, RegionX, SplitPolicy, Vec3};
use crate::error::DispatchResult;

const LEFT: usize = 0;
const MIDDLE: usize = 1;
const RIGHT: usize = 2;

pub struct FillBuffer {
    op: BuiltinOp,
}

impl FillBuffer {
    pub fn new(stateless: bool) -> Self {
        Self {
            op: if stateless {
                BuiltinOp::FillBufferStateless
            } else {
                BuiltinOp::FillBuffer
            },
        }
    }
}

impl BuiltinOperation for FillBuffer {
    fn op(&self) -> BuiltinOp {
        self.op
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &["FillBufferLeftLeftover", "FillBufferMiddle", "FillBufferRightLeftover"]
    }

    fn build(
        &self,
        state: &mut BuilderState,
        params: &BuiltinOpParams,
        env: &BuildEnv<'_>,
    ) -> DispatchResult<DispatchSequence> {
        let pattern = params.require_src(self.op)?;
        let dst = params.require_dst(self.op)?;
        let stateless = self.op.is_stateless();
        let element_size = env.device.helper().fill_element_size();
        let dst_offset = params.dst_offset.x;

        let split = split_aligned_range(
            dst.address + dst_offset as u64,
            params.size.x,
            env.device.cache_line_size(),
            element_size,
        );
        let in_system = params.destination_in_system_memory();

        let kernels = &mut state.kernels;
        for index in [LEFT, MIDDLE, RIGHT] {
            let kernel = &mut kernels[index];
            kernel.set_arg_buffer(0, dst);
            kernel.set_arg_buffer(2, pattern);
            kernel.set_destination_in_system_memory(in_system);
        }

        set_offset_arg(&mut kernels[LEFT], 1, dst_offset, stateless);
        set_offset_arg(&mut kernels[MIDDLE], 1, dst_offset + split.left, stateless);
        set_offset_arg(&mut kernels[RIGHT], 1, dst_offset + split.left + split.middle_bytes, stateless);

        // Leftovers count the pattern in bytes, the bulk kernel in elements.
        set_offset_arg(&mut kernels[LEFT], 3, pattern.size, stateless);
        set_offset_arg(&mut kernels[MIDDLE], 3, pattern.size / element_size, stateless);
        set_offset_arg(&mut kernels[RIGHT], 3, pattern.size, stateless);

        let mut builder = DispatchBuilder::new(1, SplitPolicy::KernelSplit, env.max_workgroup_size);
        for (region, index, extent) in [
            (RegionX::Left, LEFT, split.left),
            (RegionX::Middle, MIDDLE, split.middle_elements),
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
