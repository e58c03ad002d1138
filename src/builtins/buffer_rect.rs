//! Rectangular (2D/3D) buffer copy with row and slice pitches.

use super::builder::{BuildEnv, BuilderState, BuiltinOperation};
use super::{set_offset_array_arg, BuiltinOp, BuiltinOpParams};
use crate::dispatch::{DispatchBuilder, DispatchSequence, RegionCoord, SplitPolicy, Vec3};
use crate::error::DispatchResult;

const BYTES_2D: usize = 0;
const BYTES_3D: usize = 1;

pub struct CopyBufferRect {
    op: BuiltinOp,
}

impl CopyBufferRect {
    pub fn new(stateless: bool) -> Self {
        Self {
            op: if stateless {
                BuiltinOp::CopyBufferRectStateless
            } else {
                BuiltinOp::CopyBufferRect
            },
        }
    }
}

/// A region needs the 3D kernel when it spans or starts beyond the first slice.
pub fn is_3d_region(params: &BuiltinOpParams) -> bool {
    params.size.z > 1 || params.src_offset.z > 0 || params.dst_offset.z > 0
}

impl BuiltinOperation for CopyBufferRect {
    fn op(&self) -> BuiltinOp {
        self.op
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &["CopyBufferRectBytes2d", "CopyBufferRectBytes3d"]
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
        let is_3d = is_3d_region(params);
        let (dim, index) = if is_3d { (3, BYTES_3D) } else { (2, BYTES_2D) };

        let kernel = &mut state.kernels[index];
        kernel.set_arg_buffer(0, src);
        kernel.set_arg_buffer(1, dst);
        kernel.set_destination_in_system_memory(params.destination_in_system_memory());

        let (so, d) = (params.src_offset, params.dst_offset);
        set_offset_array_arg(kernel, 2, [so.x, so.y, so.z, 0], stateless);
        set_offset_array_arg(kernel, 3, [d.x, d.y, d.z, 0], stateless);
        set_offset_array_arg(kernel, 4, [params.src_row_pitch, params.src_slice_pitch], stateless);
        set_offset_array_arg(kernel, 5, [params.dst_row_pitch, params.dst_slice_pitch], stateless);

        let mut builder = DispatchBuilder::new(dim, SplitPolicy::None, env.max_workgroup_size);
        builder.set_kernel(RegionCoord::WHOLE, kernel);
        builder.set_dispatch_geometry(RegionCoord::WHOLE, params.size, Vec3::ZERO, Vec3::ZERO);

        let mut sequence = DispatchSequence::new(self.op, params.clone());
        sequence.extend(builder.bake());
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_3d_region() {
        let mut params = BuiltinOpParams {
            size: Vec3::new(16, 16, 1),
            ..BuiltinOpParams::default()
        };
        assert!(!is_3d_region(&params));
        params.dst_offset.z = 1;
        assert!(is_3d_region(&params));
        params.dst_offset.z = 0;
        params.size.z = 2;
        assert!(is_3d_region(&params));
    }
}
