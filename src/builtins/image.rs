//! Image copies and fills.
//!
//! Images are redescribed by the surrounding driver to an integer format of
//! the same pixel size, so copies move raw pixels. Buffer/image copies pick
//! the kernel by pixel size.

use super::builder::{BuildEnv, BuilderState, BuiltinOperation};
use super::{set_offset_arg, set_offset_array_arg, BuiltinOp, BuiltinOpParams};
use crate::dispatch::{DispatchBuilder, DispatchSequence, RegionCoord, SplitPolicy, Vec3};
use crate::error::{DispatchError, DispatchResult};
use crate::kernel::KernelInstance;

/// Index of the kernel for `bytes_per_pixel` (1, 2, 4, 8 or 16).
pub fn pixel_size_index(op: BuiltinOp, bytes_per_pixel: usize) -> DispatchResult<usize> {
    if bytes_per_pixel.is_power_of_two() && bytes_per_pixel <= 16 {
        Ok(bytes_per_pixel.trailing_zeros() as usize)
    } else {
        Err(DispatchError::InvalidParams {
            operation: op.to_string(),
            reason: format!("unsupported pixel size {bytes_per_pixel}"),
        })
    }
}

/// Row and slice pitch of the buffer side, defaulting to a tightly packed region.
pub fn buffer_pitches(
    row_pitch: usize,
    slice_pitch: usize,
    region: Vec3,
    bytes_per_pixel: usize,
    image_1d_array: bool,
) -> (usize, usize) {
    let row = if row_pitch != 0 { row_pitch } else { region.x * bytes_per_pixel };
    let slice = if slice_pitch != 0 {
        slice_pitch
    } else if image_1d_array {
        row
    } else {
        region.y * row
    };
    (row, slice)
}

/// Image origin as the kernels take it: `uint4` with a zero `w`.
pub fn origin(op: BuiltinOp, v: Vec3) -> DispatchResult<[u32; 4]> {
    let coord = |c: usize| {
        u32::try_from(c).map_err(|_| DispatchError::InvalidParams {
            operation: op.to_string(),
            reason: format!("image origin {c} does not fit in 32 bits"),
        })
    };
    Ok([coord(v.x)?, coord(v.y)?, coord(v.z)?, 0])
}

fn bake_3d(op: BuiltinOp, params: &BuiltinOpParams, kernel: &KernelInstance, env: &BuildEnv<'_>) -> DispatchSequence {
    let mut builder = DispatchBuilder::new(3, SplitPolicy::None, env.max_workgroup_size);
    builder.set_kernel(RegionCoord::WHOLE, kernel);
    builder.set_dispatch_geometry(RegionCoord::WHOLE, params.size, Vec3::ZERO, Vec3::ZERO);
    let mut sequence = DispatchSequence::new(op, params.clone());
    sequence.extend(builder.bake());
    sequence
}

// ============================================================================
// Buffer -> image
// ============================================================================

pub struct CopyBufferToImage3d {
    op: BuiltinOp,
}

impl CopyBufferToImage3d {
    pub fn new(stateless: bool) -> Self {
        Self {
            op: if stateless {
                BuiltinOp::CopyBufferToImage3dStateless
            } else {
                BuiltinOp::CopyBufferToImage3d
            },
        }
    }
}

impl BuiltinOperation for CopyBufferToImage3d {
    fn op(&self) -> BuiltinOp {
        self.op
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &[
            "CopyBufferToImage3dBytes",
            "CopyBufferToImage3d2Bytes",
            "CopyBufferToImage3d4Bytes",
            "CopyBufferToImage3d8Bytes",
            "CopyBufferToImage3d16Bytes",
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
        let index = pixel_size_index(self.op, params.bytes_per_pixel)?;
        let (row, slice) = buffer_pitches(
            params.src_row_pitch,
            params.src_slice_pitch,
            params.size,
            params.bytes_per_pixel,
            params.image_1d_array,
        );

        let kernel = &mut state.kernels[index];
        kernel.set_arg_buffer(0, src);
        kernel.set_arg_buffer(1, dst);
        set_offset_arg(kernel, 2, params.src_offset.x, stateless);
        kernel.set_arg_scalar(3, origin(self.op, params.dst_offset)?);
        set_offset_array_arg(kernel, 4, [row, slice], stateless);

        Ok(bake_3d(self.op, params, kernel, env))
    }
}

// ============================================================================
// Image -> buffer
// ============================================================================

pub struct CopyImage3dToBuffer {
    op: BuiltinOp,
}

impl CopyImage3dToBuffer {
    pub fn new(stateless: bool) -> Self {
        Self {
            op: if stateless {
                BuiltinOp::CopyImage3dToBufferStateless
            } else {
                BuiltinOp::CopyImage3dToBuffer
            },
        }
    }
}

impl BuiltinOperation for CopyImage3dToBuffer {
    fn op(&self) -> BuiltinOp {
        self.op
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &[
            "CopyImage3dToBufferBytes",
            "CopyImage3dToBuffer2Bytes",
            "CopyImage3dToBuffer4Bytes",
            "CopyImage3dToBuffer8Bytes",
            "CopyImage3dToBuffer16Bytes",
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
        let index = pixel_size_index(self.op, params.bytes_per_pixel)?;
        let (row, slice) = buffer_pitches(
            params.dst_row_pitch,
            params.dst_slice_pitch,
            params.size,
            params.bytes_per_pixel,
            params.image_1d_array,
        );

        let kernel = &mut state.kernels[index];
        kernel.set_arg_buffer(0, src);
        kernel.set_arg_buffer(1, dst);
        kernel.set_destination_in_system_memory(params.destination_in_system_memory());
        kernel.set_arg_scalar(2, origin(self.op, params.src_offset)?);
        set_offset_arg(kernel, 3, params.dst_offset.x, stateless);
        set_offset_array_arg(kernel, 4, [row, slice], stateless);

        Ok(bake_3d(self.op, params, kernel, env))
    }
}

// ============================================================================
// Image -> image, image fill
// ============================================================================

pub struct CopyImageToImage3d;

impl BuiltinOperation for CopyImageToImage3d {
    fn op(&self) -> BuiltinOp {
        BuiltinOp::CopyImageToImage3d
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &["CopyImageToImage3d"]
    }

    fn build(
        &self,
        state: &mut BuilderState,
        params: &BuiltinOpParams,
        env: &BuildEnv<'_>,
    ) -> DispatchResult<DispatchSequence> {
        let src = params.require_src(self.op())?;
        let dst = params.require_dst(self.op())?;

        let kernel = &mut state.kernels[0];
        kernel.set_arg_buffer(0, src);
        kernel.set_arg_buffer(1, dst);
        kernel.set_arg_scalar(2, origin(self.op(), params.src_offset)?);
        kernel.set_arg_scalar(3, origin(self.op(), params.dst_offset)?);

        Ok(bake_3d(self.op(), params, kernel, env))
    }
}

pub struct FillImage3d;

impl BuiltinOperation for FillImage3d {
    fn op(&self) -> BuiltinOp {
        BuiltinOp::FillImage3d
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &["FillImage3d"]
    }

    fn build(
        &self,
        state: &mut BuilderState,
        params: &BuiltinOpParams,
        env: &BuildEnv<'_>,
    ) -> DispatchResult<DispatchSequence> {
        let dst = params.require_dst(self.op())?;

        let kernel = &mut state.kernels[0];
        kernel.set_arg_buffer(0, dst);
        kernel.set_arg_scalar(1, params.fill_color);
        kernel.set_arg_scalar(2, origin(self.op(), params.dst_offset)?);

        Ok(bake_3d(self.op(), params, kernel, env))
    }
}
