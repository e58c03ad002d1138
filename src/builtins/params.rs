//! Parameters of a builtin operation request.

use crate::dispatch::Vec3;
use crate::error::{DispatchError, DispatchResult};
use crate::memory::MemoryTarget;

use super::BuiltinOp;

/// Direction of an aux (compression state) translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AuxTranslationDirection {
    /// Unset. Reaching a translation with this value is a driver bug.
    #[default]
    None,
    /// Decompress: compressed to plain.
    AuxToNonAux,
    /// Compress: plain to compressed.
    NonAuxToAux,
}

/// Operands of one builtin operation.
///
/// Offsets, sizes and pitches are in bytes for buffers and in pixels for
/// images. Fields an operation does not read are left at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinOpParams {
    /// Source buffer or image. For buffer fills this is the pattern buffer.
    pub src: Option<MemoryTarget>,
    pub dst: Option<MemoryTarget>,
    pub src_offset: Vec3,
    pub dst_offset: Vec3,
    pub size: Vec3,
    pub src_row_pitch: usize,
    pub src_slice_pitch: usize,
    pub dst_row_pitch: usize,
    pub dst_slice_pitch: usize,
    /// Pixel size of the image side of an image copy.
    pub bytes_per_pixel: usize,
    /// The image side of an image copy is a 1D array.
    pub image_1d_array: bool,
    /// Fill color already converted to the redescribed image format.
    pub fill_color: [u32; 4],
    pub aux_direction: AuxTranslationDirection,
    pub aux_targets: Vec<MemoryTarget>,
}

impl BuiltinOpParams {
    /// Copy `size` bytes between two buffers.
    pub fn copy_buffer(src: MemoryTarget, dst: MemoryTarget, src_offset: usize, dst_offset: usize, size: usize) -> Self {
        Self {
            src: Some(src),
            dst: Some(dst),
            src_offset: Vec3::new(src_offset, 0, 0),
            dst_offset: Vec3::new(dst_offset, 0, 0),
            size: Vec3::new(size, 0, 0),
            ..Self::default()
        }
    }

    /// Fill `size` bytes of `dst` with the contents of `pattern`.
    pub fn fill_buffer(pattern: MemoryTarget, dst: MemoryTarget, dst_offset: usize, size: usize) -> Self {
        Self {
            src: Some(pattern),
            dst: Some(dst),
            dst_offset: Vec3::new(dst_offset, 0, 0),
            size: Vec3::new(size, 0, 0),
            ..Self::default()
        }
    }

    /// Translate the compression state of `targets`.
    pub fn aux_translation(targets: Vec<MemoryTarget>, direction: AuxTranslationDirection) -> Self {
        Self {
            aux_direction: direction,
            aux_targets: targets,
            ..Self::default()
        }
    }

    pub(crate) fn require_src(&self, op: BuiltinOp) -> DispatchResult<MemoryTarget> {
        self.src.ok_or_else(|| missing(op, "source"))
    }

    pub(crate) fn require_dst(&self, op: BuiltinOp) -> DispatchResult<MemoryTarget> {
        self.dst.ok_or_else(|| missing(op, "destination"))
    }

    /// Destination lives in host-visible memory.
    pub fn destination_in_system_memory(&self) -> bool {
        self.dst.is_some_and(|dst| dst.is_system_memory())
    }
}

fn missing(op: BuiltinOp, what: &str) -> DispatchError {
    DispatchError::InvalidParams {
        operation: op.to_string(),
        reason: format!("missing {what}"),
    }
}
