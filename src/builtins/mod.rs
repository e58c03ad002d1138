//! Builtin kernels for implicit operations.
//!
//! Copies, fills and aux translations requested by the runtime are serviced
//! by driver-owned kernels. For each operation this module:
//!
//! - picks the kernel variant for the device (stateless, addressing mode)
//! - patches the shared kernel instances with the request's arguments
//! - stages per-region geometry and bakes a [`DispatchSequence`]
//!
//! [`DispatchSequence`]: crate::dispatch::DispatchSequence

pub mod aux_translation;
pub mod buffer_rect;
pub mod builder;
pub mod copy_buffer;
pub mod fill_buffer;
pub mod image;
pub mod ops;
pub mod ownership;
pub mod params;
pub mod resolver;

pub use aux_translation::AuxTranslationPool;
pub use builder::{BuilderState, BuiltinDispatchBuilder, BuiltinOperation, KernelSet};
pub use copy_buffer::{split_aligned_range, AlignedSplit};
pub use ops::BuiltinOp;
pub use ownership::{BuiltinOwnership, ContextId};
pub use params::{AuxTranslationDirection, BuiltinOpParams};
pub use resolver::{create_operation, BuiltinResolver};

use crate::kernel::KernelInstance;

/// Bind an offset or size: `u64` for stateless variants, `u32` otherwise.
pub(crate) fn set_offset_arg(kernel: &mut KernelInstance, index: usize, value: usize, stateless: bool) {
    if stateless {
        kernel.set_arg_scalar(index, value as u64);
    } else {
        kernel.set_arg_scalar(index, value as u32);
    }
}

/// Array form of [`set_offset_arg`].
pub(crate) fn set_offset_array_arg<const N: usize>(
    kernel: &mut KernelInstance,
    index: usize,
    values: [usize; N],
    stateless: bool,
) {
    if stateless {
        kernel.set_arg_scalar(index, values.map(|v| v as u64));
    } else {
        kernel.set_arg_scalar(index, values.map(|v| v as u32));
    }
}
