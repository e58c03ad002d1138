//! Bindable kernel instances.
//!
//! A [`KernelInstance`] is a kernel entry point inside a builtin program plus
//! the argument block of one invocation. Cloning shares the program and kernel
//! description and copies only the argument block, so clones can be bound
//! independently.

use std::fmt;
use std::mem::size_of;
use std::sync::Arc;

use bytemuck::Pod;

use crate::memory::MemoryTarget;
use crate::resource::BuiltinCode;

/// Immutable description shared by every clone of a kernel.
#[derive(Debug, PartialEq, Eq)]
pub struct KernelInfo {
    pub name: String,
    pub code: BuiltinCode,
}

/// Value bound to one kernel argument slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelArg {
    Unset,
    /// Raw little-endian bytes of a scalar or small array.
    Scalar(Vec<u8>),
    Buffer(MemoryTarget),
}

/// Per-instance state read by the command encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelFlags {
    /// Destination is host-visible; the encoder must keep caches coherent.
    pub destination_in_system_memory: bool,
    /// Output of an aux translation is written in compressed form.
    pub output_compressed: bool,
}

#[derive(Clone, PartialEq, Eq)]
pub struct KernelInstance {
    info: Arc<KernelInfo>,
    args: Vec<KernelArg>,
    flags: KernelFlags,
}

impl KernelInstance {
    pub fn new(name: impl Into<String>, code: BuiltinCode) -> Self {
        Self::from_info(Arc::new(KernelInfo {
            name: name.into(),
            code,
        }))
    }

    pub fn from_info(info: Arc<KernelInfo>) -> Self {
        Self {
            info,
            args: Vec::new(),
            flags: KernelFlags::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &Arc<KernelInfo> {
        &self.info
    }

    pub fn code(&self) -> &BuiltinCode {
        &self.info.code
    }

    /// True when both instances were cloned from the same kernel.
    pub fn shares_info_with(&self, other: &KernelInstance) -> bool {
        Arc::ptr_eq(&self.info, &other.info)
    }

    /// Bind a plain-data value (integer, float or array of them).
    pub fn set_arg_scalar<T: Pod>(&mut self, index: usize, value: T) {
        *self.slot(index) = KernelArg::Scalar(bytemuck::bytes_of(&value).to_vec());
    }

    pub fn set_arg_buffer(&mut self, index: usize, target: MemoryTarget) {
        *self.slot(index) = KernelArg::Buffer(target);
    }

    pub fn arg(&self, index: usize) -> Option<&KernelArg> {
        self.args.get(index)
    }

    pub fn args(&self) -> &[KernelArg] {
        &self.args
    }

    /// Read back a scalar bound with [`set_arg_scalar`](Self::set_arg_scalar).
    ///
    /// `None` when the slot is unset, holds a buffer, or has a different size.
    pub fn scalar_arg<T: Pod>(&self, index: usize) -> Option<T> {
        match self.args.get(index) {
            Some(KernelArg::Scalar(bytes)) if bytes.len() == size_of::<T>() => {
                Some(bytemuck::pod_read_unaligned(bytes))
            }
            _ => None,
        }
    }

    pub fn buffer_arg(&self, index: usize) -> Option<&MemoryTarget> {
        match self.args.get(index) {
            Some(KernelArg::Buffer(target)) => Some(target),
            _ => None,
        }
    }

    pub fn flags(&self) -> KernelFlags {
        self.flags
    }

    pub fn set_destination_in_system_memory(&mut self, value: bool) {
        self.flags.destination_in_system_memory = value;
    }

    pub fn set_output_compressed(&mut self, value: bool) {
        self.flags.output_compressed = value;
    }

    fn slot(&mut self, index: usize) -> &mut KernelArg {
        if self.args.len() <= index {
            self.args.resize(index + 1, KernelArg::Unset);
        }
        &mut self.args[index]
    }
}

impl fmt::Debug for KernelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelInstance")
            .field("name", &self.info.name)
            .field("code_kind", &self.info.code.kind)
            .field("args", &self.args)
            .field("flags", &self.flags)
            .finish()
    }
}
