//! Memory objects as seen by builtin kernels.
//!
//! Allocation and residency are owned by the surrounding driver. The dispatch
//! core only needs an identity, a GPU address, a size and placement flags.

use serde::{Deserialize, Serialize};

/// Driver-assigned identity of a memory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemObjectId(pub u64);

/// Where an allocation physically lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryLocation {
    /// Host-visible system memory (host pointers, shared USM, system buffers).
    System,
    #[default]
    Device,
}

/// A buffer or image bound to a kernel argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTarget {
    pub id: MemObjectId,
    /// GPU virtual address of the first byte.
    pub address: u64,
    pub size: usize,
    pub location: MemoryLocation,
    /// Contents are currently held in compressed (aux) form.
    pub compressed: bool,
}

impl MemoryTarget {
    pub fn new(id: u64, address: u64, size: usize) -> Self {
        Self {
            id: MemObjectId(id),
            address,
            size,
            location: MemoryLocation::Device,
            compressed: false,
        }
    }

    pub fn in_system_memory(mut self) -> Self {
        self.location = MemoryLocation::System;
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    pub fn is_system_memory(&self) -> bool {
        self.location == MemoryLocation::System
    }
}
