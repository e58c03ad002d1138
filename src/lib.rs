//! builtin-dispatch: work-geometry decomposition and builtin kernel dispatch
//! for GPU compute runtimes.
//!
//! This crate turns a logical compute request into hardware-issuable work:
//! - **Decomposition**: global/local/offset geometry into ordered dispatch
//!   descriptors, with no split, walker split or per-region kernel split
//! - **Builtin operations**: buffer and image copies, fills and aux
//!   translations serviced by precompiled driver kernels
//! - **Resource cache**: layered lookup of kernel code (embedded table, then
//!   installed kernel tree) keyed by device IP and addressing mode
//! - **Ownership**: scoped, non-reentrant exclusive access to a builtin's
//!   shared kernel state
//!
//! # Quick Start
//!
//! ```ignore
//! use builtin_dispatch::{BuiltinOp, BuiltinOpParams, BuiltinResolver, ContextId, Device, DeviceCapabilities, HardwareFamily, DispatchConfig};
//!
//! let config = DispatchConfig::from_env()?;
//! let device = Arc::new(Device::new(DeviceCapabilities::for_family(HardwareFamily::Gen12Lp))?);
//! let resolver = BuiltinResolver::from_config(device, config);
//! let params = BuiltinOpParams::copy_buffer(src, dst, 0, 0, 4096);
//! let sequence = resolver.resolve(BuiltinOp::CopyBufferToBuffer, &params, ContextId(0))?;
//! ```

pub mod builtins;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod kernel;
pub mod memory;
pub mod resource;

pub use builtins::{
    AuxTranslationDirection, AuxTranslationPool, BuiltinDispatchBuilder, BuiltinOp, BuiltinOpParams,
    BuiltinOwnership, BuiltinResolver, ContextId,
};
pub use config::DispatchConfig;
pub use device::{AddressingMode, CoreHelper, Device, DeviceCapabilities, HardwareFamily};
pub use dispatch::{
    decompose, DispatchBuilder, DispatchDescriptor, DispatchSequence, RegionBinding, RegionCoord, SplitPolicy,
    Vec3, WorkGeometry,
};
pub use error::{DispatchError, DispatchResult};
pub use kernel::{KernelArg, KernelInstance};
pub use memory::{MemObjectId, MemoryLocation, MemoryTarget};
pub use resource::{BuiltinCode, CodeKind, EmbeddedRegistry, ResourceCache, Storage};
