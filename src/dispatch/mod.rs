//! Work geometry decomposition into dispatch descriptors.
//!
//! A [`WorkGeometry`] is turned into an ordered list of
//! [`DispatchDescriptor`]s by [`decompose`], following a [`SplitPolicy`].
//! Builtin operations stage their per-region kernels in a
//! [`DispatchBuilder`] and bake them into a [`DispatchSequence`].

pub mod builder;
pub mod descriptor;
pub mod geometry;
pub mod split;

pub use builder::DispatchBuilder;
pub use descriptor::{DispatchDescriptor, DispatchSequence};
pub use geometry::{default_local_size, Vec3, WorkGeometry, DEFAULT_MAX_WORKGROUP_SIZE};
pub use split::{
    decompose, decompose_with_limit, RegionBinding, RegionCoord, RegionX, RegionY, RegionZ, SplitPolicy,
};
