//! Work geometry decomposition.
//!
//! Three policies turn a geometry into descriptors:
//!
//! - [`SplitPolicy::None`]: one descriptor over the whole geometry.
//! - [`SplitPolicy::WalkerSplit`]: per axis, a main partition of whole
//!   workgroups and a remainder partition holding one irregular workgroup.
//!   Partitions are the Cartesian product over the axes, `x` innermost and
//!   main before remainder. Kernel argument patching downstream relies on
//!   this order.
//! - [`SplitPolicy::KernelSplit`]: the caller supplies one geometry and kernel
//!   per region; each non-empty region becomes one descriptor.

use super::descriptor::{DispatchDescriptor, DispatchSequence};
use super::geometry::{Vec3, WorkGeometry, DEFAULT_MAX_WORKGROUP_SIZE};
use crate::kernel::KernelInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitPolicy {
    None,
    WalkerSplit,
    KernelSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionX {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionY {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionZ {
    Front,
    Middle,
    Back,
}

/// Named spatial region of a kernel split.
///
/// Ordering is `z`, then `y`, then `x`, so sorting regions enumerates `x`
/// innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoord {
    pub z: RegionZ,
    pub y: RegionY,
    pub x: RegionX,
}

impl RegionCoord {
    /// The whole geometry, used by unsplit and walker-split dispatches.
    pub const WHOLE: RegionCoord = RegionCoord {
        z: RegionZ::Middle,
        y: RegionY::Middle,
        x: RegionX::Middle,
    };

    pub const fn x(x: RegionX) -> Self {
        Self {
            z: RegionZ::Middle,
            y: RegionY::Middle,
            x,
        }
    }

    pub const fn new(x: RegionX, y: RegionY, z: RegionZ) -> Self {
        Self { z, y, x }
    }
}

impl Default for RegionCoord {
    fn default() -> Self {
        Self::WHOLE
    }
}

/// A kernel bound to a region and the geometry it runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionBinding {
    pub region: RegionCoord,
    pub geometry: WorkGeometry,
    pub kernel: KernelInstance,
}

impl RegionBinding {
    pub fn whole(geometry: WorkGeometry, kernel: KernelInstance) -> Self {
        Self {
            region: RegionCoord::WHOLE,
            geometry,
            kernel,
        }
    }
}

/// Decompose with the default workgroup size limit.
///
/// `None` and `WalkerSplit` take exactly one binding; `KernelSplit` takes one
/// per region. Passing several bindings to an unsplit policy is a caller bug
/// and panics.
pub fn decompose(policy: SplitPolicy, bindings: &[RegionBinding]) -> DispatchSequence {
    DispatchSequence::from_descriptors(decompose_with_limit(policy, bindings, DEFAULT_MAX_WORKGROUP_SIZE))
}

/// Decompose, using `max_workgroup_size` wherever the driver picks a local size.
pub fn decompose_with_limit(
    policy: SplitPolicy,
    bindings: &[RegionBinding],
    max_workgroup_size: usize,
) -> Vec<DispatchDescriptor> {
    match policy {
        SplitPolicy::None | SplitPolicy::WalkerSplit => {
            assert!(
                bindings.len() <= 1,
                "{:?} takes a single kernel binding, got {}",
                policy,
                bindings.len()
            );
            let Some(binding) = bindings.first() else {
                return Vec::new();
            };
            if policy == SplitPolicy::None {
                no_split(binding, max_workgroup_size).into_iter().collect()
            } else {
                walker_split(binding, max_workgroup_size)
            }
        }
        SplitPolicy::KernelSplit => bindings
            .iter()
            .filter_map(|binding| no_split(binding, max_workgroup_size))
            .collect(),
    }
}

fn no_split(binding: &RegionBinding, max_workgroup_size: usize) -> Option<DispatchDescriptor> {
    let geometry = &binding.geometry;
    if geometry.is_empty() {
        return None;
    }
    let global = geometry.normalized_global();
    let local = geometry.resolved_local(max_workgroup_size);
    let mut groups = Vec3::ONE;
    for axis in 0..3 {
        groups[axis] = global[axis].div_ceil(local[axis]);
    }

    Some(DispatchDescriptor {
        kernel: binding.kernel.clone(),
        region: binding.region,
        dim: geometry.effective_dim(),
        global_size: global,
        actual_workgroup_size: global,
        local_workgroup_size: local,
        enqueued_local_size: local,
        global_offset: geometry.offset,
        num_workgroups: groups,
        total_num_workgroups: groups,
        start_of_workgroups: Vec3::ZERO,
    })
}

/// One per-axis slice of a walker split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisPart {
    extent: usize,
    group: usize,
    groups: usize,
    start: usize,
}

/// Main and remainder parts of one axis, plus the axis' total group count.
fn axis_parts(global: usize, local: usize) -> (Vec<AxisPart>, usize) {
    let whole = global / local;
    let main = whole * local;
    let remainder = global - main;

    let mut parts = Vec::with_capacity(2);
    if main > 0 {
        parts.push(AxisPart {
            extent: main,
            group: local,
            groups: whole,
            start: 0,
        });
    }
    if remainder > 0 {
        parts.push(AxisPart {
            extent: remainder,
            group: remainder,
            groups: 1,
            start: whole,
        });
    }
    (parts, whole + usize::from(remainder > 0))
}

fn walker_split(binding: &RegionBinding, max_workgroup_size: usize) -> Vec<DispatchDescriptor> {
    let geometry = &binding.geometry;
    if geometry.is_empty() {
        return Vec::new();
    }
    let dim = geometry.effective_dim();
    let global = geometry.normalized_global();
    let local = geometry.resolved_local(max_workgroup_size);

    let mut per_axis: [Vec<AxisPart>; 3] = Default::default();
    let mut total = Vec3::ONE;
    for axis in 0..3 {
        let (parts, groups) = axis_parts(global[axis], local[axis]);
        per_axis[axis] = parts;
        total[axis] = groups;
    }

    let mut descriptors = Vec::with_capacity(per_axis.iter().map(Vec::len).product());
    for z in &per_axis[2] {
        for y in &per_axis[1] {
            for x in &per_axis[0] {
                descriptors.push(DispatchDescriptor {
                    kernel: binding.kernel.clone(),
                    region: binding.region,
                    dim,
                    global_size: global,
                    actual_workgroup_size: Vec3::new(x.extent, y.extent, z.extent),
                    local_workgroup_size: Vec3::new(x.group, y.group, z.group),
                    enqueued_local_size: local,
                    global_offset: geometry.offset,
                    num_workgroups: Vec3::new(x.groups, y.groups, z.groups),
                    total_num_workgroups: total,
                    start_of_workgroups: Vec3::new(x.start, y.start, z.start),
                });
            }
        }
    }
    descriptors
}
