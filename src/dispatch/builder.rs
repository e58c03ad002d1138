//! Region-keyed staging of kernels and geometries before decomposition.

use std::collections::BTreeMap;

use super::descriptor::DispatchDescriptor;
use super::geometry::{Vec3, WorkGeometry};
use super::split::{decompose_with_limit, RegionBinding, RegionCoord, SplitPolicy};
use crate::kernel::KernelInstance;

#[derive(Debug, Default)]
struct RegionSlot {
    kernel: Option<KernelInstance>,
    geometry: WorkGeometry,
}

/// Collects per-region kernels and geometry, then bakes descriptors.
///
/// Kernels are snapshotted when set, so later patches to the source instance
/// do not leak into descriptors already staged.
#[derive(Debug)]
pub struct DispatchBuilder {
    dim: usize,
    policy: SplitPolicy,
    max_workgroup_size: usize,
    regions: BTreeMap<RegionCoord, RegionSlot>,
}

impl DispatchBuilder {
    pub fn new(dim: usize, policy: SplitPolicy, max_workgroup_size: usize) -> Self {
        Self {
            dim: dim.clamp(1, 3),
            policy,
            max_workgroup_size,
            regions: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    pub fn set_kernel(&mut self, region: RegionCoord, kernel: &KernelInstance) {
        self.slot(region).kernel = Some(kernel.clone());
    }

    /// Global size, requested local size and offset for `region`.
    ///
    /// Components beyond the builder's dimensionality are ignored.
    pub fn set_dispatch_geometry(&mut self, region: RegionCoord, global: Vec3, local: Vec3, offset: Vec3) {
        let dim = self.dim;
        let mut g = Vec3::ONE;
        let mut l = Vec3::ZERO;
        let mut o = Vec3::ZERO;
        for axis in 0..dim {
            g[axis] = global[axis];
            l[axis] = local[axis];
            o[axis] = offset[axis];
        }
        let unset_local = (0..dim).any(|axis| l[axis] == 0);
        if !unset_local {
            for axis in dim..3 {
                l[axis] = 1;
            }
        }
        self.slot(region).geometry = WorkGeometry::with_dim(dim, g, l, o);
    }

    /// Decompose every region that has both a kernel and a geometry.
    pub fn bake(self) -> Vec<DispatchDescriptor> {
        let bindings: Vec<RegionBinding> = self
            .regions
            .into_iter()
            .filter_map(|(region, slot)| {
                slot.kernel.map(|kernel| RegionBinding {
                    region,
                    geometry: slot.geometry,
                    kernel,
                })
            })
            .collect();
        decompose_with_limit(self.policy, &bindings, self.max_workgroup_size)
    }

    fn slot(&mut self, region: RegionCoord) -> &mut RegionSlot {
        let region = match self.policy {
            SplitPolicy::KernelSplit => region,
            SplitPolicy::None | SplitPolicy::WalkerSplit => RegionCoord::WHOLE,
        };
        self.regions.entry(region).or_default()
    }
}
