//! Dispatch descriptors and the sequences handed to the command encoder.

use super::geometry::Vec3;
use super::split::RegionCoord;
use crate::builtins::{BuiltinOp, BuiltinOpParams};
use crate::kernel::KernelInstance;
use crate::memory::MemoryTarget;

/// One hardware-issuable unit of work.
///
/// Per axis, `local_workgroup_size * num_workgroups` is the extent this
/// descriptor covers, reported as `actual_workgroup_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchDescriptor {
    /// Bound kernel snapshot.
    pub kernel: KernelInstance,
    pub region: RegionCoord,
    pub dim: usize,
    /// Global size of the whole geometry.
    pub global_size: Vec3,
    /// Extent of this partition in work items.
    pub actual_workgroup_size: Vec3,
    /// Workgroup size used for this partition.
    pub local_workgroup_size: Vec3,
    /// Local size of the whole enqueue.
    pub enqueued_local_size: Vec3,
    pub global_offset: Vec3,
    pub num_workgroups: Vec3,
    pub total_num_workgroups: Vec3,
    /// Origin of this partition, in workgroups.
    pub start_of_workgroups: Vec3,
}

impl DispatchDescriptor {
    /// Work items covered.
    pub fn work_items(&self) -> usize {
        self.actual_workgroup_size.product()
    }
}

/// Ordered descriptors for one request plus the operation they implement.
///
/// An empty sequence means there is nothing to dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSequence {
    op: Option<BuiltinOp>,
    descriptors: Vec<DispatchDescriptor>,
    params: BuiltinOpParams,
    aux_targets: Vec<MemoryTarget>,
}

impl DispatchSequence {
    pub fn new(op: BuiltinOp, params: BuiltinOpParams) -> Self {
        Self {
            op: Some(op),
            params,
            ..Self::default()
        }
    }

    /// Sequence for a user kernel, with no builtin operation attached.
    pub fn from_descriptors(descriptors: Vec<DispatchDescriptor>) -> Self {
        Self {
            descriptors,
            ..Self::default()
        }
    }

    pub fn op(&self) -> Option<BuiltinOp> {
        self.op
    }

    pub fn params(&self) -> &BuiltinOpParams {
        &self.params
    }

    pub fn descriptors(&self) -> &[DispatchDescriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DispatchDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn push(&mut self, descriptor: DispatchDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn extend(&mut self, descriptors: impl IntoIterator<Item = DispatchDescriptor>) {
        self.descriptors.extend(descriptors);
    }

    /// Distinct objects an aux translation touches, in encounter order.
    pub fn aux_targets(&self) -> &[MemoryTarget] {
        &self.aux_targets
    }

    pub fn set_aux_targets(&mut self, targets: Vec<MemoryTarget>) {
        self.aux_targets = targets;
    }

    pub fn into_descriptors(self) -> Vec<DispatchDescriptor> {
        self.descriptors
    }
}

impl<'a> IntoIterator for &'a DispatchSequence {
    type Item = &'a DispatchDescriptor;
    type IntoIter = std::slice::Iter<'a, DispatchDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

impl std::ops::Index<usize> for DispatchSequence {
    type Output = DispatchDescriptor;

    fn index(&self, index: usize) -> &DispatchDescriptor {
        &self.descriptors[index]
    }
}
