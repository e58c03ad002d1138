//! Iteration-space geometry.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Workgroup size limit used when no device limit is supplied.
pub const DEFAULT_MAX_WORKGROUP_SIZE: usize = 256;

/// Three-component size or offset, `x` first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vec3 {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0, y: 0, z: 0 };
    pub const ONE: Vec3 = Vec3 { x: 1, y: 1, z: 1 };

    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    pub const fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    pub fn product(&self) -> usize {
        self.x * self.y * self.z
    }
}

impl From<[usize; 3]> for Vec3 {
    fn from(v: [usize; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Index<usize> for Vec3 {
    type Output = usize;

    fn index(&self, axis: usize) -> &usize {
        match axis {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("axis {axis} out of range"),
        }
    }
}

impl IndexMut<usize> for Vec3 {
    fn index_mut(&mut self, axis: usize) -> &mut usize {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("axis {axis} out of range"),
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One unit of work: global iteration space, requested grouping and offset.
///
/// A zero requested local size means the driver picks one. A zero global
/// component truncates the dimensionality at that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WorkGeometry {
    pub dim: usize,
    pub global: Vec3,
    pub local: Vec3,
    pub offset: Vec3,
}

impl WorkGeometry {
    /// Geometry whose dimensionality follows the non-zero global components.
    pub fn new(global: impl Into<Vec3>, local: impl Into<Vec3>, offset: impl Into<Vec3>) -> Self {
        let global = global.into();
        Self {
            dim: leading_non_zero(&global),
            global,
            local: local.into(),
            offset: offset.into(),
        }
    }

    pub fn with_dim(dim: usize, global: impl Into<Vec3>, local: impl Into<Vec3>, offset: impl Into<Vec3>) -> Self {
        Self {
            dim: dim.min(3),
            global: global.into(),
            local: local.into(),
            offset: offset.into(),
        }
    }

    /// Global size only, driver-chosen local size.
    pub fn global(global: impl Into<Vec3>) -> Self {
        Self::new(global, Vec3::ZERO, Vec3::ZERO)
    }

    /// Dimensionality after truncating at the first zero global component.
    pub fn effective_dim(&self) -> usize {
        self.dim.min(leading_non_zero(&self.global))
    }

    /// No work at all.
    pub fn is_empty(&self) -> bool {
        self.effective_dim() == 0
    }

    /// Global size with unused axes set to 1.
    pub fn normalized_global(&self) -> Vec3 {
        let dim = self.effective_dim();
        let mut global = Vec3::ONE;
        for axis in 0..dim {
            global[axis] = self.global[axis];
        }
        global
    }

    /// Requested local size, or a driver choice when any used axis is zero.
    pub fn resolved_local(&self, max_workgroup_size: usize) -> Vec3 {
        let dim = self.effective_dim();
        if (0..dim).any(|axis| self.local[axis] == 0) {
            return default_local_size(&self.normalized_global(), dim, max_workgroup_size);
        }
        let mut local = Vec3::ONE;
        for axis in 0..dim {
            local[axis] = self.local[axis];
        }
        local
    }
}

/// Pick a local size that evenly divides `global` and fits `max_workgroup_size`.
///
/// Axes are filled from `x` upwards, each taking the largest divisor of its
/// global size that still fits the remaining budget.
pub fn default_local_size(global: &Vec3, dim: usize, max_workgroup_size: usize) -> Vec3 {
    let mut budget = max_workgroup_size.max(1);
    let mut local = Vec3::ONE;
    for axis in 0..dim.min(3) {
        let size = largest_divisor_at_most(global[axis], budget);
        local[axis] = size;
        budget /= size;
    }
    local
}

fn largest_divisor_at_most(n: usize, limit: usize) -> usize {
    if n == 0 {
        return 1;
    }
    (1..=n.min(limit)).rev().find(|d| n % d == 0).unwrap_or(1)
}

fn leading_non_zero(v: &Vec3) -> usize {
    v.as_array().iter().take_while(|&&c| c != 0).count()
}
