//! Aux (compression state) translation.
//!
//! One `fullCopy` instance is bound per distinct target object, so the
//! builder keeps a pool of clones per direction that only ever grows.

use super::builder::{BuildEnv, BuilderState, BuiltinOperation};
use super::{AuxTranslationDirection, BuiltinOp, BuiltinOpParams};
use crate::config::DEFAULT_AUX_POOL_SIZE;
use crate::dispatch::{DispatchBuilder, DispatchSequence, RegionCoord, SplitPolicy, Vec3};
use crate::error::DispatchResult;
use crate::kernel::KernelInstance;
use crate::memory::MemoryTarget;

/// Cloned `fullCopy` instances, one array per translation direction.
#[derive(Debug, Clone)]
pub struct AuxTranslationPool {
    base: KernelInstance,
    to_non_aux: Vec<KernelInstance>,
    to_aux: Vec<KernelInstance>,
}

impl AuxTranslationPool {
    pub fn new(base: KernelInstance, initial_size: usize) -> Self {
        let mut pool = Self {
            base,
            to_non_aux: Vec::new(),
            to_aux: Vec::new(),
        };
        pool.grow_to(initial_size);
        pool
    }

    pub fn len(&self) -> usize {
        self.to_non_aux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn base(&self) -> &KernelInstance {
        &self.base
    }

    /// # Panics
    ///
    /// If `direction` is [`AuxTranslationDirection::None`].
    pub fn instances(&self, direction: AuxTranslationDirection) -> &[KernelInstance] {
        match direction {
            AuxTranslationDirection::AuxToNonAux => &self.to_non_aux,
            AuxTranslationDirection::NonAuxToAux => &self.to_aux,
            AuxTranslationDirection::None => panic!("aux translation direction is unset"),
        }
    }

    /// Grow both arrays to at least `len`. Never shrinks.
    pub fn grow_to(&mut self, len: usize) {
        let current = self.len();
        if len <= current {
            return;
        }
        for _ in current..len {
            self.to_non_aux.push(self.base.clone());
            self.to_aux.push(self.base.clone());
        }
        log::debug!("Aux translation pool grown from {} to {}", current, len);
    }

    /// Bind one instance per distinct target, in encounter order.
    ///
    /// # Panics
    ///
    /// If `direction` is [`AuxTranslationDirection::None`].
    pub fn translate(
        &mut self,
        targets: &[MemoryTarget],
        direction: AuxTranslationDirection,
    ) -> Vec<&KernelInstance> {
        if direction == AuxTranslationDirection::None {
            panic!("aux translation direction is unset");
        }
        let distinct = distinct_targets(targets);
        self.grow_to(distinct.len());

        let instances = match direction {
            AuxTranslationDirection::AuxToNonAux => &mut self.to_non_aux,
            _ => &mut self.to_aux,
        };
        let compress = direction == AuxTranslationDirection::NonAuxToAux;
        for (kernel, target) in instances.iter_mut().zip(&distinct) {
            kernel.set_arg_buffer(0, *target);
            kernel.set_arg_buffer(1, *target);
            kernel.set_output_compressed(compress);
        }
        instances[..distinct.len()].iter().collect()
    }
}

/// Targets with duplicate object ids removed, first occurrence kept.
pub fn distinct_targets(targets: &[MemoryTarget]) -> Vec<MemoryTarget> {
    let mut distinct: Vec<MemoryTarget> = Vec::with_capacity(targets.len());
    for target in targets {
        if !distinct.iter().any(|seen| seen.id == target.id) {
            distinct.push(*target);
        }
    }
    distinct
}

/// Work items needed to translate `size` bytes.
pub fn translation_work_items(size: usize, direction: AuxTranslationDirection) -> usize {
    match direction {
        AuxTranslationDirection::AuxToNonAux => size.next_multiple_of(512) / 16,
        AuxTranslationDirection::NonAuxToAux => size.next_multiple_of(4) / 4,
        AuxTranslationDirection::None => 0,
    }
}

pub struct AuxTranslation;

impl BuiltinOperation for AuxTranslation {
    fn op(&self) -> BuiltinOp {
        BuiltinOp::AuxTranslation
    }

    fn kernel_names(&self) -> &'static [&'static str] {
        &["fullCopy"]
    }

    fn build(
        &self,
        state: &mut BuilderState,
        params: &BuiltinOpParams,
        env: &BuildEnv<'_>,
    ) -> DispatchResult<DispatchSequence> {
        let direction = params.aux_direction;
        if direction == AuxTranslationDirection::None {
            panic!("aux translation requested with unset direction");
        }
        let mut sequence = DispatchSequence::new(self.op(), params.clone());
        let distinct = distinct_targets(&params.aux_targets);
        if distinct.is_empty() {
            return Ok(sequence);
        }

        let base = &state.kernels[0];
        let pool = state
            .aux_pool
            .get_or_insert_with(|| AuxTranslationPool::new(base.clone(), DEFAULT_AUX_POOL_SIZE));

        for (kernel, target) in pool.translate(&distinct, direction).into_iter().zip(&distinct) {
            let items = translation_work_items(target.size, direction);
            let mut builder = DispatchBuilder::new(1, SplitPolicy::None, env.max_workgroup_size);
            builder.set_kernel(RegionCoord::WHOLE, kernel);
            builder.set_dispatch_geometry(RegionCoord::WHOLE, Vec3::new(items, 0, 0), Vec3::ZERO, Vec3::ZERO);
            sequence.extend(builder.bake());
        }
        sequence.set_aux_targets(distinct);
        Ok(sequence)
    }
}
