//! Per-operation builtin dispatch builders.
//!
//! A builder owns the kernel instances of one builtin operation on one device.
//! Their bound arguments are shared mutable state, reachable only through a
//! [`BuiltinOwnership`](super::BuiltinOwnership) guard.

use std::ops::{Index, IndexMut};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use super::aux_translation::AuxTranslationPool;
use super::ownership::ContextId;
use super::{BuiltinOp, BuiltinOpParams};
use crate::config::DispatchConfig;
use crate::device::Device;
use crate::dispatch::DispatchSequence;
use crate::error::DispatchResult;
use crate::kernel::KernelInstance;
use crate::resource::BuiltinCode;

/// Device facts an operation reads while building.
pub struct BuildEnv<'a> {
    pub device: &'a Device,
    pub max_workgroup_size: usize,
}

/// Layout and argument patching of one builtin operation.
pub trait BuiltinOperation: Send + Sync {
    fn op(&self) -> BuiltinOp;

    /// Kernel entry points, in the order they appear in the [`KernelSet`].
    fn kernel_names(&self) -> &'static [&'static str];

    /// Patch the shared kernels for `params` and produce the dispatch sequence.
    fn build(
        &self,
        state: &mut BuilderState,
        params: &BuiltinOpParams,
        env: &BuildEnv<'_>,
    ) -> DispatchResult<DispatchSequence>;
}

/// Kernel instances of a builder, indexed like `kernel_names()`.
#[derive(Debug, Clone)]
pub struct KernelSet {
    kernels: Vec<KernelInstance>,
}

impl KernelSet {
    pub fn new(names: &[&str], code: &BuiltinCode) -> Self {
        Self {
            kernels: names
                .iter()
                .map(|name| KernelInstance::new(*name, code.clone()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&KernelInstance> {
        self.kernels.iter().find(|k| k.name() == name)
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KernelInstance> {
        self.kernels.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, KernelInstance> {
        self.kernels.iter_mut()
    }
}

impl Index<usize> for KernelSet {
    type Output = KernelInstance;

    fn index(&self, index: usize) -> &KernelInstance {
        &self.kernels[index]
    }
}

impl IndexMut<usize> for KernelSet {
    fn index_mut(&mut self, index: usize) -> &mut KernelInstance {
        &mut self.kernels[index]
    }
}

/// Mutable state guarded by builtin ownership.
#[derive(Debug)]
pub struct BuilderState {
    pub kernels: KernelSet,
    /// Present only for aux translation.
    pub aux_pool: Option<AuxTranslationPool>,
    pub(crate) context: Option<ContextId>,
}

pub struct BuiltinDispatchBuilder {
    operation: Box<dyn BuiltinOperation>,
    device: Arc<Device>,
    code: BuiltinCode,
    max_workgroup_size: usize,
    state: Mutex<BuilderState>,
}

impl BuiltinDispatchBuilder {
    pub fn new(
        operation: Box<dyn BuiltinOperation>,
        device: Arc<Device>,
        code: BuiltinCode,
        config: &DispatchConfig,
    ) -> Self {
        let kernels = KernelSet::new(operation.kernel_names(), &code);
        let aux_pool = (operation.op() == BuiltinOp::AuxTranslation && !kernels.is_empty())
            .then(|| AuxTranslationPool::new(kernels[0].clone(), config.aux_pool_initial_size));
        let max_workgroup_size = config
            .max_workgroup_size
            .unwrap_or(device.capabilities().max_workgroup_size);

        log::info!(
            "Created builtin builder {} on {} ({} kernels, {} code)",
            operation.op(),
            device,
            kernels.len(),
            code.kind
        );

        Self {
            operation,
            device,
            code,
            max_workgroup_size,
            state: Mutex::new(BuilderState {
                kernels,
                aux_pool,
                context: None,
            }),
        }
    }

    pub fn op(&self) -> BuiltinOp {
        self.operation.op()
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn code(&self) -> &BuiltinCode {
        &self.code
    }

    pub fn kernel_names(&self) -> &'static [&'static str] {
        self.operation.kernel_names()
    }

    /// Some guard currently owns this builder.
    pub fn is_owned(&self) -> bool {
        matches!(self.state.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Lock the state without waiting. `None` when already owned.
    pub(crate) fn try_own(&self) -> Option<MutexGuard<'_, BuilderState>> {
        match self.state.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    pub(crate) fn build_owned(
        &self,
        state: &mut BuilderState,
        params: &BuiltinOpParams,
    ) -> DispatchResult<DispatchSequence> {
        let env = BuildEnv {
            device: &self.device,
            max_workgroup_size: self.max_workgroup_size,
        };
        self.operation.build(state, params, &env)
    }
}

impl std::fmt::Debug for BuiltinDispatchBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinDispatchBuilder")
            .field("op", &self.op())
            .field("device", &self.device.to_string())
            .field("code_kind", &self.code.kind)
            .finish()
    }
}
