//! Builtin operation resolution for one device.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::aux_translation::AuxTranslation;
use super::buffer_rect::CopyBufferRect;
use super::builder::{BuiltinDispatchBuilder, BuiltinOperation};
use super::copy_buffer::CopyBufferToBuffer;
use super::fill_buffer::FillBuffer;
use super::image::{CopyBufferToImage3d, CopyImage3dToBuffer, CopyImageToImage3d, FillImage3d};
use super::ownership::{BuiltinOwnership, ContextId};
use super::{BuiltinOp, BuiltinOpParams};
use crate::config::DispatchConfig;
use crate::device::Device;
use crate::dispatch::DispatchSequence;
use crate::error::{DispatchError, DispatchResult};
use crate::resource::{CodeKind, ResourceCache};

/// Operation layout for `op`.
pub fn create_operation(op: BuiltinOp) -> Box<dyn BuiltinOperation> {
    let stateless = op.is_stateless();
    match op {
        BuiltinOp::CopyBufferToBuffer | BuiltinOp::CopyBufferToBufferStateless => {
            Box::new(CopyBufferToBuffer::new(stateless))
        }
        BuiltinOp::CopyBufferRect | BuiltinOp::CopyBufferRectStateless => Box::new(CopyBufferRect::new(stateless)),
        BuiltinOp::FillBuffer | BuiltinOp::FillBufferStateless => Box::new(FillBuffer::new(stateless)),
        BuiltinOp::CopyBufferToImage3d | BuiltinOp::CopyBufferToImage3dStateless => {
            Box::new(CopyBufferToImage3d::new(stateless))
        }
        BuiltinOp::CopyImage3dToBuffer | BuiltinOp::CopyImage3dToBufferStateless => {
            Box::new(CopyImage3dToBuffer::new(stateless))
        }
        BuiltinOp::CopyImageToImage3d => Box::new(CopyImageToImage3d),
        BuiltinOp::FillImage3d => Box::new(FillImage3d),
        BuiltinOp::AuxTranslation => Box::new(AuxTranslation),
    }
}

/// Lazily creates one builder per operation and turns requests into
/// dispatch sequences.
pub struct BuiltinResolver {
    device: Arc<Device>,
    cache: Arc<ResourceCache>,
    config: DispatchConfig,
    builders: Mutex<HashMap<BuiltinOp, Arc<BuiltinDispatchBuilder>>>,
}

impl BuiltinResolver {
    pub fn new(device: Arc<Device>, cache: Arc<ResourceCache>, config: DispatchConfig) -> Self {
        Self {
            device,
            cache,
            config,
            builders: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver with a cache built from `config`.
    pub fn from_config(device: Arc<Device>, config: DispatchConfig) -> Self {
        let cache = Arc::new(ResourceCache::from_config(&config));
        Self::new(device, cache, config)
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Builder for `op`, created on first use.
    pub fn builder(&self, op: BuiltinOp) -> DispatchResult<Arc<BuiltinDispatchBuilder>> {
        let mut builders = self.builders.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(builder) = builders.get(&op) {
            return Ok(Arc::clone(builder));
        }

        if op.uses_images() && !self.device.supports_images() {
            return Err(DispatchError::UnsupportedOperation(format!(
                "{} (no image support on {})",
                op, self.device
            )));
        }
        if op == BuiltinOp::AuxTranslation && !self.device.supports_aux_translation() {
            return Err(DispatchError::UnsupportedOperation(format!(
                "{} (no aux translation on {})",
                op, self.device
            )));
        }

        let code = self.cache.get(op, CodeKind::Any, &self.device);
        if code.is_empty() {
            log::warn!("No builtin code for {} on {}", op, self.device);
            return Err(DispatchError::MissingBuiltinCode {
                operation: op.to_string(),
                device: self.device.ip_identity(),
            });
        }

        let builder = Arc::new(BuiltinDispatchBuilder::new(
            create_operation(op),
            Arc::clone(&self.device),
            code,
            &self.config,
        ));
        builders.insert(op, Arc::clone(&builder));
        Ok(builder)
    }

    /// Builder for a numeric operation id.
    pub fn builder_by_id(&self, id: u32) -> DispatchResult<Arc<BuiltinDispatchBuilder>> {
        self.builder(BuiltinOp::from_id(id)?)
    }

    /// Number of builders created so far.
    pub fn builder_count(&self) -> usize {
        self.builders.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Build the dispatch sequence for one request on behalf of `context`.
    ///
    /// The stateless variant is used when the device forces it. Ownership of
    /// the builder is held only while its kernels are patched; callers that
    /// need it across encoding should use [`builder`](Self::builder) and
    /// [`BuiltinOwnership`] directly.
    ///
    /// # Panics
    ///
    /// If the builder is already owned, or an aux translation has no direction.
    pub fn resolve(
        &self,
        op: BuiltinOp,
        params: &BuiltinOpParams,
        context: ContextId,
    ) -> DispatchResult<DispatchSequence> {
        let op = op.for_device(&self.device);
        let builder = self.builder(op)?;
        let mut ownership = BuiltinOwnership::new(&builder, context);
        let sequence = ownership.build_dispatch(params)?;
        log::debug!("Resolved {} into {} descriptors", op, sequence.len());
        Ok(sequence)
    }
}

impl std::fmt::Debug for BuiltinResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinResolver")
            .field("device", &self.device.to_string())
            .field("builders", &self.builder_count())
            .finish()
    }
}
