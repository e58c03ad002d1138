//! Scoped exclusive ownership of a builtin builder.
//!
//! Patching a builtin's kernels and encoding the resulting sequence must not
//! interleave with another request on the same builder. Ownership is taken
//! without waiting: if the builder is already owned, by this guard or any
//! other, the caller has a bug and the call panics. Dropping the guard
//! releases ownership.

use std::sync::MutexGuard;

use super::builder::{BuilderState, BuiltinDispatchBuilder};
use super::BuiltinOpParams;
use crate::dispatch::DispatchSequence;
use crate::error::DispatchResult;

/// Execution context (queue or command list) a builder is owned on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

/// Guard holding exclusive access to one builder. Not `Clone`.
pub struct BuiltinOwnership<'a> {
    builder: Option<&'a BuiltinDispatchBuilder>,
    state: Option<MutexGuard<'a, BuilderState>>,
}

impl<'a> BuiltinOwnership<'a> {
    /// A guard owning nothing yet.
    pub fn empty() -> Self {
        Self {
            builder: None,
            state: None,
        }
    }

    /// Take ownership of `builder` for `context`.
    pub fn new(builder: &'a BuiltinDispatchBuilder, context: ContextId) -> Self {
        let mut ownership = Self::empty();
        ownership.take_ownership(builder, context);
        ownership
    }

    /// # Panics
    ///
    /// If this guard already owns a builder, or `builder` is owned elsewhere.
    pub fn take_ownership(&mut self, builder: &'a BuiltinDispatchBuilder, context: ContextId) {
        if let Some(held) = self.builder {
            panic!(
                "builtin ownership already held on {} while taking {}",
                held.op(),
                builder.op()
            );
        }
        let Some(mut state) = builder.try_own() else {
            panic!("builtin {} is already owned by another context", builder.op());
        };
        state.context = Some(context);
        log::debug!("Context {:?} took ownership of builtin {}", context, builder.op());
        self.builder = Some(builder);
        self.state = Some(state);
    }

    pub fn is_owned(&self) -> bool {
        self.state.is_some()
    }

    pub fn builder(&self) -> Option<&'a BuiltinDispatchBuilder> {
        self.builder
    }

    pub fn context(&self) -> Option<ContextId> {
        self.state.as_ref().and_then(|state| state.context)
    }

    /// Patch the owned builder's kernels for `params` and build its sequence.
    ///
    /// # Panics
    ///
    /// If the guard owns nothing.
    pub fn build_dispatch(&mut self, params: &BuiltinOpParams) -> DispatchResult<DispatchSequence> {
        let (Some(builder), Some(state)) = (self.builder, self.state.as_mut()) else {
            panic!("build_dispatch called without builtin ownership");
        };
        builder.build_owned(state, params)
    }

    /// Owned state, for inspection.
    pub fn state(&self) -> Option<&BuilderState> {
        self.state.as_deref()
    }

    /// Give ownership back. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.context = None;
            if let Some(builder) = self.builder {
                log::debug!("Released ownership of builtin {}", builder.op());
            }
        }
        self.builder = None;
    }
}

impl Drop for BuiltinOwnership<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl Default for BuiltinOwnership<'_> {
    fn default() -> Self {
        Self::empty()
    }
}
