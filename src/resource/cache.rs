//! Layered, lazily populated cache of builtin kernel code.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use super::storage::{EmbeddedStorage, FileStorage, Storage};
use super::{resource_name, BuiltinCode, CodeKind};
use crate::builtins::BuiltinOp;
use crate::config::DispatchConfig;
use crate::device::{AddressingMode, Device};

/// Identity of one cached blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// Operation resource name, e.g. `copy_buffer_to_buffer`.
    pub operation: String,
    /// Concrete kind. Never [`CodeKind::Any`].
    pub kind: CodeKind,
    /// Device IP identity, e.g. `gen12lp_0`.
    pub ip: String,
    pub addressing: AddressingMode,
}

impl ResourceKey {
    pub fn new(operation: &str, kind: CodeKind, ip: &str, addressing: AddressingMode) -> Self {
        Self {
            operation: operation.to_string(),
            kind,
            ip: ip.to_string(),
            addressing,
        }
    }

    /// Names to try, most specific first.
    pub fn candidate_names(&self) -> [String; 2] {
        [
            resource_name(&self.operation, self.addressing, self.kind, Some(&self.ip)),
            resource_name(&self.operation, self.addressing, self.kind, None),
        ]
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}{:?}", self.operation, self.kind, self.ip, self.addressing)
    }
}

/// Builtin code cache over an ordered list of storages.
///
/// Only hits are cached. The first value inserted for a key is kept for the
/// lifetime of the cache and returned to every later caller.
pub struct ResourceCache {
    storages: Vec<Box<dyn Storage>>,
    prefer_source: bool,
    resources: Mutex<HashMap<ResourceKey, Arc<[u8]>>>,
}

impl ResourceCache {
    /// Cache over `storages`, probed in the given order.
    pub fn new(storages: Vec<Box<dyn Storage>>) -> Self {
        Self {
            storages,
            prefer_source: false,
            resources: Mutex::new(HashMap::new()),
        }
    }

    /// Embedded table first, then the installed kernel tree.
    pub fn from_config(config: &DispatchConfig) -> Self {
        let root = config.resolved_kernel_root();
        log::debug!("Builtin file storage root: {:?}", root);
        let storages: Vec<Box<dyn Storage>> = vec![
            Box::new(EmbeddedStorage::new("")),
            Box::new(FileStorage::new(root)),
        ];
        let mut cache = Self::new(storages);
        cache.set_prefer_source(config.prefer_source);
        cache
    }

    /// Probe source before binaries for [`CodeKind::Any`].
    pub fn set_prefer_source(&mut self, prefer_source: bool) {
        self.prefer_source = prefer_source;
    }

    pub fn prefer_source(&self) -> bool {
        self.prefer_source
    }

    /// Code for `op` on `device`.
    ///
    /// `CodeKind::Any` returns the first kind found in probe order. A miss is an
    /// empty [`BuiltinCode`], never an error.
    pub fn get(&self, op: BuiltinOp, kind: CodeKind, device: &Device) -> BuiltinCode {
        let addressing = device.addressing_mode(op.is_stateless());
        let ip = device.ip_identity();
        let kinds: Vec<CodeKind> = match kind {
            CodeKind::Any => CodeKind::probe_order(self.prefer_source).to_vec(),
            concrete => vec![concrete],
        };

        for kind in kinds {
            let key = ResourceKey::new(op.resource_name(), kind, &ip, addressing);
            let blob = self.get_resource(&key);
            if !blob.is_empty() {
                return BuiltinCode { kind, resource: blob };
            }
        }
        log::debug!("No {} code for {} on {}", kind, op, device);
        BuiltinCode { kind, resource: Arc::from(Vec::new()) }
    }

    /// Blob for one concrete key, loading it on first use.
    pub fn get_resource(&self, key: &ResourceKey) -> Arc<[u8]> {
        if let Some(hit) = self.lock().get(key) {
            return Arc::clone(hit);
        }

        let loaded = self.load(key);
        if loaded.is_empty() {
            return Arc::from(loaded);
        }

        match self.lock().entry(key.clone()) {
            Entry::Occupied(existing) => Arc::clone(existing.get()),
            Entry::Vacant(slot) => {
                log::debug!("Cached builtin resource {} ({} bytes)", key, loaded.len());
                Arc::clone(slot.insert(Arc::from(loaded)))
            }
        }
    }

    /// Number of cached blobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self, key: &ResourceKey) -> Vec<u8> {
        for name in key.candidate_names() {
            for storage in &self.storages {
                let data = storage.load(&name);
                if !data.is_empty() {
                    log::debug!("Builtin resource hit: {} in {:?}", name, storage.root_path());
                    return data;
                }
            }
        }
        log::debug!("Builtin resource miss: {}", key);
        Vec::new()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ResourceKey, Arc<[u8]>>> {
        self.resources.lock().unwrap_or_else(|e| e.into_inner())
    }
}
