//! Storage back-ends for builtin resources.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use super::join_path;

/// A named blob source. A miss is an empty vector.
pub trait Storage: Send + Sync {
    /// Root every name is resolved against.
    fn root_path(&self) -> &str;

    /// Load `name` relative to the root.
    fn load(&self, name: &str) -> Vec<u8> {
        self.load_impl(&join_path(self.root_path(), name))
    }

    /// Load an already rooted name.
    fn load_impl(&self, full_name: &str) -> Vec<u8>;
}

// ============================================================================
// Embedded blobs
// ============================================================================

/// In-memory table of bundled blobs, keyed by full resource name.
#[derive(Debug, Default)]
pub struct EmbeddedRegistry {
    resources: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl EmbeddedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blob. A later store under the same name replaces it.
    pub fn store(&self, name: impl Into<String>, blob: impl Into<Arc<[u8]>>) {
        let name = name.into();
        let blob = blob.into();
        log::debug!("Embedded builtin stored: {} ({} bytes)", name, blob.len());
        self.resources
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, blob);
    }

    pub fn get(&self, name: &str) -> Option<Arc<[u8]>> {
        self.resources
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.resources.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static EMBEDDED: OnceLock<Arc<EmbeddedRegistry>> = OnceLock::new();

/// Process-wide registry that bundled kernels register into at startup.
pub fn embedded_registry() -> Arc<EmbeddedRegistry> {
    Arc::clone(EMBEDDED.get_or_init(|| Arc::new(EmbeddedRegistry::new())))
}

/// Storage reading from an [`EmbeddedRegistry`].
pub struct EmbeddedStorage {
    root: String,
    registry: Arc<EmbeddedRegistry>,
}

impl EmbeddedStorage {
    /// Storage over the process-wide registry.
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_registry(root, embedded_registry())
    }

    pub fn with_registry(root: impl Into<String>, registry: Arc<EmbeddedRegistry>) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }
}

impl Storage for EmbeddedStorage {
    fn root_path(&self) -> &str {
        &self.root
    }

    fn load_impl(&self, full_name: &str) -> Vec<u8> {
        match self.registry.get(full_name) {
            Some(blob) => blob.to_vec(),
            None => Vec::new(),
        }
    }
}

// ============================================================================
// Installed kernel tree
// ============================================================================

/// Storage reading files below a root directory.
pub struct FileStorage {
    root: String,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_string_lossy().into_owned(),
        }
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }
}

impl Storage for FileStorage {
    fn root_path(&self) -> &str {
        &self.root
    }

    fn load_impl(&self, full_name: &str) -> Vec<u8> {
        match fs::read(full_name) {
            Ok(data) => {
                log::debug!("Loaded builtin file: {} ({} bytes)", full_name, data.len());
                data
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log::warn!("Failed to read builtin file {}: {}", full_name, e);
                Vec::new()
            }
        }
    }
}
