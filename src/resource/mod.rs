//! Precompiled builtin kernel resources.
//!
//! Builtin kernels ship as binaries, intermediate IR and source. Each blob is
//! named after its operation, addressing mode and code kind, optionally
//! prefixed with the device IP it was built for:
//!
//! ```text
//! {ip}_{revision}_{prefix}{operation}.builtin_kernel{ext}   # IP-specific
//! {prefix}{operation}.builtin_kernel{ext}                    # generic
//! ```
//!
//! Blobs are looked up in an embedded table first and in the installed kernel
//! tree second. See [`ResourceCache`].

pub mod cache;
pub mod storage;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::device::AddressingMode;

pub use cache::{ResourceCache, ResourceKey};
pub use storage::{embedded_registry, EmbeddedRegistry, EmbeddedStorage, FileStorage, Storage};

/// Suffix shared by every builtin resource.
pub const BUILTIN_SUFFIX: &str = ".builtin_kernel";

/// Form a builtin kernel's code is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CodeKind {
    /// Whatever is available, probed in precedence order.
    Any,
    Binary,
    Intermediate,
    Source,
}

impl CodeKind {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Any => "",
            Self::Binary => ".bin",
            Self::Intermediate => ".bc",
            Self::Source => ".cl",
        }
    }

    /// Probe order used for [`CodeKind::Any`].
    pub const fn probe_order(prefer_source: bool) -> [CodeKind; 3] {
        if prefer_source {
            [Self::Source, Self::Intermediate, Self::Binary]
        } else {
            [Self::Binary, Self::Intermediate, Self::Source]
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Binary => "binary",
            Self::Intermediate => "intermediate",
            Self::Source => "source",
        };
        f.write_str(name)
    }
}

/// A loaded blob and the kind it was found as.
///
/// The bytes are shared; cloning never copies the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinCode {
    pub kind: CodeKind,
    pub resource: Arc<[u8]>,
}

impl BuiltinCode {
    /// Nothing found.
    pub fn empty() -> Self {
        Self {
            kind: CodeKind::Any,
            resource: Arc::from(Vec::new()),
        }
    }

    pub fn new(kind: CodeKind, resource: impl Into<Arc<[u8]>>) -> Self {
        Self {
            kind,
            resource: resource.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resource.len()
    }
}

/// Resource name for `operation` (e.g. `copy_buffer_to_buffer`).
///
/// `ip` is the device IP identity; `None` yields the generic name.
pub fn resource_name(operation: &str, addressing: AddressingMode, kind: CodeKind, ip: Option<&str>) -> String {
    let base = format!("{}{}{}{}", addressing.prefix(), operation, BUILTIN_SUFFIX, kind.extension());
    match ip {
        Some(ip) if !ip.is_empty() => format!("{}_{}", ip, base),
        _ => base,
    }
}

/// Join a storage root and a resource name with a single separator.
pub fn join_path(root: &str, name: &str) -> String {
    if root.is_empty() {
        return name.to_string();
    }
    if name.is_empty() {
        return root.to_string();
    }
    if root.ends_with(std::path::MAIN_SEPARATOR) {
        format!("{}{}", root, name)
    } else {
        format!("{}{}{}", root, std::path::MAIN_SEPARATOR, name)
    }
}
