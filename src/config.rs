//! Runtime configuration for builtin dispatch.
//!
//! Settings are layered: built-in defaults, then an optional JSON file named by
//! `BUILTIN_DISPATCH_CONFIG`, then individual environment overrides.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

pub const ENV_CONFIG_FILE: &str = "BUILTIN_DISPATCH_CONFIG";
pub const ENV_PREFER_SOURCE: &str = "BUILTIN_DISPATCH_PREFER_SOURCE";
pub const ENV_KERNEL_DIR: &str = "BUILTIN_DISPATCH_KERNEL_DIR";
pub const ENV_AUX_POOL_SIZE: &str = "BUILTIN_DISPATCH_AUX_POOL_SIZE";
pub const ENV_MAX_WG_SIZE: &str = "BUILTIN_DISPATCH_MAX_WG_SIZE";

/// Number of aux translation kernels cloned up front.
pub const DEFAULT_AUX_POOL_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Probe source code before precompiled binaries (kernel rebuild debugging).
    pub prefer_source: bool,
    /// Root of the installed kernel tree. `None` uses the platform data dir.
    pub kernel_root: Option<PathBuf>,
    pub aux_pool_initial_size: usize,
    /// Overrides the device limit used when the driver picks a local size.
    pub max_workgroup_size: Option<usize>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefer_source: false,
            kernel_root: None,
            aux_pool_initial_size: DEFAULT_AUX_POOL_SIZE,
            max_workgroup_size: None,
        }
    }
}

impl DispatchConfig {
    /// Defaults, then the config file, then environment overrides.
    pub fn from_env() -> DispatchResult<Self> {
        let mut config = match env::var(ENV_CONFIG_FILE) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> DispatchResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str::<DispatchConfig>(&content)?;
        config.validate()?;
        log::debug!("Loaded dispatch config from: {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.max_workgroup_size == Some(0) {
            return Err(DispatchError::Config("max_workgroup_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Apply `BUILTIN_DISPATCH_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are logged and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PREFER_SOURCE) {
            match parse_flag(&value) {
                Some(flag) => self.prefer_source = flag,
                None => log::warn!("Ignoring {}={:?}: expected a boolean", ENV_PREFER_SOURCE, value),
            }
        }
        if let Some(value) = lookup(ENV_KERNEL_DIR) {
            let value = value.trim();
            if !value.is_empty() {
                self.kernel_root = Some(PathBuf::from(value));
            }
        }
        if let Some(value) = lookup(ENV_AUX_POOL_SIZE) {
            match value.trim().parse::<usize>() {
                Ok(size) => self.aux_pool_initial_size = size,
                Err(e) => log::warn!("Ignoring {}={:?}: {}", ENV_AUX_POOL_SIZE, value, e),
            }
        }
        if let Some(value) = lookup(ENV_MAX_WG_SIZE) {
            match value.trim().parse::<usize>() {
                Ok(size) if size > 0 => self.max_workgroup_size = Some(size),
                _ => log::warn!("Ignoring {}={:?}: expected a positive integer", ENV_MAX_WG_SIZE, value),
            }
        }
    }

    /// Directory the file storage reads installed kernels from.
    pub fn resolved_kernel_root(&self) -> PathBuf {
        if let Some(root) = &self.kernel_root {
            return root.clone();
        }
        match dirs::data_dir() {
            Some(dir) => dir.join("builtin-dispatch").join("kernels"),
            None => PathBuf::from("kernels"),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
