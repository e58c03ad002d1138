//! Device identity and capability model.
//!
//! A [`Device`] pairs the capability flags reported by the surrounding driver
//! with the [`CoreHelper`] of its hardware family. The helper is resolved from
//! the family registry once, when the device is created.

pub mod families;
pub mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

pub use families::CoreHelper;
pub use registry::{core_helper_factory, registered_families};

/// Default cache line size in bytes.
pub const CACHE_LINE_SIZE: usize = 64;

/// GPU core generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HardwareFamily {
    Gen9,
    Gen11,
    Gen12Lp,
    XeHpg,
    XeHpc,
}

impl HardwareFamily {
    pub const ALL: [HardwareFamily; 5] = [
        Self::Gen9,
        Self::Gen11,
        Self::Gen12Lp,
        Self::XeHpg,
        Self::XeHpc,
    ];

    /// IP name used in builtin resource names.
    pub const fn ip_name(&self) -> &'static str {
        match self {
            Self::Gen9 => "gen9",
            Self::Gen11 => "gen11",
            Self::Gen12Lp => "gen12lp",
            Self::XeHpg => "xe_hpg",
            Self::XeHpc => "xe_hpc",
        }
    }
}

impl fmt::Display for HardwareFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ip_name())
    }
}

impl FromStr for HardwareFamily {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|family| family.ip_name() == wanted)
            .ok_or_else(|| DispatchError::UnknownHardwareFamily(s.to_string()))
    }
}

/// Memory addressing scheme a kernel variant is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressingMode {
    Heapless,
    Stateless,
    Bindless,
    Bindful,
    /// No addressing-specific variant.
    Default,
}

impl AddressingMode {
    /// Prefix prepended to the operation name in resource names.
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Heapless => "heapless_",
            Self::Stateless => "stateless_",
            Self::Bindless => "bindless_",
            Self::Bindful => "bindful_",
            Self::Default => "",
        }
    }
}

/// Capability flags reported by the surrounding driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub family: HardwareFamily,
    pub revision: u32,
    pub cache_line_size: usize,
    pub max_workgroup_size: usize,
    /// Buffers above 4 GiB are in use, so 32-bit stateful offsets are not enough.
    pub force_stateless: bool,
    pub heapless: bool,
    pub bindless: bool,
    pub image_support: bool,
    pub aux_translation: bool,
}

impl DeviceCapabilities {
    /// Typical capabilities of a family at revision 0.
    pub fn for_family(family: HardwareFamily) -> Self {
        Self {
            family,
            revision: 0,
            cache_line_size: CACHE_LINE_SIZE,
            max_workgroup_size: match family {
                HardwareFamily::XeHpc => 1024,
                _ => 256,
            },
            force_stateless: false,
            heapless: false,
            bindless: false,
            image_support: family != HardwareFamily::XeHpc,
            aux_translation: matches!(family, HardwareFamily::Gen12Lp | HardwareFamily::XeHpg),
        }
    }
}

/// A device as seen by the dispatch core.
pub struct Device {
    caps: DeviceCapabilities,
    helper: Box<dyn CoreHelper>,
}

impl Device {
    /// Resolve the family helper from the registry.
    pub fn new(caps: DeviceCapabilities) -> DispatchResult<Self> {
        let factory = core_helper_factory(caps.family)
            .ok_or_else(|| DispatchError::UnknownHardwareFamily(caps.family.to_string()))?;
        let helper = factory();
        let line = caps.cache_line_size;
        for element in [helper.bulk_copy_element_size(), helper.fill_element_size()] {
            if line == 0 || line % element != 0 {
                return Err(DispatchError::Config(format!(
                    "cache line size {} is not a multiple of the {}-byte bulk element on {}",
                    line, element, caps.family
                )));
            }
        }
        log::debug!("Device {} resolved core helper for {}", caps.family, helper.family());
        Ok(Self { caps, helper })
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    pub fn helper(&self) -> &dyn CoreHelper {
        self.helper.as_ref()
    }

    pub fn family(&self) -> HardwareFamily {
        self.caps.family
    }

    /// Family plus revision, e.g. `gen12lp_1`.
    pub fn ip_identity(&self) -> String {
        format!("{}_{}", self.caps.family.ip_name(), self.caps.revision)
    }

    pub fn cache_line_size(&self) -> usize {
        self.caps.cache_line_size
    }

    pub fn supports_images(&self) -> bool {
        self.caps.image_support && self.helper.supports_images()
    }

    pub fn supports_aux_translation(&self) -> bool {
        self.caps.aux_translation && self.helper.supports_aux_translation()
    }

    /// Addressing mode for an operation, `stateless_op` marking 64-bit offset variants.
    pub fn addressing_mode(&self, stateless_op: bool) -> AddressingMode {
        self.helper.addressing_mode(&self.caps, stateless_op)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("caps", &self.caps)
            .field("helper", &self.helper.family())
            .finish()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rev {})", self.caps.family, self.caps.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_round_trip_names() {
        for family in HardwareFamily::ALL {
            assert_eq!(family.ip_name().parse::<HardwareFamily>().unwrap(), family);
        }
        assert!("gen7".parse::<HardwareFamily>().is_err());
        assert_eq!(" XE_HPG ".parse::<HardwareFamily>().unwrap(), HardwareFamily::XeHpg);
    }

    #[test]
    fn test_ip_identity() {
        let mut caps = DeviceCapabilities::for_family(HardwareFamily::Gen12Lp);
        caps.revision = 3;
        let device = Device::new(caps).unwrap();
        assert_eq!(device.ip_identity(), "gen12lp_3");
        assert_eq!(device.cache_line_size(), 64);
    }

    #[test]
    fn test_cache_line_must_hold_whole_elements() {
        for line in [0, 8, 100] {
            let mut caps = DeviceCapabilities::for_family(HardwareFamily::Gen12Lp);
            caps.cache_line_size = line;
            assert!(matches!(Device::new(caps), Err(DispatchError::Config(_))), "line {}", line);
        }
        let mut caps = DeviceCapabilities::for_family(HardwareFamily::Gen12Lp);
        caps.cache_line_size = 128;
        assert_eq!(Device::new(caps).unwrap().cache_line_size(), 128);
    }

    #[test]
    fn test_image_support_needs_both_flags() {
        let hpc = Device::new(DeviceCapabilities::for_family(HardwareFamily::XeHpc)).unwrap();
        assert!(!hpc.supports_images());

        let mut caps = DeviceCapabilities::for_family(HardwareFamily::Gen9);
        assert!(Device::new(caps.clone()).unwrap().supports_images());
        caps.image_support = false;
        assert!(!Device::new(caps).unwrap().supports_images());
    }

    #[test]
    fn test_addressing_prefixes() {
        assert_eq!(AddressingMode::Heapless.prefix(), "heapless_");
        assert_eq!(AddressingMode::Stateless.prefix(), "stateless_");
        assert_eq!(AddressingMode::Bindless.prefix(), "bindless_");
        assert_eq!(AddressingMode::Bindful.prefix(), "bindful_");
        assert_eq!(AddressingMode::Default.prefix(), "");
    }
}
