//! Per-family core helpers.

use super::{AddressingMode, DeviceCapabilities, HardwareFamily};

/// Family-specific answers the dispatch core needs.
///
/// One implementation per [`HardwareFamily`]; a device holds the helper it
/// resolved at creation and never looks it up again.
pub trait CoreHelper: Send + Sync {
    fn family(&self) -> HardwareFamily;

    /// Element width in bytes of the bulk (middle) buffer copy kernel.
    fn bulk_copy_element_size(&self) -> usize {
        16
    }

    /// Element width in bytes of the bulk (middle) buffer fill kernel.
    fn fill_element_size(&self) -> usize {
        4
    }

    fn supports_images(&self) -> bool {
        true
    }

    fn supports_aux_translation(&self) -> bool {
        false
    }

    fn supports_heapless(&self) -> bool {
        false
    }

    fn supports_bindless(&self) -> bool {
        false
    }

    /// Kernels for this family are built against bindful surface state.
    fn has_bindful_surface_state(&self) -> bool {
        false
    }

    fn addressing_mode(&self, caps: &DeviceCapabilities, stateless_op: bool) -> AddressingMode {
        if caps.heapless && self.supports_heapless() {
            AddressingMode::Heapless
        } else if stateless_op || caps.force_stateless {
            AddressingMode::Stateless
        } else if caps.bindless && self.supports_bindless() {
            AddressingMode::Bindless
        } else if self.has_bindful_surface_state() {
            AddressingMode::Bindful
        } else {
            AddressingMode::Default
        }
    }
}

pub struct Gen9Helper;

impl CoreHelper for Gen9Helper {
    fn family(&self) -> HardwareFamily {
        HardwareFamily::Gen9
    }
}

pub struct Gen11Helper;

impl CoreHelper for Gen11Helper {
    fn family(&self) -> HardwareFamily {
        HardwareFamily::Gen11
    }
}

pub struct Gen12LpHelper;

impl CoreHelper for Gen12LpHelper {
    fn family(&self) -> HardwareFamily {
        HardwareFamily::Gen12Lp
    }

    fn supports_aux_translation(&self) -> bool {
        true
    }

    fn has_bindful_surface_state(&self) -> bool {
        true
    }
}

pub struct XeHpgHelper;

impl CoreHelper for XeHpgHelper {
    fn family(&self) -> HardwareFamily {
        HardwareFamily::XeHpg
    }

    fn supports_aux_translation(&self) -> bool {
        true
    }

    fn supports_bindless(&self) -> bool {
        true
    }

    fn has_bindful_surface_state(&self) -> bool {
        true
    }
}

pub struct XeHpcHelper;

impl CoreHelper for XeHpcHelper {
    fn family(&self) -> HardwareFamily {
        HardwareFamily::XeHpc
    }

    // No sampler hardware on this family.
    fn supports_images(&self) -> bool {
        false
    }

    fn supports_heapless(&self) -> bool {
        true
    }

    fn supports_bindless(&self) -> bool {
        true
    }

    fn has_bindful_surface_state(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(family: HardwareFamily) -> DeviceCapabilities {
        DeviceCapabilities::for_family(family)
    }

    #[test]
    fn test_legacy_families_have_no_prefix() {
        assert_eq!(Gen9Helper.addressing_mode(&caps(HardwareFamily::Gen9), false), AddressingMode::Default);
        assert_eq!(Gen11Helper.addressing_mode(&caps(HardwareFamily::Gen11), false), AddressingMode::Default);
        assert_eq!(Gen9Helper.addressing_mode(&caps(HardwareFamily::Gen9), true), AddressingMode::Stateless);
    }

    #[test]
    fn test_force_stateless_overrides_bindful() {
        let mut c = caps(HardwareFamily::Gen12Lp);
        assert_eq!(Gen12LpHelper.addressing_mode(&c, false), AddressingMode::Bindful);
        c.force_stateless = true;
        assert_eq!(Gen12LpHelper.addressing_mode(&c, false), AddressingMode::Stateless);
    }

    #[test]
    fn test_bindless_only_where_supported() {
        let mut c = caps(HardwareFamily::Gen12Lp);
        c.bindless = true;
        assert_eq!(Gen12LpHelper.addressing_mode(&c, false), AddressingMode::Bindful);

        let mut c = caps(HardwareFamily::XeHpg);
        c.bindless = true;
        assert_eq!(XeHpgHelper.addressing_mode(&c, false), AddressingMode::Bindless);
    }

    #[test]
    fn test_heapless_wins_over_stateless() {
        let mut c = caps(HardwareFamily::XeHpc);
        c.heapless = true;
        assert_eq!(XeHpcHelper.addressing_mode(&c, true), AddressingMode::Heapless);

        let mut c = caps(HardwareFamily::XeHpg);
        c.heapless = true;
        assert_eq!(XeHpgHelper.addressing_mode(&c, true), AddressingMode::Stateless);
    }

    #[test]
    fn test_element_widths() {
        assert_eq!(Gen9Helper.bulk_copy_element_size(), 16);
        assert_eq!(Gen9Helper.fill_element_size(), 4);
    }
}
