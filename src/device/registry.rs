//! Hardware-family registry.
//!
//! Maps each [`HardwareFamily`] to the factory of its [`CoreHelper`]. The table
//! is built on first use and read-only afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::families::{CoreHelper, Gen11Helper, Gen12LpHelper, Gen9Helper, XeHpcHelper, XeHpgHelper};
use super::HardwareFamily;

pub type CoreHelperFactory = fn() -> Box<dyn CoreHelper>;

static REGISTRY: OnceLock<HashMap<HardwareFamily, CoreHelperFactory>> = OnceLock::new();

fn registry() -> &'static HashMap<HardwareFamily, CoreHelperFactory> {
    REGISTRY.get_or_init(|| {
        let mut table: HashMap<HardwareFamily, CoreHelperFactory> = HashMap::new();
        table.insert(HardwareFamily::Gen9, create_gen9_helper);
        table.insert(HardwareFamily::Gen11, create_gen11_helper);
        table.insert(HardwareFamily::Gen12Lp, create_gen12lp_helper);
        table.insert(HardwareFamily::XeHpg, create_xe_hpg_helper);
        table.insert(HardwareFamily::XeHpc, create_xe_hpc_helper);
        log::info!("Registered {} hardware families", table.len());
        table
    })
}

/// Factory for `family`, if one is registered.
pub fn core_helper_factory(family: HardwareFamily) -> Option<CoreHelperFactory> {
    registry().get(&family).copied()
}

/// Registered families in ascending order.
pub fn registered_families() -> Vec<HardwareFamily> {
    let mut families: Vec<_> = registry().keys().copied().collect();
    families.sort();
    families
}

fn create_gen9_helper() -> Box<dyn CoreHelper> {
    Box::new(Gen9Helper)
}

fn create_gen11_helper() -> Box<dyn CoreHelper> {
    Box::new(Gen11Helper)
}

fn create_gen12lp_helper() -> Box<dyn CoreHelper> {
    Box::new(Gen12LpHelper)
}

fn create_xe_hpg_helper() -> Box<dyn CoreHelper> {
    Box::new(XeHpgHelper)
}

fn create_xe_hpc_helper() -> Box<dyn CoreHelper> {
    Box::new(XeHpcHelper)
}
