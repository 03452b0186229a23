//! Device type registry.
//!
//! Maps the case-sensitive device type names accepted by
//! [`create`](crate::create) onto the built-in vendor profiles.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::VendorProfile;
use super::vendors::{
    arista, aruba, cisco, fortinet, fujitsu, hp, infotecs, juniper, mikrotik, terminal, ubiquiti,
};

/// Built-in profiles, keyed by device type.
static REGISTRY: Lazy<IndexMap<&'static str, Arc<VendorProfile>>> = Lazy::new(|| {
    let builtin: [(&'static str, fn() -> VendorProfile); 18] = [
        ("arista_eos", arista::eos),
        ("aruba_aos_6", aruba::aos6),
        ("aruba_aos_8", aruba::aos8),
        ("cisco_asa", cisco::asa),
        ("cisco_ftd", cisco::ftd),
        ("cisco_ios", cisco::ios),
        ("cisco_ios_xe", cisco::ios_xe),
        ("cisco_ios_xr", cisco::ios_xr),
        ("cisco_nxos", cisco::nxos),
        ("fortinet", fortinet::fortigate),
        ("fujitsu_switch", fujitsu::switch),
        ("hp_comware", hp::comware),
        ("hp_comware_limited", hp::comware_limited),
        ("hw1000", infotecs::hw1000),
        ("juniper_junos", juniper::junos),
        ("mikrotik_routeros", mikrotik::routeros),
        ("terminal", terminal::shell),
        ("ubiquity_edge", ubiquiti::edge),
    ];

    builtin
        .into_iter()
        .map(|(name, profile)| (name, Arc::new(profile())))
        .collect()
});

/// Look up the shared profile for a device type.
pub fn lookup(device_type: &str) -> Option<Arc<VendorProfile>> {
    REGISTRY.get(device_type).cloned()
}

/// All supported device types, sorted.
pub fn supported_device_types() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}
