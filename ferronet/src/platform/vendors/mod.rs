//! Built-in vendor profiles.
//!
//! Each module exposes functions returning a fresh [`VendorProfile`]; the
//! registry maps device type names onto them. Behaviors shared by several
//! families live in the `*_like` modules.
//!
//! [`VendorProfile`]: crate::platform::VendorProfile

mod comware_like;
mod ios_like;
mod junos_like;

pub mod arista;
pub mod aruba;
pub mod cisco;
pub mod fortinet;
pub mod fujitsu;
pub mod hp;
pub mod infotecs;
pub mod juniper;
pub mod mikrotik;
pub mod terminal;
pub mod ubiquiti;

pub use comware_like::ComwareLike;
pub use ios_like::IosLike;
pub use junos_like::JunosLike;
