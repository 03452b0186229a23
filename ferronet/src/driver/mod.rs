//! High-level session API for device interaction.
//!
//! The driver layer provides the main API for sending commands, applying
//! configuration and moving between modes on network devices.

mod builder;
mod config_set;
mod modes;
pub mod output;
pub(crate) mod response;
mod session;

pub use builder::SessionBuilder;
pub use config_set::ConfigSetOptions;
pub use modes::Mode;
pub use response::Response;
pub use session::{DEFAULT_READ_FOR, ExpectOptions, SendOptions, Session};
