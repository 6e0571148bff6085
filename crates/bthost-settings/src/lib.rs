//! Persistent settings store boundary for the bthost stack.
//!
//! This crate defines the narrow interface the host consumes from whatever
//! key/value settings subsystem backs the device:
//! - a backend that can initialize itself, replay a namespace at boot, and
//!   write single values
//! - a handler that receives one callback per stored entry plus a final
//!   commit callback once the replay is done
//!
//! The replay contract is deliberately loose: entries arrive in whatever
//! order the backend enumerates them, every entry under the namespace is
//! visited exactly once per load pass, and `commit` always runs after the
//! last entry.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod traits;

pub use error::{SettingsError, SettingsResult};
pub use memory::MemorySettings;
pub use traits::{SettingsBackend, SettingsHandler, SettingsValue};
