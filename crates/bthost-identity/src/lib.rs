//! Persistent identity subsystem for the bthost stack.
//!
//! Converts a host's identity state (identity addresses, resolving keys,
//! device name, appearance) into namespaced entries in a persistent
//! settings store and reconstructs that state at boot. The subsystem also
//! owns the ordering contract between "settings loaded" and "controller
//! link ready": identity setup issues controller commands, so a load pass
//! that arrives before the link is enabled is deferred, not failed.
//!
//! ## Components
//!
//! - [`keys`]: the `bt/<subsys>/<addr><type>[/<key>]` path codec
//! - [`IdentityRecords`]: the in-memory identity record store
//! - [`IdentityHost`]: ingestion of replayed entries, the one-shot commit
//!   pass, and the coalesced deferred write-back
//! - [`IdentityProvider`]: the controller-side collaborator
//!
//! The persistent store itself is the `bthost-settings` boundary; this
//! crate never touches flash or files directly.
//!
//! ## Boot flow
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bthost_identity::{IdentityConfig, IdentityHost, StaticProvider, GeneratedIdentity, IdentityAddr};
//! use bthost_settings::MemorySettings;
//!
//! # async fn boot() -> bthost_identity::IdentityResult<()> {
//! let backend = Arc::new(MemorySettings::new());
//! let provider = Arc::new(StaticProvider::random_only(GeneratedIdentity {
//!     addr: IdentityAddr::random([0xc0, 0, 0, 0, 0, 0x01]),
//!     irk: None,
//! }));
//!
//! let host = IdentityHost::new(IdentityConfig::default(), backend, provider);
//! host.init().await?;
//! host.set_enabled(true).await;
//! host.load().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod addr;
mod config;
mod error;
mod handler;
pub mod keys;
mod provider;
mod records;
mod saver;

pub use addr::{AddrType, IdentityAddr, ResolvingKey, ADDR_LEN, RECORD_LEN};
pub use config::IdentityConfig;
pub use error::{IdentityError, IdentityResult};
pub use handler::IdentityHost;
pub use provider::{GeneratedIdentity, IdentityProvider, StaticProvider};
pub use records::IdentityRecords;
