//! A Rust library for priority-ordered Wi-Fi roaming on a single interface.
//!
//! This crate keeps one wireless interface attached to the best network it
//! knows about:
//!
//! - Scanning for visible SSIDs
//! - Picking the highest-priority known profile that is in range
//! - Connecting to open and WPA-PSK networks (via `wpa_supplicant`)
//! - Configuring addresses through DHCP or a static address and gateway
//! - Failing over to a better network as soon as it appears
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use roamrs::{RoamConfig, RoamingLoop, ShutdownHandler, SystemOps, TomlProfileStore};
//!
//! # async fn example() -> roamrs::Result<()> {
//! let config = RoamConfig::new().with_interface("wlan1");
//! let store = TomlProfileStore::new("/etc/roamrs/profiles.toml");
//! let (handler, shutdown) = ShutdownHandler::new();
//! handler.listen_for_signals()?;
//!
//! let mut roaming =
//!     RoamingLoop::start(Arc::new(SystemOps::new()), store, config, shutdown).await?;
//! roaming.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Profiles
//!
//! Profiles are read from a TOML file, one table per network. The order of
//! the tables is the priority order: the first table wins whenever its
//! network is visible.
//!
//! ```toml
//! [HomeNet]
//! pass = "correct horse battery staple"
//!
//! ["Cafe Guest"]
//!
//! [Lab]
//! ip = "10.0.0.5/24"
//! gateway = "10.0.0.1"
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return `Result<T, RoamError>`. Scan failures are
//! retried by the roaming loop; configuration errors abort startup. Failures
//! of individual system commands while connecting or disconnecting are logged
//! and otherwise ignored.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`. For example:

//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod types;
mod util;

// Public API modules
pub mod api;
pub mod core;
pub mod ops;

// Re-exported public API
pub use api::config::RoamConfig;
pub use api::models::{
    ActiveLink, AddressingMode, ConnectionProfile, ConnectionState, OpError, ProfileList,
    RoamError, SecurityMode,
};
pub use crate::core::controller::ConnectionController;
pub use crate::core::profiles::{ProfileStore, TomlProfileStore};
pub use crate::core::roaming::{RoamingLoop, TickOutcome};
pub use crate::core::scan::Scanner;
pub use crate::core::shutdown::{ShutdownHandler, ShutdownSignal};
pub use ops::{NetworkOps, ProcessKind, SystemOps};

/// A specialized `Result` type for roaming operations.
pub type Result<T> = std::result::Result<T, RoamError>;
