//! Operations the agent performs against the operating system.
//!
//! [`NetworkOps`] is the only way the rest of the crate touches the network
//! stack. Implementations report whether an operation ran successfully and
//! never interpret what it did; deciding what to do about a failure is left
//! to the caller.

mod system;

use async_trait::async_trait;
use std::fmt::{self, Display};
use std::path::Path;

use crate::api::models::OpError;

pub use system::SystemOps;

/// Background processes the agent starts and later stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessKind {
    /// `wpa_supplicant`, for WPA-PSK links
    Supplicant,
    /// `dhcpcd`, for DHCP-addressed links
    DhcpClient,
}

impl Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supplicant => write!(f, "supplicant"),
            Self::DhcpClient => write!(f, "DHCP client"),
        }
    }
}

/// Capability set needed to roam on one wireless interface.
///
/// Every method is a single, self-contained action. None of them retries,
/// and none checks that the link actually came up afterwards.
#[async_trait]
pub trait NetworkOps: Send + Sync {
    /// Sets the interface administratively up. Idempotent.
    async fn bring_up(&self, iface: &str) -> Result<(), OpError>;

    /// Runs a scan and returns the tool's raw report.
    async fn scan(&self, iface: &str) -> Result<String, OpError>;

    /// Associates with an open network.
    async fn associate_open(&self, iface: &str, ssid: &str) -> Result<(), OpError>;

    /// Drops an open association.
    async fn disassociate(&self, iface: &str) -> Result<(), OpError>;

    /// Returns true if a supplicant configuration is already stored at `path`.
    async fn secret_config_exists(&self, path: &Path) -> bool;

    /// Derives a supplicant configuration from the SSID and passphrase and
    /// stores it at `path`.
    async fn generate_secret_config(
        &self,
        ssid: &str,
        secret: &str,
        path: &Path,
    ) -> Result<(), OpError>;

    /// Starts the supplicant in the background against `config`.
    async fn start_supplicant(&self, iface: &str, config: &Path) -> Result<(), OpError>;

    /// Starts a DHCP client for the interface.
    async fn start_dhcp(&self, iface: &str) -> Result<(), OpError>;

    async fn add_address(&self, iface: &str, address: &str) -> Result<(), OpError>;

    async fn remove_address(&self, iface: &str, address: &str) -> Result<(), OpError>;

    async fn add_default_route(&self, iface: &str, gateway: &str) -> Result<(), OpError>;

    /// Terminates every process of `kind` serving the interface.
    ///
    /// Finding nothing to kill is not an error.
    async fn kill_process(&self, iface: &str, kind: ProcessKind) -> Result<(), OpError>;

    /// Returns true if a process of `kind` is serving the interface.
    async fn process_running(&self, iface: &str, kind: ProcessKind) -> Result<bool, OpError>;
}
