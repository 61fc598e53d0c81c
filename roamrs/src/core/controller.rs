//! Connection state machine for a single wireless interface.
//!
//! The controller owns the [`ConnectionState`] and is the only code that
//! changes it. Bringing a link up or down is a sequence of independent
//! system operations; a failing operation is logged and the sequence keeps
//! going, so the recorded state is the state the agent *asked for*.

use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::models::{AddressingMode, ConnectionProfile, ConnectionState, SecurityMode};
use crate::ops::{NetworkOps, ProcessKind};
use crate::util::utils::{best_effort, secret_config_path};

pub struct ConnectionController<O: ?Sized> {
    ops: Arc<O>,
    interface: String,
    secrets_dir: PathBuf,
    state: ConnectionState,
}

impl<O: NetworkOps + ?Sized> ConnectionController<O> {
    /// Creates a controller in the `Disconnected` state.
    pub fn new(ops: Arc<O>, interface: impl Into<String>, secrets_dir: impl Into<PathBuf>) -> Self {
        Self {
            ops,
            interface: interface.into(),
            secrets_dir: secrets_dir.into(),
            state: ConnectionState::Disconnected,
        }
    }

    /// Current connection snapshot.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Brings up a link to `profile`.
    ///
    /// An existing link is always torn down first, even when it belongs to
    /// the same profile, so every association starts from a clean slate.
    /// The flow:
    /// 1. Tear down the current link, if any
    /// 2. Secure the link: supplicant for WPA-PSK, plain association otherwise
    /// 3. Address the link: static address (plus default route) or DHCP
    /// 4. Record the new state
    pub async fn connect(&mut self, profile: &ConnectionProfile) {
        info!("Trying to connect to {}...", profile.name);

        if self.state.is_connected() {
            self.disconnect().await;
        }

        match &profile.secret {
            Some(secret) => self.start_secured(&profile.name, secret).await,
            None => {
                best_effort!(
                    self.ops.associate_open(&self.interface, &profile.name).await,
                    format!("Failed to associate with '{}'", profile.name)
                );
            }
        }

        match &profile.address {
            Some(address) => {
                best_effort!(
                    self.ops.add_address(&self.interface, address).await,
                    format!("Failed to add address {address}")
                );
                if let Some(gateway) = &profile.gateway {
                    best_effort!(
                        self.ops.add_default_route(&self.interface, gateway).await,
                        format!("Failed to add default route via {gateway}")
                    );
                }
            }
            None => {
                best_effort!(
                    self.ops.start_dhcp(&self.interface).await,
                    "Failed to start DHCP client"
                );
            }
        }

        self.state = ConnectionState::established(profile);
        info!("Connected to {}.", profile.name);
        debug!("State is now: {}", self.state);
    }

    /// Starts the supplicant, generating its configuration on first use.
    async fn start_secured(&self, name: &str, secret: &str) {
        let config = secret_config_path(&self.secrets_dir, name);

        if self.ops.secret_config_exists(&config).await {
            debug!("Reusing supplicant config {}", config.display());
        } else {
            debug!("Generating supplicant config {}", config.display());
            best_effort!(
                self.ops.generate_secret_config(name, secret, &config).await,
                format!("Failed to generate supplicant config for '{name}'")
            );
        }

        best_effort!(
            self.ops.start_supplicant(&self.interface, &config).await,
            "Failed to start supplicant"
        );
    }

    /// Tears the current link down.
    ///
    /// Safe to call from any state: every teardown step for the recorded
    /// state is issued regardless of how the previous one went. When no link
    /// is recorded the agent cannot know what a half-finished connect left
    /// behind, so the open association and any DHCP client are cleared.
    pub async fn disconnect(&mut self) {
        info!("Killing network.");

        let security = self.state.security().unwrap_or(SecurityMode::Open);
        match security {
            SecurityMode::PreSharedKey => {
                best_effort!(
                    self.ops
                        .kill_process(&self.interface, ProcessKind::Supplicant)
                        .await,
                    "Failed to stop supplicant"
                );
            }
            SecurityMode::Open => {
                best_effort!(
                    self.ops.disassociate(&self.interface).await,
                    "Failed to disassociate"
                );
            }
        }

        match self.state.addressing() {
            Some(AddressingMode::Static { address }) => {
                best_effort!(
                    self.ops.remove_address(&self.interface, address).await,
                    format!("Failed to remove address {address}")
                );
            }
            Some(AddressingMode::Dhcp) | None => {
                best_effort!(
                    self.ops
                        .kill_process(&self.interface, ProcessKind::DhcpClient)
                        .await,
                    "Failed to stop DHCP client"
                );
            }
        }

        self.state = ConnectionState::Disconnected;
    }

    /// Re-issues the open association for the current link.
    ///
    /// A regulatory domain update can drop an open association without any
    /// visible state change, and re-associating is harmless, so this runs
    /// unconditionally on every tick. No-op unless connected to an open
    /// network.
    pub async fn reassert_open_association(&self) {
        let Some(link) = self.state.link() else {
            return;
        };
        if link.security != SecurityMode::Open {
            return;
        }

        debug!("Re-associating with '{}'", link.name);
        best_effort!(
            self.ops.associate_open(&self.interface, &link.name).await,
            format!("Failed to re-associate with '{}'", link.name)
        );
    }

    /// Restarts the DHCP client if it is gone. No-op unless the link uses
    /// DHCP.
    pub async fn ensure_dhcp_running(&self) {
        if self.state.addressing() != Some(&AddressingMode::Dhcp) {
            return;
        }

        // A failed check counts as "not running".
        let running = match self
            .ops
            .process_running(&self.interface, ProcessKind::DhcpClient)
            .await
        {
            Ok(running) => running,
            Err(e) => {
                debug!("Could not check for DHCP client: {e}");
                false
            }
        };

        if !running {
            info!("DHCP client for {} is gone, restarting it", self.interface);
            best_effort!(
                self.ops.start_dhcp(&self.interface).await,
                "Failed to restart DHCP client"
            );
        }
    }
}
