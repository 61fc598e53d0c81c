//! Runtime settings for the roaming agent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::constants::{defaults, timing};

/// Settings for a [`RoamingLoop`](crate::RoamingLoop).
///
/// Every field has a default matching the agent's stock behavior, so most
/// callers only override what differs on their system.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use roamrs::RoamConfig;
///
/// let config = RoamConfig::new()
///     .with_interface("wlp3s0")
///     .with_tick_period(Duration::from_secs(10));
///
/// assert_eq!(config.interface, "wlp3s0");
/// assert_eq!(config.scan_retry_interval, Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoamConfig {
    /// Wireless interface to manage
    pub interface: String,
    /// Pause between two scan-evaluate-connect ticks
    pub tick_period: Duration,
    /// Pause before retrying a scan that failed
    pub scan_retry_interval: Duration,
    /// Directory holding the generated `wpa_supplicant` configurations
    pub secrets_dir: PathBuf,
}

impl Default for RoamConfig {
    fn default() -> Self {
        Self {
            interface: defaults::INTERFACE.to_string(),
            tick_period: timing::tick_period(),
            scan_retry_interval: timing::scan_retry_interval(),
            secrets_dir: PathBuf::from(defaults::SECRETS_DIR),
        }
    }
}

impl RoamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    #[must_use]
    pub fn with_scan_retry_interval(mut self, interval: Duration) -> Self {
        self.scan_retry_interval = interval;
        self
    }

    #[must_use]
    pub fn with_secrets_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.secrets_dir = dir.as_ref().to_path_buf();
        self
    }
}
