//! Constants for the system tools the agent drives.
//!
//! Program names, process match patterns, and the stock timing of the
//! roaming loop.

/// Executables invoked by [`SystemOps`](crate::SystemOps).
pub mod programs {
    pub const IP: &str = "ip";
    pub const IW: &str = "iw";
    pub const WPA_PASSPHRASE: &str = "wpa_passphrase";
    pub const WPA_SUPPLICANT: &str = "wpa_supplicant";
    pub const DHCPCD: &str = "dhcpcd";
    pub const PKILL: &str = "pkill";
    pub const PGREP: &str = "pgrep";
}

/// `wpa_supplicant` driver backend
pub const SUPPLICANT_DRIVER: &str = "nl80211";

/// Marker preceding the network name in `iw <iface> scan` output.
pub const SSID_MARKER: &str = "SSID: ";

/// Stock settings used when nothing else is configured.
pub mod defaults {
    pub const INTERFACE: &str = "wlan0";
    pub const SECRETS_DIR: &str = "/etc/sysconfig";
    pub const SECRET_FILE_PREFIX: &str = "wpa-";
    pub const SECRET_FILE_SUFFIX: &str = ".conf";
}

/// Roaming loop timing.
pub mod timing {
    use std::time::Duration;

    /// Time between two ticks of the roaming loop (5 seconds).
    const TICK_PERIOD_SECS: u64 = 5;

    /// Time before retrying a failed scan (200 milliseconds).
    ///
    /// Scans fail while the radio is busy, which rarely lasts long.
    const SCAN_RETRY_MS: u64 = 200;

    pub fn tick_period() -> Duration {
        Duration::from_secs(TICK_PERIOD_SECS)
    }

    pub fn scan_retry_interval() -> Duration {
        Duration::from_millis(SCAN_RETRY_MS)
    }
}
