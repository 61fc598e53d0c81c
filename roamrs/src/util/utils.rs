//! Utility helpers shared by the controller, scanner and profile store.
//!
//! File naming for generated supplicant configurations, address validation,
//! and the warn-and-continue policy for system operations.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::types::constants::defaults;

/// Path of the supplicant configuration generated for the named network.
///
/// Bytes outside `[A-Za-z0-9._-]` are written as `%XX`, so every SSID maps
/// to its own file name and none can escape `dir`.
pub(crate) fn secret_config_path(dir: &Path, name: &str) -> PathBuf {
    let mut file = String::from(defaults::SECRET_FILE_PREFIX);
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                file.push(char::from(byte));
            }
            _ => file.push_str(&format!("%{byte:02X}")),
        }
    }
    file.push_str(defaults::SECRET_FILE_SUFFIX);
    dir.join(file)
}

/// Checks a static address, optionally in CIDR notation.
pub(crate) fn is_valid_address(value: &str) -> bool {
    let (addr, prefix) = match value.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (value, None),
    };

    let Ok(ip) = addr.parse::<IpAddr>() else {
        return false;
    };

    let Some(prefix) = prefix else {
        return true;
    };

    let max = if ip.is_ipv4() { 32 } else { 128 };
    matches!(prefix.parse::<u8>(), Ok(p) if p <= max)
}

/// Checks a gateway address; prefixes are not allowed.
pub(crate) fn is_valid_gateway(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// Evaluates a fallible system operation, logging a failure instead of
/// propagating it.
///
/// Yields `true` when the operation succeeded.
macro_rules! best_effort {
    ($result:expr, $context:expr) => {
        match $result {
            Ok(_) => true,
            Err(e) => {
                log::warn!("{}: {}", $context, e);
                false
            }
        }
    };
}

pub(crate) use best_effort;
