//! Wi-Fi network scanning.
//!
//! Turns the raw scan report from [`NetworkOps`] into the set of SSIDs
//! currently in range.

use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::Result;
use crate::api::models::RoamError;
use crate::ops::NetworkOps;
use crate::types::constants::SSID_MARKER;

/// Produces the set of visible network names for one interface.
pub struct Scanner<O: ?Sized> {
    ops: Arc<O>,
    interface: String,
}

impl<O: NetworkOps + ?Sized> Scanner<O> {
    pub fn new(ops: Arc<O>, interface: impl Into<String>) -> Self {
        Self {
            ops,
            interface: interface.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Scans once and returns the visible SSIDs.
    ///
    /// The interface is brought up first. An empty set means the scan
    /// worked and found nothing; a scan that could not run at all is
    /// [`RoamError::ScanFailed`]. No retry happens here.
    pub async fn scan(&self) -> Result<BTreeSet<String>> {
        if let Err(e) = self.ops.bring_up(&self.interface).await {
            warn!("Failed to bring {} up: {e}", self.interface);
        }

        let report = self
            .ops
            .scan(&self.interface)
            .await
            .map_err(RoamError::ScanFailed)?;

        let visible = parse_ssids(&report);
        debug!("Visible networks on {}: {:?}", self.interface, visible);
        Ok(visible)
    }
}

/// Extracts SSIDs from an `iw` scan report.
///
/// Every line containing `SSID: ` contributes the text after the marker.
/// Hidden networks report an empty SSID and are skipped.
pub(crate) fn parse_ssids(report: &str) -> BTreeSet<String> {
    report
        .lines()
        .filter_map(|line| line.trim().split_once(SSID_MARKER))
        .map(|(_, ssid)| ssid.trim())
        .filter(|ssid| !ssid.is_empty())
        .map(str::to_string)
        .collect()
}
