//! The scan-evaluate-connect loop.
//!
//! Each tick scans, picks the best visible profile, switches to it when it
//! differs from the current link, and then runs the per-tick upkeep of the
//! current link. Between ticks the loop sleeps and reloads its profiles.
//!
//! Only scans are retried, at a short fixed interval and without limit.
//! Shutdown requests are checked before each tick and during every pause; a
//! tick that has started always runs to completion first.

use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::api::config::RoamConfig;
use crate::api::models::{ConnectionProfile, ConnectionState, ProfileList};
use crate::core::controller::ConnectionController;
use crate::core::profiles::ProfileStore;
use crate::core::scan::Scanner;
use crate::core::shutdown::ShutdownSignal;
use crate::ops::NetworkOps;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The scan could not run; nothing else happened.
    ScanFailed,
    /// The link moved to a different profile.
    Switched {
        /// Profile connected before the tick, if any
        from: Option<String>,
        to: String,
    },
    /// The link stayed as it was.
    Unchanged,
}

/// Profiles allowed to claim the interface, given what is visible.
///
/// If the connected network has dropped out of range (or nothing is
/// connected) every profile is eligible, so the agent recovers even through
/// a lower-priority network. Otherwise only profiles ranked strictly above
/// the current one are.
pub fn candidate_list<'a>(
    profiles: &'a ProfileList,
    state: &ConnectionState,
    visible: &BTreeSet<String>,
) -> &'a [ConnectionProfile] {
    match state.profile_name() {
        Some(name) if visible.contains(name) => profiles.candidates(state),
        _ => profiles.as_slice(),
    }
}

/// The highest-priority eligible profile that is in range.
pub fn select_candidate<'a>(
    profiles: &'a ProfileList,
    state: &ConnectionState,
    visible: &BTreeSet<String>,
) -> Option<&'a ConnectionProfile> {
    candidate_list(profiles, state, visible)
        .iter()
        .find(|profile| visible.contains(&profile.name))
}

/// Keeps one interface on the best visible known network.
pub struct RoamingLoop<O: ?Sized, S> {
    scanner: Scanner<O>,
    controller: ConnectionController<O>,
    store: S,
    profiles: ProfileList,
    config: RoamConfig,
    shutdown: ShutdownSignal,
}

impl<O, S> RoamingLoop<O, S>
where
    O: NetworkOps + ?Sized,
    S: ProfileStore,
{
    /// Loads the profiles and builds a disconnected loop.
    ///
    /// A profile store that cannot be read or parsed fails startup before
    /// any network operation is attempted.
    pub async fn start(
        ops: Arc<O>,
        store: S,
        config: RoamConfig,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        let profiles = store.load().await?;
        info!(
            "Roaming on {} with {} known networks",
            config.interface,
            profiles.len()
        );

        Ok(Self {
            scanner: Scanner::new(Arc::clone(&ops), config.interface.clone()),
            controller: ConnectionController::new(
                ops,
                config.interface.clone(),
                config.secrets_dir.clone(),
            ),
            store,
            profiles,
            config,
            shutdown,
        })
    }

    pub fn state(&self) -> &ConnectionState {
        self.controller.state()
    }

    pub fn profiles(&self) -> &ProfileList {
        &self.profiles
    }

    pub fn config(&self) -> &RoamConfig {
        &self.config
    }

    /// Runs until shutdown is requested, then tears the link down.
    pub async fn run(&mut self) {
        while !self.shutdown.is_requested() {
            if self.tick().await == TickOutcome::ScanFailed {
                let retry = self.config.scan_retry_interval;
                if self.pause(retry).await {
                    break;
                }
                continue;
            }

            let period = self.config.tick_period;
            if self.pause(period).await {
                break;
            }
            self.reload().await;
        }

        info!("Shutting down, tearing down {}", self.controller.state());
        self.controller.disconnect().await;
    }

    /// Runs one scan-evaluate-connect pass.
    pub async fn tick(&mut self) -> TickOutcome {
        debug!("Scanning on {}...", self.scanner.interface());
        let visible = match self.scanner.scan().await {
            Ok(visible) => visible,
            Err(e) => {
                warn!("{e}");
                return TickOutcome::ScanFailed;
            }
        };

        let current = self.controller.state().profile_name().map(str::to_string);
        let outcome = match select_candidate(&self.profiles, self.controller.state(), &visible) {
            Some(profile) if current.as_deref() != Some(profile.name.as_str()) => {
                self.controller.connect(profile).await;
                TickOutcome::Switched {
                    from: current,
                    to: profile.name.clone(),
                }
            }
            _ => TickOutcome::Unchanged,
        };

        self.controller.reassert_open_association().await;
        self.controller.ensure_dhcp_running().await;

        outcome
    }

    /// Re-reads the profile store.
    ///
    /// After startup a broken store is not fatal: the previous profiles stay
    /// in effect until the file is fixed.
    pub async fn reload(&mut self) {
        match self.store.load().await {
            Ok(profiles) => {
                if profiles != self.profiles {
                    info!("Profiles changed, now {} known networks", profiles.len());
                }
                self.profiles = profiles;
            }
            Err(e) => warn!("Keeping previous profiles: {e}"),
        }
    }

    /// Sleeps for `period`; returns true if shutdown was requested meanwhile.
    async fn pause(&mut self, period: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.requested() => true,
            _ = tokio::time::sleep(period) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles(names: &[&str]) -> ProfileList {
        ProfileList::new(names.iter().map(|n| ConnectionProfile::new(*n)).collect()).unwrap()
    }

    fn visible(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn on(name: &str) -> ConnectionState {
        ConnectionState::established(&ConnectionProfile::new(name))
    }

    #[test]
    fn lost_connection_widens_candidates_to_full_list() {
        let list = profiles(&["A", "B", "C"]);
        let candidates = candidate_list(&list, &on("B"), &visible(&["C"]));
        assert_eq!(candidates, list.as_slice());
    }

    #[test]
    fn visible_connection_limits_candidates_to_higher_priority() {
        let list = profiles(&["A", "B", "C"]);
        let candidates = candidate_list(&list, &on("B"), &visible(&["B", "C"]));
        assert_eq!(candidates, &list.as_slice()[..1]);
    }

    #[test]
    fn selects_highest_priority_visible() {
        let list = profiles(&["A", "B", "C", "D"]);
        let chosen = select_candidate(
            &list,
            &ConnectionState::Disconnected,
            &visible(&["D", "B", "C"]),
        );
        assert_eq!(chosen.map(|p| p.name.as_str()), Some("B"));
    }

    #[test]
    fn never_selects_lower_priority_while_current_visible() {
        let list = profiles(&["A", "B", "C"]);
        assert_eq!(select_candidate(&list, &on("B"), &visible(&["B", "C"])), None);
    }

    #[test]
    fn recovers_through_lower_priority_network() {
        let list = profiles(&["A", "B", "C"]);
        let chosen = select_candidate(&list, &on("B"), &visible(&["C"]));
        assert_eq!(chosen.map(|p| p.name.as_str()), Some("C"));
    }

    #[test]
    fn nothing_visible_selects_nothing() {
        let list = profiles(&["A", "B"]);
        assert_eq!(
            select_candidate(&list, &ConnectionState::Disconnected, &visible(&["X"])),
            None
        );
    }
}
