//! Test doubles for the roaming agent.
//!
//! `FakeOps` records every operation instead of touching the system, and
//! `MemoryStore` serves profiles that a test can swap between ticks.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use roamrs::{
    ConnectionProfile, NetworkOps, OpError, ProcessKind, ProfileList, ProfileStore, RoamError,
    ShutdownHandler,
};

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BringUp,
    Scan,
    AssociateOpen(String),
    Disassociate,
    GenerateSecretConfig { ssid: String, path: PathBuf },
    StartSupplicant(PathBuf),
    StartDhcp,
    AddAddress(String),
    RemoveAddress(String),
    AddDefaultRoute(String),
    Kill(ProcessKind),
    Probe(ProcessKind),
}

#[derive(Default)]
struct Inner {
    calls: Vec<(Instant, Call)>,
    scripted_scans: VecDeque<Option<Vec<String>>>,
    visible: Vec<String>,
    secret_configs: HashSet<PathBuf>,
    dhcp_running: bool,
    fail_operations: bool,
    shutdown_after_scans: Option<(usize, ShutdownHandler)>,
    scans_seen: usize,
}

#[derive(Default)]
pub struct FakeOps {
    inner: Mutex<Inner>,
}

impl FakeOps {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Networks every unscripted scan reports.
    pub fn set_visible(&self, names: &[&str]) {
        self.inner.lock().unwrap().visible = names.iter().map(|n| n.to_string()).collect();
    }

    /// Queues one scan that fails.
    pub fn push_scan_failure(&self) {
        self.inner.lock().unwrap().scripted_scans.push_back(None);
    }

    /// Queues one scan reporting `names`.
    pub fn push_scan(&self, names: &[&str]) {
        self.inner
            .lock()
            .unwrap()
            .scripted_scans
            .push_back(Some(names.iter().map(|n| n.to_string()).collect()));
    }

    /// Makes every non-scan operation fail from now on.
    pub fn fail_operations(&self, fail: bool) {
        self.inner.lock().unwrap().fail_operations = fail;
    }

    pub fn set_dhcp_running(&self, running: bool) {
        self.inner.lock().unwrap().dhcp_running = running;
    }

    pub fn add_secret_config(&self, path: impl Into<PathBuf>) {
        self.inner.lock().unwrap().secret_configs.insert(path.into());
    }

    /// Triggers `handler` when the `n`th scan runs.
    pub fn shutdown_after_scans(&self, n: usize, handler: ShutdownHandler) {
        self.inner.lock().unwrap().shutdown_after_scans = Some((n, handler));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Calls other than the bring-up/scan pair every tick starts with.
    pub fn actions(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::BringUp | Call::Scan))
            .collect()
    }

    pub fn scan_times(&self) -> Vec<Instant> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, call)| *call == Call::Scan)
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    fn record(&self, call: Call) -> Result<(), OpError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push((Instant::now(), call));
        if inner.fail_operations {
            Err(OpError::Failed {
                program: "fake",
                code: Some(1),
            })
        } else {
            Ok(())
        }
    }
}

fn report(names: &[String]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("BSS 00:00:00:00:00:{i:02x}(on wlan0)\n\tSSID: {name}\n"))
        .collect()
}

#[async_trait]
impl NetworkOps for FakeOps {
    async fn bring_up(&self, _iface: &str) -> Result<(), OpError> {
        self.record(Call::BringUp)
    }

    async fn scan(&self, _iface: &str) -> Result<String, OpError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push((Instant::now(), Call::Scan));
        inner.scans_seen += 1;

        if let Some((n, handler)) = &inner.shutdown_after_scans {
            if inner.scans_seen >= *n {
                handler.trigger();
            }
        }

        match inner.scripted_scans.pop_front() {
            Some(Some(names)) => Ok(report(&names)),
            Some(None) => Err(OpError::Failed {
                program: "iw",
                code: Some(240),
            }),
            None => Ok(report(&inner.visible)),
        }
    }

    async fn associate_open(&self, _iface: &str, ssid: &str) -> Result<(), OpError> {
        self.record(Call::AssociateOpen(ssid.to_string()))
    }

    async fn disassociate(&self, _iface: &str) -> Result<(), OpError> {
        self.record(Call::Disassociate)
    }

    async fn secret_config_exists(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().secret_configs.contains(path)
    }

    async fn generate_secret_config(
        &self,
        ssid: &str,
        _secret: &str,
        path: &Path,
    ) -> Result<(), OpError> {
        let result = self.record(Call::GenerateSecretConfig {
            ssid: ssid.to_string(),
            path: path.to_path_buf(),
        });
        if result.is_ok() {
            self.inner
                .lock()
                .unwrap()
                .secret_configs
                .insert(path.to_path_buf());
        }
        result
    }

    async fn start_supplicant(&self, _iface: &str, config: &Path) -> Result<(), OpError> {
        self.record(Call::StartSupplicant(config.to_path_buf()))
    }

    async fn start_dhcp(&self, _iface: &str) -> Result<(), OpError> {
        let result = self.record(Call::StartDhcp);
        if result.is_ok() {
            self.inner.lock().unwrap().dhcp_running = true;
        }
        result
    }

    async fn add_address(&self, _iface: &str, address: &str) -> Result<(), OpError> {
        self.record(Call::AddAddress(address.to_string()))
    }

    async fn remove_address(&self, _iface: &str, address: &str) -> Result<(), OpError> {
        self.record(Call::RemoveAddress(address.to_string()))
    }

    async fn add_default_route(&self, _iface: &str, gateway: &str) -> Result<(), OpError> {
        self.record(Call::AddDefaultRoute(gateway.to_string()))
    }

    async fn kill_process(&self, _iface: &str, kind: ProcessKind) -> Result<(), OpError> {
        let result = self.record(Call::Kill(kind));
        if result.is_ok() && kind == ProcessKind::DhcpClient {
            self.inner.lock().unwrap().dhcp_running = false;
        }
        result
    }

    async fn process_running(&self, _iface: &str, kind: ProcessKind) -> Result<bool, OpError> {
        self.record(Call::Probe(kind))?;
        let inner = self.inner.lock().unwrap();
        Ok(match kind {
            ProcessKind::DhcpClient => inner.dhcp_running,
            ProcessKind::Supplicant => false,
        })
    }
}

/// Profile store whose contents a test can replace at any time.
#[derive(Clone, Default)]
pub struct MemoryStore {
    profiles: Arc<Mutex<Option<ProfileList>>>,
}

impl MemoryStore {
    pub fn new(profiles: Vec<ConnectionProfile>) -> Self {
        let store = Self::default();
        store.set(profiles);
        store
    }

    pub fn set(&self, profiles: Vec<ConnectionProfile>) {
        *self.profiles.lock().unwrap() = Some(ProfileList::new(profiles).unwrap());
    }

    /// Makes the next loads fail as if the file were malformed.
    pub fn break_store(&self) {
        *self.profiles.lock().unwrap() = None;
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn load(&self) -> roamrs::Result<ProfileList> {
        self.profiles
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RoamError::ConfigParse {
                path: PathBuf::from("memory"),
                reason: "broken on purpose".into(),
            })
    }
}

/// `[A(pass=x), B(open)]`, the list most scenarios start from.
pub fn secured_then_open() -> Vec<ConnectionProfile> {
    vec![
        ConnectionProfile::new("A").with_secret("xxxxxxxx"),
        ConnectionProfile::new("B"),
    ]
}

pub fn secrets_dir() -> PathBuf {
    PathBuf::from("/etc/sysconfig")
}
