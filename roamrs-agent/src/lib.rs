pub mod file_lock;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use roamrs::{RoamConfig, RoamingLoop, ShutdownHandler, SystemOps, TomlProfileStore};

use crate::file_lock::{acquire_interface_lock, lock_path};

const DEFAULT_PROFILES: &str = "/etc/roamrs/profiles.toml";

#[derive(Parser, Debug)]
#[command(name = "roamrsd")]
#[command(about = "Keeps a wireless interface on the best known network")]
#[command(disable_version_flag = true)]
#[command(version)]
struct Args {
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    /// Wireless interface to manage [default: wlan0]
    #[arg(short, long)]
    interface: Option<String>,

    /// Profile file, one TOML table per network in priority order
    #[arg(short = 'c', long, default_value = DEFAULT_PROFILES)]
    profiles: PathBuf,

    /// Where generated wpa_supplicant configs are kept [default: /etc/sysconfig]
    #[arg(long)]
    secrets_dir: Option<PathBuf>,

    /// Seconds between scans [default: 5]
    #[arg(long)]
    tick_secs: Option<u64>,

    /// Milliseconds before retrying a failed scan [default: 200]
    #[arg(long)]
    retry_ms: Option<u64>,
}

impl Args {
    fn roam_config(&self) -> RoamConfig {
        let mut config = RoamConfig::new();
        if let Some(interface) = &self.interface {
            config = config.with_interface(interface.as_str());
        }
        if let Some(dir) = &self.secrets_dir {
            config = config.with_secrets_dir(dir);
        }
        if let Some(secs) = self.tick_secs {
            config = config.with_tick_period(Duration::from_secs(secs));
        }
        if let Some(ms) = self.retry_ms {
            config = config.with_scan_retry_interval(Duration::from_millis(ms));
        }
        config
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Args { version: true, .. } = args {
        println!("roamrsd {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));
        return Ok(());
    }

    init_logging();

    let config = args.roam_config();
    let _lock = acquire_interface_lock(&lock_path(&config.interface))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(roam(config, args.profiles))
}

async fn roam(config: RoamConfig, profiles: PathBuf) -> anyhow::Result<()> {
    let (handler, shutdown) = ShutdownHandler::new();
    handler.listen_for_signals()?;

    let store = TomlProfileStore::new(&profiles);
    let mut roaming = RoamingLoop::start(Arc::new(SystemOps::new()), store, config, shutdown)
        .await
        .with_context(|| format!("Failed to load profiles from {}", profiles.display()))?;

    roaming.run().await;
    info!("Network down, exiting.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_defaults() {
        let args = Args::try_parse_from(["roamrsd"]).unwrap();
        assert_eq!(args.roam_config(), RoamConfig::default());
        assert_eq!(args.profiles, PathBuf::from(DEFAULT_PROFILES));
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "roamrsd",
            "-i",
            "wlp2s0",
            "-c",
            "/tmp/profiles.toml",
            "--secrets-dir",
            "/var/lib/roamrs",
            "--tick-secs",
            "10",
            "--retry-ms",
            "500",
        ])
        .unwrap();
        let config = args.roam_config();

        assert_eq!(config.interface, "wlp2s0");
        assert_eq!(config.secrets_dir, PathBuf::from("/var/lib/roamrs"));
        assert_eq!(config.tick_period, Duration::from_secs(10));
        assert_eq!(config.scan_retry_interval, Duration::from_millis(500));
        assert_eq!(args.profiles, PathBuf::from("/tmp/profiles.toml"));
    }

    #[test]
    fn version_flag_parses() {
        let args = Args::try_parse_from(["roamrsd", "-V"]).unwrap();
        assert!(args.version);
    }
}
