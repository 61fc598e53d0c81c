//! [`NetworkOps`] backed by the standard Linux wireless tools.
//!
//! Commands are spawned directly with their arguments; nothing goes through
//! a shell, so SSIDs and passphrases never need quoting.

use async_trait::async_trait;
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::api::models::OpError;
use crate::ops::{NetworkOps, ProcessKind};
use crate::types::constants::{SUPPLICANT_DRIVER, programs};

/// `pkill`/`pgrep` exit status meaning "no process matched".
const NO_MATCH: i32 = 1;

/// Runs the real `ip`, `iw`, `wpa_supplicant` and `dhcpcd` binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOps;

impl SystemOps {
    pub fn new() -> Self {
        Self
    }
}

/// Runs a command whose output is not needed.
///
/// Output streams go to `/dev/null`: daemonizing children would otherwise
/// keep a captured pipe open and stall the wait.
async fn run(program: &'static str, args: &[&str]) -> Result<(), OpError> {
    debug!("Running {program} {}", args.join(" "));

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| OpError::Spawn { program, source })?;

    if status.success() {
        Ok(())
    } else {
        Err(OpError::Failed {
            program,
            code: status.code(),
        })
    }
}

/// Runs a command and returns its exit code without judging it.
async fn run_for_code(program: &'static str, args: &[&str]) -> Result<Option<i32>, OpError> {
    debug!("Running {program} {}", args.join(" "));

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| OpError::Spawn { program, source })?;

    Ok(status.code())
}

/// Extended regex matching the command line or process title of the `kind`
/// process bound to `iface`.
///
/// The interface must be a whole word: `wlan0` never matches `wlan01`.
/// dhcpcd retitles itself (`dhcpcd: wlan0 [ip4]`), so nothing is assumed
/// about what follows the program name.
fn process_pattern(iface: &str, kind: ProcessKind) -> String {
    let iface = escape_regex(iface);
    match kind {
        ProcessKind::Supplicant => {
            format!("{}.*[ ]-i{iface}( |$)", programs::WPA_SUPPLICANT)
        }
        ProcessKind::DhcpClient => format!("{}.*[ ]{iface}( |$)", programs::DHCPCD),
    }
}

fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Replaces the file at `path` with `contents`, readable by the owner only.
///
/// The data goes to a temporary file next to `path` first and is renamed
/// into place, so `path` holds either the old file or the complete new one.
async fn write_secret_config(path: &Path, contents: String) -> Result<(), OpError> {
    let target = path.to_path_buf();
    let written = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Created with mode 0600
        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .unwrap_or_else(|e| Err(std::io::Error::other(e)));

    written.map_err(|source| OpError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Drops the plaintext passphrase comment `wpa_passphrase` emits.
fn strip_plaintext_secret(config: &str) -> String {
    config
        .lines()
        .filter(|line| !line.trim_start().starts_with("#psk="))
        .map(|line| format!("{line}\n"))
        .collect()
}

#[async_trait]
impl NetworkOps for SystemOps {
    async fn bring_up(&self, iface: &str) -> Result<(), OpError> {
        run(programs::IP, &["link", "set", iface, "up"]).await
    }

    async fn scan(&self, iface: &str) -> Result<String, OpError> {
        let program = programs::IW;
        debug!("Running {program} dev {iface} scan");

        let output = Command::new(program)
            .args(["dev", iface, "scan"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| OpError::Spawn { program, source })?;

        if !output.status.success() {
            return Err(OpError::Failed {
                program,
                code: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn associate_open(&self, iface: &str, ssid: &str) -> Result<(), OpError> {
        run(programs::IW, &["dev", iface, "connect", ssid]).await
    }

    async fn disassociate(&self, iface: &str) -> Result<(), OpError> {
        run(programs::IW, &["dev", iface, "disconnect"]).await
    }

    async fn secret_config_exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn generate_secret_config(
        &self,
        ssid: &str,
        secret: &str,
        path: &Path,
    ) -> Result<(), OpError> {
        let program = programs::WPA_PASSPHRASE;
        debug!("Running {program} {ssid} for {}", path.display());

        // The passphrase goes through stdin to keep it out of the process list.
        let mut child = Command::new(program)
            .arg(ssid)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| OpError::Spawn { program, source })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(format!("{secret}\n").as_bytes())
                .await
                .map_err(|source| OpError::Spawn { program, source })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| OpError::Spawn { program, source })?;

        if !output.status.success() {
            return Err(OpError::Failed {
                program,
                code: output.status.code(),
            });
        }

        let config = strip_plaintext_secret(&String::from_utf8_lossy(&output.stdout));

        write_secret_config(path, config).await
    }

    async fn start_supplicant(&self, iface: &str, config: &Path) -> Result<(), OpError> {
        let iface_arg = format!("-i{iface}");
        let driver_arg = format!("-D{SUPPLICANT_DRIVER}");
        let config_arg = format!("-c{}", config.display());
        run(
            programs::WPA_SUPPLICANT,
            &["-B", driver_arg.as_str(), iface_arg.as_str(), config_arg.as_str()],
        )
        .await
    }

    async fn start_dhcp(&self, iface: &str) -> Result<(), OpError> {
        run(programs::DHCPCD, &["-4", "-L", iface]).await
    }

    async fn add_address(&self, iface: &str, address: &str) -> Result<(), OpError> {
        run(programs::IP, &["addr", "add", address, "dev", iface]).await
    }

    async fn remove_address(&self, iface: &str, address: &str) -> Result<(), OpError> {
        run(programs::IP, &["addr", "del", address, "dev", iface]).await
    }

    async fn add_default_route(&self, iface: &str, gateway: &str) -> Result<(), OpError> {
        run(
            programs::IP,
            &["route", "add", "default", "via", gateway, "dev", iface],
        )
        .await
    }

    async fn kill_process(&self, iface: &str, kind: ProcessKind) -> Result<(), OpError> {
        let pattern = process_pattern(iface, kind);
        match run_for_code(programs::PKILL, &["-f", pattern.as_str()]).await? {
            Some(0) | Some(NO_MATCH) => Ok(()),
            code => Err(OpError::Failed {
                program: programs::PKILL,
                code,
            }),
        }
    }

    async fn process_running(&self, iface: &str, kind: ProcessKind) -> Result<bool, OpError> {
        let pattern = process_pattern(iface, kind);
        match run_for_code(programs::PGREP, &["-f", pattern.as_str()]).await? {
            Some(0) => Ok(true),
            Some(NO_MATCH) => Ok(false),
            code => Err(OpError::Failed {
                program: programs::PGREP,
                code,
            }),
        }
    }
}
