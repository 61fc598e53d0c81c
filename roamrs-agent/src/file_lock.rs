use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lock file guarding `iface`, in the runtime directory when there is one.
pub fn lock_path(iface: &str) -> PathBuf {
    let mut path = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
    path.push(format!("roamrs-{iface}.lock"));
    path
}

/// Takes the per-interface instance lock at `path`.
///
/// Two agents driving the same interface would fight over it, so the second
/// one must not start. The lock is held for as long as the returned file is.
pub fn acquire_interface_lock(path: &Path) -> anyhow::Result<File> {
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("Failed to create lock file {}: {e}", path.display()))?;

    // Exclusive lock; fails if another instance holds it
    FileExt::try_lock_exclusive(&file).map_err(|_| {
        anyhow::anyhow!(
            "Another roamrs agent is already running ({})",
            path.display()
        )
    })?;

    Ok(file)
}
