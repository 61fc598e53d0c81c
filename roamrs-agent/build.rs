//! Embeds the commit the agent was built from, shown by `roamrsd --version`.

use std::env;
use std::process::Command;

fn git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed=ROAMRS_GIT_HASH");

    // Release tarballs have no .git directory; packagers pass the hash in.
    let hash = env::var("ROAMRS_GIT_HASH")
        .ok()
        .filter(|hash| !hash.is_empty())
        .or_else(git_hash)
        .unwrap_or_else(|| {
            println!("cargo:warning=Unable to determine git hash, using 'unknown'");
            String::from("unknown")
        });

    println!("cargo:rustc-env=GIT_HASH={hash}");
}
