use std::{
    env,
    process::Command,
    time::{SystemTime, UNIX_EPOCH},
};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=PKGFINDER_BUILD_VERSION");

    // Packagers building outside a git checkout can pin the version.
    let version = env::var("PKGFINDER_BUILD_VERSION")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(git_version)
        .unwrap_or_else(|| format!("0.0.0-unknown-{}", timestamp()));

    println!("cargo:rustc-env=PKGFINDER_VERSION={}", version);
}

/// `git describe` without a leading `v`; a dirty tree gets a timestamp suffix.
fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    let version = described.strip_prefix('v').unwrap_or(described);

    if version.is_empty() {
        None
    } else if version.ends_with("-dirty") {
        Some(format!("{}-{}", version, timestamp()))
    } else {
        Some(version.to_string())
    }
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
