//! Stamps the binary with GIT_HASH, BUILD_TIMESTAMP and BUILD_PROFILE,
//! reported in the startup log line.

use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

/// Short commit hash of the checkout, if built from one
fn git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_owned()).filter(|h| !h.is_empty())
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    emit("GIT_HASH", &git_hash().unwrap_or_else(|| UNKNOWN.to_owned()));
    emit(
        "BUILD_TIMESTAMP",
        &chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    );
    emit(
        "BUILD_PROFILE",
        &env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_owned()),
    );
}
