//! Pre-flight checks for the runtime environment
//!
//! Verifies the host before any mutation:
//! - Required tool binaries are present
//! - Running with root privileges (EUID 0)
//!
//! If any check fails the program exits with a clear error message before
//! the pipeline starts. psql and ufw are deliberately absent from the
//! required list: the pipeline itself installs them.

use crate::error::{ProvisionError, Result};
use std::process::Command;
use tracing::{debug, warn};

/// Result of environment verification
#[derive(Debug)]
pub struct PreflightResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl PreflightResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }
}

/// Binaries that must exist before provisioning starts
const REQUIRED_BINARIES: &[&str] = &[
    "apt-get",   // Package installation
    "systemctl", // Service management
    "sudo",      // Running psql as the postgres OS user
    "swapon",    // Swap activation (util-linux)
];

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Check if running as root (EUID 0)
fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Skip root check (for development/testing)
/// Set POSTGIS_BOOTSTRAP_SKIP_ROOT_CHECK=1 to skip
fn should_skip_root_check() -> bool {
    std::env::var("POSTGIS_BOOTSTRAP_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Perform all checks and return the observations
pub fn verify_environment() -> PreflightResult {
    let mut missing = Vec::new();

    for binary in REQUIRED_BINARIES {
        if !binary_exists(binary) {
            missing.push((*binary).to_string());
        }
    }

    PreflightResult {
        missing_binaries: missing,
        is_root: is_running_as_root(),
    }
}

/// Verify the environment, returning a fatal configuration error on failure.
///
/// Runs before CLI-derived state is acted on; nothing has been mutated yet
/// when this fails.
pub fn check() -> Result<()> {
    debug!("running pre-flight checks");

    let mut result = verify_environment();

    if should_skip_root_check() {
        warn!("root check skipped (POSTGIS_BOOTSTRAP_SKIP_ROOT_CHECK=1)");
        result.is_root = true;
    }

    if !result.is_root {
        return Err(ProvisionError::config(
            "root privileges required: rerun with sudo or as root",
        ));
    }

    if !result.missing_binaries.is_empty() {
        return Err(ProvisionError::config(format!(
            "missing required binaries: {}",
            result.missing_binaries.join(", ")
        )));
    }

    debug!("pre-flight checks passed");
    Ok(())
}
