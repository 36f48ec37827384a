//! Package manager interface.
//!
//! A narrow seam over the distribution package tooling so the install
//! convergence step can run against an in-memory fake in tests. The one real
//! implementation shells out to apt through the system gateway.

use crate::error::Result;
use crate::gateway::SystemGateway;

/// Narrow interface over the host's package tooling.
pub trait PackageManager {
    /// Refresh the package index.
    fn refresh_index(&self) -> Result<()>;

    /// Install the named packages non-interactively. Already-installed
    /// packages are a no-op for the underlying tool.
    fn install(&self, packages: &[&str]) -> Result<()>;
}

/// apt-get implementation used on Debian-family hosts.
pub struct AptPackageManager<'a> {
    gateway: &'a dyn SystemGateway,
}

// Debconf must never prompt during an unattended run
const APT_ENV: &[(&str, &str)] = &[("DEBIAN_FRONTEND", "noninteractive")];

impl<'a> AptPackageManager<'a> {
    pub fn new(gateway: &'a dyn SystemGateway) -> Self {
        Self { gateway }
    }
}

impl PackageManager for AptPackageManager<'_> {
    fn refresh_index(&self) -> Result<()> {
        self.gateway
            .run_privileged("apt-get", &["update"], APT_ENV)?
            .ensure_success("apt-get update")
    }

    fn install(&self, packages: &[&str]) -> Result<()> {
        let mut args = vec!["install", "-y"];
        args.extend_from_slice(packages);
        self.gateway
            .run_privileged("apt-get", &args, APT_ENV)?
            .ensure_success("apt-get install")
    }
}
