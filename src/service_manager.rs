//! Service manager interface.
//!
//! Thin seam over systemd unit operations. The remote-access configurator
//! needs a full restart (listen-address changes do not apply on reload), so
//! restart is part of the contract alongside enable/start.

use crate::error::Result;
use crate::gateway::SystemGateway;

/// Narrow interface over the host's service tooling.
pub trait ServiceManager {
    /// Enable a unit so it starts on boot.
    fn enable(&self, unit: &str) -> Result<()>;

    /// Start a unit now.
    fn start(&self, unit: &str) -> Result<()>;

    /// Fully restart a unit (not a reload).
    fn restart(&self, unit: &str) -> Result<()>;
}

/// systemctl implementation.
pub struct SystemdServiceManager<'a> {
    gateway: &'a dyn SystemGateway,
}

impl<'a> SystemdServiceManager<'a> {
    pub fn new(gateway: &'a dyn SystemGateway) -> Self {
        Self { gateway }
    }

    fn systemctl(&self, action: &str, unit: &str) -> Result<()> {
        self.gateway
            .run_privileged("systemctl", &[action, unit], &[])?
            .ensure_success(&format!("systemctl {} {}", action, unit))
    }
}

impl ServiceManager for SystemdServiceManager<'_> {
    fn enable(&self, unit: &str) -> Result<()> {
        self.systemctl("enable", unit)
    }

    fn start(&self, unit: &str) -> Result<()> {
        self.systemctl("start", unit)
    }

    fn restart(&self, unit: &str) -> Result<()> {
        self.systemctl("restart", unit)
    }
}
