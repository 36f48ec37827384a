//! Firewall manager interface and rule types.
//!
//! The convergence step rebuilds the whole rule table from scratch, so the
//! interface exposes exactly the operations that strategy needs: reset,
//! default policies, ordered allow rules, enable. The one real implementation
//! drives `ufw` through the system gateway.

use crate::error::Result;
use crate::gateway::SystemGateway;
use std::fmt;

/// Transport protocol for an allow rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Traffic direction for a default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Default policy verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Policy {
    Allow,
    Deny,
}

/// A single inbound allow rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowRule {
    pub port: u16,
    pub protocol: Protocol,
}

impl AllowRule {
    pub fn tcp(port: u16) -> Self {
        Self {
            port,
            protocol: Protocol::Tcp,
        }
    }
}

impl fmt::Display for AllowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Narrow interface over the host firewall.
pub trait FirewallManager {
    /// Drop every existing rule. Must not prompt.
    fn reset(&self) -> Result<()>;

    /// Set the default policy for one traffic direction.
    fn set_default_policy(&self, policy: Policy, direction: Direction) -> Result<()>;

    /// Add one allow rule.
    fn allow(&self, rule: &AllowRule) -> Result<()>;

    /// Turn enforcement on. Must not prompt.
    fn enable(&self) -> Result<()>;
}

/// ufw implementation.
pub struct UfwFirewall<'a> {
    gateway: &'a dyn SystemGateway,
}

impl<'a> UfwFirewall<'a> {
    pub fn new(gateway: &'a dyn SystemGateway) -> Self {
        Self { gateway }
    }
}

impl FirewallManager for UfwFirewall<'_> {
    fn reset(&self) -> Result<()> {
        // --force: reset normally asks for confirmation
        self.gateway
            .run_privileged("ufw", &["--force", "reset"], &[])?
            .ensure_success("ufw reset")
    }

    fn set_default_policy(&self, policy: Policy, direction: Direction) -> Result<()> {
        let policy = policy.to_string();
        let direction = direction.to_string();
        self.gateway
            .run_privileged("ufw", &["default", &policy, &direction], &[])?
            .ensure_success(&format!("ufw default {} {}", policy, direction))
    }

    fn allow(&self, rule: &AllowRule) -> Result<()> {
        let spec = rule.to_string();
        self.gateway
            .run_privileged("ufw", &["allow", &spec], &[])?
            .ensure_success(&format!("ufw allow {}", spec))
    }

    fn enable(&self) -> Result<()> {
        self.gateway
            .run_privileged("ufw", &["--force", "enable"], &[])?
            .ensure_success("ufw enable")
    }
}
