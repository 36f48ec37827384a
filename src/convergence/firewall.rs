//! Firewall convergence: reset-then-rebuild.
//!
//! The rule table is cleared unconditionally and rebuilt from the desired
//! rule list, so the end state is identical no matter what was configured
//! before — no ghost rules survive a rerun. The trade is state-independence
//! for efficiency, which is the right trade for a run-once tool.

use crate::error::Result;
use crate::firewall::{AllowRule, Direction, FirewallManager, Policy};
use tracing::info;

/// Converge the firewall to: deny incoming, allow outgoing, plus `rules`
/// applied in order, with enforcement on.
pub fn ensure_firewall(firewall: &dyn FirewallManager, rules: &[AllowRule]) -> Result<()> {
    firewall.reset()?;
    firewall.set_default_policy(Policy::Deny, Direction::Incoming)?;
    firewall.set_default_policy(Policy::Allow, Direction::Outgoing)?;

    for rule in rules {
        firewall.allow(rule)?;
    }

    firewall.enable()?;
    info!(
        "firewall enabled: deny incoming, allow outgoing, inbound open on {}",
        rules
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
