//! Provisioning orchestrator.
//!
//! Runs the fixed convergence pipeline against one host:
//! validate → install packages → configure remote access → role/database →
//! extensions → swap → firewall → summary. Stages run strictly in order,
//! each one blocking until complete. Any failure aborts the run (remote
//! access discovery degrades instead of failing); nothing is retried and
//! nothing is rolled back — every stage is idempotent, so the recovery path
//! for a partial run is simply running again.

use crate::convergence;
use crate::convergence::packages::{DB_PACKAGES, DB_SERVICE};
use crate::convergence::swap::SwapState;
use crate::error::Result;
use crate::firewall::{AllowRule, FirewallManager};
use crate::gateway::SystemGateway;
use crate::package_manager::PackageManager;
use crate::remote_access;
use crate::request::ProvisioningRequest;
use crate::service_manager::ServiceManager;
use tracing::info;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Validate,
    InstallPackages,
    ConfigureRemoteAccess,
    EnsureRoleAndDatabase,
    EnsureExtensions,
    EnsureSwap,
    ConfigureFirewall,
    ReportSummary,
}

/// Tunables resolved from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Swap file size when no swap pre-exists.
    pub swap_bytes: u64,
    /// Inbound SSH port kept open.
    pub ssh_port: u16,
    /// Port the database listens on.
    pub db_port: u16,
    /// Extensions enabled in the target database, in dependency order.
    pub extensions: Vec<String>,
    /// Leave an existing role's password and privileges untouched.
    pub keep_existing_role: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            swap_bytes: 2 * 1024 * 1024 * 1024,
            ssh_port: 22,
            db_port: 5432,
            extensions: vec!["postgis".to_string(), "postgis_topology".to_string()],
            keep_existing_role: false,
        }
    }
}

/// Drives the convergence pipeline. All collaborators are injected so the
/// whole pipeline runs against fakes in tests.
pub struct Orchestrator<'a> {
    request: &'a ProvisioningRequest,
    settings: &'a Settings,
    gateway: &'a dyn SystemGateway,
    packages: &'a dyn PackageManager,
    services: &'a dyn ServiceManager,
    firewall: &'a dyn FirewallManager,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        request: &'a ProvisioningRequest,
        settings: &'a Settings,
        gateway: &'a dyn SystemGateway,
        packages: &'a dyn PackageManager,
        services: &'a dyn ServiceManager,
        firewall: &'a dyn FirewallManager,
    ) -> Self {
        Self {
            request,
            settings,
            gateway,
            packages,
            services,
            firewall,
        }
    }

    /// Run every stage in order. Returns on the first fatal error.
    pub fn run(&self) -> Result<()> {
        self.enter(Stage::Validate);
        self.request.validate()?;
        info!("inputs validated: role and database set");

        self.enter(Stage::InstallPackages);
        convergence::packages::ensure_packages_installed(
            self.packages,
            self.services,
            DB_PACKAGES,
            DB_SERVICE,
        )?;

        self.enter(Stage::ConfigureRemoteAccess);
        remote_access::configure(self.gateway, self.services)?;

        self.enter(Stage::EnsureRoleAndDatabase);
        convergence::database::ensure_role(
            self.gateway,
            self.request,
            self.settings.keep_existing_role,
        )?;
        convergence::database::ensure_database(self.gateway, self.request)?;

        self.enter(Stage::EnsureExtensions);
        convergence::database::ensure_extensions(
            self.gateway,
            &self.request.database,
            &self.settings.extensions,
        )?;

        self.enter(Stage::EnsureSwap);
        let swap = convergence::swap::ensure_swap(self.gateway, self.settings.swap_bytes)?;

        self.enter(Stage::ConfigureFirewall);
        let rules = [
            AllowRule::tcp(self.settings.ssh_port),
            AllowRule::tcp(self.settings.db_port),
        ];
        convergence::firewall::ensure_firewall(self.firewall, &rules)?;

        self.enter(Stage::ReportSummary);
        self.report_summary(swap, &rules);
        Ok(())
    }

    fn enter(&self, stage: Stage) {
        info!("stage {} starting", stage);
    }

    // Only reached on full success.
    fn report_summary(&self, swap: SwapState, rules: &[AllowRule]) {
        let ports = rules
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        println!();
        println!("=== provisioning complete ===");
        println!("role:      {} (superuser, login)", self.request.role);
        println!(
            "database:  {} (owner {}, extensions: {})",
            self.request.database,
            self.request.role,
            self.settings.extensions.join(", ")
        );
        println!("swap:      active, {} bytes", swap.size_bytes);
        println!("firewall:  deny incoming except {}", ports);
        println!();
        println!(
            "WARNING: role {} is a SUPERUSER and password logins are accepted",
            self.request.role
        );
        println!("from ANY IPv4 address. Suitable for throwaway/demo hosts only.");
    }
}
