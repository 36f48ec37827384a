//! Tests for the Provisioning Pipeline
//!
//! The whole orchestrator runs against in-memory fakes, so these tests
//! verify:
//! - Stage ordering over a full successful run
//! - Degraded mode when server path discovery fails
//! - Fatal aborts stopping the pipeline early
//! - That a bad command line produces no side effects at all

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use clap::Parser;
use postgis_bootstrap::cli::Cli;
use postgis_bootstrap::error::{ProvisionError, Result};
use postgis_bootstrap::firewall::{AllowRule, Direction, FirewallManager, Policy};
use postgis_bootstrap::gateway::{CommandOutput, SystemGateway};
use postgis_bootstrap::orchestrator::{Orchestrator, Settings};
use postgis_bootstrap::package_manager::PackageManager;
use postgis_bootstrap::request::ProvisioningRequest;
use postgis_bootstrap::service_manager::ServiceManager;

const PROC_SWAPS_HEADER: &str = "Filename\tType\tSize\tUsed\tPriority\n";

/// In-memory gateway that records every interaction.
#[derive(Default)]
struct FakeGateway {
    commands: RefCell<Vec<String>>,
    queries: RefCell<Vec<String>>,
    query_results: RefCell<VecDeque<String>>,
    files: RefCell<HashMap<PathBuf, String>>,
    failing_query_patterns: RefCell<Vec<String>>,
}

impl FakeGateway {
    fn new() -> Self {
        Self::default()
    }

    fn push_query_result(&self, result: &str) {
        self.query_results.borrow_mut().push_back(result.to_string());
    }

    fn set_file(&self, path: &str, contents: &str) {
        self.files
            .borrow_mut()
            .insert(PathBuf::from(path), contents.to_string());
    }

    fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(Path::new(path)).cloned()
    }

    fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    /// Make any query whose text contains `pattern` fail.
    fn fail_queries_containing(&self, pattern: &str) {
        self.failing_query_patterns
            .borrow_mut()
            .push(pattern.to_string());
    }

    fn is_untouched(&self) -> bool {
        self.commands.borrow().is_empty() && self.queries.borrow().is_empty()
    }
}

impl SystemGateway for FakeGateway {
    fn run_privileged(
        &self,
        program: &str,
        args: &[&str],
        _env: &[(&str, &str)],
    ) -> Result<CommandOutput> {
        self.commands
            .borrow_mut()
            .push(format!("{} {}", program, args.join(" ")));
        Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
        })
    }

    fn query_database(&self, _database: Option<&str>, sql: &str) -> Result<String> {
        if self
            .failing_query_patterns
            .borrow()
            .iter()
            .any(|p| sql.contains(p.as_str()))
        {
            return Err(ProvisionError::external_tool(format!(
                "psql failed: {}",
                sql
            )));
        }
        self.queries.borrow_mut().push(sql.to_string());
        Ok(self
            .query_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_default())
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| ProvisionError::filesystem(format!("no file at {}", path.display())))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn append_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_default()
            .push_str(contents);
        Ok(())
    }
}

/// Recording package manager fake.
#[derive(Default)]
struct FakePackageManager {
    actions: RefCell<Vec<String>>,
    fail_install: bool,
}

impl PackageManager for FakePackageManager {
    fn refresh_index(&self) -> Result<()> {
        self.actions.borrow_mut().push("refresh".to_string());
        Ok(())
    }

    fn install(&self, packages: &[&str]) -> Result<()> {
        if self.fail_install {
            return Err(ProvisionError::external_tool("apt-get install failed"));
        }
        self.actions
            .borrow_mut()
            .push(format!("install {}", packages.join(" ")));
        Ok(())
    }
}

/// Recording service manager fake.
#[derive(Default)]
struct FakeServiceManager {
    actions: RefCell<Vec<String>>,
}

impl ServiceManager for FakeServiceManager {
    fn enable(&self, unit: &str) -> Result<()> {
        self.actions.borrow_mut().push(format!("enable {}", unit));
        Ok(())
    }

    fn start(&self, unit: &str) -> Result<()> {
        self.actions.borrow_mut().push(format!("start {}", unit));
        Ok(())
    }

    fn restart(&self, unit: &str) -> Result<()> {
        self.actions.borrow_mut().push(format!("restart {}", unit));
        Ok(())
    }
}

/// Recording firewall fake.
#[derive(Default)]
struct FakeFirewall {
    actions: RefCell<Vec<String>>,
}

impl FirewallManager for FakeFirewall {
    fn reset(&self) -> Result<()> {
        self.actions.borrow_mut().push("reset".to_string());
        Ok(())
    }

    fn set_default_policy(&self, policy: Policy, direction: Direction) -> Result<()> {
        self.actions
            .borrow_mut()
            .push(format!("default {} {}", policy, direction));
        Ok(())
    }

    fn allow(&self, rule: &AllowRule) -> Result<()> {
        self.actions.borrow_mut().push(format!("allow {}", rule));
        Ok(())
    }

    fn enable(&self) -> Result<()> {
        self.actions.borrow_mut().push("enable".to_string());
        Ok(())
    }
}

fn demo_request() -> ProvisioningRequest {
    ProvisioningRequest::new("demo", "p@ss", "gisdata")
}

/// Gateway primed for a full happy-path run on a fresh host.
fn fresh_host_gateway() -> FakeGateway {
    let gateway = FakeGateway::new();
    gateway.set_file("/proc/swaps", PROC_SWAPS_HEADER);
    gateway.set_file("/etc/fstab", "/dev/sda1 / ext4 defaults 0 1\n");
    gateway.set_file(
        "/etc/postgresql/16/main/pg_hba.conf",
        "local   all             postgres                                peer\n",
    );
    // Discovery answers, in query order
    gateway.push_query_result("/etc/postgresql/16/main/postgresql.conf\n");
    gateway.push_query_result("/etc/postgresql/16/main/pg_hba.conf\n");
    gateway
}

// =============================================================================
// Full Pipeline Tests
// =============================================================================

#[test]
fn test_full_run_on_fresh_host() {
    let gateway = fresh_host_gateway();
    let packages = FakePackageManager::default();
    let services = FakeServiceManager::default();
    let firewall = FakeFirewall::default();
    let request = demo_request();
    let settings = Settings::default();

    let orchestrator =
        Orchestrator::new(&request, &settings, &gateway, &packages, &services, &firewall);
    orchestrator.run().expect("pipeline should succeed");

    // Packages before anything else
    assert_eq!(
        *packages.actions.borrow(),
        vec!["refresh", "install postgresql postgresql-contrib postgis"]
    );

    // Service enabled and started at install, restarted for remote access
    assert_eq!(
        *services.actions.borrow(),
        vec!["enable postgresql", "start postgresql", "restart postgresql"]
    );

    // SQL in pipeline order: discovery, listen address, role, database,
    // extensions
    let queries = gateway.queries();
    assert_eq!(queries[0], "SHOW config_file");
    assert_eq!(queries[1], "SHOW hba_file");
    assert_eq!(queries[2], "ALTER SYSTEM SET listen_addresses = '*'");
    assert!(queries[3].contains("pg_roles"));
    assert_eq!(
        queries[4],
        "CREATE ROLE \"demo\" WITH SUPERUSER LOGIN PASSWORD 'p@ss'"
    );
    assert!(queries[5].contains("pg_database"));
    assert_eq!(
        queries[6],
        "CREATE DATABASE \"gisdata\" OWNER \"demo\" ENCODING 'UTF8' TEMPLATE template0"
    );
    assert_eq!(queries[7], "CREATE EXTENSION IF NOT EXISTS \"postgis\"");
    assert_eq!(
        queries[8],
        "CREATE EXTENSION IF NOT EXISTS \"postgis_topology\""
    );

    // hba opened exactly once
    let hba = gateway
        .file("/etc/postgresql/16/main/pg_hba.conf")
        .expect("hba file");
    assert_eq!(hba.matches("0.0.0.0/0").count(), 1);

    // Swap provisioned and registered
    assert!(gateway.commands().iter().any(|c| c == "swapon /swapfile"));
    let fstab = gateway.file("/etc/fstab").expect("fstab");
    assert!(fstab.contains("/swapfile none swap sw 0 0"));

    // Firewall rebuilt from scratch with both ports
    assert_eq!(
        *firewall.actions.borrow(),
        vec![
            "reset",
            "default deny incoming",
            "default allow outgoing",
            "allow 22/tcp",
            "allow 5432/tcp",
            "enable",
        ]
    );
}

#[test]
fn test_rerun_converges_to_same_state() {
    // Second run against a host the first run already converged
    let gateway = FakeGateway::new();
    gateway.set_file(
        "/proc/swaps",
        &format!("{}/swapfile file 2097152 0 -2\n", PROC_SWAPS_HEADER),
    );
    gateway.set_file(
        "/etc/fstab",
        "/dev/sda1 / ext4 defaults 0 1\n/swapfile none swap sw 0 0\n",
    );
    gateway.set_file(
        "/etc/postgresql/16/main/pg_hba.conf",
        "local all postgres peer\nhost    all             all             0.0.0.0/0               md5\n",
    );
    gateway.push_query_result("/etc/postgresql/16/main/postgresql.conf\n");
    gateway.push_query_result("/etc/postgresql/16/main/pg_hba.conf\n");
    gateway.push_query_result(""); // ALTER SYSTEM
    gateway.push_query_result("1"); // role exists
    gateway.push_query_result(""); // ALTER ROLE
    gateway.push_query_result("demo\n"); // database owned correctly

    let packages = FakePackageManager::default();
    let services = FakeServiceManager::default();
    let firewall = FakeFirewall::default();
    let request = demo_request();
    let settings = Settings::default();

    let orchestrator =
        Orchestrator::new(&request, &settings, &gateway, &packages, &services, &firewall);
    orchestrator.run().expect("rerun should succeed");

    // Role repair still happened
    assert!(
        gateway
            .queries()
            .iter()
            .any(|q| q.starts_with("ALTER ROLE \"demo\""))
    );
    // No duplicate hba rule
    let hba = gateway
        .file("/etc/postgresql/16/main/pg_hba.conf")
        .expect("hba");
    assert_eq!(hba.matches("0.0.0.0/0").count(), 1);
    // No duplicate fstab entry, no swap mutation
    let fstab = gateway.file("/etc/fstab").expect("fstab");
    assert_eq!(fstab.matches("/swapfile").count(), 1);
    assert!(!gateway.commands().iter().any(|c| c.contains("mkswap")));
}

#[test]
fn test_discovery_failure_degrades_but_continues() {
    let gateway = FakeGateway::new();
    gateway.set_file("/proc/swaps", PROC_SWAPS_HEADER);
    gateway.set_file("/etc/fstab", "");
    gateway.fail_queries_containing("SHOW");

    let packages = FakePackageManager::default();
    let services = FakeServiceManager::default();
    let firewall = FakeFirewall::default();
    let request = demo_request();
    let settings = Settings::default();

    let orchestrator =
        Orchestrator::new(&request, &settings, &gateway, &packages, &services, &firewall);
    orchestrator.run().expect("degraded run should still succeed");

    // Remote access skipped entirely: no ALTER SYSTEM, no restart
    assert!(!gateway.queries().iter().any(|q| q.contains("ALTER SYSTEM")));
    assert!(
        !services
            .actions
            .borrow()
            .iter()
            .any(|a| a.starts_with("restart"))
    );

    // Later stages still ran
    assert!(gateway.queries().iter().any(|q| q.contains("CREATE ROLE")));
    assert!(!firewall.actions.borrow().is_empty());
}

#[test]
fn test_install_failure_aborts_before_database_work() {
    let gateway = FakeGateway::new();
    let packages = FakePackageManager {
        fail_install: true,
        ..Default::default()
    };
    let services = FakeServiceManager::default();
    let firewall = FakeFirewall::default();
    let request = demo_request();
    let settings = Settings::default();

    let orchestrator =
        Orchestrator::new(&request, &settings, &gateway, &packages, &services, &firewall);
    let err = orchestrator.run().expect_err("install failure is fatal");

    assert!(matches!(err, ProvisionError::ExternalTool(_)));
    assert!(gateway.queries().is_empty(), "no SQL after a fatal abort");
    assert!(firewall.actions.borrow().is_empty());
}

#[test]
fn test_empty_inputs_fail_validation_before_any_step() {
    let gateway = FakeGateway::new();
    let packages = FakePackageManager::default();
    let services = FakeServiceManager::default();
    let firewall = FakeFirewall::default();
    let request = ProvisioningRequest::new("", "", "");
    let settings = Settings::default();

    let orchestrator =
        Orchestrator::new(&request, &settings, &gateway, &packages, &services, &firewall);
    let err = orchestrator.run().expect_err("empty inputs are fatal");

    assert!(matches!(err, ProvisionError::Config(_)));
    assert!(gateway.is_untouched());
    assert!(packages.actions.borrow().is_empty());
}

// =============================================================================
// CLI Boundary Tests
// =============================================================================

#[test]
fn test_missing_option_exits_before_side_effects() {
    // Parsing fails, so nothing downstream can have run
    let gateway = FakeGateway::new();

    let result = Cli::try_parse_from(["postgis-bootstrap", "--role", "demo"]);
    assert!(result.is_err());

    assert!(gateway.is_untouched());
}
