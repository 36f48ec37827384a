//! postgis-bootstrap - main entry point
//!
//! Parses the command line, verifies the environment, and hands the request
//! to the provisioning orchestrator. Every failure path exits non-zero so
//! calling automation can detect it.

use tracing::error;
use tracing_subscriber::EnvFilter;

use postgis_bootstrap::cli::Cli;
use postgis_bootstrap::firewall::UfwFirewall;
use postgis_bootstrap::gateway::HostGateway;
use postgis_bootstrap::orchestrator::Orchestrator;
use postgis_bootstrap::package_manager::AptPackageManager;
use postgis_bootstrap::preflight;
use postgis_bootstrap::service_manager::SystemdServiceManager;

/// Initialize logging: timestamped progress lines on stdout,
/// RUST_LOG overrides the default level.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse_args();

    if let Err(e) = run(&cli) {
        error!("provisioning aborted: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // Root and tooling are checked before anything is read or mutated
    preflight::check()?;

    let request = cli.request()?;
    let settings = cli.settings();

    let gateway = HostGateway::new();
    let packages = AptPackageManager::new(&gateway);
    let services = SystemdServiceManager::new(&gateway);
    let firewall = UfwFirewall::new(&gateway);

    let orchestrator = Orchestrator::new(
        &request, &settings, &gateway, &packages, &services, &firewall,
    );
    orchestrator.run()?;

    Ok(())
}
