//! postgis-bootstrap library
//!
//! Idempotent provisioning of a single host into a publicly reachable
//! PostgreSQL + PostGIS server: package install, remote access, role and
//! database convergence, swap, and firewall.

pub mod cli;
pub mod convergence;
pub mod error;
pub mod firewall;
pub mod gateway;
pub mod orchestrator;
pub mod package_manager;
pub mod preflight;
pub mod remote_access;
pub mod request;
pub mod service_manager;
pub mod sql;

// Re-export main types for convenience
pub use cli::Cli;
pub use convergence::packages::{DB_PACKAGES, DB_SERVICE};
pub use convergence::swap::SwapState;
pub use error::{ProvisionError, Result};
pub use firewall::{AllowRule, Direction, FirewallManager, Policy, Protocol, UfwFirewall};
pub use gateway::{CommandOutput, HostGateway, SystemGateway};
pub use orchestrator::{Orchestrator, Settings, Stage};
pub use package_manager::{AptPackageManager, PackageManager};
pub use remote_access::ServerPaths;
pub use request::ProvisioningRequest;
pub use service_manager::{ServiceManager, SystemdServiceManager};
pub use sql::{IdentifierFragment, LiteralFragment, escape_identifier, escape_literal};
