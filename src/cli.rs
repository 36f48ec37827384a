use clap::Parser;
use std::path::PathBuf;

use crate::orchestrator::Settings;
use crate::request::ProvisioningRequest;

/// Provision this host into a publicly reachable PostgreSQL + PostGIS server
#[derive(Parser)]
#[command(name = "postgis-bootstrap")]
#[command(about = "Provision this host into a publicly reachable PostgreSQL + PostGIS server")]
#[command(version)]
pub struct Cli {
    /// Login role to create or repair
    #[arg(short, long, required_unless_present = "config")]
    pub role: Option<String>,

    /// Password asserted on the role
    #[arg(short, long, required_unless_present = "config")]
    pub password: Option<String>,

    /// Database to create, owned by the role
    #[arg(short, long, required_unless_present = "config")]
    pub database: Option<String>,

    /// Read role/password/database from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["role", "password", "database"])]
    pub config: Option<PathBuf>,

    /// Swap file size in GiB (only used when the host has no active swap)
    #[arg(long, default_value_t = 2)]
    pub swap_size: u64,

    /// Port the database listens on
    #[arg(long, default_value_t = 5432)]
    pub db_port: u16,

    /// Inbound SSH port to keep open
    #[arg(long, default_value_t = 22)]
    pub ssh_port: u16,

    /// Leave an existing role's password and privileges untouched
    #[arg(long)]
    pub keep_existing_role: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Resolve the provisioning request from flags or the config file.
    pub fn request(&self) -> anyhow::Result<ProvisioningRequest> {
        if let Some(path) = &self.config {
            ProvisioningRequest::load_from_file(path)
        } else {
            // clap guarantees presence when --config is absent; empty values
            // are still caught by validation before anything runs.
            Ok(ProvisioningRequest::new(
                self.role.clone().unwrap_or_default(),
                self.password.clone().unwrap_or_default(),
                self.database.clone().unwrap_or_default(),
            ))
        }
    }

    /// Resolve pipeline settings from the flags.
    pub fn settings(&self) -> Settings {
        Settings {
            swap_bytes: self.swap_size * 1024 * 1024 * 1024,
            ssh_port: self.ssh_port,
            db_port: self.db_port,
            keep_existing_role: self.keep_existing_role,
            ..Settings::default()
        }
    }
}
