//! Remote-access configuration for the database server.
//!
//! Makes the server reachable from any address: discover where the running
//! server keeps its configuration and access-control files, point the listen
//! address at all interfaces, open password authentication to any IPv4
//! client, and restart the unit so both changes land together.
//!
//! Discovery failing is a degraded mode, not an error: the rest of the
//! pipeline still runs and the server simply stays reachable only locally.

use crate::convergence::packages::DB_SERVICE;
use crate::error::{ProvisionError, Result};
use crate::gateway::SystemGateway;
use crate::service_manager::ServiceManager;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Access-control line opening password auth to every IPv4 client
pub const OPEN_HBA_RULE: &str = "host    all             all             0.0.0.0/0               md5";

/// Paths the running server reports for its own configuration.
///
/// Always discovered, never hard-coded: the locations vary by OS and
/// packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPaths {
    pub config_file: PathBuf,
    pub hba_file: PathBuf,
}

fn show_setting(gateway: &dyn SystemGateway, setting: &str) -> Result<PathBuf> {
    // SHOW takes a bare setting name; both names queried here are fixed
    // strings, nothing user-supplied.
    let rows = gateway
        .query_database(None, &format!("SHOW {}", setting))
        .map_err(|e| ProvisionError::discovery(format!("SHOW {} failed: {}", setting, e)))?;

    let path = rows.trim();
    if path.is_empty() {
        return Err(ProvisionError::discovery(format!(
            "SHOW {} returned no path",
            setting
        )));
    }
    Ok(PathBuf::from(path))
}

/// Ask the running server for its configuration and hba file paths.
pub fn discover_paths(gateway: &dyn SystemGateway) -> Result<ServerPaths> {
    let config_file = show_setting(gateway, "config_file")?;
    let hba_file = show_setting(gateway, "hba_file")?;
    Ok(ServerPaths {
        config_file,
        hba_file,
    })
}

/// Does this hba file already accept password logins from any IPv4 address?
pub fn hba_has_open_rule(contents: &str) -> bool {
    contents.lines().any(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        fields.len() >= 4
            && fields[0] == "host"
            && fields[1] == "all"
            && fields[2] == "all"
            && fields[3] == "0.0.0.0/0"
    })
}

/// Open the server to remote connections and restart it.
///
/// Skipped entirely (with a warning) when path discovery fails; a missing
/// hba file skips only the hba step. The listen address is changed through
/// `ALTER SYSTEM` rather than file edits, and the restart is a full restart
/// because listen-address changes do not apply on reload.
pub fn configure(gateway: &dyn SystemGateway, services: &dyn ServiceManager) -> Result<()> {
    let paths = match discover_paths(gateway) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("{}; server stays reachable only locally", e);
            return Ok(());
        }
    };
    debug!(
        "server config at {}, hba at {}",
        paths.config_file.display(),
        paths.hba_file.display()
    );

    gateway.query_database(None, "ALTER SYSTEM SET listen_addresses = '*'")?;
    info!("listen address set to all interfaces");

    match gateway.read_file(&paths.hba_file) {
        Ok(contents) => {
            if hba_has_open_rule(&contents) {
                info!("open hba rule already present, not appended again");
            } else {
                gateway.append_file(&paths.hba_file, &format!("{}\n", OPEN_HBA_RULE))?;
                info!("password auth opened to all IPv4 addresses");
            }
        }
        Err(e) => {
            warn!("{}; hba step skipped", e);
        }
    }

    services.restart(DB_SERVICE)?;
    info!("{} restarted to apply listen and hba changes", DB_SERVICE);
    Ok(())
}
