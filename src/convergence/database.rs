//! Role, database, and extension convergence.
//!
//! All three primitives probe the catalog first and then issue only the
//! statement that closes the gap. Role and database names come from user
//! input, so every dynamic fragment is built through the `sql` module —
//! identifiers in identifier position, passwords and probe values in literal
//! position. No raw string reaches SQL text from here.

use crate::error::Result;
use crate::gateway::SystemGateway;
use crate::request::ProvisioningRequest;
use crate::sql::{escape_identifier, escape_literal};
use tracing::info;

/// Does a role with this exact name exist?
pub fn role_exists(gateway: &dyn SystemGateway, role: &str) -> Result<bool> {
    let sql = format!(
        "SELECT 1 FROM pg_roles WHERE rolname = {}",
        escape_literal(role)
    );
    let rows = gateway.query_database(None, &sql)?;
    Ok(rows.trim() == "1")
}

/// Converge the login role.
///
/// An existing role gets its password rewritten and is re-elevated to
/// superuser so reruns repair drift (a role that lost superuser, a rotated
/// password) rather than skipping. `keep_existing` turns the existing-role
/// branch into a logged no-op for operators who manage the role themselves.
pub fn ensure_role(
    gateway: &dyn SystemGateway,
    request: &ProvisioningRequest,
    keep_existing: bool,
) -> Result<()> {
    let name = escape_identifier(&request.role);
    let password = escape_literal(&request.password);

    if role_exists(gateway, &request.role)? {
        if keep_existing {
            info!(
                "role {} exists, left untouched (--keep-existing-role)",
                request.role
            );
            return Ok(());
        }
        let sql = format!(
            "ALTER ROLE {} WITH SUPERUSER LOGIN PASSWORD {}",
            name, password
        );
        gateway.query_database(None, &sql)?;
        info!(
            "role {} exists, superuser and password re-asserted",
            request.role
        );
    } else {
        let sql = format!(
            "CREATE ROLE {} WITH SUPERUSER LOGIN PASSWORD {}",
            name, password
        );
        gateway.query_database(None, &sql)?;
        info!("role {} created as superuser", request.role);
    }
    Ok(())
}

/// Current owner of the named database, or None if it does not exist.
pub fn database_owner(gateway: &dyn SystemGateway, database: &str) -> Result<Option<String>> {
    let sql = format!(
        "SELECT pg_catalog.pg_get_userbyid(datdba) FROM pg_database WHERE datname = {}",
        escape_literal(database)
    );
    let rows = gateway.query_database(None, &sql)?;
    let owner = rows.trim();
    if owner.is_empty() {
        Ok(None)
    } else {
        Ok(Some(owner.to_string()))
    }
}

/// Converge the database: create it owned by the role, or repair ownership.
///
/// Ownership already matching the role is a no-op. Creation pins UTF-8 via
/// template0 so the encoding clause is honored regardless of the cluster
/// default.
pub fn ensure_database(gateway: &dyn SystemGateway, request: &ProvisioningRequest) -> Result<()> {
    let name = escape_identifier(&request.database);
    let owner = escape_identifier(&request.role);

    match database_owner(gateway, &request.database)? {
        Some(current) if current == request.role => {
            info!(
                "database {} exists, already owned by {}",
                request.database, request.role
            );
        }
        Some(current) => {
            let sql = format!("ALTER DATABASE {} OWNER TO {}", name, owner);
            gateway.query_database(None, &sql)?;
            info!(
                "database {} existed owned by {}, ownership moved to {}",
                request.database, current, request.role
            );
        }
        None => {
            let sql = format!(
                "CREATE DATABASE {} OWNER {} ENCODING 'UTF8' TEMPLATE template0",
                name, owner
            );
            gateway.query_database(None, &sql)?;
            info!(
                "database {} created, owner {}, encoding UTF8",
                request.database, request.role
            );
        }
    }
    Ok(())
}

/// Enable each extension in order inside the target database.
///
/// Order matters: postgis_topology depends on postgis already being present.
pub fn ensure_extensions(
    gateway: &dyn SystemGateway,
    database: &str,
    extensions: &[String],
) -> Result<()> {
    for extension in extensions {
        let sql = format!(
            "CREATE EXTENSION IF NOT EXISTS {}",
            escape_identifier(extension)
        );
        gateway.query_database(Some(database), &sql)?;
        info!("extension {} present in {}", extension, database);
    }
    Ok(())
}
