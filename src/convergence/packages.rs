//! Package-set convergence.
//!
//! Installs the database engine and its spatial extension packages and makes
//! sure the server unit is enabled and running. Failure here is fatal to the
//! whole run: with no engine on disk there is no safe partial state for the
//! later stages to continue from.

use crate::error::Result;
use crate::package_manager::PackageManager;
use crate::service_manager::ServiceManager;
use tracing::info;

/// Packages that make up the spatial database server
pub const DB_PACKAGES: &[&str] = &[
    "postgresql",         // Database engine
    "postgresql-contrib", // Admin extensions (pgcrypto etc.)
    "postgis",            // Spatial types and functions
];

/// systemd unit providing the database server
pub const DB_SERVICE: &str = "postgresql";

/// Refresh the index, install `names`, and enable + start `unit`.
pub fn ensure_packages_installed(
    packages: &dyn PackageManager,
    services: &dyn ServiceManager,
    names: &[&str],
    unit: &str,
) -> Result<()> {
    packages.refresh_index()?;
    packages.install(names)?;
    services.enable(unit)?;
    services.start(unit)?;
    info!(
        "packages installed ({}), service {} enabled and running",
        names.join(" "),
        unit
    );
    Ok(())
}
