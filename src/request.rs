//! Provisioning request: the three inputs every convergence step consumes.
//!
//! A request is constructed once — from command-line options or a JSON file —
//! validated before any mutation, and then read-only for the rest of the run.

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{ProvisionError, Result};

/// The role, password, and database to converge the server towards.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    /// Login role to create or repair.
    pub role: String,
    /// Password asserted on the role. Opaque secret; never logged.
    pub password: String,
    /// Database to create or repair, owned by `role`.
    pub database: String,
}

impl ProvisioningRequest {
    pub fn new(
        role: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    /// Load a request from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> AnyResult<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request file {:?}", path.as_ref()))?;

        let request: Self =
            serde_json::from_str(&content).context("Failed to parse request JSON")?;

        Ok(request)
    }

    /// Validate the request before any convergence step runs.
    ///
    /// Absence of any field is a fatal configuration error, not a per-step
    /// failure. Content is not otherwise restricted — arbitrary names are
    /// handled by SQL escaping, not rejected here.
    pub fn validate(&self) -> Result<()> {
        if self.role.trim().is_empty() {
            return Err(ProvisionError::config("role name must not be empty"));
        }
        if self.password.is_empty() {
            return Err(ProvisionError::config("password must not be empty"));
        }
        if self.database.trim().is_empty() {
            return Err(ProvisionError::config("database name must not be empty"));
        }
        Ok(())
    }
}

// Manual Debug so the password never lands in logs or panic output.
impl fmt::Debug for ProvisioningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningRequest")
            .field("role", &self.role)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}
