//! System gateway: the only sanctioned path to the target machine.
//!
//! Every convergence primitive mutates the host exclusively through the
//! [`SystemGateway`] trait — privileged commands, administrative SQL, and
//! file access all go through here. This keeps the primitives independently
//! testable against an in-memory fake instead of a live OS.
//!
//! # Architecture Rule
//!
//! `HostGateway` is the execution gatekeeper. Any attempt to use
//! `Command::new` directly from a convergence primitive violates the
//! architecture.

use crate::error::{ProvisionError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
}

impl CommandOutput {
    /// Check that the command succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            Err(ProvisionError::external_tool(format!(
                "{} failed (exit code {}): {}",
                context,
                code,
                self.stderr.trim()
            )))
        }
    }
}

/// Capability interface over the target machine.
///
/// The orchestrator injects one implementation into every convergence
/// primitive. Production uses [`HostGateway`]; tests use a recording fake.
pub trait SystemGateway {
    /// Run a privileged external command and capture its output.
    ///
    /// `env` entries are injected into the child environment (e.g.
    /// `DEBIAN_FRONTEND=noninteractive` for apt).
    fn run_privileged(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput>;

    /// Run a single SQL statement as the database superuser and return its
    /// raw stdout. `database` targets a specific database; `None` uses the
    /// server default.
    fn query_database(&self, database: Option<&str>, sql: &str) -> Result<String>;

    /// Read an entire file into a string.
    fn read_file(&self, path: &Path) -> Result<String>;

    /// Replace a file's contents.
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Append to a file, creating it if absent.
    fn append_file(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Real implementation that shells out to the host.
///
/// SQL goes through the `psql` client running as the `postgres` OS user,
/// with `ON_ERROR_STOP` so statement failures surface as non-zero exits.
pub struct HostGateway;

impl HostGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HostGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemGateway for HostGateway {
    fn run_privileged(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput> {
        debug!("run_privileged: {} args={:?}", program, args);

        let mut cmd = Command::new(program);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        for (key, value) in env {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|e| {
            ProvisionError::external_tool(format!("failed to spawn {}: {}", program, e))
        })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        };

        if result.success {
            debug!("{} executed successfully", program);
        } else {
            info!(
                "{} failed with exit code {}",
                program,
                result.exit_code.unwrap_or(-1)
            );
        }

        Ok(result)
    }

    fn query_database(&self, database: Option<&str>, sql: &str) -> Result<String> {
        // -X skips psqlrc, -tA gives unadorned rows for existence probes
        let mut args = vec![
            "-u",
            "postgres",
            "psql",
            "-X",
            "-v",
            "ON_ERROR_STOP=1",
            "-tAc",
            sql,
        ];
        if let Some(db) = database {
            args.push("-d");
            args.push(db);
        }

        let output = self.run_privileged("sudo", &args, &[])?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(ProvisionError::external_tool(format!(
                "psql failed (exit code {}): {}",
                output.exit_code.unwrap_or(-1),
                output.stderr.trim()
            )))
        }
    }

    fn read_file(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| {
            ProvisionError::filesystem(format!("failed to read {}: {}", path.display(), e))
        })
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::write(path, contents).map_err(|e| {
            ProvisionError::filesystem(format!("failed to write {}: {}", path.display(), e))
        })
    }

    fn append_file(&self, path: &Path, contents: &str) -> Result<()> {
        use std::io::Write;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                ProvisionError::filesystem(format!("failed to open {}: {}", path.display(), e))
            })?;
        file.write_all(contents.as_bytes()).map_err(|e| {
            ProvisionError::filesystem(format!("failed to append to {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}
