//! Swap convergence.
//!
//! Observes `/proc/swaps`; if any swap is already active the primitive is a
//! strict no-op — operator-managed swap is never grown, shrunk, or replaced.
//! Only on a swapless host does it provision a file at [`SWAP_FILE`]: clear
//! stale leftovers from an interrupted run, allocate exactly the target size
//! (sparse fast path, zero-fill fallback), lock down permissions, format,
//! activate, and register the mount entry once.

use crate::error::Result;
use crate::gateway::SystemGateway;
use std::path::Path;
use tracing::{debug, info, warn};

/// Well-known path of the swap file this tool manages
pub const SWAP_FILE: &str = "/swapfile";

/// Persistent mount table
pub const FSTAB: &str = "/etc/fstab";

const FSTAB_ENTRY: &str = "/swapfile none swap sw 0 0\n";
const PROC_SWAPS: &str = "/proc/swaps";

/// Observed swap state of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapState {
    /// At least one swap device is active.
    pub exists: bool,
    /// Total active swap, in bytes.
    pub size_bytes: u64,
}

/// Parse the contents of `/proc/swaps`.
///
/// The first line is a header; each following line is
/// `<path> <type> <size-kib> <used-kib> <priority>`.
pub fn parse_proc_swaps(contents: &str) -> SwapState {
    let mut exists = false;
    let mut size_bytes = 0u64;

    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() >= 3 {
            exists = true;
            size_bytes += fields[2].parse::<u64>().unwrap_or(0) * 1024;
        }
    }

    SwapState { exists, size_bytes }
}

/// Observe the host's current swap state.
pub fn observe(gateway: &dyn SystemGateway) -> Result<SwapState> {
    let contents = gateway.read_file(Path::new(PROC_SWAPS))?;
    Ok(parse_proc_swaps(&contents))
}

/// Converge swap to "some swap exists", returning the resulting state.
///
/// Newly provisioned swap is exactly `target_bytes`; pre-existing swap is
/// reported as observed.
pub fn ensure_swap(gateway: &dyn SystemGateway, target_bytes: u64) -> Result<SwapState> {
    let state = observe(gateway)?;
    if state.exists {
        info!(
            "swap already active ({} bytes), leaving it untouched",
            state.size_bytes
        );
        return Ok(state);
    }

    // Clear any stale registration or half-written file from an interrupted
    // run; both are expected to fail on a genuinely clean host.
    if let Ok(output) = gateway.run_privileged("swapoff", &[SWAP_FILE], &[]) {
        if !output.success {
            debug!("no stale swap registration at {}", SWAP_FILE);
        }
    }
    gateway
        .run_privileged("rm", &["-f", SWAP_FILE], &[])?
        .ensure_success("removing stale swap file")?;

    let size_arg = target_bytes.to_string();
    let fallocate = gateway.run_privileged("fallocate", &["-l", &size_arg, SWAP_FILE], &[])?;
    if !fallocate.success {
        // Filesystems without extent preallocation (e.g. some overlayfs)
        warn!("fallocate unsupported here, zero-filling instead");
        let of_arg = format!("of={}", SWAP_FILE);
        let count_arg = format!("count={}", target_bytes.div_ceil(1024 * 1024));
        gateway
            .run_privileged(
                "dd",
                &["if=/dev/zero", &of_arg, "bs=1048576", &count_arg],
                &[],
            )?
            .ensure_success("dd zero-fill")?;
    }

    gateway
        .run_privileged("chmod", &["600", SWAP_FILE], &[])?
        .ensure_success("chmod 600 swap file")?;
    gateway
        .run_privileged("mkswap", &[SWAP_FILE], &[])?
        .ensure_success("mkswap")?;
    gateway
        .run_privileged("swapon", &[SWAP_FILE], &[])?
        .ensure_success("swapon")?;

    register_fstab_entry(gateway)?;

    info!("swap file provisioned and active ({} bytes)", target_bytes);
    Ok(SwapState {
        exists: true,
        size_bytes: target_bytes,
    })
}

/// Append the fstab entry only if no entry for the swap file exists yet.
fn register_fstab_entry(gateway: &dyn SystemGateway) -> Result<()> {
    let fstab = match gateway.read_file(Path::new(FSTAB)) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("{}; treating fstab as empty", e);
            String::new()
        }
    };

    let already_registered = fstab
        .lines()
        .any(|line| line.split_whitespace().next() == Some(SWAP_FILE));

    if already_registered {
        debug!("fstab already carries a {} entry", SWAP_FILE);
    } else {
        gateway.append_file(Path::new(FSTAB), FSTAB_ENTRY)?;
        info!("fstab entry added for {}", SWAP_FILE);
    }
    Ok(())
}
