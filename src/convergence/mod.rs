//! Idempotent convergence primitives.
//!
//! Every primitive follows the same shape: observe the current state of one
//! resource, compare it to the desired state, apply only the delta, and log
//! one line describing the outcome. None of them assumes a clean-slate
//! machine, and all of them are safe to invoke again after a partial run —
//! a rerun is the designated recovery path.

pub mod database;
pub mod firewall;
pub mod packages;
pub mod swap;
