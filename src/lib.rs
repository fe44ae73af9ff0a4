//! Declarative reconciliation of cluster-node VMs against a remote manager
//! API: resolve references, check existence, submit, poll to a terminal
//! status, report an idempotent changed/unchanged result.

pub mod client;
pub mod config;
pub mod error;
pub mod exists;
pub mod model;
pub mod poll;
pub mod reconcile;
pub mod resolve;

pub use client::{HttpManagerClient, ManagerClient};
pub use config::ManagerConfig;
pub use error::{Error, Result};
pub use model::{DesiredState, NodeState};
pub use poll::DeletePollPolicy;
pub use reconcile::{reconcile, Outcome, ReconcileOptions};
