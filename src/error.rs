use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the reconciliation core.
///
/// Every variant is fatal at the point of detection: there is no retry or
/// backoff for individual calls. The only loop that re-issues a request is
/// the status poller, and only while the remote reports an in-progress state.
#[derive(Debug, Error)]
pub enum Error {
    /// Network, TLS, or protocol failure talking to the manager.
    #[error("Error accessing manager. Error [{0}]")]
    Transport(String),

    /// A required display-name lookup found no matching resource.
    #[error("No id exists with display name {name}")]
    NotFound { name: String },

    /// The manager rejected a create/delete submission.
    ///
    /// The message carries the serialized request body, which can include
    /// guest-OS credentials. This matches the remote system's established
    /// failure reporting; see DESIGN.md.
    #[error("Manager rejected request. Request body [{body}]. Error [{cause}]")]
    Remote { body: String, cause: String },

    /// The poller observed a failed or unrecognized deployment status.
    #[error("Error in node status: {status}")]
    TerminalStatus { status: String },

    /// Desired state asked for deletion without naming the node.
    #[error("node_id is required when state is 'absent'")]
    MissingNodeId,

    /// The caller-supplied polling deadline elapsed before a terminal status.
    #[error("Polling deadline of {0:?} exceeded before a terminal status")]
    DeadlineExceeded(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
