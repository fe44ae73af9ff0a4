use crate::client::ManagerClient;
use crate::error::{Error, Result};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Interval between status polls while a deployment is in progress.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Delay applied after a terminal status, letting the remote side settle.
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(5);

/// Classification of a remote deployment status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    InProgress,
    Success,
    Failed,
}

/// Map a status string reported by the manager onto a poll decision.
///
/// The vocabulary is fixed by the remote system. Anything outside it is
/// treated as a failure so an unknown state can never leave the poller
/// spinning. Note that VM_UNDEPLOY_SUCCESSFUL is an in-progress state: the
/// undeploy phase completes before declustering does.
pub fn classify_status(status: &str) -> StatusClass {
    match status {
        "VM_DEPLOYMENT_QUEUED"
        | "VM_DEPLOYMENT_IN_PROGRESS"
        | "VM_POWER_ON_IN_PROGRESS"
        | "WAITING_TO_REGISTER_VM"
        | "VM_WAITING_TO_CLUSTER"
        | "VM_WAITING_TO_COME_ONLINE"
        | "VM_CLUSTERING_IN_PROGRESS"
        | "WAITING_TO_UNDEPLOY_VM"
        | "VM_DECLUSTER_IN_PROGRESS"
        | "VM_POWER_OFF_IN_PROGRESS"
        | "VM_UNDEPLOY_IN_PROGRESS"
        | "VM_UNDEPLOY_SUCCESSFUL" => StatusClass::InProgress,
        "VM_CLUSTERING_SUCCESSFUL" | "VM_DECLUSTER_SUCCESSFUL" => StatusClass::Success,
        _ => StatusClass::Failed,
    }
}

/// How the delete poller decides it is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePollPolicy {
    /// Ignore poll responses entirely and keep polling until the status
    /// endpoint errors, which is read as "resource gone". This mirrors the
    /// remote system's established delete behavior; see DESIGN.md.
    UntilError,
    /// Classify statuses like the create poller, additionally treating a
    /// status-endpoint error as completion.
    StrictStatus,
}

/// Sleep seam so tests can observe the poll cadence instead of waiting it
/// out.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper; blocks the calling thread.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

fn status_path(vm_id: &str) -> String {
    format!("/cluster/nodes/deployments/{}/status", vm_id)
}

fn fetch_status(client: &dyn ManagerClient, vm_id: &str) -> Result<String> {
    let response = client.get(&status_path(vm_id))?;
    response
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Transport("status response missing 'status' field".to_string()))
}

fn check_deadline(start: Instant, deadline: Option<Duration>) -> Result<()> {
    if let Some(limit) = deadline {
        if start.elapsed() >= limit {
            return Err(Error::DeadlineExceeded(limit));
        }
    }
    Ok(())
}

/// Poll one deployment until it reaches a terminal state.
///
/// In-progress statuses sleep and re-poll; a success status sleeps the
/// shorter settle interval and returns; a failed or unrecognized status
/// fails immediately with the raw string. With `deadline: None` (the
/// default) this blocks until the remote reaches a terminal state or the
/// status endpoint itself errors. The deadline is checked before each sleep,
/// so at least one poll is always issued.
pub fn wait_for_create(
    client: &dyn ManagerClient,
    sleeper: &dyn Sleeper,
    vm_id: &str,
    deadline: Option<Duration>,
) -> Result<()> {
    let start = Instant::now();
    loop {
        let status = fetch_status(client, vm_id)?;
        match classify_status(&status) {
            StatusClass::InProgress => {
                check_deadline(start, deadline)?;
                sleeper.sleep(POLL_INTERVAL);
            }
            StatusClass::Success => {
                sleeper.sleep(SETTLE_INTERVAL);
                return Ok(());
            }
            StatusClass::Failed => {
                return Err(Error::TerminalStatus { status });
            }
        }
    }
}

/// Poll a deletion until it completes according to `policy`.
///
/// Under either policy, an error from the status endpoint means the record
/// is gone and the deletion is complete.
pub fn wait_for_delete(
    client: &dyn ManagerClient,
    sleeper: &dyn Sleeper,
    node_id: &str,
    policy: DeletePollPolicy,
    deadline: Option<Duration>,
) -> Result<()> {
    let start = Instant::now();
    loop {
        match policy {
            DeletePollPolicy::UntilError => match client.get(&status_path(node_id)) {
                Ok(_) => {
                    check_deadline(start, deadline)?;
                    sleeper.sleep(POLL_INTERVAL);
                }
                Err(_) => {
                    sleeper.sleep(SETTLE_INTERVAL);
                    return Ok(());
                }
            },
            DeletePollPolicy::StrictStatus => match fetch_status(client, node_id) {
                Ok(status) => match classify_status(&status) {
                    StatusClass::InProgress => {
                        check_deadline(start, deadline)?;
                        sleeper.sleep(POLL_INTERVAL);
                    }
                    StatusClass::Success => {
                        sleeper.sleep(SETTLE_INTERVAL);
                        return Ok(());
                    }
                    StatusClass::Failed => {
                        return Err(Error::TerminalStatus { status });
                    }
                },
                Err(_) => {
                    sleeper.sleep(SETTLE_INTERVAL);
                    return Ok(());
                }
            },
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::Sleeper;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records requested sleeps without actually sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub sleeps: RefCell<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn recorded(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }
}
