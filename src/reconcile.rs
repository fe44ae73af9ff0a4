use crate::client::ManagerClient;
use crate::error::{Error, Result};
use crate::exists::find_existing;
use crate::model::{DeploymentCollection, DesiredState, NodeState};
use crate::poll::{wait_for_create, wait_for_delete, DeletePollPolicy, Sleeper, SETTLE_INTERVAL};
use crate::resolve::resolve_references;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Deployments collection endpoint.
pub const DEPLOYMENTS: &str = "/cluster/nodes/deployments";

/// Knobs for a single reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Report the would-be request without issuing mutating calls.
    pub dry_run: bool,
    pub delete_policy: DeletePollPolicy,
    /// Overall polling budget; None blocks until a terminal status.
    pub deadline: Option<Duration>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            delete_policy: DeletePollPolicy::UntilError,
            deadline: None,
        }
    }
}

/// Final result of a reconciliation run.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub message: String,
    /// Raw response body on a successful create, or the would-be request
    /// body on a create dry run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_id: Option<String>,
}

impl Outcome {
    fn unchanged(message: String) -> Self {
        Self {
            changed: false,
            message,
            body: None,
            deleted_id: None,
        }
    }

    fn changed(message: String) -> Self {
        Self {
            changed: true,
            message,
            body: None,
            deleted_id: None,
        }
    }
}

/// Drive the desired state to completion against the manager.
///
/// Validates preconditions, resolves references, short-circuits on the
/// idempotency check (create path), submits the mutating request, polls each
/// node to a terminal status, and applies a final settle delay before
/// reporting. Each deployment in a batch is polled sequentially, in list
/// order.
pub fn reconcile(
    client: &dyn ManagerClient,
    sleeper: &dyn Sleeper,
    state: DesiredState,
    options: &ReconcileOptions,
) -> Result<Outcome> {
    state.validate()?;
    let state = resolve_references(client, state)?;

    match state.state {
        NodeState::Present => apply_present(client, sleeper, &state, options),
        NodeState::Absent => apply_absent(client, sleeper, &state, options),
    }
}

fn apply_present(
    client: &dyn ManagerClient,
    sleeper: &dyn Sleeper,
    state: &DesiredState,
    options: &ReconcileOptions,
) -> Result<Outcome> {
    let response = client.get(DEPLOYMENTS)?;
    let existing: DeploymentCollection = serde_json::from_value(response)
        .map_err(|e| Error::Transport(format!("Invalid deployments response: {}", e)))?;

    if let Some(hostname) = find_existing(&state.deployment_requests, &existing.results) {
        println!("✓ Node with hostname {} already exists", hostname);
        return Ok(Outcome::unchanged(format!(
            "Node with hostname {} already exists.",
            hostname
        )));
    }

    let body = serde_json::to_value(state.body())
        .map_err(|e| Error::Transport(format!("Failed to serialize request body: {}", e)))?;

    if options.dry_run {
        return Ok(Outcome {
            body: Some(body),
            ..Outcome::changed("Dry run: deployment request not submitted.".to_string())
        });
    }

    let response = client.post(DEPLOYMENTS, Some(&body))?;

    for vm_id in vm_ids(&response)? {
        println!("Waiting for node {} to deploy and join the cluster...", vm_id);
        wait_for_create(client, sleeper, &vm_id, options.deadline)?;
        println!("✓ Node {} clustered", vm_id);
    }
    sleeper.sleep(SETTLE_INTERVAL);

    Ok(Outcome {
        body: Some(response),
        ..Outcome::changed("Nodes deployed.".to_string())
    })
}

fn apply_absent(
    client: &dyn ManagerClient,
    sleeper: &dyn Sleeper,
    state: &DesiredState,
    options: &ReconcileOptions,
) -> Result<Outcome> {
    // Guaranteed by validate(); re-checked so this path never panics.
    let node_id = state.node_id.clone().ok_or(Error::MissingNodeId)?;

    if options.dry_run {
        return Ok(Outcome::changed(format!(
            "Dry run: node {} not deleted.",
            node_id
        )));
    }

    client.post(&format!("{}/{}?action=delete", DEPLOYMENTS, node_id), None)?;

    println!("Waiting for node {} to be deleted...", node_id);
    wait_for_delete(client, sleeper, &node_id, options.delete_policy, options.deadline)?;
    sleeper.sleep(SETTLE_INTERVAL);

    Ok(Outcome {
        deleted_id: Some(node_id.clone()),
        ..Outcome::changed(format!("Node with id {} deleted.", node_id))
    })
}

fn vm_ids(response: &Value) -> Result<Vec<String>> {
    let results = response
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Transport("create response missing 'results'".to_string()))?;
    results
        .iter()
        .map(|result| {
            result
                .get("vm_id")
                .and_then(Value::as_str)
                .map(|s| s.to_string())
                .ok_or_else(|| Error::Transport("create response missing 'vm_id'".to_string()))
        })
        .collect()
}
