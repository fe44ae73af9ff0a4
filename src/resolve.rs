use crate::client::ManagerClient;
use crate::error::{Error, Result};
use crate::model::DesiredState;
use serde_json::Value;

/// Collection endpoint for compute-manager name resolution.
pub const COMPUTE_MANAGERS: &str = "/fabric/compute-managers";

/// Resolve a display name to the resource id the API requires.
///
/// Fetches the collection and scans for an item whose `display_name` equals
/// `name`. Fails with `NotFound` when nothing matches.
pub fn resolve_id(client: &dyn ManagerClient, endpoint: &str, name: &str) -> Result<String> {
    resolve_id_optional(client, endpoint, name)?.ok_or_else(|| Error::NotFound {
        name: name.to_string(),
    })
}

/// Like `resolve_id`, but a missing match is not an error.
pub fn resolve_id_optional(
    client: &dyn ManagerClient,
    endpoint: &str,
    name: &str,
) -> Result<Option<String>> {
    let response = client.get(endpoint)?;
    if let Some(results) = response.get("results").and_then(Value::as_array) {
        for item in results {
            if item.get("display_name").and_then(Value::as_str) == Some(name) {
                if let Some(id) = item.get("id").and_then(Value::as_str) {
                    return Ok(Some(id.to_string()));
                }
            }
        }
    }
    Ok(None)
}

/// Replace every caller-supplied compute-manager name with its id.
///
/// Returns a new desired state rather than mutating the input: requests that
/// carry a `vc_name` get `vc_id` filled in and the name cleared; requests
/// that already carry an id (or reference nothing) pass through untouched.
pub fn resolve_references(
    client: &dyn ManagerClient,
    mut state: DesiredState,
) -> Result<DesiredState> {
    for request in &mut state.deployment_requests {
        if let Some(name) = request.deployment_config.vc_name.take() {
            let id = resolve_id(client, COMPUTE_MANAGERS, &name)?;
            request.deployment_config.vc_id = Some(id);
        }
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::ScriptedClient;
    use crate::model::{ClusteringConfig, NodeState};
    use serde_json::json;

    fn compute_managers() -> Value {
        json!({
            "results": [
                { "display_name": "vc1", "id": "uuid-1" },
                { "display_name": "other", "id": "uuid-2" }
            ]
        })
    }

    #[test]
    fn test_resolve_known_name() {
        let client = ScriptedClient::new();
        client.push_get(Ok(compute_managers()));

        let id = resolve_id(&client, COMPUTE_MANAGERS, "vc1").unwrap();
        assert_eq!(id, "uuid-1");
        assert_eq!(client.get_calls.borrow()[0], COMPUTE_MANAGERS);
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        let client = ScriptedClient::new();
        client.push_get(Ok(compute_managers()));

        let err = resolve_id(&client, COMPUTE_MANAGERS, "vc2").unwrap_err();
        match err {
            Error::NotFound { name } => assert_eq!(name, "vc2"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_optional_missing_is_none() {
        let client = ScriptedClient::new();
        client.push_get(Ok(json!({ "results": [] })));
        assert_eq!(
            resolve_id_optional(&client, COMPUTE_MANAGERS, "vc1").unwrap(),
            None
        );
    }

    fn state_with_configs(configs: Vec<Value>) -> DesiredState {
        let requests: Vec<Value> = configs
            .into_iter()
            .map(|config| {
                let mut config = config;
                let base = json!({
                    "placement_type": "VsphereClusterNodeVMDeploymentConfig",
                    "management_network_id": "network-44",
                    "hostname": "controller-1",
                    "compute_id": "domain-c49",
                    "storage_id": "datastore-43"
                });
                for (key, value) in base.as_object().unwrap() {
                    config
                        .as_object_mut()
                        .unwrap()
                        .entry(key.clone())
                        .or_insert(value.clone());
                }
                json!({ "roles": ["CONTROLLER"], "deployment_config": config })
            })
            .collect();

        DesiredState {
            deployment_requests: serde_json::from_value(Value::Array(requests)).unwrap(),
            clustering_config: ClusteringConfig {
                clustering_type: "ControlClusteringConfig".to_string(),
                join_to_existing_cluster: false,
                shared_secret: None,
            },
            state: NodeState::Present,
            node_id: None,
        }
    }

    #[test]
    fn test_resolve_references_fills_id() {
        let client = ScriptedClient::new();
        client.push_get(Ok(compute_managers()));

        let state = state_with_configs(vec![json!({ "vc_name": "vc1" })]);
        let resolved = resolve_references(&client, state).unwrap();

        let config = &resolved.deployment_requests[0].deployment_config;
        assert_eq!(config.vc_id.as_deref(), Some("uuid-1"));
        assert_eq!(config.vc_name, None);
    }

    #[test]
    fn test_resolve_references_passes_through_existing_id() {
        let client = ScriptedClient::new();

        let state = state_with_configs(vec![json!({ "vc_id": "uuid-9" })]);
        let resolved = resolve_references(&client, state).unwrap();

        let config = &resolved.deployment_requests[0].deployment_config;
        assert_eq!(config.vc_id.as_deref(), Some("uuid-9"));
        // No lookup was needed.
        assert_eq!(client.get_count(), 0);
    }
}
