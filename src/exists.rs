use crate::model::{DeploymentRequest, ExistingDeployment};

/// Check whether any candidate deployment is already satisfied by an
/// existing one, matching on the configured hostname.
///
/// Pure function: the caller supplies the already-fetched snapshot of
/// existing deployments. First candidate with a match wins. Returns the
/// matched hostname, or None when nothing matches. Used on the create path
/// only; deletion is attempted unconditionally.
pub fn find_existing(
    candidates: &[DeploymentRequest],
    existing: &[ExistingDeployment],
) -> Option<String> {
    for candidate in candidates {
        for deployment in existing {
            if let Some(config) = &deployment.deployment_config {
                if config.hostname == candidate.deployment_config.hostname {
                    return Some(config.hostname.clone());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeploymentCollection, DeploymentConfig};

    fn candidate(hostname: &str) -> DeploymentRequest {
        DeploymentRequest {
            roles: vec!["CONTROLLER".to_string()],
            form_factor: None,
            user_settings: None,
            deployment_config: DeploymentConfig {
                placement_type: "VsphereClusterNodeVMDeploymentConfig".to_string(),
                vc_name: None,
                vc_id: Some("uuid-1".to_string()),
                management_network_id: "network-44".to_string(),
                hostname: hostname.to_string(),
                compute_id: "domain-c49".to_string(),
                storage_id: "datastore-43".to_string(),
                default_gateway_addresses: vec![],
                management_port_subnets: vec![],
                dns_servers: None,
                ntp_servers: None,
                enable_ssh: None,
                allow_ssh_root_login: None,
            },
        }
    }

    fn snapshot(hostnames: &[&str]) -> Vec<ExistingDeployment> {
        let results: Vec<_> = hostnames
            .iter()
            .map(|h| {
                serde_json::json!({
                    "vm_id": format!("vm-{}", h),
                    "deployment_config": { "hostname": h }
                })
            })
            .collect();
        let collection: DeploymentCollection =
            serde_json::from_value(serde_json::json!({ "results": results })).unwrap();
        collection.results
    }

    #[test]
    fn test_match_returns_hostname() {
        let existing = snapshot(&["controller-1", "controller-2"]);
        let found = find_existing(&[candidate("controller-2")], &existing);
        assert_eq!(found, Some("controller-2".to_string()));
    }

    #[test]
    fn test_no_match_returns_none() {
        let existing = snapshot(&["controller-1"]);
        assert_eq!(find_existing(&[candidate("controller-9")], &existing), None);
    }

    #[test]
    fn test_first_candidate_wins() {
        let existing = snapshot(&["controller-2", "controller-1"]);
        let candidates = [candidate("controller-1"), candidate("controller-2")];
        // controller-1 is the first candidate with a match, even though
        // controller-2 appears earlier in the snapshot.
        let found = find_existing(&candidates, &existing);
        assert_eq!(found, Some("controller-1".to_string()));
    }

    #[test]
    fn test_deployments_without_config_are_skipped() {
        let collection: DeploymentCollection = serde_json::from_value(serde_json::json!({
            "results": [{ "vm_id": "vm-0" }]
        }))
        .unwrap();
        assert_eq!(
            find_existing(&[candidate("controller-1")], &collection.results),
            None
        );
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(find_existing(&[candidate("controller-1")], &[]), None);
    }
}
