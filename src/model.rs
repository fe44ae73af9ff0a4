use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Target existence for the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Present,
    Absent,
}

/// Guest OS credentials applied to the deployed VM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_password: Option<String>,
}

/// One management-interface subnet for the deployed VM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSubnet {
    pub ip_addresses: Vec<String>,
    pub prefix_length: String,
}

/// Placement and network configuration for a single node VM.
///
/// `vc_name` is accepted on input as a human-readable alternative to `vc_id`
/// and is never serialized: the manager API only accepts the identifier, so
/// reference resolution replaces the name with the id before submission.
/// Optional fields are stripped from the wire body when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub placement_type: String,
    #[serde(default, skip_serializing)]
    pub vc_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc_id: Option<String>,
    pub management_network_id: String,
    pub hostname: String,
    pub compute_id: String,
    pub storage_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_gateway_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub management_port_subnets: Vec<PortSubnet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_servers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntp_servers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ssh: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_ssh_root_login: Option<bool>,
}

/// One node VM to deploy. Identity key for idempotency is
/// `deployment_config.hostname`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_settings: Option<UserSettings>,
    pub deployment_config: DeploymentConfig,
}

/// Clustering intent for the whole batch.
///
/// The shared secret policy (at least 6 characters, at least 4 distinct) is
/// enforced by the remote system, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    pub clustering_type: String,
    pub join_to_existing_cluster: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

/// Top-level desired state, as loaded from the state file.
///
/// Constructed once per invocation and never mutated; reference resolution
/// produces a new value, and the wire body is a projection that carries only
/// the fields the manager accepts (`state` and `node_id` never reach it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesiredState {
    pub deployment_requests: Vec<DeploymentRequest>,
    pub clustering_config: ClusteringConfig,
    pub state: NodeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl DesiredState {
    /// Precondition check, run before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.state == NodeState::Absent && self.node_id.is_none() {
            return Err(Error::MissingNodeId);
        }
        Ok(())
    }

    /// Project the wire body submitted to the deployments endpoint.
    pub fn body(&self) -> DeploymentBody {
        DeploymentBody {
            deployment_requests: self.deployment_requests.clone(),
            clustering_config: self.clustering_config.clone(),
        }
    }
}

/// Request body for POST /cluster/nodes/deployments.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentBody {
    pub deployment_requests: Vec<DeploymentRequest>,
    pub clustering_config: ClusteringConfig,
}

/// One deployment record as returned by the manager's list endpoint.
/// Only the fields the existence check and the CLI need are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct ExistingDeployment {
    #[serde(default)]
    pub vm_id: Option<String>,
    #[serde(default)]
    pub deployment_config: Option<ExistingDeploymentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExistingDeploymentConfig {
    pub hostname: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentCollection {
    #[serde(default)]
    pub results: Vec<ExistingDeployment>,
}
