//! Embedded payload types shared by the legacy and current API groups.
//!
//! Only types whose shape is identical in both groups live here; fields that
//! were deprecated in the legacy group stay on the legacy spec structs.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Ingress settings for the platform frontend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfiguration {
    /// Base domain under which the platform dashboard and API are exposed.
    pub domain: String,

    #[serde(default = "default_ingress_class")]
    pub class_name: String,
}

fn default_ingress_class() -> String {
    "nginx".to_string()
}

/// How user cluster control planes are exposed to their worker nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ExposureStrategy {
    /// One NodePort service per control plane component.
    #[default]
    NodePort,

    /// A LoadBalancer service in front of each control plane.
    LoadBalancer,

    /// A shared SNI tunnel through a single entry point.
    Tunneling,
}

impl std::fmt::Display for ExposureStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExposureStrategy::NodePort => write!(f, "NodePort"),
            ExposureStrategy::LoadBalancer => write!(f, "LoadBalancer"),
            ExposureStrategy::Tunneling => write!(f, "Tunneling"),
        }
    }
}

/// Placement of a user cluster within a provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloudSpec {
    /// Datacenter key, resolved against the owning Seed's datacenter map.
    pub datacenter: String,

    /// Cloud provider name (aws, gcp, openstack, ...).
    pub provider: String,
}

/// A datacenter a Seed can schedule user clusters into.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Datacenter {
    pub country: String,
    pub location: String,
    pub provider: String,
}

/// Health of a single control plane component.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum HealthStatus {
    #[default]
    Down,
    Provisioning,
    Up,
}

/// Per-component health of a user cluster control plane.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHealth {
    #[serde(default)]
    pub apiserver: HealthStatus,
    #[serde(default)]
    pub scheduler: HealthStatus,
    #[serde(default)]
    pub controller: HealthStatus,
    #[serde(default)]
    pub etcd: HealthStatus,
}

/// Observed state of a Cluster. The status subresource is ported verbatim
/// during schema migration, as a second write after the object is created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(default)]
    pub extended_health: ClusterHealth,

    /// Email of the user the cluster was created for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Free-form feature gates keyed by feature name.
pub type FeatureGates = BTreeMap<String, bool>;
