//! CRD types under the legacy `meridian.k8s.io` API group.
//!
//! These are the schemas the migration reads. Fields that were deprecated in
//! this group and folded into newer fields in the current group are still
//! declared here; the per-field translation rules live in
//! `migration::convert`.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    CloudSpec, ClusterStatus, Datacenter, ExposureStrategy, FeatureGates, IngressConfiguration,
};

/// Platform-wide configuration object. Exactly one instance lives in the
/// platform namespace of the master cluster.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "meridian.k8s.io",
    version = "v1",
    kind = "MeridianConfiguration",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MeridianConfigurationSpec {
    #[serde(default)]
    pub ingress: IngressConfiguration,

    #[serde(default)]
    pub exposure_strategy: ExposureStrategy,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_gates: FeatureGates,
}

/// A platform user account.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(group = "meridian.k8s.io", version = "v1", kind = "User")]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    pub email: String,

    pub name: String,

    #[serde(default)]
    pub admin: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

/// A project grouping clusters and SSH keys. Projects are owned by the
/// users that created them, via owner references.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(group = "meridian.k8s.io", version = "v1", kind = "Project")]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    /// Human-readable project name, distinct from the object name.
    pub name: String,
}

/// A user cluster control plane managed by the platform.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "meridian.k8s.io",
    version = "v1",
    kind = "Cluster",
    status = "ClusterStatus",
    printcolumn = r#"{"name":"HumanReadableName","type":"string","jsonPath":".spec.humanReadableName"}"#,
    printcolumn = r#"{"name":"Provider","type":"string","jsonPath":".spec.cloud.provider"}"#,
    printcolumn = r#"{"name":"Paused","type":"boolean","jsonPath":".spec.pause"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub human_readable_name: String,

    /// Kubernetes version of the user cluster control plane.
    pub version: String,

    /// While paused, platform controllers do not reconcile this cluster.
    #[serde(default)]
    pub pause: bool,

    pub cloud: CloudSpec,

    /// Deprecated: a single admission plugin name. Folded into
    /// `admissionPlugins` in the current group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_plugin: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admission_plugins: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: FeatureGates,
}

/// A dependent cluster that hosts user cluster control planes.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(group = "meridian.k8s.io", version = "v1", kind = "Seed", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct SeedSpec {
    #[serde(default)]
    pub country: String,

    #[serde(default)]
    pub location: String,

    /// Reference to the Secret holding this seed's kubeconfig. Points into
    /// the core API group and is therefore carried through migration
    /// untouched.
    #[schemars(with = "serde_json::Value")]
    pub kubeconfig: ObjectReference,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub datacenters: BTreeMap<String, Datacenter>,
}

/// Reusable provider credential preset offered to users at cluster creation.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(group = "meridian.k8s.io", version = "v1", kind = "Preset")]
#[serde(rename_all = "camelCase")]
pub struct PresetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Deprecated: a single email domain restriction. Folded into
    /// `requiredEmails` in the current group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_email_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_emails: Vec<String>,
}

/// An SSH public key a user can assign to their clusters. Owned by the
/// creating User via an owner reference.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(group = "meridian.k8s.io", version = "v1", kind = "UserSSHKey")]
#[serde(rename_all = "camelCase")]
pub struct UserSSHKeySpec {
    /// Name of the owning User object.
    pub owner: String,

    pub public_key: String,

    #[serde(default)]
    pub fingerprint: String,

    /// Names of the clusters this key is deployed to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<String>,
}

/// An addon installed into a user cluster. Lives in the cluster's control
/// plane namespace and is owned by the Cluster via an owner reference.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(group = "meridian.k8s.io", version = "v1", kind = "Addon", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct AddonSpec {
    /// Name of the addon manifest to install (dns, cni, ...).
    pub name: String,

    /// Typed reference to the Cluster this addon belongs to. The reference
    /// carries the legacy API group and is rewritten during migration.
    #[schemars(with = "serde_json::Value")]
    pub cluster: ObjectReference,

    /// Free-form values templated into the addon manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,

    #[serde(default)]
    pub is_default: bool,
}
