//! Read-only preflight validation.
//!
//! Confirms that every cluster is reachable and that the platform is
//! quiescent: controller deployments scaled to zero and admission webhooks
//! gone. Problems are collected across all clusters rather than failing
//! fast, so the operator sees everything wrong in a single pass.

use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::Api;
use kube::Client;
use tracing::instrument;

use crate::migration::MigrationOptions;

/// Controller deployments that must be scaled to zero on the master.
pub const MASTER_DEPLOYMENTS: &[&str] = &[
    "meridian-operator",
    "meridian-api",
    "meridian-master-controller-manager",
];

/// Controller deployments that must be scaled to zero on every seed.
pub const SEED_DEPLOYMENTS: &[&str] = &["meridian-operator", "meridian-seed-controller-manager"];

/// Admission webhook configurations that must not exist on any cluster.
/// Checked as both validating and mutating configurations.
pub const ADMISSION_WEBHOOKS: &[&str] = &["meridian-admission", "meridian-seed-admission"];

/// Check master and every seed. An empty list means migration may proceed.
#[instrument(skip_all)]
pub async fn check(opts: &MigrationOptions) -> Vec<String> {
    let mut problems = Vec::new();

    check_cluster(
        "master",
        &opts.master,
        &opts.namespace,
        MASTER_DEPLOYMENTS,
        &mut problems,
    )
    .await;

    for (seed_name, client) in &opts.seeds {
        check_cluster(
            &format!("seed {seed_name}"),
            client,
            &opts.namespace,
            SEED_DEPLOYMENTS,
            &mut problems,
        )
        .await;
    }

    problems
}

async fn check_cluster(
    cluster: &str,
    client: &Client,
    namespace: &str,
    deployments: &[&str],
    problems: &mut Vec<String>,
) {
    // Retrieving the platform namespace proves the client and its
    // credentials work. If it fails there is no point probing further on
    // this cluster; one problem is enough.
    let namespaces: Api<Namespace> = Api::all(client.clone());
    match namespaces.get_opt(namespace).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            problems.push(format!(
                "cluster {cluster}: namespace {namespace} does not exist"
            ));
            return;
        }
        Err(err) => {
            problems.push(format!("cluster {cluster}: cannot reach cluster: {err}"));
            return;
        }
    }

    let deploy_api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    for name in deployments {
        match deploy_api.get_opt(name).await {
            Ok(Some(deployment)) => {
                let ready = deployment
                    .status
                    .as_ref()
                    .and_then(|status| status.ready_replicas)
                    .unwrap_or(0);
                if ready > 0 {
                    problems.push(format!(
                        "cluster {cluster}: Deployment {namespace}/{name} still has {ready} ready replica(s)"
                    ));
                }
            }
            Ok(None) => {}
            Err(err) => problems.push(format!(
                "cluster {cluster}: cannot check Deployment {namespace}/{name}: {err}"
            )),
        }
    }

    let validating: Api<ValidatingWebhookConfiguration> = Api::all(client.clone());
    let mutating: Api<MutatingWebhookConfiguration> = Api::all(client.clone());
    for name in ADMISSION_WEBHOOKS {
        match validating.get_opt(name).await {
            Ok(Some(_)) => problems.push(format!(
                "cluster {cluster}: ValidatingWebhookConfiguration {name} still exists"
            )),
            Ok(None) => {}
            Err(err) => problems.push(format!(
                "cluster {cluster}: cannot check ValidatingWebhookConfiguration {name}: {err}"
            )),
        }
        match mutating.get_opt(name).await {
            Ok(Some(_)) => problems.push(format!(
                "cluster {cluster}: MutatingWebhookConfiguration {name} still exists"
            )),
            Ok(None) => {}
            Err(err) => problems.push(format!(
                "cluster {cluster}: cannot check MutatingWebhookConfiguration {name}: {err}"
            )),
        }
    }
}
