//! Shutdown orchestrator.
//!
//! Scales the platform's controller deployments to zero and removes its
//! admission webhook configurations across all clusters, so the migration
//! operates on a quiescent platform. Every step treats "not found" as
//! already satisfied; this stage is what makes a failed preflight pass on
//! the next attempt.

use std::fmt::Debug;
use std::time::Duration;

use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, DeleteParams, Patch, PatchParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, instrument};

use crate::error::{self, Error, Result};
use crate::migration::preflight::{ADMISSION_WEBHOOKS, MASTER_DEPLOYMENTS, SEED_DEPLOYMENTS};
use crate::migration::MigrationOptions;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DRAIN_DEADLINE: Duration = Duration::from_secs(120);

#[instrument(skip_all)]
pub async fn run(opts: &MigrationOptions) -> Result<()> {
    shutdown_cluster(&opts.master, &opts.namespace, MASTER_DEPLOYMENTS)
        .await
        .map_err(|err| err.on_cluster("master"))?;

    for (seed_name, client) in &opts.seeds {
        shutdown_cluster(client, &opts.namespace, SEED_DEPLOYMENTS)
            .await
            .map_err(|err| err.on_cluster(&format!("seed {seed_name}")))?;
    }

    Ok(())
}

async fn shutdown_cluster(client: &Client, namespace: &str, deployments: &[&str]) -> Result<()> {
    let deploy_api: Api<Deployment> = Api::namespaced(client.clone(), namespace);

    for name in deployments {
        if scale_down(&deploy_api, name).await? {
            wait_until_drained(&deploy_api, name, DRAIN_POLL_INTERVAL, DRAIN_DEADLINE).await?;
        }
    }

    remove_webhooks(client).await
}

/// Patch the deployment to zero replicas if it exists and is not already
/// there. Returns whether the deployment exists at all.
async fn scale_down(api: &Api<Deployment>, name: &str) -> Result<bool> {
    let deployment = match api.get_opt(name).await? {
        Some(deployment) => deployment,
        None => return Ok(false),
    };

    let replicas = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(0);

    if replicas != 0 {
        info!(deployment = name, replicas, "scaling controller to zero");
        let patch = json!({"spec": {"replicas": 0}});
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
    }

    Ok(true)
}

/// Poll until the scaled deployment reports no remaining replicas. Bounded:
/// expiry yields the typed deadline error, distinct from a hard API error.
pub(crate) async fn wait_until_drained(
    api: &Api<Deployment>,
    name: &str,
    interval: Duration,
    deadline: Duration,
) -> Result<()> {
    let started = std::time::Instant::now();

    loop {
        let remaining = api
            .get_opt(name)
            .await?
            .and_then(|deployment| deployment.status)
            .and_then(|status| status.replicas)
            .unwrap_or(0);

        if remaining == 0 {
            return Ok(());
        }
        if started.elapsed() >= deadline {
            return Err(Error::DeadlineExceeded {
                what: format!("Deployment {name} to scale to zero"),
                after_seconds: deadline.as_secs(),
            });
        }

        tokio::time::sleep(interval).await;
    }
}

async fn remove_webhooks(client: &Client) -> Result<()> {
    let validating: Api<ValidatingWebhookConfiguration> = Api::all(client.clone());
    let mutating: Api<MutatingWebhookConfiguration> = Api::all(client.clone());

    for name in ADMISSION_WEBHOOKS {
        if delete_if_present(&validating, name).await? {
            info!(webhook = name, "deleted validating webhook configuration");
        }
        if delete_if_present(&mutating, name).await? {
            info!(webhook = name, "deleted mutating webhook configuration");
        }
    }

    Ok(())
}

/// Returns whether a deletion actually happened; absence is success.
async fn delete_if_present<K>(api: &Api<K>, name: &str) -> Result<bool>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(true),
        Err(err) if error::is_not_found(&err) => Ok(false),
        Err(err) => Err(err.into()),
    }
}
