//! Cluster registry: one client handle for the master cluster and one per
//! seed.
//!
//! Seeds register themselves as legacy-group `Seed` objects whose spec
//! points at a Secret holding the seed cluster's kubeconfig; this module
//! turns each of those into a ready `kube::Client`.

use std::collections::BTreeMap;
use std::path::Path;

use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, ResourceExt};
use tracing::{info, instrument};

use crate::crd::legacy;
use crate::error::{Error, Result};

/// Key inside a seed kubeconfig Secret.
const KUBECONFIG_SECRET_KEY: &str = "kubeconfig";

/// Build the master cluster client from an explicit kubeconfig path and/or
/// context, falling back to the ambient environment (in-cluster config or
/// `~/.kube/config`).
pub async fn master_client(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Client> {
    let options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..Default::default()
    };

    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|err| {
                Error::ConfigError(format!("cannot read kubeconfig {}: {err}", path.display()))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|err| Error::ConfigError(err.to_string()))?
        }
        None if context.is_some() => Config::from_kubeconfig(&options)
            .await
            .map_err(|err| Error::ConfigError(err.to_string()))?,
        None => return Client::try_default().await.map_err(Error::KubeError),
    };

    Client::try_from(config).map_err(Error::KubeError)
}

/// Resolve one client per Seed by reading each seed's kubeconfig Secret on
/// the master cluster.
#[instrument(skip(master))]
pub async fn seed_clients(master: &Client, namespace: &str) -> Result<BTreeMap<String, Client>> {
    let seeds: Api<legacy::Seed> = Api::namespaced(master.clone(), namespace);

    let mut clients = BTreeMap::new();
    for seed in seeds.list(&ListParams::default()).await?.items {
        let name = seed.name_any();
        let client = seed_client(master, namespace, &seed).await?;

        info!(seed = %name, "resolved seed client");
        clients.insert(name, client);
    }

    Ok(clients)
}

async fn seed_client(master: &Client, namespace: &str, seed: &legacy::Seed) -> Result<Client> {
    let name = seed.name_any();
    let reference = &seed.spec.kubeconfig;

    let secret_name = reference.name.as_deref().ok_or_else(|| {
        Error::ConfigError(format!("Seed {name} has a kubeconfig reference without a name"))
    })?;
    let secret_namespace = reference.namespace.as_deref().unwrap_or(namespace);

    let secrets: Api<Secret> = Api::namespaced(master.clone(), secret_namespace);
    let secret = secrets.get(secret_name).await?;

    let data = secret
        .data
        .as_ref()
        .and_then(|data| data.get(KUBECONFIG_SECRET_KEY))
        .ok_or_else(|| {
            Error::ConfigError(format!(
                "kubeconfig Secret {secret_namespace}/{secret_name} for Seed {name} has no \
                 '{KUBECONFIG_SECRET_KEY}' key"
            ))
        })?;

    let kubeconfig: Kubeconfig = serde_yaml::from_slice(&data.0)?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|err| Error::ConfigError(format!("invalid kubeconfig for Seed {name}: {err}")))?;

    Client::try_from(config).map_err(Error::KubeError)
}
