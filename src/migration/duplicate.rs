//! The resource duplicator — the core of the migration.
//!
//! For one cluster, walks the ordered kind table; for each kind it lists
//! every legacy-group instance, converts it, creates the current-group twin
//! (adopting an existing twin on re-runs) and records the assigned UID so
//! later kinds can repair their references. Any single instance failure
//! aborts the run: this is a one-shot migration, not a best-effort sync.

use std::collections::BTreeMap;
use std::fmt::Debug;

use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::crd::{current, legacy};
use crate::error::{self, Error, Result};
use crate::migration::cache::IdentityCache;
use crate::migration::convert;
use crate::migration::kinds;

/// Duplicate every instance of every kind, in table order. Returns the
/// number of migrated instances per kind.
#[instrument(skip_all)]
pub async fn run(
    client: &Client,
    cache: &mut IdentityCache,
) -> Result<BTreeMap<&'static str, usize>> {
    let mut counts = BTreeMap::new();

    for migration in kinds::migrations()? {
        let count = (migration.run)(client, cache).await?;
        info!(kind = migration.kind, count, "duplicated kind");
        counts.insert(migration.kind, count);
    }

    Ok(counts)
}

/// How to address the target API for one converted object.
type ApiFor<New> = fn(&Client, Option<&str>) -> Api<New>;

fn cluster_scoped_api<New>(client: &Client, _namespace: Option<&str>) -> Api<New>
where
    New: Resource<DynamicType = ()>,
{
    Api::all(client.clone())
}

fn namespaced_api<New>(client: &Client, namespace: Option<&str>) -> Api<New>
where
    New: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
    Api::namespaced(client.clone(), namespace.unwrap_or("default"))
}

/// List, convert, create, record — the shared per-kind loop.
async fn duplicate_kind<Old, New>(
    client: &Client,
    kind: &'static str,
    cache: &mut IdentityCache,
    api_for: ApiFor<New>,
    convert: fn(&Old, &IdentityCache) -> Result<New>,
) -> Result<usize>
where
    Old: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    New: Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Debug,
{
    let source: Api<Old> = Api::all(client.clone());
    let old_objects = source.list(&ListParams::default()).await?.items;

    let mut migrated = 0;
    for old in &old_objects {
        let name = old.name_any();
        let namespace = old.namespace();

        let desired =
            convert(old, cache).map_err(|err| migrate_error(kind, &name, err))?;
        let target = api_for(client, namespace.as_deref());
        let created = create_or_adopt(&target, &desired)
            .await
            .map_err(|err| migrate_error(kind, &name, err))?;

        record_identity(cache, kind, namespace.as_deref(), &name, &created)?;
        migrated += 1;
    }

    Ok(migrated)
}

/// Create the twin; when it already exists a previous, partially completed
/// run created it, so fetch it instead to learn its assigned identity.
async fn create_or_adopt<New>(api: &Api<New>, desired: &New) -> Result<New>
where
    New: Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Debug,
{
    match api.create(&PostParams::default(), desired).await {
        Ok(created) => Ok(created),
        Err(err) if error::is_already_exists(&err) => {
            debug!(name = %desired.name_any(), "twin already exists, adopting it");
            Ok(api.get(&desired.name_any()).await?)
        }
        Err(err) => Err(err.into()),
    }
}

fn record_identity<New>(
    cache: &mut IdentityCache,
    kind: &'static str,
    namespace: Option<&str>,
    name: &str,
    created: &New,
) -> Result<()>
where
    New: Resource<DynamicType = ()>,
{
    let uid = created
        .meta()
        .uid
        .as_deref()
        .ok_or(Error::MissingObjectKey("metadata.uid"))?;
    cache.record(kind, namespace, name, uid);
    Ok(())
}

fn migrate_error(kind: &'static str, name: &str, source: Error) -> Error {
    Error::MigrateObject {
        kind,
        name: name.to_string(),
        source: Box::new(source),
    }
}

pub async fn configurations(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    duplicate_kind::<legacy::MeridianConfiguration, current::MeridianConfiguration>(
        client,
        kinds::CONFIGURATION,
        cache,
        namespaced_api,
        convert::configuration,
    )
    .await
}

pub async fn users(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    duplicate_kind::<legacy::User, current::User>(
        client,
        kinds::USER,
        cache,
        cluster_scoped_api,
        convert::user,
    )
    .await
}

pub async fn projects(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    duplicate_kind::<legacy::Project, current::Project>(
        client,
        kinds::PROJECT,
        cache,
        cluster_scoped_api,
        convert::project,
    )
    .await
}

/// Clusters carry a status subresource that must be ported too, so this one
/// does not go through the shared loop: the status is written as a second,
/// separate write after the object exists.
pub async fn clusters(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    let source: Api<legacy::Cluster> = Api::all(client.clone());
    let target: Api<current::Cluster> = Api::all(client.clone());
    let old_clusters = source.list(&ListParams::default()).await?.items;

    let mut migrated = 0;
    for old in &old_clusters {
        let name = old.name_any();

        let desired =
            convert::cluster(old, cache).map_err(|err| migrate_error(kinds::CLUSTER, &name, err))?;
        let created = create_or_adopt(&target, &desired)
            .await
            .map_err(|err| migrate_error(kinds::CLUSTER, &name, err))?;

        if let Some(status) = &old.status {
            let mut with_status = created.clone();
            with_status.status = Some(status.clone());
            target
                .replace_status(
                    &name,
                    &PostParams::default(),
                    serde_json::to_vec(&with_status)?,
                )
                .await
                .map_err(|err| migrate_error(kinds::CLUSTER, &name, err.into()))?;
        }

        record_identity(cache, kinds::CLUSTER, None, &name, &created)?;
        migrated += 1;
    }

    Ok(migrated)
}

pub async fn seeds(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    duplicate_kind::<legacy::Seed, current::Seed>(
        client,
        kinds::SEED,
        cache,
        namespaced_api,
        convert::seed,
    )
    .await
}

pub async fn presets(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    duplicate_kind::<legacy::Preset, current::Preset>(
        client,
        kinds::PRESET,
        cache,
        cluster_scoped_api,
        convert::preset,
    )
    .await
}

pub async fn ssh_keys(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    duplicate_kind::<legacy::UserSSHKey, current::UserSSHKey>(
        client,
        kinds::USER_SSH_KEY,
        cache,
        cluster_scoped_api,
        convert::ssh_key,
    )
    .await
}

pub async fn addons(client: &Client, cache: &mut IdentityCache) -> Result<usize> {
    duplicate_kind::<legacy::Addon, current::Addon>(
        client,
        kinds::ADDON,
        cache,
        namespaced_api,
        convert::addon,
    )
    .await
}
