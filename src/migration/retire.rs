//! Old-resource retirement.
//!
//! Deletes every legacy-group instance once duplication has succeeded,
//! walking the kind table in reverse: dependents go before the owners they
//! reference, so no owner disappears while something still points at it.
//! Finalizers and owner references are cleared first so deletion can
//! neither block nor cascade into objects that must survive.

use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use tracing::{info, instrument};

use crate::error::{self, Result};
use crate::migration::kinds;

#[instrument(skip_all)]
pub async fn run(client: &Client) -> Result<()> {
    for migration in kinds::migrations()?.iter().rev() {
        let resource = kinds::legacy_api_resource(migration);
        let list_api: Api<DynamicObject> = Api::all_with(client.clone(), &resource);

        let instances = list_api.list(&ListParams::default()).await?.items;
        if instances.is_empty() {
            continue;
        }

        info!(
            kind = migration.kind,
            count = instances.len(),
            "retiring legacy instances"
        );

        for instance in &instances {
            let name = instance.name_any();
            let api: Api<DynamicObject> = match instance.namespace() {
                Some(ns) => Api::namespaced_with(client.clone(), &ns, &resource),
                None => Api::all_with(client.clone(), &resource),
            };

            release(&api, &name).await?;
            delete(&api, &name).await?;
        }
    }

    Ok(())
}

/// Strip finalizers and owner references ahead of deletion.
async fn release(api: &Api<DynamicObject>, name: &str) -> Result<()> {
    let patch = json!({
        "metadata": {
            "finalizers": null,
            "ownerReferences": null,
        }
    });

    match api
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => Ok(()),
        Err(err) if error::is_not_found(&err) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn delete(api: &Api<DynamicObject>, name: &str) -> Result<()> {
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(err) if error::is_not_found(&err) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
