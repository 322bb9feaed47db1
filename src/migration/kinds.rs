//! The ordered table of migrated kinds.
//!
//! The order is a correctness invariant, not a convention: a kind must
//! appear after every kind it can reference through owner or object
//! references, because the duplicator can only repair a reference once the
//! referenced object's new identity is in the cache. Each entry declares its
//! predecessors so the order is validated instead of trusted; retirement
//! walks the same table in reverse.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use kube::api::ApiResource;
use kube::core::GroupVersionKind;
use kube::Client;

use crate::crd::{LEGACY_GROUP, VERSION};
use crate::error::{Error, Result};
use crate::migration::cache::IdentityCache;
use crate::migration::duplicate;

pub const CONFIGURATION: &str = "MeridianConfiguration";
pub const USER: &str = "User";
pub const PROJECT: &str = "Project";
pub const CLUSTER: &str = "Cluster";
pub const SEED: &str = "Seed";
pub const PRESET: &str = "Preset";
pub const USER_SSH_KEY: &str = "UserSSHKey";
pub const ADDON: &str = "Addon";

type MigrateFn =
    for<'a> fn(&'a Client, &'a mut IdentityCache) -> LocalBoxFuture<'a, Result<usize>>;

/// One migrated kind: identity for group-addressed access plus the typed
/// duplication entry point.
pub struct KindMigration {
    pub kind: &'static str,
    pub plural: &'static str,
    pub namespaced: bool,

    /// Kinds this one can reference. Every entry must appear earlier in the
    /// table.
    pub depends_on: &'static [&'static str],

    pub run: MigrateFn,
}

fn run_configurations<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::configurations(client, cache).boxed_local()
}

fn run_users<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::users(client, cache).boxed_local()
}

fn run_projects<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::projects(client, cache).boxed_local()
}

fn run_clusters<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::clusters(client, cache).boxed_local()
}

fn run_seeds<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::seeds(client, cache).boxed_local()
}

fn run_presets<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::presets(client, cache).boxed_local()
}

fn run_ssh_keys<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::ssh_keys(client, cache).boxed_local()
}

fn run_addons<'a>(
    client: &'a Client,
    cache: &'a mut IdentityCache,
) -> LocalBoxFuture<'a, Result<usize>> {
    duplicate::addons(client, cache).boxed_local()
}

static MIGRATIONS: &[KindMigration] = &[
    KindMigration {
        kind: CONFIGURATION,
        plural: "meridianconfigurations",
        namespaced: true,
        depends_on: &[],
        run: run_configurations,
    },
    KindMigration {
        kind: USER,
        plural: "users",
        namespaced: false,
        depends_on: &[],
        run: run_users,
    },
    KindMigration {
        kind: PROJECT,
        plural: "projects",
        namespaced: false,
        depends_on: &[USER],
        run: run_projects,
    },
    KindMigration {
        kind: CLUSTER,
        plural: "clusters",
        namespaced: false,
        depends_on: &[],
        run: run_clusters,
    },
    KindMigration {
        kind: SEED,
        plural: "seeds",
        namespaced: true,
        depends_on: &[],
        run: run_seeds,
    },
    KindMigration {
        kind: PRESET,
        plural: "presets",
        namespaced: false,
        depends_on: &[],
        run: run_presets,
    },
    KindMigration {
        kind: USER_SSH_KEY,
        plural: "usersshkeys",
        namespaced: false,
        depends_on: &[USER],
        run: run_ssh_keys,
    },
    KindMigration {
        kind: ADDON,
        plural: "addons",
        namespaced: true,
        depends_on: &[CLUSTER],
        run: run_addons,
    },
];

/// The validated migration order. Fails if the static table ever declares a
/// predecessor that does not precede its dependent.
pub fn migrations() -> Result<&'static [KindMigration]> {
    validate_order(MIGRATIONS.iter().map(|m| (m.kind, m.depends_on)))?;
    Ok(MIGRATIONS)
}

/// Assert that every declared predecessor appears before its dependent and
/// that no kind is listed twice.
pub fn validate_order<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a [&'a str])>,
) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();

    for (kind, depends_on) in entries {
        if seen.contains(&kind) {
            return Err(Error::KindOrder(format!("{kind} is listed twice")));
        }
        for dep in depends_on {
            if !seen.contains(dep) {
                return Err(Error::KindOrder(format!(
                    "{kind} depends on {dep}, which does not precede it"
                )));
            }
        }
        seen.push(kind);
    }

    Ok(())
}

/// Legacy-group `ApiResource` for group-addressed (dynamic) access to a
/// migrated kind, used by backup and retirement.
pub fn legacy_api_resource(kind: &KindMigration) -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(LEGACY_GROUP, VERSION, kind.kind),
        kind.plural,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_is_valid() {
        let kinds: Vec<&str> = migrations().unwrap().iter().map(|m| m.kind).collect();

        // Owners precede their dependents.
        let pos = |k: &str| kinds.iter().position(|other| *other == k).unwrap();
        assert!(pos(USER) < pos(PROJECT));
        assert!(pos(USER) < pos(USER_SSH_KEY));
        assert!(pos(CLUSTER) < pos(ADDON));
    }

    #[test]
    fn dependent_before_owner_is_rejected() {
        let addon_deps: &[&str] = &[CLUSTER];
        let err =
            validate_order(vec![(ADDON, addon_deps), (CLUSTER, &[] as &[&str])]).unwrap_err();

        assert!(matches!(err, Error::KindOrder(_)));
        assert!(err.to_string().contains("Addon"));
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let empty: &[&str] = &[];
        let err = validate_order(vec![(USER, empty), (USER, empty)]).unwrap_err();

        assert!(matches!(err, Error::KindOrder(_)));
    }

    #[test]
    fn legacy_api_resource_targets_old_group() {
        let addon = migrations()
            .unwrap()
            .iter()
            .find(|m| m.kind == ADDON)
            .unwrap();
        let resource = legacy_api_resource(addon);

        assert_eq!(resource.group, "meridian.k8s.io");
        assert_eq!(resource.version, "v1");
        assert_eq!(resource.plural, "addons");
    }
}
