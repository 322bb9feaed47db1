//! Reference rewriting between API groups.
//!
//! The single place that knows how to move an `OwnerReference` or a typed
//! `ObjectReference` from the legacy group to the current group: the group
//! is replaced and the server-assigned UID is re-stamped from the identity
//! cache. References into any other group pass through deep-copied and
//! untouched. Everything here is pure; the cache is only read.

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

use crate::crd::{GROUP, LEGACY_GROUP, VERSION};
use crate::error::{Error, Result};
use crate::migration::cache::IdentityCache;

/// apiVersion of rewritten references.
fn current_api_version() -> String {
    format!("{GROUP}/{VERSION}")
}

/// The group half of an `apiVersion` string ("" for the core group).
fn group_of(api_version: &str) -> &str {
    match api_version.rsplit_once('/') {
        Some((group, _version)) => group,
        None => "",
    }
}

/// Rewrite every owner reference of an object. `namespace` is the
/// namespace of the *referencing* object; owner references carry no
/// namespace of their own.
pub fn rewrite_owner_references(
    owners: &[OwnerReference],
    namespace: Option<&str>,
    cache: &IdentityCache,
) -> Result<Vec<OwnerReference>> {
    owners
        .iter()
        .map(|owner| rewrite_owner_reference(owner, namespace, cache))
        .collect()
}

fn rewrite_owner_reference(
    owner: &OwnerReference,
    namespace: Option<&str>,
    cache: &IdentityCache,
) -> Result<OwnerReference> {
    if group_of(&owner.api_version) != LEGACY_GROUP {
        return Ok(owner.clone());
    }

    let uid = cache.resolve(&owner.kind, namespace, &owner.name)?;

    Ok(OwnerReference {
        api_version: current_api_version(),
        kind: owner.kind.clone(),
        name: owner.name.clone(),
        uid: uid.to_string(),
        controller: owner.controller,
        block_owner_deletion: owner.block_owner_deletion,
    })
}

/// Rewrite a typed object reference found in a spec field. Unlike owner
/// references, object references carry their own namespace.
pub fn rewrite_object_reference(
    reference: &ObjectReference,
    cache: &IdentityCache,
) -> Result<ObjectReference> {
    let api_version = reference.api_version.as_deref().unwrap_or("");
    if group_of(api_version) != LEGACY_GROUP {
        return Ok(reference.clone());
    }

    let kind = reference
        .kind
        .as_deref()
        .ok_or_else(|| Error::InvalidReference("object reference without a kind".to_string()))?;
    let name = reference
        .name
        .as_deref()
        .ok_or_else(|| Error::InvalidReference("object reference without a name".to_string()))?;

    let uid = cache.resolve(kind, reference.namespace.as_deref(), name)?;

    Ok(ObjectReference {
        api_version: Some(current_api_version()),
        kind: reference.kind.clone(),
        name: reference.name.clone(),
        namespace: reference.namespace.clone(),
        uid: Some(uid.to_string()),
        // The old resourceVersion belongs to an object that is about to be
        // deleted; never carry it forward.
        resource_version: None,
        field_path: reference.field_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(api_version: &str, kind: &str, name: &str, uid: &str) -> OwnerReference {
        OwnerReference {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            uid: uid.to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    #[test]
    fn legacy_owner_reference_gets_new_group_and_uid() {
        let mut cache = IdentityCache::new();
        cache.record("Cluster", None, "abcd1234", "new-uid");

        let rewritten = rewrite_owner_references(
            &[owner("meridian.k8s.io/v1", "Cluster", "abcd1234", "old-uid")],
            Some("cluster-abcd1234"),
            &cache,
        )
        .unwrap();

        assert_eq!(rewritten.len(), 1);
        assert_eq!(rewritten[0].api_version, "meridian.io/v1");
        assert_eq!(rewritten[0].uid, "new-uid");
        assert_eq!(rewritten[0].controller, Some(true));
    }

    #[test]
    fn foreign_owner_reference_passes_through() {
        let cache = IdentityCache::new();
        let original = owner("apps/v1", "Deployment", "frontend", "dep-uid");

        let rewritten = rewrite_owner_references(&[original.clone()], None, &cache).unwrap();

        assert_eq!(rewritten[0], original);
    }

    #[test]
    fn unresolved_owner_reference_fails_loudly() {
        let cache = IdentityCache::new();

        let err = rewrite_owner_references(
            &[owner("meridian.k8s.io/v1", "User", "alice", "old-uid")],
            None,
            &cache,
        )
        .unwrap_err();

        assert!(matches!(err, Error::ReferenceUnresolved { .. }));
    }

    #[test]
    fn legacy_object_reference_is_rewritten() {
        let mut cache = IdentityCache::new();
        cache.record("Cluster", None, "abcd1234", "new-uid");

        let reference = ObjectReference {
            api_version: Some("meridian.k8s.io/v1".to_string()),
            kind: Some("Cluster".to_string()),
            name: Some("abcd1234".to_string()),
            uid: Some("old-uid".to_string()),
            resource_version: Some("42".to_string()),
            ..Default::default()
        };

        let rewritten = rewrite_object_reference(&reference, &cache).unwrap();

        assert_eq!(rewritten.api_version.as_deref(), Some("meridian.io/v1"));
        assert_eq!(rewritten.uid.as_deref(), Some("new-uid"));
        assert_eq!(rewritten.resource_version, None);
    }

    #[test]
    fn secret_reference_passes_through() {
        let cache = IdentityCache::new();
        let reference = ObjectReference {
            api_version: Some("v1".to_string()),
            kind: Some("Secret".to_string()),
            name: Some("seed-kubeconfig".to_string()),
            namespace: Some("meridian".to_string()),
            ..Default::default()
        };

        let rewritten = rewrite_object_reference(&reference, &cache).unwrap();
        assert_eq!(rewritten, reference);
    }
}
