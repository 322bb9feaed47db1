//! Old→new schema conversion, one function per migrated kind.
//!
//! Scalar fields are copied directly; reference fields go through
//! [`refs`]; deprecated legacy fields are translated by the explicit,
//! per-field folding rules documented on each function. Conversion is pure
//! and never talks to the API server.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::crd::{current, legacy};
use crate::error::Result;
use crate::migration::cache::IdentityCache;
use crate::migration::refs;

/// Metadata for the duplicated object. Server-assigned identity and
/// revision bookkeeping (uid, resourceVersion, generation,
/// creationTimestamp, managedFields) belong to the old object and are
/// dropped; owner references are rewritten into the current group.
pub fn migrated_meta(meta: &ObjectMeta, cache: &IdentityCache) -> Result<ObjectMeta> {
    Ok(ObjectMeta {
        name: meta.name.clone(),
        namespace: meta.namespace.clone(),
        labels: meta.labels.clone(),
        annotations: meta.annotations.clone(),
        finalizers: meta.finalizers.clone(),
        owner_references: meta
            .owner_references
            .as_ref()
            .map(|owners| {
                refs::rewrite_owner_references(owners, meta.namespace.as_deref(), cache)
            })
            .transpose()?,
        ..Default::default()
    })
}

pub fn configuration(
    old: &legacy::MeridianConfiguration,
    cache: &IdentityCache,
) -> Result<current::MeridianConfiguration> {
    Ok(current::MeridianConfiguration {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::MeridianConfigurationSpec {
            ingress: old.spec.ingress.clone(),
            exposure_strategy: old.spec.exposure_strategy.clone(),
            feature_gates: old.spec.feature_gates.clone(),
        },
    })
}

pub fn user(old: &legacy::User, cache: &IdentityCache) -> Result<current::User> {
    Ok(current::User {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::UserSpec {
            email: old.spec.email.clone(),
            name: old.spec.name.clone(),
            admin: old.spec.admin,
            groups: old.spec.groups.clone(),
        },
    })
}

pub fn project(old: &legacy::Project, cache: &IdentityCache) -> Result<current::Project> {
    Ok(current::Project {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::ProjectSpec {
            name: old.spec.name.clone(),
        },
    })
}

/// Folding rule: the deprecated single `admissionPlugin` becomes one entry
/// of `admissionPlugins`, unless the list already names it.
pub fn cluster(old: &legacy::Cluster, cache: &IdentityCache) -> Result<current::Cluster> {
    let mut admission_plugins = old.spec.admission_plugins.clone();
    if let Some(plugin) = &old.spec.admission_plugin {
        if !admission_plugins.contains(plugin) {
            admission_plugins.push(plugin.clone());
        }
    }

    Ok(current::Cluster {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::ClusterSpec {
            human_readable_name: old.spec.human_readable_name.clone(),
            version: old.spec.version.clone(),
            pause: old.spec.pause,
            cloud: old.spec.cloud.clone(),
            admission_plugins,
            features: old.spec.features.clone(),
        },
        status: None,
    })
}

pub fn seed(old: &legacy::Seed, cache: &IdentityCache) -> Result<current::Seed> {
    Ok(current::Seed {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::SeedSpec {
            country: old.spec.country.clone(),
            location: old.spec.location.clone(),
            // Points at a core-group Secret; passes through unchanged.
            kubeconfig: refs::rewrite_object_reference(&old.spec.kubeconfig, cache)?,
            datacenters: old.spec.datacenters.clone(),
        },
    })
}

/// Folding rule: the deprecated `requiredEmailDomain` becomes one entry of
/// `requiredEmails`, unless the list already names it.
pub fn preset(old: &legacy::Preset, cache: &IdentityCache) -> Result<current::Preset> {
    let mut required_emails = old.spec.required_emails.clone();
    if let Some(domain) = &old.spec.required_email_domain {
        if !required_emails.contains(domain) {
            required_emails.push(domain.clone());
        }
    }

    Ok(current::Preset {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::PresetSpec {
            enabled: old.spec.enabled,
            required_emails,
        },
    })
}

pub fn ssh_key(old: &legacy::UserSSHKey, cache: &IdentityCache) -> Result<current::UserSSHKey> {
    Ok(current::UserSSHKey {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::UserSSHKeySpec {
            owner: old.spec.owner.clone(),
            public_key: old.spec.public_key.clone(),
            fingerprint: old.spec.fingerprint.clone(),
            clusters: old.spec.clusters.clone(),
        },
    })
}

pub fn addon(old: &legacy::Addon, cache: &IdentityCache) -> Result<current::Addon> {
    Ok(current::Addon {
        metadata: migrated_meta(&old.metadata, cache)?,
        spec: current::AddonSpec {
            name: old.spec.name.clone(),
            cluster: refs::rewrite_object_reference(&old.spec.cluster, cache)?,
            variables: old.spec.variables.clone(),
            is_default: old.spec.is_default,
        },
    })
}
