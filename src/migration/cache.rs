//! Run-scoped identity cache.
//!
//! Maps `(kind, namespace, name)` to the UID the API server assigned when
//! the object was re-created under the new group. The cache is owned by the
//! migration invocation and reset between clusters: UIDs are cluster-local,
//! so an entry must never leak across cluster boundaries.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Cluster-scoped objects are keyed with an empty namespace.
const CLUSTER_SCOPED: &str = "";

#[derive(Debug, Default)]
pub struct IdentityCache {
    entries: BTreeMap<(String, String, String), String>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries. Called between clusters.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Record the UID assigned to a freshly created (or adopted) object.
    pub fn record(&mut self, kind: &str, namespace: Option<&str>, name: &str, uid: &str) {
        self.entries.insert(
            (
                kind.to_string(),
                namespace.unwrap_or(CLUSTER_SCOPED).to_string(),
                name.to_string(),
            ),
            uid.to_string(),
        );
    }

    /// Exact lookup, no fallback.
    pub fn lookup(&self, kind: &str, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.entries
            .get(&(
                kind.to_string(),
                namespace.unwrap_or(CLUSTER_SCOPED).to_string(),
                name.to_string(),
            ))
            .map(String::as_str)
    }

    /// Resolve a reference: try the referencing namespace first, then fall
    /// back to the cluster-scoped key (a namespaced object may legally be
    /// owned by a cluster-scoped one). A miss on both is a hard failure —
    /// the ordered kind list guarantees owners are migrated before their
    /// dependents, so a missing entry means the order was violated.
    pub fn resolve(&self, kind: &str, namespace: Option<&str>, name: &str) -> Result<&str> {
        self.lookup(kind, namespace, name)
            .or_else(|| self.lookup(kind, None, name))
            .ok_or_else(|| Error::ReferenceUnresolved {
                kind: kind.to_string(),
                namespace: namespace.unwrap_or(CLUSTER_SCOPED).to_string(),
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
