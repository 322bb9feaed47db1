//! Error types for the installer and the CRD migration engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Helm error: {0}")]
    HelmError(String),

    #[error("preflight checks failed:\n{}", .0.join("\n"))]
    PreflightFailed(Vec<String>),

    /// An owner or object reference points at an object whose new identity
    /// was never recorded. Continuing would corrupt the ownership chain, so
    /// migration stops here.
    #[error("no identity recorded for {kind} {namespace}/{name}; owners must be migrated before their dependents")]
    ReferenceUnresolved {
        kind: String,
        /// Empty for cluster-scoped objects.
        namespace: String,
        name: String,
    },

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid migration order: {0}")]
    KindOrder(String),

    #[error("timed out after {after_seconds}s waiting for {what}")]
    DeadlineExceeded { what: String, after_seconds: u64 },

    #[error("failed to migrate {kind} {name}: {source}")]
    MigrateObject {
        kind: &'static str,
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("on cluster {cluster}: {source}")]
    Cluster {
        cluster: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Missing object key: {0}")]
    MissingObjectKey(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Attach the cluster label a stage was operating on.
    pub fn on_cluster(self, cluster: &str) -> Self {
        Error::Cluster {
            cluster: cluster.to_string(),
            source: Box::new(self),
        }
    }
}

/// True if the kube error is an API response with the given HTTP status.
pub fn is_api_code(err: &kube::Error, code: u16) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == code)
}

/// "Not found" on get/delete is a satisfied precondition for every
/// idempotent stage, never a failure.
pub fn is_not_found(err: &kube::Error) -> bool {
    is_api_code(err, 404)
}

/// "Already exists" on create means a previous run got there first.
pub fn is_already_exists(err: &kube::Error) -> bool {
    is_api_code(err, 409)
}
