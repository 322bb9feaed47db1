//! The CRD migration engine.
//!
//! Moves every platform-owned custom resource from the legacy API group to
//! the current one, across the master cluster and all seeds:
//!
//! Preflight → Shutdown → Backup → Schema Install → Duplicate → Retire
//!
//! Stages are strictly sequential; each one finishes across every cluster
//! (master first, then seeds) before the next begins, and any failure
//! aborts the run. Every write is idempotent, so a failed run is resumed by
//! simply invoking it again.

pub mod backup;
pub mod cache;
pub mod convert;
pub mod crds;
pub mod duplicate;
pub mod kinds;
pub mod preflight;
pub mod refs;
pub mod retire;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod preflight_test;
#[cfg(test)]
mod retire_test;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use kube::Client;
use tracing::{info, instrument};

use crate::charts::ChartClient;
use crate::crd::legacy;
use crate::error::{Error, Result};
use cache::IdentityCache;

/// Configuration for one migration run. Constructed once per invocation and
/// immutable for its duration.
pub struct MigrationOptions {
    /// Namespace the platform is installed into.
    pub namespace: String,

    /// The platform configuration object, read from the master cluster.
    pub config: legacy::MeridianConfiguration,

    pub master: Client,

    /// Seed name to client, resolved through the cluster registry.
    pub seeds: BTreeMap<String, Client>,

    /// Where backup archives are written.
    pub backup_directory: PathBuf,

    /// Directory holding the platform charts, including the CRD chart.
    pub charts_directory: PathBuf,
}

impl MigrationOptions {
    /// Master first, then seeds: the processing order of every stage.
    pub fn clusters(&self) -> Vec<(String, &Client)> {
        let mut clusters = vec![("master".to_string(), &self.master)];
        for (name, client) in &self.seeds {
            clusters.push((format!("seed-{name}"), client));
        }
        clusters
    }
}

/// Per-kind instance counts, summed across clusters.
#[derive(Debug, Default)]
pub struct MigrationSummary {
    pub migrated: BTreeMap<&'static str, usize>,
}

/// Run the full migration pipeline.
#[instrument(skip_all)]
pub async fn run(opts: &MigrationOptions, charts: &dyn ChartClient) -> Result<MigrationSummary> {
    info!("running preflight checks");
    let problems = preflight::check(opts).await;
    if !problems.is_empty() {
        return Err(Error::PreflightFailed(problems));
    }

    info!("shutting down platform controllers");
    shutdown::run(opts).await?;

    let run_stamp = Utc::now().format("%Y-%m-%dT%H%M%S").to_string();
    for (label, client) in opts.clusters() {
        backup::backup_cluster(client, &label, &run_stamp, &opts.backup_directory)
            .await
            .map_err(|err| err.on_cluster(&label))?;
    }

    info!("installing current-group CRDs");
    crds::install(charts, opts).await?;

    let mut summary = MigrationSummary::default();
    let mut cache = IdentityCache::new();
    for (label, client) in opts.clusters() {
        // Identities are cluster-local; entries must never survive a
        // cluster boundary.
        cache.reset();

        let counts = duplicate::run(client, &mut cache)
            .await
            .map_err(|err| err.on_cluster(&label))?;
        for (kind, count) in counts {
            *summary.migrated.entry(kind).or_default() += count;
        }
    }

    for (label, client) in opts.clusters() {
        retire::run(client)
            .await
            .map_err(|err| err.on_cluster(&label))?;
    }

    info!("migration complete");
    Ok(summary)
}
