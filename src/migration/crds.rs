//! Schema installer.
//!
//! Applies the current-group CRD definitions by delegating to the chart
//! deployment collaborator. The migration refuses to run on top of a failed
//! CRD release; anything else is handled by an idempotent upgrade-or-install.

use serde_json::json;
use tracing::{info, instrument};

use crate::charts::{ChartClient, ReleaseStatus};
use crate::error::{Error, Result};
use crate::migration::MigrationOptions;

pub const CRD_RELEASE: &str = "meridian-crds";

#[instrument(skip_all)]
pub async fn install(charts: &dyn ChartClient, opts: &MigrationOptions) -> Result<()> {
    match charts.release_status(&opts.namespace, CRD_RELEASE).await? {
        ReleaseStatus::Failed(status) => {
            return Err(Error::HelmError(format!(
                "release {CRD_RELEASE} is in state {status}; repair or remove it before migrating"
            )));
        }
        ReleaseStatus::NotInstalled => info!(release = CRD_RELEASE, "installing CRD chart"),
        ReleaseStatus::Deployed => info!(release = CRD_RELEASE, "upgrading CRD chart"),
    }

    let chart = opts.charts_directory.join(CRD_RELEASE);
    let values = json!({
        "meridian": {
            "ingress": {
                "domain": opts.config.spec.ingress.domain,
            }
        }
    });

    charts
        .deploy(&opts.namespace, CRD_RELEASE, &chart, &values)
        .await
}
