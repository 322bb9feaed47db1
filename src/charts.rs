//! Chart deployment collaborator.
//!
//! Release lifecycle management (rendering, upgrades, rollbacks) is
//! external to the installer. This module defines the boundary trait the
//! migration engine depends on, plus the thin wrapper that delegates to the
//! external `helm` executable.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReleaseStatus {
    NotInstalled,
    Deployed,
    /// The release exists but is not in a healthy state; the string is the
    /// status helm reported.
    Failed(String),
}

#[async_trait]
pub trait ChartClient: Send + Sync {
    async fn release_status(&self, namespace: &str, release: &str) -> Result<ReleaseStatus>;

    async fn deploy(
        &self,
        namespace: &str,
        release: &str,
        chart: &Path,
        values: &serde_json::Value,
    ) -> Result<()>;
}

/// Delegates every operation to the external `helm` binary.
pub struct HelmBinary {
    binary: PathBuf,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
}

impl HelmBinary {
    pub fn new(
        binary: impl Into<PathBuf>,
        kubeconfig: Option<PathBuf>,
        context: Option<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig,
            context,
        }
    }

    async fn helm(&self, args: &[String]) -> Result<std::process::Output> {
        let mut command = Command::new(&self.binary);

        if let Some(kubeconfig) = &self.kubeconfig {
            command.arg("--kubeconfig").arg(kubeconfig);
        }
        if let Some(context) = &self.context {
            command.arg("--kube-context").arg(context);
        }

        debug!(?args, "invoking helm");
        let output = command.args(args).stdin(Stdio::null()).output().await?;
        Ok(output)
    }
}

#[async_trait]
impl ChartClient for HelmBinary {
    async fn release_status(&self, namespace: &str, release: &str) -> Result<ReleaseStatus> {
        let args = vec![
            "status".to_string(),
            release.to_string(),
            "--namespace".to_string(),
            namespace.to_string(),
            "-o".to_string(),
            "json".to_string(),
        ];
        let output = self.helm(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("release: not found") {
                return Ok(ReleaseStatus::NotInstalled);
            }
            return Err(Error::HelmError(format!(
                "helm status {release} failed: {}",
                stderr.trim()
            )));
        }

        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        let status = parsed
            .pointer("/info/status")
            .and_then(|value| value.as_str())
            .unwrap_or("unknown");

        match status {
            "deployed" | "superseded" => Ok(ReleaseStatus::Deployed),
            other => Ok(ReleaseStatus::Failed(other.to_string())),
        }
    }

    async fn deploy(
        &self,
        namespace: &str,
        release: &str,
        chart: &Path,
        values: &serde_json::Value,
    ) -> Result<()> {
        let mut args = vec![
            "upgrade".to_string(),
            "--install".to_string(),
            release.to_string(),
            chart.display().to_string(),
            "--namespace".to_string(),
            namespace.to_string(),
            "--create-namespace".to_string(),
            "--wait".to_string(),
        ];

        // helm reads values from a file, not stdin.
        let values_file = std::env::temp_dir().join(format!("{release}-values.yaml"));
        if !values.is_null() {
            std::fs::write(&values_file, serde_yaml::to_string(values)?)?;
            args.push("--values".to_string());
            args.push(values_file.display().to_string());
        }

        let output = self.helm(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::HelmError(format!(
                "helm upgrade --install {release} failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}
