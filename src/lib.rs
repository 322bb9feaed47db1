//! Meridian Installer: installs and upgrades the Meridian multi-cluster
//! Kubernetes platform.
//!
//! The heart of this crate is the one-shot, irreversible migration of the
//! platform's custom resources from the legacy `meridian.k8s.io` API group
//! to the current `meridian.io` group, across the master cluster and every
//! seed cluster. See the [`migration`] module for the pipeline.

pub mod charts;
pub mod clusters;
pub mod crd;
pub mod error;
pub mod migration;

pub use crate::error::{Error, Result};
