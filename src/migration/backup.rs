//! Backup archiver.
//!
//! Serializes every instance of every migrated kind into one compressed
//! archive per cluster per run. The archive is purely an operator-recovery
//! artifact: nothing later in the pipeline reads it back, and a write
//! failure aborts the cluster's archive rather than retrying.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use kube::api::{Api, DynamicObject, ListParams};
use kube::{Client, ResourceExt};
use tracing::{info, instrument};

use crate::error::Result;
use crate::migration::kinds;

/// Document extension inside the archive.
const DOC_EXT: &str = "yaml";

/// List every instance of every migrated kind (cluster-wide, regardless of
/// namespace scoping) and write them into
/// `<run_stamp>-<cluster_label>.tar.gz` under `directory`.
#[instrument(skip(client, directory))]
pub async fn backup_cluster(
    client: &Client,
    cluster_label: &str,
    run_stamp: &str,
    directory: &Path,
) -> Result<PathBuf> {
    let mut objects: Vec<(&'static str, Vec<DynamicObject>)> = Vec::new();

    for migration in kinds::migrations()? {
        let resource = kinds::legacy_api_resource(migration);
        let api: Api<DynamicObject> = Api::all_with(client.clone(), &resource);

        let mut instances = api.list(&ListParams::default()).await?.items;
        for instance in &mut instances {
            // Managed-field bookkeeping is not reproducible and has no
            // value in a recovery archive.
            instance.metadata.managed_fields = None;
        }

        objects.push((migration.kind, instances));
    }

    std::fs::create_dir_all(directory)?;
    let path = directory.join(format!("{run_stamp}-{cluster_label}.tar.gz"));

    let file = File::create(&path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    let documents = write_archive(&mut encoder, &objects)?;
    encoder.finish()?;

    info!(documents, path = %path.display(), "wrote backup archive");
    Ok(path)
}

/// Write one YAML document per instance into a tar stream. All-or-nothing:
/// the first failed write aborts the archive.
pub(crate) fn write_archive<W: Write>(
    writer: W,
    objects: &[(&'static str, Vec<DynamicObject>)],
) -> Result<usize> {
    let mut archive = tar::Builder::new(writer);
    let mut documents = 0;

    for (kind, instances) in objects {
        for instance in instances {
            let doc = serde_yaml::to_string(instance)?;
            let path = entry_path(kind, instance.namespace().as_deref(), &instance.name_any());
            append_document(&mut archive, &path, &doc)?;
            documents += 1;
        }
    }

    archive.into_inner()?.flush()?;
    Ok(documents)
}

/// `<kind-lowercase>/[<namespace>-]<name>.yaml`
pub(crate) fn entry_path(kind: &str, namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}/{ns}-{name}.{DOC_EXT}", kind.to_lowercase()),
        None => format!("{}/{name}.{DOC_EXT}", kind.to_lowercase()),
    }
}

fn append_document<W: Write>(archive: &mut tar::Builder<W>, path: &str, doc: &str) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(doc.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    archive.append_data(&mut header, path, doc.as_bytes())?;
    Ok(())
}
