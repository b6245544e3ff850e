//! Artifact files in a working directory.

use std::fs;
use std::path::{Path, PathBuf};

use autodeploy_spec::{ArtifactKind, ArtifactSet};
use tracing::{debug, info};

use crate::error::{IacError, IacResult};

/// Terraform files in `dir`, sorted by name.
pub fn terraform_files(dir: &Path) -> IacResult<Vec<PathBuf>> {
    let pattern = dir.join("*.tf");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Names of the managed artifacts present in `dir`.
pub fn artifact_names(dir: &Path) -> IacResult<Vec<String>> {
    let mut names: Vec<(ArtifactKind, String)> = terraform_files(dir)?
        .iter()
        .filter_map(|path| path.file_name())
        .filter_map(|name| {
            let name = name.to_string_lossy();
            ArtifactKind::from_file_name(&name)
                .ok()
                .map(|kind| (kind, name.into_owned()))
        })
        .collect();
    names.sort();
    Ok(names.into_iter().map(|(_, name)| name).collect())
}

/// Record of the files written into a working directory, as a JSON array.
pub const MANIFEST_FILE: &str = ".autodeploy-manifest.json";

/// File names listed in the manifest of `dir`; empty when there is none.
pub fn managed_files(dir: &Path) -> IacResult<Vec<String>> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Terraform files in `dir` that were not written by [`write_artifacts`].
pub fn unmanaged_files(dir: &Path) -> IacResult<Vec<String>> {
    let managed = managed_files(dir)?;
    Ok(terraform_files(dir)?
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !managed.contains(name))
        .collect())
}

/// Only bare `.tf` names from a manifest are ever removed.
fn is_removable(name: &str) -> bool {
    name.ends_with(".tf") && Path::new(name).file_name().map(|n| n == name).unwrap_or(false)
}

/// Write `artifacts` into `dir` and record them in the manifest.
///
/// A directory holding `.tf` files this crate did not write is refused
/// untouched. Previously written artifacts missing from `artifacts` are
/// removed. Returns the paths written, in artifact order.
pub fn write_artifacts(dir: &Path, artifacts: &ArtifactSet) -> IacResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let unmanaged = unmanaged_files(dir)?;
    if !unmanaged.is_empty() {
        return Err(IacError::UnmanagedFiles {
            dir: dir.to_path_buf(),
            files: unmanaged,
        });
    }

    let names = artifacts.names();
    for stale in managed_files(dir)? {
        if names.iter().any(|name| *name == stale.as_str()) || !is_removable(&stale) {
            continue;
        }
        let path = dir.join(&stale);
        if path.is_file() {
            debug!("Removing stale artifact {:?}", path);
            fs::remove_file(&path)?;
        }
    }

    let mut written = Vec::with_capacity(artifacts.len());
    for (name, content) in artifacts.iter() {
        let path = dir.join(name);
        fs::write(&path, content)?;
        written.push(path);
    }
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&names)?)?;

    info!("Wrote {} artifacts to {:?}", written.len(), dir);
    Ok(written)
}
