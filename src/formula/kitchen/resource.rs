// src/formula/kitchen/resource.rs

//! Post-install staging of auxiliary resources and binaries

use super::archive::place_artifact;
use super::fetch::{verify_download, Fetcher};
use crate::error::{Error, Result};
use crate::formula::format::Resource;
use crate::formula::parser::is_contained_relative;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Proof that the install stage completed
///
/// Only the kitchen can create one, so staging cannot happen before a
/// successful install.
#[derive(Debug)]
pub struct InstallReceipt {
    prefix: PathBuf,
}

impl InstallReceipt {
    pub(crate) fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }
}

/// Fetch, verify, and unpack a resource into `<prefix>/<stage_dir>`
pub fn stage_resource(
    resource: &Resource,
    fetcher: &dyn Fetcher,
    receipt: &InstallReceipt,
) -> Result<PathBuf> {
    info!("Staging resource {}", resource.name);
    if !is_contained_relative(&resource.stage_dir) {
        return Err(Error::InvalidFormula(format!(
            "resource '{}' stage_dir escapes the prefix: {}",
            resource.name,
            resource.stage_dir.display()
        )));
    }
    let artifact = fetcher.fetch(&resource.url, Some(&resource.checksum))?;
    verify_download(&artifact, &resource.url, &resource.checksum)?;

    let target = receipt.prefix().join(&resource.stage_dir);
    place_artifact(&artifact, &resource.file_name(), &target)?;
    debug!("Staged {} into {}", resource.name, target.display());
    Ok(target)
}

/// Symlink every entry of `from` into `<prefix>/bin`
///
/// The build tree is temporary, so entries are first copied into
/// `<prefix>/libexec` and the links point there. Names already installed
/// into `<prefix>/bin` as regular files are left alone.
pub fn link_binaries(from: &Path, receipt: &InstallReceipt) -> Result<Vec<PathBuf>> {
    if !from.is_dir() {
        warn!("No binaries to link: {} does not exist", from.display());
        return Ok(Vec::new());
    }

    let bin = receipt.prefix().join("bin");
    let libexec = receipt.prefix().join("libexec");
    fs::create_dir_all(&bin)?;
    fs::create_dir_all(&libexec)?;

    let mut entries = fs::read_dir(from)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut linked = Vec::new();
    for entry in entries {
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let link = bin.join(&name);
        if link.exists() && !link.is_symlink() {
            debug!("{} already installed, not linking", link.display());
            continue;
        }

        let installed = libexec.join(&name);
        fs::copy(entry.path(), &installed)?;
        if link.is_symlink() {
            fs::remove_file(&link)?;
        }
        std::os::unix::fs::symlink(&installed, &link).map_err(|e| {
            Error::IoError(format!("Failed to link {}: {}", link.display(), e))
        })?;
        linked.push(link);
    }

    Ok(linked)
}
