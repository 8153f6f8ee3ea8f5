// src/formula/kitchen/archive.rs

//! Archive unpacking for sources and resources

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use tar::Archive;
use tracing::debug;
use xz2::read::XzDecoder;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    TarXz,
}

impl ArchiveFormat {
    /// Detect the format from a file name, `None` if it is not an archive
    pub fn detect(file_name: &str) -> Option<Self> {
        if file_name.ends_with(".tar.gz") || file_name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if file_name.ends_with(".tar.xz") || file_name.ends_with(".txz") {
            Some(Self::TarXz)
        } else if file_name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }

    fn open(self, path: &Path) -> Result<Archive<Box<dyn Read>>> {
        let file = File::open(path)
            .map_err(|e| Error::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
        let reader: Box<dyn Read> = match self {
            Self::Tar => Box::new(BufReader::new(file)),
            Self::TarGz => Box::new(GzDecoder::new(BufReader::new(file))),
            Self::TarXz => Box::new(XzDecoder::new(BufReader::new(file))),
        };
        Ok(Archive::new(reader))
    }
}

/// Unpack `archive` into `dest`, stripping a single top-level directory
///
/// `dest` is created if needed. Entries land directly in `dest` whether or
/// not the archive wraps them in a directory.
pub fn unpack_stripped(archive: &Path, format: ArchiveFormat, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    let parent = dest.parent().unwrap_or(dest);
    let scratch = tempfile::Builder::new()
        .prefix(".kettle-unpack")
        .tempdir_in(parent)
        .map_err(|e| Error::IoError(format!("Failed to create unpack directory: {}", e)))?;

    format
        .open(archive)?
        .unpack(scratch.path())
        .map_err(|e| Error::IoError(format!("Failed to extract {}: {}", archive.display(), e)))?;

    let entries = fs::read_dir(scratch.path())?.collect::<std::io::Result<Vec<_>>>()?;
    let root = if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        debug!("Stripping top-level directory {:?}", entries[0].file_name());
        entries[0].path()
    } else {
        scratch.path().to_path_buf()
    };

    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if target.is_dir() && !target.is_symlink() {
            fs::remove_dir_all(&target)?;
        } else if target.symlink_metadata().is_ok() {
            fs::remove_file(&target)?;
        }
        fs::rename(entry.path(), &target)?;
    }

    Ok(())
}

/// Place a fetched artifact into `dest`: unpack archives, copy anything else
///
/// `file_name` is the artifact's original name, used for format detection.
pub fn place_artifact(artifact: &Path, file_name: &str, dest: &Path) -> Result<()> {
    match ArchiveFormat::detect(file_name) {
        Some(format) => unpack_stripped(artifact, format, dest),
        None => {
            fs::create_dir_all(dest)?;
            fs::copy(artifact, dest.join(file_name))?;
            Ok(())
        }
    }
}
