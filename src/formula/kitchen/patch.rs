// src/formula/kitchen/patch.rs

//! Ordered patch application

use super::fetch::{verify_download, Fetcher};
use super::runner::{StageOutput, StageRunner};
use crate::env::EnvOverrides;
use crate::error::{Error, Result};
use crate::formula::format::PatchInfo;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Stage name patch failures are reported under
pub const PATCH_STAGE: &str = "patch";

/// A patch whose document is available locally
#[derive(Debug, Clone)]
pub struct FetchedPatch {
    pub url: String,
    pub path: PathBuf,
    pub strip: u32,
}

impl FetchedPatch {
    /// `patch -p<strip> -i <file>`
    pub fn command(&self) -> Vec<String> {
        vec![
            "patch".to_string(),
            format!("-p{}", self.strip),
            "-i".to_string(),
            self.path.to_string_lossy().into_owned(),
        ]
    }
}

/// Fetch every patch in declaration order
///
/// Declared checksums are verified before the patch is used. Patches
/// without one are still returned, with a warning pushed to `warnings`.
pub fn fetch_patches(
    patches: &[PatchInfo],
    fetcher: &dyn Fetcher,
    warnings: &mut Vec<String>,
) -> Result<Vec<FetchedPatch>> {
    let mut fetched = Vec::with_capacity(patches.len());

    for patch in patches {
        let path = if patch.is_remote() {
            fetcher.fetch(&patch.url, patch.checksum.as_ref())?
        } else {
            let path = PathBuf::from(&patch.url);
            if !path.is_file() {
                return Err(Error::NotFound(format!("Patch file not found: {}", patch.url)));
            }
            path
        };

        match &patch.checksum {
            Some(checksum) => verify_download(&path, &patch.url, checksum)?,
            None => {
                let message = format!("Patch {} has no checksum; applying unverified", patch.url);
                warn!("{}", message);
                warnings.push(message);
            }
        }

        fetched.push(FetchedPatch {
            url: patch.url.clone(),
            path,
            strip: patch.strip,
        });
    }

    Ok(fetched)
}

/// Apply patches to `source_dir` in order, stopping at the first failure
pub fn apply_patches(
    patches: &[FetchedPatch],
    runner: &dyn StageRunner,
    source_dir: &Path,
) -> Result<Vec<StageOutput>> {
    let env = EnvOverrides::new();
    let mut outputs = Vec::with_capacity(patches.len());

    for patch in patches {
        info!("Applying patch: {}", patch.url);
        let output = runner
            .run(PATCH_STAGE, &patch.command(), &env, source_dir)?
            .check(PATCH_STAGE)?;
        outputs.push(output);
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash_bytes, Checksum, HashAlgorithm};
    use std::sync::Mutex;

    struct DirFetcher {
        dir: PathBuf,
    }

    impl Fetcher for DirFetcher {
        fn fetch(&self, url: &str, _checksum: Option<&Checksum>) -> Result<PathBuf> {
            let name = url.rsplit('/').next().unwrap_or(url);
            let path = self.dir.join(name);
            if path.exists() {
                Ok(path)
            } else {
                Err(Error::DownloadError(format!("HTTP 404 Not Found from {url}")))
            }
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<Vec<String>>>,
        fail_on: Option<usize>,
    }

    impl StageRunner for RecordingRunner {
        fn run(
            &self,
            _stage: &str,
            command: &[String],
            _env: &EnvOverrides,
            _workdir: &Path,
        ) -> Result<StageOutput> {
            let mut commands = self.commands.lock().unwrap();
            commands.push(command.to_vec());
            let exit_code = if Some(commands.len()) == self.fail_on { 1 } else { 0 };
            Ok(StageOutput {
                exit_code: Some(exit_code),
                stdout: String::new(),
                stderr: "Hunk #1 FAILED".to_string(),
            })
        }
    }

    fn patch_info(url: &str, checksum: Option<Checksum>) -> PatchInfo {
        PatchInfo {
            url: url.to_string(),
            checksum,
            strip: 1,
        }
    }

    fn sha256_of(data: &[u8]) -> Checksum {
        Checksum::new(HashAlgorithm::Sha256, hash_bytes(HashAlgorithm::Sha256, data)).unwrap()
    }

    #[test]
    fn test_fetch_verifies_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gnulib.patch"), b"--- a\n+++ b\n").unwrap();
        std::fs::write(dir.path().join("backing.patch"), b"--- c\n+++ d\n").unwrap();
        let fetcher = DirFetcher { dir: dir.path().to_path_buf() };

        let patches = vec![
            patch_info("https://x/gnulib.patch", Some(sha256_of(b"--- a\n+++ b\n"))),
            patch_info("https://x/backing.patch", None),
        ];
        let mut warnings = Vec::new();
        let fetched = fetch_patches(&patches, &fetcher, &mut warnings).unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("backing.patch"));
    }

    #[test]
    fn test_checksum_mismatch_is_integrity_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gnulib.patch"), b"tampered").unwrap();
        let fetcher = DirFetcher { dir: dir.path().to_path_buf() };

        let patches = vec![patch_info("https://x/gnulib.patch", Some(sha256_of(b"original")))];
        let err = fetch_patches(&patches, &fetcher, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::IntegrityFailure { .. }));
    }

    #[test]
    fn test_local_patch_bypasses_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("local.patch");
        std::fs::write(&local, b"--- e\n+++ f\n").unwrap();
        let fetcher = DirFetcher { dir: dir.path().join("empty") };

        let patches = vec![patch_info(local.to_str().unwrap(), Some(sha256_of(b"--- e\n+++ f\n")))];
        let fetched = fetch_patches(&patches, &fetcher, &mut Vec::new()).unwrap();
        assert_eq!(fetched[0].path, local);

        let missing = vec![patch_info("patches/absent.patch", None)];
        let err = fetch_patches(&missing, &fetcher, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_unreachable_patch_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DirFetcher { dir: dir.path().to_path_buf() };
        let patches = vec![patch_info("https://x/missing.patch", None)];
        let err = fetch_patches(&patches, &fetcher, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::DownloadError(_)));
    }

    #[test]
    fn test_apply_in_order_and_stop_on_failure() {
        let patches: Vec<FetchedPatch> = ["one", "two", "three"]
            .iter()
            .map(|n| FetchedPatch {
                url: format!("https://x/{n}.patch"),
                path: PathBuf::from(format!("/tmp/{n}.patch")),
                strip: 1,
            })
            .collect();

        let runner = RecordingRunner {
            fail_on: Some(2),
            ..Default::default()
        };
        let err = apply_patches(&patches, &runner, Path::new("/src")).unwrap_err();
        assert_eq!(err.failed_stage(), Some(PATCH_STAGE));

        let commands = runner.commands.lock().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], vec!["patch", "-p1", "-i", "/tmp/one.patch"]);
        assert_eq!(commands[1][3], "/tmp/two.patch");
    }
}
