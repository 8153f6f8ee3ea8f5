// src/formula/kitchen/fetch.rs

//! Downloading and caching of sources, patches, and resources

use crate::error::{Error, Result};
use crate::formula::format::file_name_from_url;
use crate::hash::{hash_bytes, Checksum, HashAlgorithm};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum attempts for a failed download
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (multiplied by the attempt number)
const RETRY_DELAY_MS: u64 = 1000;

/// Something that can turn a URL into a local file
///
/// Implementations should verify `checksum` when one is given; the kitchen
/// verifies again before use either way.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, checksum: Option<&Checksum>) -> Result<PathBuf>;
}

/// Check a fetched file against its declared checksum
pub fn verify_download(path: &Path, url: &str, checksum: &Checksum) -> Result<()> {
    match checksum.verify_file(path)? {
        Ok(()) => Ok(()),
        Err(actual) => Err(Error::IntegrityFailure {
            url: url.to_string(),
            expected: checksum.to_prefixed_string(),
            actual: format!("{}:{}", checksum.algorithm, actual),
        }),
    }
}

/// HTTP downloader with a checksum-keyed cache directory
pub struct SourceCache {
    root: PathBuf,
    client: Client,
    max_retries: u32,
}

impl SourceCache {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kettle/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            root: root.into(),
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Cache path for a URL
    ///
    /// Verified artifacts are keyed by checksum so a URL change does not
    /// trigger a re-download; unverified ones by a hash of the URL.
    pub fn cache_path(&self, url: &str, checksum: Option<&Checksum>) -> PathBuf {
        let key = match checksum {
            Some(c) => c.cache_key(),
            None => format!("url_{}", hash_bytes(HashAlgorithm::Xxh128, url.as_bytes())),
        };
        self.root
            .join(format!("{}-{}", key, file_name_from_url(url, "download")))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(mut response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let mut file = File::create(dest).map_err(|e| {
                        Error::IoError(format!("Failed to create file {}: {e}", dest.display()))
                    })?;
                    io::copy(&mut response, &mut file).map_err(|e| {
                        Error::IoError(format!("Failed to write downloaded data: {e}"))
                    })?;
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to download {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

impl Fetcher for SourceCache {
    fn fetch(&self, url: &str, checksum: Option<&Checksum>) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|e| {
            Error::IoError(format!(
                "Failed to create source cache {}: {e}",
                self.root.display()
            ))
        })?;

        let cached_path = self.cache_path(url, checksum);

        if cached_path.exists() {
            match checksum {
                Some(c) => match verify_download(&cached_path, url, c) {
                    Ok(()) => {
                        debug!("Using cached source: {}", cached_path.display());
                        return Ok(cached_path);
                    }
                    Err(_) => {
                        warn!("Cached file checksum mismatch, re-downloading");
                        fs::remove_file(&cached_path)?;
                    }
                },
                None => {
                    debug!("Using cached (unverified) source: {}", cached_path.display());
                    return Ok(cached_path);
                }
            }
        }

        info!("Downloading: {}", url);
        let temp_path = cached_path.with_extension("tmp");
        self.download(url, &temp_path)?;

        if let Some(c) = checksum
            && let Err(e) = verify_download(&temp_path, url, c)
        {
            fs::remove_file(&temp_path)?;
            return Err(e);
        }

        fs::rename(&temp_path, &cached_path)?;
        Ok(cached_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksum_of(data: &[u8]) -> Checksum {
        Checksum::new(HashAlgorithm::Sha256, hash_bytes(HashAlgorithm::Sha256, data)).unwrap()
    }

    #[test]
    fn test_verify_download() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"appliance").unwrap();

        assert!(verify_download(file.path(), "u", &checksum_of(b"appliance")).is_ok());

        let err = verify_download(file.path(), "https://x/a.tar.xz", &checksum_of(b"other"))
            .unwrap_err();
        match err {
            Error::IntegrityFailure { url, expected, actual } => {
                assert_eq!(url, "https://x/a.tar.xz");
                assert!(expected.starts_with("sha256:"));
                assert_eq!(actual, checksum_of(b"appliance").to_prefixed_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cache_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SourceCache::new(dir.path(), Duration::from_secs(5)).unwrap();
        let sum = checksum_of(b"x");

        let verified = cache.cache_path("https://example.com/a/src.tar.gz", Some(&sum));
        assert_eq!(
            verified.file_name().unwrap().to_str().unwrap(),
            format!("{}-src.tar.gz", sum.cache_key())
        );

        let a = cache.cache_path("https://example.com/a/fix.patch", None);
        let b = cache.cache_path("https://example.com/b/fix.patch", None);
        assert_ne!(a, b);
        assert!(a.to_str().unwrap().ends_with("-fix.patch"));
    }

    #[test]
    fn test_cached_file_is_reused_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SourceCache::new(dir.path(), Duration::from_secs(5)).unwrap();
        let url = "https://invalid.invalid/appliance-1.30.1.tar.xz";
        let sum = checksum_of(b"cached appliance");

        std::fs::write(cache.cache_path(url, Some(&sum)), b"cached appliance").unwrap();
        let path = cache.fetch(url, Some(&sum)).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"cached appliance");
    }
}
