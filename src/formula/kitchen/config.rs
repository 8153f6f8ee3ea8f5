// src/formula/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::error::{Error, Result};
use crate::formula::dependency::DependencyPaths;
use crate::formula::plan::BuildPlan;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the Kitchen
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```toml
/// source_cache = "/var/cache/kettle"
/// host_prefix = "/opt/homebrew"
/// jobs = 8
///
/// [dependency_paths]
/// ncurses = "/opt/ncurses-6.4"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KitchenConfig {
    /// Directory for downloaded sources, patches, and resources
    pub source_cache: PathBuf,
    /// Install prefix used when the command line does not give one
    pub prefix: PathBuf,
    /// Prefix of the active package-manager installation
    pub host_prefix: PathBuf,
    /// Root of the opt tree dependencies are looked up in
    /// (defaults to `host_prefix`)
    pub opt_root: Option<PathBuf>,
    /// Explicit dependency prefixes, taking precedence over the opt tree
    pub dependency_paths: BTreeMap<String, PathBuf>,
    /// Number of parallel make jobs
    pub jobs: u32,
    /// Keep build directory after completion (for debugging)
    pub keep_builddir: bool,
    /// Timeout for each HTTP request, in seconds
    pub download_timeout: u64,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        let source_cache = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("kettle")
            .join("sources");

        Self {
            source_cache,
            prefix: PathBuf::from("/usr/local"),
            host_prefix: PathBuf::from("/usr/local"),
            opt_root: None,
            dependency_paths: BTreeMap::new(),
            jobs,
            keep_builddir: false,
            download_timeout: 300,
        }
    }
}

impl KitchenConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::ParseError(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Dependency lookup built from `opt_root` and `dependency_paths`
    pub fn dependency_paths(&self) -> DependencyPaths {
        let root = self.opt_root.as_ref().unwrap_or(&self.host_prefix);
        let mut paths = DependencyPaths::opt_tree(root);
        for (name, path) in &self.dependency_paths {
            paths.insert(name, path);
        }
        paths
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }

    /// A brew request for `platform` using this config's prefix and paths
    pub fn request(&self, platform: Platform) -> BrewRequest {
        BrewRequest {
            platform,
            prefix: self.prefix.clone(),
            dependency_paths: self.dependency_paths(),
        }
    }
}

/// What to build for, and where to install it
#[derive(Debug, Clone)]
pub struct BrewRequest {
    pub platform: Platform,
    pub prefix: PathBuf,
    pub dependency_paths: DependencyPaths,
}

impl BrewRequest {
    pub fn new(platform: Platform, prefix: impl Into<PathBuf>, paths: DependencyPaths) -> Self {
        Self {
            platform,
            prefix: prefix.into(),
            dependency_paths: paths,
        }
    }
}

/// Result of brewing a formula
#[derive(Debug)]
pub struct BrewResult {
    /// The plan that was executed
    pub plan: BuildPlan,
    /// Build log
    pub log: String,
    /// Warnings generated during the brew (missing checksums, advisory requirements)
    pub warnings: Vec<String>,
    /// Directories resources were staged into
    pub staged: Vec<PathBuf>,
    /// Symlinks created in `<prefix>/bin`
    pub linked: Vec<PathBuf>,
    /// Post-install instructions
    pub advisory: String,
    /// Build directory, when `keep_builddir` is set
    pub build_dir: Option<PathBuf>,
}
