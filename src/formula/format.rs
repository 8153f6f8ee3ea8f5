// src/formula/format.rs

//! Formula file format definitions
//!
//! Formulas are TOML files. String values may contain `%(var)s`
//! placeholders that are expanded at plan time:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `%(name)s`, `%(version)s` | package metadata |
//! | `%(prefix)s` | install prefix |
//! | `%(bin)s`, `%(lib)s`, `%(include)s` | subdirectories of the prefix |
//! | `%(opt_prefix:X)s` | installation prefix of dependency `X` |
//! | `%(opt_include:X)s`, `%(opt_lib:X)s` | its include and lib directories |

use crate::error::{Error, Result};
use crate::formula::dependency::{Dependency, DependencyPaths};
use crate::formula::feature::{Feature, FeatureFlags};
use crate::formula::requirement::RequirementSpec;
use crate::hash::Checksum;
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A complete formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Post-install instructions shown to the user
    #[serde(default)]
    pub caveats: Option<String>,

    pub package: PackageSection,

    pub source: SourceSection,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Requirement definitions, referenced by `kind = "requirement"` dependencies
    #[serde(default)]
    pub requirements: Vec<RequirementSpec>,

    /// Patches, applied in declaration order
    #[serde(default)]
    pub patches: Vec<PatchInfo>,

    /// Auxiliary artifacts staged into the prefix after install
    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub install: InstallSection,

    #[serde(default)]
    pub test: Option<TestSection>,
}

impl Formula {
    /// `name-version`, used in logs and build directory names
    pub fn full_name(&self) -> String {
        format!("{}-{}", self.package.name, self.package.version)
    }

    /// Archive URL with metadata placeholders expanded
    pub fn archive_url(&self) -> String {
        self.source
            .archive
            .replace("%(name)s", &self.package.name)
            .replace("%(version)s", &self.package.version)
    }

    /// Archive file name taken from the URL
    pub fn archive_filename(&self) -> String {
        file_name_from_url(&self.archive_url(), "source.tar.gz")
    }

    /// Features this formula switches off
    pub fn feature_flags(&self) -> FeatureFlags {
        self.build.disable.iter().copied().collect()
    }

    /// Environment entries that apply on `platform`, in declaration order
    pub fn env_entries(&self, platform: Platform) -> impl Iterator<Item = &EnvEntry> {
        self.build
            .env
            .iter()
            .filter(move |e| e.platform.is_none_or(|p| p == platform))
    }
}

/// Last path segment of a URL, or `fallback` if there is none
pub fn file_name_from_url(url: &str, fallback: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').next())
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,

    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub homepage: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,
}

/// Primary source archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Archive URL; supports `%(name)s` and `%(version)s`
    pub archive: String,

    /// Missing checksums are allowed but logged as lower-trust
    #[serde(default)]
    pub checksum: Option<Checksum>,
}

/// A patch applied to the unpacked source tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchInfo {
    /// Patch URL (`http(s)://`) or local path
    pub url: String,

    #[serde(default)]
    pub checksum: Option<Checksum>,

    /// Strip level passed to `patch -p`
    #[serde(default = "default_strip")]
    pub strip: u32,
}

fn default_strip() -> u32 {
    1
}

impl PatchInfo {
    /// Local file paths are used in place; everything else goes through the fetcher
    pub fn is_remote(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// An auxiliary artifact downloaded independently of the source archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,

    pub url: String,

    /// Resources must always be verified
    pub checksum: Checksum,

    /// Directory under the install prefix to stage into
    pub stage_dir: PathBuf,
}

impl Resource {
    pub fn file_name(&self) -> String {
        file_name_from_url(&self.url, &self.name)
    }
}

/// Build configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    /// Optional features switched off at configure time
    #[serde(default)]
    pub disable: Vec<Feature>,

    /// Extra configure arguments (after the standard ones)
    #[serde(default)]
    pub configure_args: Vec<String>,

    /// Literal environment overrides, optionally platform-scoped
    #[serde(default)]
    pub env: Vec<EnvEntry>,
}

/// A single environment override
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvEntry {
    pub key: String,

    /// Value; supports placeholders
    pub value: String,

    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Post-install steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallSection {
    /// Source-tree directory whose entries get symlinked into `<prefix>/bin`
    #[serde(default)]
    pub link_binaries_from: Option<PathBuf>,
}

/// Smoke test run against an installed prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSection {
    /// Program and arguments; supports placeholders
    pub command: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Values available to `%(var)s` placeholders
pub struct TemplateVars<'a> {
    formula: &'a Formula,
    prefix: &'a Path,
    paths: Option<&'a DependencyPaths>,
}

impl<'a> TemplateVars<'a> {
    pub fn new(formula: &'a Formula, prefix: &'a Path) -> Self {
        Self {
            formula,
            prefix,
            paths: None,
        }
    }

    pub fn with_paths(mut self, paths: &'a DependencyPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    fn lookup(&self, var: &str) -> Result<String> {
        let value = match var {
            "name" => self.formula.package.name.clone(),
            "version" => self.formula.package.version.clone(),
            "prefix" => self.prefix.display().to_string(),
            "bin" | "lib" | "include" | "share" | "var" => {
                self.prefix.join(var).display().to_string()
            }
            _ => {
                let (accessor, dep) = var
                    .split_once(':')
                    .ok_or_else(|| Error::InvalidFormula(format!("unknown placeholder %({})s", var)))?;
                let paths = self
                    .paths
                    .ok_or_else(|| Error::UnresolvedDependency(dep.to_string()))?;
                let opt = paths.require(dep)?;
                match accessor {
                    "opt_prefix" => opt.display().to_string(),
                    "opt_include" => opt.join("include").display().to_string(),
                    "opt_lib" => opt.join("lib").display().to_string(),
                    _ => {
                        return Err(Error::InvalidFormula(format!(
                            "unknown placeholder %({})s",
                            var
                        )));
                    }
                }
            }
        };
        Ok(value)
    }

    /// Expand every placeholder; any unknown or unresolvable one is an error
    pub fn expand(&self, template: &str) -> Result<String> {
        expand_with(template, |var| self.lookup(var).map(Some))
    }

    /// Expand what can be expanded and leave the rest verbatim
    pub fn expand_lossy(&self, template: &str) -> String {
        expand_with(template, |var| Ok(self.lookup(var).ok()))
            .unwrap_or_else(|_| template.to_string())
    }
}

fn expand_with<F>(template: &str, mut lookup: F) -> Result<String>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("%(") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find(")s") else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let var = &after[..end];
        match lookup(var)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
