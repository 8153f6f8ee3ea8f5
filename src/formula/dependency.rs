// src/formula/dependency.rs

//! Dependency declarations and platform-conditional resolution

use crate::error::{Error, Result};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// When a dependency is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyPhase {
    /// Needed only while building
    Build,
    /// Needed by the installed software (and therefore also while building)
    #[default]
    Runtime,
}

impl DependencyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyPhase::Build => "build",
            DependencyPhase::Runtime => "runtime",
        }
    }
}

/// What a dependency entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// A package the host installs and reports a path for
    #[default]
    Package,
    /// A named requirement check defined in the formula's `[[requirements]]`
    Requirement,
}

/// A single dependency declaration
///
/// Names are not required to be unique; duplicates are kept as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name (may be tap-qualified, e.g. `owner/tap/automake-1.15`)
    /// or requirement name
    pub name: String,

    #[serde(default)]
    pub kind: DependencyKind,

    #[serde(default)]
    pub phase: DependencyPhase,

    /// Only applies on this platform (always applies when absent)
    #[serde(default)]
    pub platform: Option<Platform>,
}

impl Dependency {
    pub fn package(name: &str, phase: DependencyPhase) -> Self {
        Self {
            name: name.to_string(),
            kind: DependencyKind::Package,
            phase,
            platform: None,
        }
    }

    pub fn requirement(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: DependencyKind::Requirement,
            phase: DependencyPhase::Build,
            platform: None,
        }
    }

    pub fn only_on(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Whether this entry is active for the given platform
    pub fn applies_to(&self, platform: Platform) -> bool {
        self.platform.is_none_or(|p| p == platform)
    }

    /// Name without any tap qualification (`owner/tap/foo` -> `foo`)
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    pub fn is_build_only(&self) -> bool {
        self.phase == DependencyPhase::Build
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.kind == DependencyKind::Requirement {
            write!(f, " (requirement)")?;
        }
        if self.is_build_only() {
            write!(f, " [build]")?;
        }
        if let Some(platform) = self.platform {
            write!(f, " [{}]", platform)?;
        }
        Ok(())
    }
}

fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Produce the platform-appropriate dependency list, in declaration order
pub fn resolve_dependencies(deps: &[Dependency], platform: Platform) -> Vec<&Dependency> {
    deps.iter().filter(|d| d.applies_to(platform)).collect()
}

/// Installation paths of already-installed dependencies, as reported by the host
///
/// Lookups consult explicit entries first, then fall back to an "opt tree"
/// root where dependency `foo` lives at `<root>/opt/foo`.
#[derive(Debug, Clone, Default)]
pub struct DependencyPaths {
    opt_root: Option<PathBuf>,
    explicit: HashMap<String, PathBuf>,
}

impl DependencyPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every dependency under `<root>/opt/<name>`
    pub fn opt_tree(root: impl Into<PathBuf>) -> Self {
        Self {
            opt_root: Some(root.into()),
            explicit: HashMap::new(),
        }
    }

    /// Register an explicit installation prefix for a dependency
    pub fn with_path(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.insert(name, path);
        self
    }

    pub fn insert(&mut self, name: &str, path: impl Into<PathBuf>) {
        self.explicit.insert(short_name(name).to_string(), path.into());
    }

    /// Installation prefix for a dependency, if the host knows it
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let short = short_name(name);
        self.explicit
            .get(short)
            .cloned()
            .or_else(|| self.opt_root.as_ref().map(|root| root.join("opt").join(short)))
    }

    /// Like [`resolve`](Self::resolve) but an unknown dependency is an error
    pub fn require(&self, name: &str) -> Result<PathBuf> {
        self.resolve(name)
            .ok_or_else(|| Error::UnresolvedDependency(name.to_string()))
    }
}
