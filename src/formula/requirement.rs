// src/formula/requirement.rs

//! Requirements: host preconditions checked before any build step
//!
//! Unlike dependencies, requirements are not installed by the host. They
//! are predicates over the build machine (is a native library present, in
//! the expected layout?) with a remediation message for the user.

use crate::env::EnvOverrides;
use crate::error::{Error, Result};
use crate::formula::dependency::{Dependency, DependencyKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable collecting extra library search paths
pub const LIBRARY_PATHS_VAR: &str = "HOMEBREW_LIBRARY_PATHS";

/// Environment variable collecting extra include search paths
pub const INCLUDE_PATHS_VAR: &str = "HOMEBREW_INCLUDE_PATHS";

/// How an unsatisfied requirement affects the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Abort before any build step
    #[default]
    Fatal,
    /// Warn and continue
    Advisory,
}

/// Host facts a requirement may consult when contributing to the environment
#[derive(Debug, Clone)]
pub struct RequirementContext {
    /// Prefix of the active package-manager installation
    pub host_prefix: PathBuf,
}

/// A pluggable pre-build check
pub trait Requirement {
    fn name(&self) -> &str;

    fn severity(&self) -> Severity;

    /// Remediation text shown when the check fails
    fn message(&self) -> &str;

    /// Evaluate the check. Must not depend on build environment overrides.
    fn satisfied(&self) -> bool;

    /// Contribute search paths once the check has passed
    fn env(&self, _ctx: &RequirementContext, _env: &mut EnvOverrides) {}
}

/// Requirement definitions as written in formula files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RequirementSpec {
    NativeHeader(NativeHeaderRequirement),
}

impl RequirementSpec {
    pub fn name(&self) -> &str {
        self.as_requirement().name()
    }

    pub fn as_requirement(&self) -> &dyn Requirement {
        match self {
            RequirementSpec::NativeHeader(r) => r,
        }
    }
}

/// A native library that must be installed with its headers in a fixed place
///
/// The check passes when `header` exists and its parent directory is a real
/// directory. A symlinked include directory means the library was installed
/// through a shim that does not provide the expected layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeHeaderRequirement {
    pub name: String,

    #[serde(default)]
    pub severity: Severity,

    /// Header that must exist (e.g. `/usr/local/include/fuse/fuse.h`)
    pub header: PathBuf,

    /// Prefix the library installs into; search paths are only added when
    /// the host prefix differs from it
    pub default_prefix: PathBuf,

    /// Library directory to add to the search path
    pub library_path: PathBuf,

    /// Include directory to add to the search path
    pub include_path: PathBuf,

    pub message: String,
}

impl Requirement for NativeHeaderRequirement {
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn satisfied(&self) -> bool {
        if !self.header.is_file() {
            debug!("{}: {} does not exist", self.name, self.header.display());
            return false;
        }
        match self.header.parent() {
            Some(dir) if dir.is_symlink() => {
                debug!("{}: {} is a symlink", self.name, dir.display());
                false
            }
            _ => true,
        }
    }

    fn env(&self, ctx: &RequirementContext, env: &mut EnvOverrides) {
        if same_prefix(&ctx.host_prefix, &self.default_prefix) {
            debug!(
                "{}: host prefix is {}, search paths already present",
                self.name,
                ctx.host_prefix.display()
            );
            return;
        }
        env.append_path(LIBRARY_PATHS_VAR, self.library_path.to_string_lossy());
        env.append_path(INCLUDE_PATHS_VAR, self.include_path.to_string_lossy());
    }
}

fn same_prefix(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

/// Outcome of a single evaluated requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementOutcome {
    pub name: String,
    pub satisfied: bool,
    pub severity: Severity,
    /// Remediation message (only set when unsatisfied)
    pub message: Option<String>,
}

/// Result of evaluating every applicable requirement
#[derive(Debug, Clone, Default)]
pub struct RequirementReport {
    pub outcomes: Vec<RequirementOutcome>,
    /// Overrides contributed by satisfied requirements
    pub env: EnvOverrides,
}

impl RequirementReport {
    pub fn all_satisfied(&self) -> bool {
        self.outcomes.iter().all(|o| o.satisfied)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.satisfied)
            .filter_map(|o| o.message.clone())
            .collect()
    }
}

/// Evaluate the requirements referenced by resolved dependencies
///
/// Each requirement is evaluated exactly once, in dependency order. The
/// first unsatisfied fatal requirement aborts with its message; advisory
/// failures are logged and recorded.
pub fn check_requirements(
    dependencies: &[&Dependency],
    specs: &[RequirementSpec],
    ctx: &RequirementContext,
) -> Result<RequirementReport> {
    let mut report = RequirementReport::default();

    for dep in dependencies
        .iter()
        .filter(|d| d.kind == DependencyKind::Requirement)
    {
        if report.outcomes.iter().any(|o| o.name == dep.name) {
            continue;
        }

        let spec = specs
            .iter()
            .find(|s| s.name() == dep.name)
            .ok_or_else(|| {
                Error::InvalidFormula(format!("requirement '{}' is not defined", dep.name))
            })?;
        let requirement = spec.as_requirement();

        if requirement.satisfied() {
            info!("Requirement {} satisfied", requirement.name());
            requirement.env(ctx, &mut report.env);
            report.outcomes.push(RequirementOutcome {
                name: requirement.name().to_string(),
                satisfied: true,
                severity: requirement.severity(),
                message: None,
            });
            continue;
        }

        match requirement.severity() {
            Severity::Fatal => {
                return Err(Error::UnsatisfiedRequirement {
                    name: requirement.name().to_string(),
                    message: requirement.message().to_string(),
                });
            }
            Severity::Advisory => {
                warn!("Requirement {} not satisfied: {}", requirement.name(), requirement.message());
                report.outcomes.push(RequirementOutcome {
                    name: requirement.name().to_string(),
                    satisfied: false,
                    severity: Severity::Advisory,
                    message: Some(requirement.message().to_string()),
                });
            }
        }
    }

    Ok(report)
}
