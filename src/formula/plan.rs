// src/formula/plan.rs

//! Build plan assembly
//!
//! The plan is everything the kitchen will do, decided up front: the
//! environment each stage sees, the ordered shell invocations, and where
//! resources get staged. Nothing here touches the filesystem or spawns
//! processes, so a plan can be printed as a dry run.

use crate::env::EnvOverrides;
use crate::error::Result;
use crate::formula::dependency::{Dependency, DependencyKind, DependencyPaths, DependencyPhase};
use crate::formula::feature::FeatureFlags;
use crate::formula::format::{Formula, Resource, TemplateVars};
use crate::formula::requirement::{
    RequirementOutcome, RequirementReport, INCLUDE_PATHS_VAR, LIBRARY_PATHS_VAR,
};
use crate::platform::Platform;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment flag the upstream install target insists on
pub const CONFIRM_INSTALL_VAR: &str = "REALLY_INSTALL";

/// One discrete step of the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Regenerate the build scripts
    Bootstrap,
    Configure,
    Compile,
    Install,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Bootstrap => "bootstrap",
            Stage::Configure => "configure",
            Stage::Compile => "compile",
            Stage::Install => "install",
        }
    }
}

/// A shell invocation with the complete environment overrides it runs under
#[derive(Debug, Clone, Serialize)]
pub struct BuildStep {
    pub stage: Stage,
    pub env: EnvOverrides,
    pub command: Vec<String>,
}

impl BuildStep {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// A dependency as it ended up in the plan
#[derive(Debug, Clone, Serialize)]
pub struct PlannedDependency {
    pub name: String,
    pub kind: DependencyKind,
    pub phase: DependencyPhase,
    /// Installation prefix (packages only)
    pub path: Option<PathBuf>,
}

/// Where a resource will be staged once install has succeeded
#[derive(Debug, Clone, Serialize)]
pub struct StagingTarget {
    pub resource: Resource,
    pub target: PathBuf,
}

/// The assembled plan for one invocation
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub formula: String,
    pub platform: Platform,
    pub prefix: PathBuf,
    pub requirements: Vec<RequirementOutcome>,
    pub dependencies: Vec<PlannedDependency>,
    /// Environment shared by every stage
    pub env: EnvOverrides,
    pub steps: Vec<BuildStep>,
    pub staging: Vec<StagingTarget>,
    pub link_binaries_from: Option<PathBuf>,
}

impl BuildPlan {
    pub fn step(&self, stage: Stage) -> Option<&BuildStep> {
        self.steps.iter().find(|s| s.stage == stage)
    }

    /// Human-readable rendering for dry runs
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Plan for {} ({})", self.formula, self.platform);
        let _ = writeln!(out, "Prefix: {}", self.prefix.display());

        if !self.requirements.is_empty() {
            let _ = writeln!(out, "\nRequirements:");
            for req in &self.requirements {
                let status = if req.satisfied { "ok" } else { "UNSATISFIED" };
                let _ = writeln!(out, "  {} [{}]", req.name, status);
            }
        }

        let _ = writeln!(out, "\nDependencies:");
        for dep in &self.dependencies {
            let _ = write!(out, "  {} ({})", dep.name, dep.phase.as_str());
            if let Some(path) = &dep.path {
                let _ = write!(out, " -> {}", path.display());
            }
            out.push('\n');
        }

        let _ = writeln!(out, "\nEnvironment:");
        for (key, value) in self.env.iter() {
            let _ = writeln!(out, "  {}={}", key, value);
        }

        let _ = writeln!(out, "\nStages:");
        for (i, step) in self.steps.iter().enumerate() {
            let _ = writeln!(out, "  {}. [{}] {}", i + 1, step.stage.as_str(), step.command_line());
            for (key, value) in step.env.iter() {
                if self.env.get(key) != Some(value) {
                    let _ = writeln!(out, "       {}={}", key, value);
                }
            }
        }

        if !self.staging.is_empty() {
            let _ = writeln!(out, "\nResources:");
            for staging in &self.staging {
                let _ = writeln!(
                    out,
                    "  {} -> {}",
                    staging.resource.name,
                    staging.target.display()
                );
            }
        }

        if let Some(dir) = &self.link_binaries_from {
            let _ = writeln!(
                out,
                "\nLink: {}/* -> {}",
                dir.display(),
                self.prefix.join("bin").display()
            );
        }

        out
    }
}

/// Composes requirements, dependencies, and feature flags into a plan
pub struct BuildPlanAssembler<'a> {
    formula: &'a Formula,
    paths: &'a DependencyPaths,
    platform: Platform,
    jobs: Option<u32>,
}

impl<'a> BuildPlanAssembler<'a> {
    pub fn new(formula: &'a Formula, paths: &'a DependencyPaths, platform: Platform) -> Self {
        Self {
            formula,
            paths,
            platform,
            jobs: None,
        }
    }

    /// Pass `-j<jobs>` to make through `MAKEFLAGS`; make rejects `-j0`, so 0 means 1
    pub fn with_jobs(mut self, jobs: u32) -> Self {
        self.jobs = Some(jobs.max(1));
        self
    }

    /// Assemble the plan
    ///
    /// Environment layering, in order: requirement overrides (with their
    /// search-path lists also folded into `LDFLAGS`/`CPPFLAGS`), search paths
    /// for each package dependency in declaration order, then the formula's
    /// literal entries (which win on conflict).
    pub fn assemble(
        &self,
        dependencies: &[&Dependency],
        requirements: &RequirementReport,
        features: &FeatureFlags,
        prefix: &Path,
    ) -> Result<BuildPlan> {
        let vars = TemplateVars::new(self.formula, prefix).with_paths(self.paths);
        let mut env = requirements.env.clone();
        fold_search_paths(&mut env, LIBRARY_PATHS_VAR, "LDFLAGS", "-L");
        fold_search_paths(&mut env, INCLUDE_PATHS_VAR, "CPPFLAGS", "-I");
        let mut planned = Vec::with_capacity(dependencies.len());

        for dep in dependencies {
            let path = match dep.kind {
                DependencyKind::Package => {
                    let path = self.paths.require(&dep.name)?;
                    env.append_path("PKG_CONFIG_PATH", path.join("lib/pkgconfig").to_string_lossy());
                    env.append_flag("CPPFLAGS", format!("-I{}", path.join("include").display()));
                    env.append_flag("LDFLAGS", format!("-L{}", path.join("lib").display()));
                    Some(path)
                }
                DependencyKind::Requirement => None,
            };
            planned.push(PlannedDependency {
                name: dep.name.clone(),
                kind: dep.kind,
                phase: dep.phase,
                path,
            });
        }

        for entry in self.formula.env_entries(self.platform) {
            let value = vars.expand(&entry.value)?;
            debug!("env {}={}", entry.key, value);
            env.set(entry.key.as_str(), value);
        }

        if let Some(jobs) = self.jobs {
            env.set("MAKEFLAGS", format!("-j{}", jobs));
        }

        let mut configure = vec![
            "./configure".to_string(),
            "--disable-dependency-tracking".to_string(),
            "--disable-silent-rules".to_string(),
            format!("--prefix={}", prefix.display()),
        ];
        for arg in &self.formula.build.configure_args {
            configure.push(vars.expand(arg)?);
        }
        configure.extend(features.configure_args());

        let mut install_env = env.clone();
        install_env.set(CONFIRM_INSTALL_VAR, "yes");

        let steps = vec![
            BuildStep {
                stage: Stage::Bootstrap,
                env: env.clone(),
                command: vec!["autoreconf".to_string(), "-i".to_string()],
            },
            BuildStep {
                stage: Stage::Configure,
                env: env.clone(),
                command: configure,
            },
            BuildStep {
                stage: Stage::Compile,
                env: env.clone(),
                command: vec!["make".to_string()],
            },
            BuildStep {
                stage: Stage::Install,
                env: install_env,
                command: vec!["make".to_string(), "install".to_string()],
            },
        ];

        let staging = self
            .formula
            .resources
            .iter()
            .map(|r| StagingTarget {
                resource: r.clone(),
                target: prefix.join(&r.stage_dir),
            })
            .collect();

        Ok(BuildPlan {
            formula: self.formula.full_name(),
            platform: self.platform,
            prefix: prefix.to_path_buf(),
            requirements: requirements.outcomes.clone(),
            dependencies: planned,
            env,
            steps,
            staging,
            link_binaries_from: self.formula.install.link_binaries_from.clone(),
        })
    }
}

/// Turn a requirement's search-path list into compiler flags the build reads
fn fold_search_paths(env: &mut EnvOverrides, list_var: &str, flags_var: &str, switch: &str) {
    let Some(list) = env.get(list_var).map(str::to_string) else {
        return;
    };
    for dir in list.split(':').filter(|d| !d.is_empty()) {
        env.append_flag(flags_var, format!("{}{}", switch, dir));
    }
}
