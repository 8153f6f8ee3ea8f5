// src/formula/mod.rs

//! Formula system for building packages from source
//!
//! A formula describes how to build one package:
//! - Source archive, patches, and auxiliary resources with checksums
//! - Dependencies, some of which only apply on one platform
//! - Requirements: host preconditions that cannot be installed for you
//! - Optional features to switch off at configure time
//! - Literal environment overrides and a post-install smoke test
//!
//! # Example Formula
//!
//! ```toml
//! [package]
//! name = "hello"
//! version = "2.12"
//!
//! [source]
//! archive = "https://ftp.gnu.org/gnu/hello/hello-%(version)s.tar.gz"
//! checksum = "sha256:cf04af86dc085268c5f4470fbae49b18afbc221b78096aab842d934a76bad0ab"
//!
//! [[dependencies]]
//! name = "gettext"
//!
//! [[build.env]]
//! key = "LIBINTL_CFLAGS"
//! value = "-I%(opt_include:gettext)s"
//! ```
//!
//! The kitchen turns a formula into a [`BuildPlan`] and then runs it:
//! requirements, prep (fetch and unpack), patch, the four build stages,
//! resource staging, and binary linking.

mod advisory;
mod dependency;
mod feature;
mod format;
pub mod kitchen;
pub mod parser;
mod plan;
mod requirement;

pub use advisory::render_advisory;
pub use dependency::{
    resolve_dependencies, Dependency, DependencyKind, DependencyPaths, DependencyPhase,
};
pub use feature::{Feature, FeatureFlags};
pub use format::{
    BuildSection, EnvEntry, Formula, InstallSection, PackageSection, PatchInfo, Resource,
    SourceSection, TemplateVars, TestSection,
};
pub use kitchen::{BrewRequest, BrewResult, Kitchen, KitchenConfig};
pub use parser::{load_formula, parse_formula, parse_formula_file, validate_formula};
pub use plan::{BuildPlan, BuildPlanAssembler, BuildStep, PlannedDependency, Stage, StagingTarget};
pub use requirement::{
    check_requirements, NativeHeaderRequirement, Requirement, RequirementContext,
    RequirementOutcome, RequirementReport, RequirementSpec, Severity, INCLUDE_PATHS_VAR,
    LIBRARY_PATHS_VAR,
};
