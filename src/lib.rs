// src/lib.rs

//! Kettle: formula-driven source builds
//!
//! Builds one package from source according to a declarative TOML formula:
//! host requirements are checked, platform-specific dependencies resolved,
//! patches applied, and autotools stages run with an explicit environment.
//! Auxiliary resources are staged into the prefix once install succeeds.
//!
//! # Architecture
//!
//! - Formulas are data: nothing in a formula executes code
//! - Plans before actions: every environment variable and command is decided
//!   up front and can be printed as a dry run
//! - No ambient state: build environments are explicit `EnvOverrides`, never
//!   the process environment
//! - Fail fast: the first unsatisfied requirement, checksum mismatch, or
//!   failing stage ends the run

pub mod env;
mod error;
pub mod formula;
pub mod hash;
pub mod platform;

pub use env::EnvOverrides;
pub use error::{Error, Result};
pub use formula::{
    load_formula, render_advisory, BrewRequest, BrewResult, BuildPlan, Formula, Kitchen,
    KitchenConfig,
};
pub use hash::{Checksum, HashAlgorithm, Hasher};
pub use platform::Platform;
