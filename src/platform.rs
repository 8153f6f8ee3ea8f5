// src/platform.rs

//! Target platform (OS family) detection and parsing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system families a formula can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the running host's platform
    ///
    /// Returns `None` on hosts kettle does not build for.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "macos" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// Lowercase identifier, as used in formula files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }

    pub fn all() -> [Platform; 2] {
        [Self::MacOs, Self::Linux]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(format!("unknown platform: {} (expected macos or linux)", other)),
        }
    }
}
