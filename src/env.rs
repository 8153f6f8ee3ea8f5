// src/env.rs

//! Build environment accumulator
//!
//! Stages never touch the process environment. Each stage receives an
//! `EnvOverrides` it may extend, and the assembled plan hands the final
//! values to child processes explicitly. Entries keep insertion order so
//! plans render deterministically.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Separator for path-list variables (PATH-style)
const PATH_SEPARATOR: &str = ":";

/// Separator for compiler/linker flag variables
const FLAG_SEPARATOR: &str = " ";

/// Ordered set of environment variable overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    vars: Vec<(String, String)>,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any previous value in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.vars.push((key, value)),
        }
    }

    /// Append an entry to a `:`-separated path list, skipping duplicates
    pub fn append_path(&mut self, key: &str, path: impl AsRef<str>) {
        self.append_joined(key, path.as_ref(), PATH_SEPARATOR);
    }

    /// Append a flag to a space-separated flag list, skipping duplicates
    pub fn append_flag(&mut self, key: &str, flag: impl AsRef<str>) {
        self.append_joined(key, flag.as_ref(), FLAG_SEPARATOR);
    }

    fn append_joined(&mut self, key: &str, item: &str, sep: &str) {
        if item.is_empty() {
            return;
        }
        match self.vars.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => {
                if existing.is_empty() {
                    *existing = item.to_string();
                } else if !existing.split(sep).any(|e| e == item) {
                    existing.push_str(sep);
                    existing.push_str(item);
                }
            }
            None => self.vars.push((key.to_string(), item.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Serialize for EnvOverrides {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.vars.len()))?;
        for (k, v) in &self.vars {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut env = EnvOverrides::new();
        env.set("A", "1");
        env.set("B", "2");
        env.set("A", "3");
        let keys: Vec<_> = env.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(env.get("A"), Some("3"));
    }

    #[test]
    fn test_append_path_dedups_and_keeps_order() {
        let mut env = EnvOverrides::new();
        env.append_path("HOMEBREW_LIBRARY_PATHS", "/usr/local/lib");
        env.append_path("HOMEBREW_LIBRARY_PATHS", "/opt/lib");
        env.append_path("HOMEBREW_LIBRARY_PATHS", "/usr/local/lib");
        assert_eq!(env.get("HOMEBREW_LIBRARY_PATHS"), Some("/usr/local/lib:/opt/lib"));
    }

    #[test]
    fn test_append_flag_uses_spaces() {
        let mut env = EnvOverrides::new();
        env.append_flag("CPPFLAGS", "-I/a/include");
        env.append_flag("CPPFLAGS", "-I/b/include");
        env.append_flag("CPPFLAGS", "");
        assert_eq!(env.get("CPPFLAGS"), Some("-I/a/include -I/b/include"));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let mut env = EnvOverrides::new();
        env.set("Z", "1");
        env.set("A", "2");
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(json, r#"{"Z":"1","A":"2"}"#);
    }
}
