// src/formula/feature.rs

//! Optional upstream features a formula can switch off at configure time

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// An optional subsystem of the packaged software
///
/// Declaration order is the order disable flags appear on the configure
/// command line.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Feature {
    /// DTrace/SystemTap probes
    Probes,
    /// Language bindings for Lua, Haskell, Erlang, PHP, Perl, Go, Python, Ruby
    ScriptingBindings,
    /// GObject bindings
    Gobject,
    /// HTML API documentation generated with gtk-doc
    GtkDocHtml,
    /// The in-appliance daemon
    Daemon,
    /// Building the supermin appliance; a prebuilt one must be staged instead
    Appliance,
    /// gnulib's own test suite
    GnulibTests,
}

impl Feature {
    /// Configure arguments that disable this feature
    pub fn disable_args(&self) -> &'static [&'static str] {
        match self {
            Feature::Probes => &["--disable-probes"],
            Feature::ScriptingBindings => &[
                "--disable-lua",
                "--disable-haskell",
                "--disable-erlang",
                "--disable-php",
                "--disable-perl",
                "--disable-golang",
                "--disable-python",
                "--disable-ruby",
            ],
            Feature::Gobject => &["--disable-gobject"],
            Feature::GtkDocHtml => &["--disable-gtk-doc-html"],
            Feature::Daemon => &["--disable-daemon"],
            Feature::Appliance => &["--disable-appliance"],
            Feature::GnulibTests => &["--disable-gnulib-tests"],
        }
    }
}

/// The set of features a build switches off
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    disabled: BTreeSet<Feature>,
}

impl FeatureFlags {
    /// Every feature left at the upstream default
    pub fn none() -> Self {
        Self::default()
    }

    /// Every optional feature disabled
    pub fn all_disabled() -> Self {
        Self {
            disabled: Feature::iter().collect(),
        }
    }

    pub fn disable(mut self, feature: Feature) -> Self {
        self.disabled.insert(feature);
        self
    }

    pub fn is_disabled(&self, feature: Feature) -> bool {
        self.disabled.contains(&feature)
    }

    pub fn disabled(&self) -> impl Iterator<Item = Feature> + '_ {
        self.disabled.iter().copied()
    }

    /// Configure arguments for all disabled features, in declaration order
    pub fn configure_args(&self) -> Vec<String> {
        self.disabled
            .iter()
            .flat_map(|f| f.disable_args().iter().map(|a| a.to_string()))
            .collect()
    }
}

impl FromIterator<Feature> for FeatureFlags {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            disabled: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_kebab_case() {
        assert_eq!(
            Feature::from_str("scripting-bindings").unwrap(),
            Feature::ScriptingBindings
        );
        assert_eq!(Feature::GtkDocHtml.as_ref(), "gtk-doc-html");
        assert!(Feature::from_str("wayland").is_err());
    }

    #[test]
    fn test_scripting_bindings_cover_eight_languages() {
        assert_eq!(Feature::ScriptingBindings.disable_args().len(), 8);
    }

    #[test]
    fn test_configure_args_follow_declaration_order() {
        let flags: FeatureFlags = [Feature::GnulibTests, Feature::Probes, Feature::Daemon]
            .into_iter()
            .collect();
        assert_eq!(
            flags.configure_args(),
            vec!["--disable-probes", "--disable-daemon", "--disable-gnulib-tests"]
        );
    }

    #[test]
    fn test_all_disabled() {
        let flags = FeatureFlags::all_disabled();
        for feature in Feature::iter() {
            assert!(flags.is_disabled(feature));
        }
        assert!(flags.configure_args().contains(&"--disable-appliance".to_string()));
        assert!(FeatureFlags::none().configure_args().is_empty());
    }
}
