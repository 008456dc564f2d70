//! Canonical config naming and per-scanner config deduplication.
//!
//! Many option-tree leaves resolve to the same pipeline (two schemes without
//! tests share one "no test" config). Scanners describe a leaf with a
//! [`ConfigDescriptor`], derive its canonical name, and only generate
//! pipeline text the first time that name shows up.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Feature that changes the generated pipeline.
///
/// Ordering of the variants is the order suffixes appear in config names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigFlag {
    ProjectType(String),
    Expo,
    Yarn,
    HasPodfile,
    Carthage(String),
    NugetPackages,
    XamarinComponents,
    Jasmine,
    Karma,
    HasTests,
    HasAppClip,
    Platform(String),
    MissingSharedSchemes,
}

impl ConfigFlag {
    fn suffix(&self) -> String {
        match self {
            ConfigFlag::ProjectType(kind) => kind.clone(),
            ConfigFlag::Expo => "expo".to_string(),
            ConfigFlag::Yarn => "yarn".to_string(),
            ConfigFlag::HasPodfile => "pod".to_string(),
            ConfigFlag::Carthage(command) => format!("carthage-{}", command),
            ConfigFlag::NugetPackages => "nuget".to_string(),
            ConfigFlag::XamarinComponents => "components".to_string(),
            ConfigFlag::Jasmine => "jasmine".to_string(),
            ConfigFlag::Karma => "karma".to_string(),
            ConfigFlag::HasTests => "test".to_string(),
            ConfigFlag::HasAppClip => "app-clip".to_string(),
            ConfigFlag::Platform(platform) => platform.clone(),
            ConfigFlag::MissingSharedSchemes => "missing-shared-schemes".to_string(),
        }
    }
}

/// Structured, order-independent description of one pipeline variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigDescriptor {
    pub platform: String,
    pub flags: BTreeSet<ConfigFlag>,
}

impl ConfigDescriptor {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            flags: BTreeSet::new(),
        }
    }

    pub fn with(mut self, flag: ConfigFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn with_if(self, condition: bool, flag: ConfigFlag) -> Self {
        if condition {
            self.with(flag)
        } else {
            self
        }
    }

    pub fn has(&self, flag: &ConfigFlag) -> bool {
        self.flags.contains(flag)
    }

    /// `<platform>[-<flag>...]-config`, flags in their canonical order.
    pub fn config_name(&self) -> String {
        let mut parts = vec![self.platform.clone()];
        parts.extend(self.flags.iter().map(ConfigFlag::suffix));
        parts.push("config".to_string());
        parts.join("-")
    }
}

impl fmt::Display for ConfigDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_name())
    }
}

/// Name of the config a scanner emits in manual mode.
pub fn default_config_name(platform: &str) -> String {
    format!("default-{}-config", platform)
}

/// Config name → generated pipeline text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, String>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.0.insert(name.into(), text.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Generates each distinct config once.
#[derive(Debug, Default)]
pub struct ConfigCatalog {
    configs: ConfigMap,
    generated: usize,
}

impl ConfigCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical name, running `generate` only for unseen names.
    pub fn get_or_generate<F>(
        &mut self,
        descriptor: &ConfigDescriptor,
        generate: F,
    ) -> anyhow::Result<String>
    where
        F: FnOnce(&ConfigDescriptor) -> anyhow::Result<String>,
    {
        let name = descriptor.config_name();
        if !self.configs.contains(&name) {
            let text = generate(descriptor)?;
            self.configs.insert(name.clone(), text);
            self.generated += 1;
        }
        Ok(name)
    }

    /// How many times a generator actually ran.
    pub fn generated_count(&self) -> usize {
        self.generated
    }

    pub fn into_config_map(self) -> ConfigMap {
        self.configs
    }
}
