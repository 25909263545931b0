use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::Error;
use crate::platform;

pub const PUBLIC_LABEL: &str = "Public";
pub const PERSONAL_BUCKET: &str = "Unused Shortcuts";
pub const PUBLIC_BUCKET: &str = "Unused Public Shortcuts";
pub const HANDOFF_FILE_NAME: &str = "desktopcleanup.tmp";

#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
    pub label: String,
    pub path: String,
    /// Shared roots get their own bucket so files from both origins never mix.
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Empty means the platform defaults (personal desktop, plus the public
    /// desktop where one exists).
    #[serde(default)]
    pub roots: Vec<RootConfig>,
    #[serde(default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub handoff_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            skip_extensions: default_skip_extensions(),
            ignore_patterns: Vec::new(),
            handoff_path: None,
        }
    }
}

fn default_skip_extensions() -> Vec<String> {
    vec!["ini".to_string()]
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("DESKTOP_CLEANUP").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

impl AppConfig {
    /// Configured roots, or the platform defaults when none are configured.
    pub fn root_configs(&self) -> Vec<RootConfig> {
        if self.roots.is_empty() {
            platform::default_roots()
        } else {
            self.roots.clone()
        }
    }

    pub fn handoff_path(&self) -> PathBuf {
        match &self.handoff_path {
            Some(path) => PathBuf::from(path),
            None => platform::home_dir().join(HANDOFF_FILE_NAME),
        }
    }
}

/// One directory the scanner lists and the cleaner moves out of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRoot {
    pub label: String,
    pub path: PathBuf,
    pub shared: bool,
}

impl CleanupRoot {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>, shared: bool) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            shared,
        }
    }

    pub fn bucket_name(&self) -> &'static str {
        if self.shared {
            PUBLIC_BUCKET
        } else {
            PERSONAL_BUCKET
        }
    }

    pub fn bucket_dir(&self) -> PathBuf {
        self.path.join(self.bucket_name())
    }
}

/// The roots this run works on. Built once at startup; roots missing on
/// this machine are dropped here and never reconsidered mid-run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupRoots {
    roots: Vec<CleanupRoot>,
}

impl CleanupRoots {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::from_candidates(
            config
                .root_configs()
                .into_iter()
                .map(|r| CleanupRoot::new(r.label, r.path, r.shared)),
        )
    }

    pub fn from_candidates<I>(candidates: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = CleanupRoot>,
    {
        let mut labels = HashSet::new();
        let mut roots = Vec::new();

        for root in candidates {
            if !labels.insert(root.label.clone()) {
                return Err(Error::Config(ConfigError::Message(format!(
                    "duplicate cleanup root label '{}'",
                    root.label
                ))));
            }
            if !root.path.is_dir() {
                info!("Ignoring missing {:?}", root.path.display().to_string());
                continue;
            }
            debug!("Cleanup root '{}' -> {}", root.label, root.path.display());
            roots.push(root);
        }

        Ok(Self { roots })
    }

    pub fn get(&self, label: &str) -> Option<&CleanupRoot> {
        self.roots.iter().find(|r| r.label == label)
    }

    pub fn bucket_for(&self, label: &str) -> Option<PathBuf> {
        self.get(label).map(CleanupRoot::bucket_dir)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CleanupRoot> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_roots_are_dropped_at_construction() {
        let tmp = tempdir().unwrap();
        let desktop = tmp.path().join("Desktop");
        std::fs::create_dir_all(&desktop).unwrap();

        let roots = CleanupRoots::from_candidates(vec![
            CleanupRoot::new("u", &desktop, false),
            CleanupRoot::new(PUBLIC_LABEL, tmp.path().join("Public").join("Desktop"), true),
        ])
        .unwrap();

        assert_eq!(roots.len(), 1);
        assert!(roots.get("u").is_some());
        assert!(roots.get(PUBLIC_LABEL).is_none());
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let tmp = tempdir().unwrap();
        let result = CleanupRoots::from_candidates(vec![
            CleanupRoot::new("u", tmp.path(), false),
            CleanupRoot::new("u", tmp.path(), true),
        ]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bucket_names_differ_by_root_kind() {
        let personal = CleanupRoot::new("u", "/home/u/Desktop", false);
        let public = CleanupRoot::new(PUBLIC_LABEL, "/home/u/Desktop", true);
        assert_eq!(personal.bucket_dir(), PathBuf::from("/home/u/Desktop/Unused Shortcuts"));
        assert_eq!(
            public.bucket_dir(),
            PathBuf::from("/home/u/Desktop/Unused Public Shortcuts")
        );
    }

    #[test]
    fn test_explicit_handoff_path_wins() {
        let config = AppConfig {
            handoff_path: Some("/tmp/handoff.json".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.handoff_path(), PathBuf::from("/tmp/handoff.json"));
        assert_eq!(config.skip_extensions, vec!["ini".to_string()]);
    }
}
