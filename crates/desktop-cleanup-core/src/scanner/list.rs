use glob::Pattern;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error};

use crate::config::{AppConfig, CleanupRoot, CleanupRoots};
use crate::error::Error;
use crate::shortcut::{accessed_from_system_time, ActiveSet, ShortcutRecord};

/// Decides which direct entries of a root count as shortcuts.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    skip_extensions: Vec<String>,
    ignore_patterns: Vec<Pattern>,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl EntryFilter {
    pub fn from_config(config: &AppConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            skip_extensions: config
                .skip_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            ignore_patterns,
        }
    }

    /// Hidden files, housekeeping extensions and ignored names are skipped.
    pub fn accepts(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        if let Some(ext) = Path::new(name).extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if self.skip_extensions.iter().any(|skip| *skip == ext) {
                return false;
            }
        }
        !self.ignore_patterns.iter().any(|p| p.matches(name))
    }
}

/// List every root (non-recursively) and return the shortcuts found,
/// oldest access first.
pub fn scan_roots(roots: &CleanupRoots, filter: &EntryFilter) -> Result<ActiveSet, Error> {
    let mut found = ActiveSet::new();
    for root in roots.iter() {
        scan_dir(root, filter, &mut found)?;
    }
    found.sort_by_accessed();
    Ok(found)
}

fn scan_dir(root: &CleanupRoot, filter: &EntryFilter, found: &mut ActiveSet) -> Result<(), Error> {
    let entries = match fs::read_dir(&root.path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::DirectoryNotFound(root.path.clone()));
        }
        Err(err) => {
            return Err(Error::Io(io::Error::new(
                err.kind(),
                format!("Error reading directory {}: {}", root.path.display(), err),
            )));
        }
    };

    let parent = root.path.to_string_lossy().into_owned();

    for entry_result in entries {
        let entry = entry_result.map_err(|err| {
            io::Error::new(
                err.kind(),
                format!(
                    "Error reading entry in directory {}: {}",
                    root.path.display(),
                    err
                ),
            )
        })?;

        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        let metadata = match entry_metadata(&path) {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!("Skipping {}, removed while listing", path.display());
                continue;
            }
            Err(err) => {
                return Err(Error::Io(io::Error::new(
                    err.kind(),
                    format!("Error getting metadata for {}: {}", path.display(), err),
                )));
            }
        };

        if metadata.is_dir() {
            continue;
        }
        if !filter.accepts(&name) {
            debug!("Skipping {}", path.display());
            continue;
        }

        let accessed = accessed_from_system_time(metadata.accessed()?);
        found.insert(ShortcutRecord::new(
            name,
            path.to_string_lossy().into_owned(),
            parent.clone(),
            root.label.clone(),
            accessed,
        ));
    }

    Ok(())
}

/// Metadata of the link target, or of the link itself when the target is
/// gone. `None` when the entry vanished after `read_dir` listed it.
fn entry_metadata(path: &Path) -> io::Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => match fs::symlink_metadata(path) {
            Ok(link) => {
                debug!("Dangling link {}", path.display());
                Ok(Some(link))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_skips_hidden_and_housekeeping() {
        let filter = EntryFilter::default();
        assert!(filter.accepts("Browser.lnk"));
        assert!(filter.accepts("notes.desktop"));
        assert!(!filter.accepts(".hidden.lnk"));
        assert!(!filter.accepts("desktop.ini"));
        assert!(!filter.accepts("DESKTOP.INI"));
    }

    #[test]
    fn test_filter_applies_ignore_patterns() {
        let config = AppConfig {
            ignore_patterns: vec!["Keep*".to_string(), "[".to_string()],
            ..AppConfig::default()
        };
        let filter = EntryFilter::from_config(&config);
        assert!(!filter.accepts("Keep Me.lnk"));
        assert!(filter.accepts("Drop Me.lnk"));
    }

    #[test]
    fn test_vanished_entry_has_no_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(entry_metadata(&tmp.path().join("gone.lnk")).unwrap().is_none());
    }
}
