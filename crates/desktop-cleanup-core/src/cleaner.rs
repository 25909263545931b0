use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::CleanupRoots;
use crate::error::Error;
use crate::scanner::{self, EntryFilter};
use crate::shortcut::{ActiveSet, ShortcutRecord};

/// Filesystem operations used for a cleanup. Both must report a denied
/// operation as `io::ErrorKind::PermissionDenied`.
pub trait FileMover {
    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    /// Same-volume rename. An existing file at the destination is replaced.
    fn move_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::rename(src, dst)
    }
}

#[derive(Debug, Default)]
pub struct FsMover;

impl FileMover for FsMover {}

/// Owns the active set and moves shortcuts into their root's bucket.
pub struct ShortcutCleaner {
    roots: CleanupRoots,
    filter: EntryFilter,
    mover: Box<dyn FileMover>,
    shortcuts: ActiveSet,
}

impl ShortcutCleaner {
    pub fn new(roots: CleanupRoots) -> Self {
        Self {
            roots,
            filter: EntryFilter::default(),
            mover: Box::new(FsMover),
            shortcuts: ActiveSet::new(),
        }
    }

    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_mover(mut self, mover: Box<dyn FileMover>) -> Self {
        self.mover = mover;
        self
    }

    pub fn roots(&self) -> &CleanupRoots {
        &self.roots
    }

    pub fn shortcuts(&self) -> &ActiveSet {
        &self.shortcuts
    }

    pub fn shortcuts_mut(&mut self) -> &mut ActiveSet {
        &mut self.shortcuts
    }

    /// Swap in a set restored from a handoff.
    pub fn replace_shortcuts(&mut self, shortcuts: ActiveSet) {
        self.shortcuts = shortcuts;
    }

    /// Replace the active set with a fresh listing of every root.
    pub fn scan(&mut self) -> Result<&ActiveSet, Error> {
        self.shortcuts.clear();
        self.shortcuts = scanner::scan_roots(&self.roots, &self.filter)?;
        info!("Found {} shortcuts", self.shortcuts.len());
        Ok(&self.shortcuts)
    }

    pub fn get(&self, path: &str) -> Result<&ShortcutRecord, Error> {
        self.shortcuts
            .get(path)
            .ok_or_else(|| Error::Lookup(path.to_string()))
    }

    /// Where `path` would be moved to.
    pub fn destination(&self, path: &str) -> Result<PathBuf, Error> {
        let shortcut = self.get(path)?;
        let bucket = self
            .roots
            .bucket_for(&shortcut.caption)
            .ok_or_else(|| Error::UnknownRoot(shortcut.caption.clone()))?;
        Ok(bucket.join(&shortcut.name))
    }

    /// Move one shortcut into its bucket and stop tracking it. On any error
    /// the record stays in the active set.
    pub fn clean(&mut self, path: &str) -> Result<(), Error> {
        let dst_path = self.destination(path)?;
        let shortcut = self.get(path)?;

        if let Some(bucket) = dst_path.parent() {
            self.mover.ensure_dir(bucket).map_err(|e| classify(path, e))?;
        }
        info!("mv {:?} {:?}", shortcut.path, dst_path.display().to_string());
        self.mover
            .move_file(Path::new(&shortcut.path), &dst_path)
            .map_err(|e| classify(path, e))?;

        self.shortcuts.remove(path);
        Ok(())
    }
}

fn classify(path: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::PermissionDenied {
        Error::PermissionDenied {
            path: path.to_string(),
            source: err,
        }
    } else {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CleanupRoot, PUBLIC_LABEL};
    use crate::shortcut::from_epoch_seconds;
    use tempfile::tempdir;

    #[test]
    fn test_destinations_separate_personal_and_public() {
        let tmp = tempdir().unwrap();
        let personal = tmp.path().join("u").join("Desktop");
        let public = tmp.path().join("Public").join("Desktop");
        fs::create_dir_all(&personal).unwrap();
        fs::create_dir_all(&public).unwrap();

        let roots = CleanupRoots::from_candidates(vec![
            CleanupRoot::new("u", &personal, false),
            CleanupRoot::new(PUBLIC_LABEL, &public, true),
        ])
        .unwrap();
        let mut cleaner = ShortcutCleaner::new(roots);
        for (root, caption) in [(&personal, "u"), (&public, PUBLIC_LABEL)] {
            let path = root.join("x.lnk").to_string_lossy().into_owned();
            cleaner.shortcuts_mut().insert(ShortcutRecord::new(
                "x.lnk",
                path,
                root.to_string_lossy().into_owned(),
                caption,
                from_epoch_seconds(1),
            ));
        }

        let personal_dst = cleaner
            .destination(&personal.join("x.lnk").to_string_lossy())
            .unwrap();
        let public_dst = cleaner
            .destination(&public.join("x.lnk").to_string_lossy())
            .unwrap();

        assert_ne!(personal_dst, public_dst);
        assert_eq!(personal_dst, personal.join("Unused Shortcuts").join("x.lnk"));
        assert_eq!(public_dst, public.join("Unused Public Shortcuts").join("x.lnk"));
    }

    #[test]
    fn test_unknown_caption_keeps_record() {
        let tmp = tempdir().unwrap();
        let roots =
            CleanupRoots::from_candidates(vec![CleanupRoot::new("u", tmp.path(), false)]).unwrap();
        let mut cleaner = ShortcutCleaner::new(roots);
        let path = tmp.path().join("a.lnk");
        fs::write(&path, b"").unwrap();
        let path = path.to_string_lossy().into_owned();
        cleaner.shortcuts_mut().insert(ShortcutRecord::new(
            "a.lnk",
            path.clone(),
            tmp.path().to_string_lossy().into_owned(),
            "someone-else",
            from_epoch_seconds(1),
        ));

        let err = cleaner.clean(&path).unwrap_err();
        assert!(matches!(err, Error::UnknownRoot(ref label) if label == "someone-else"));
        assert!(cleaner.shortcuts().contains(&path));
    }
}
