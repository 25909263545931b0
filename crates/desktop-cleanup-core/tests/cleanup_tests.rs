use filetime::{set_file_atime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use desktop_cleanup_core::config::PUBLIC_LABEL;
use desktop_cleanup_core::{CleanupRoot, CleanupRoots, Error, ShortcutCleaner};

fn create_desktop() -> (TempDir, PathBuf) {
    let tmp = tempdir().unwrap();
    let personal = tmp.path().join("u").join("Desktop");
    fs::create_dir_all(&personal).unwrap();
    (tmp, personal)
}

fn touch(dir: &Path, name: &str, accessed: i64) -> String {
    let path = dir.join(name);
    fs::write(&path, name.as_bytes()).unwrap();
    set_file_atime(&path, FileTime::from_unix_time(accessed, 0)).unwrap();
    path.to_string_lossy().into_owned()
}

fn personal_cleaner(personal: &Path) -> ShortcutCleaner {
    let roots = CleanupRoots::from_candidates(vec![CleanupRoot::new("u", personal, false)]).unwrap();
    ShortcutCleaner::new(roots)
}

#[test]
fn test_old_and_new_scenario() {
    let (_tmp, personal) = create_desktop();
    let old = touch(&personal, "old.lnk", 100);
    let new = touch(&personal, "new.lnk", 200);

    let mut cleaner = personal_cleaner(&personal);
    cleaner.scan().unwrap();
    assert_eq!(cleaner.shortcuts().paths(), vec![old.clone(), new.clone()]);

    for path in [&old, &new] {
        cleaner.shortcuts_mut().get_mut(path).unwrap().mark = true;
    }
    cleaner.clean(&old).unwrap();

    let moved = personal.join("Unused Shortcuts").join("old.lnk");
    assert!(moved.is_file());
    assert_eq!(fs::read(&moved).unwrap(), b"old.lnk");
    assert!(!Path::new(&old).exists());
    assert!(!cleaner.shortcuts().contains(&old));

    assert!(Path::new(&new).is_file());
    let remaining = cleaner.shortcuts().get(&new).unwrap();
    assert!(remaining.mark);
    assert_eq!(cleaner.shortcuts().len(), 1);
}

#[test]
fn test_bucket_creation_is_idempotent() {
    let (_tmp, personal) = create_desktop();
    let a = touch(&personal, "a.lnk", 1);
    let b = touch(&personal, "b.lnk", 2);

    let mut cleaner = personal_cleaner(&personal);
    cleaner.scan().unwrap();
    cleaner.clean(&a).unwrap();
    cleaner.clean(&b).unwrap();

    let bucket = personal.join("Unused Shortcuts");
    assert!(bucket.join("a.lnk").is_file());
    assert!(bucket.join("b.lnk").is_file());
    assert!(cleaner.shortcuts().is_empty());
}

#[test]
fn test_public_files_use_public_bucket() {
    let tmp = tempdir().unwrap();
    let personal = tmp.path().join("u").join("Desktop");
    let public = tmp.path().join("Public").join("Desktop");
    fs::create_dir_all(&personal).unwrap();
    fs::create_dir_all(&public).unwrap();
    let mine = touch(&personal, "x.lnk", 1);
    let shared = touch(&public, "x.lnk", 2);

    let roots = CleanupRoots::from_candidates(vec![
        CleanupRoot::new("u", &personal, false),
        CleanupRoot::new(PUBLIC_LABEL, &public, true),
    ])
    .unwrap();
    let mut cleaner = ShortcutCleaner::new(roots);
    cleaner.scan().unwrap();
    cleaner.clean(&mine).unwrap();
    cleaner.clean(&shared).unwrap();

    assert!(personal.join("Unused Shortcuts").join("x.lnk").is_file());
    assert!(public.join("Unused Public Shortcuts").join("x.lnk").is_file());
}

#[test]
fn test_clean_untracked_path_is_lookup_error() {
    let (_tmp, personal) = create_desktop();
    let stray = touch(&personal, "stray.lnk", 1);

    let mut cleaner = personal_cleaner(&personal);
    let err = cleaner.clean(&stray).unwrap_err();

    assert!(matches!(err, Error::Lookup(ref p) if *p == stray));
    assert!(Path::new(&stray).is_file());
}

#[test]
fn test_missing_source_is_unhandled_and_keeps_record() {
    let (_tmp, personal) = create_desktop();
    let gone = touch(&personal, "gone.lnk", 1);

    let mut cleaner = personal_cleaner(&personal);
    cleaner.scan().unwrap();
    fs::remove_file(&gone).unwrap();

    let err = cleaner.clean(&gone).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {:?}", err);
    assert!(!err.is_permission_denied());
    assert!(cleaner.shortcuts().contains(&gone));
}
