//! End-to-end scenarios against a local location
//!
//! Exercises the storage contract the way a file-management caller would:
//! nested mkdir, file and tree copies, non-recursive vs recursive removal,
//! and the listing failure sentinel.

use std::fs;

use fsbridge::{
    Backend, BackendError, FileUpload, LocalBackend, LocalConfig, MkdirOptions, RemoveOptions,
    UploadOptions,
};
use tempfile::TempDir;

const TEST_DATA: &[u8] = b"This is test data.\n"; // 19 bytes

fn seeded_location() -> (LocalBackend, TempDir) {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("test.txt"), TEST_DATA).unwrap();
    let config = LocalConfig::new(temp.path()).with_url("http://example.com/tmp/");
    (LocalBackend::new(config), temp)
}

#[test]
fn full_file_management_scenario() {
    let (backend, temp) = seeded_location();
    assert_eq!(TEST_DATA.len(), 19);

    // nested directory creation
    backend
        .mkdir("Test_1/first", MkdirOptions::default())
        .unwrap();
    assert!(temp.path().join("Test_1/first").is_dir());

    // single-file copy keeps the byte count
    backend.copy("test.txt", "Test_1/test.txt").unwrap();
    let listing = backend.ls("Test_1").unwrap();
    let copied = listing.iter().find(|e| e.name() == "test.txt").unwrap();
    assert_eq!(copied.size(), Some(19));

    // tree copy reproduces every child
    backend.copy("Test_1", "Test_3").unwrap();
    assert!(temp.path().join("Test_3/first").is_dir());
    assert_eq!(
        fs::read(temp.path().join("Test_3/test.txt")).unwrap(),
        TEST_DATA
    );

    // a populated directory survives a non-recursive remove
    assert!(backend
        .remove("Test_1", RemoveOptions { recursive: false })
        .is_err());
    assert!(temp.path().join("Test_1").is_dir());

    // and is fully gone after a recursive one
    backend.remove("Test_1", RemoveOptions::default()).unwrap();
    assert!(!temp.path().join("Test_1").exists());
    assert!(!temp.path().join("Test_1/first").exists());
}

#[test]
fn listing_entities_carry_urls_and_paths() {
    let (backend, _temp) = seeded_location();
    backend
        .mkdir("Test_3/first", MkdirOptions::default())
        .unwrap();
    backend.copy("test.txt", "Test_3/test.txt").unwrap();

    let listing = backend.ls("Test_3").unwrap();
    let names: Vec<&str> = listing.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["first", "test.txt"]);

    for entity in &listing {
        assert_eq!(entity.path(), "/Test_3/");
        assert_eq!(
            entity.url(),
            Some(format!("http://example.com/tmp/Test_3/{}", entity.name()).as_str())
        );
    }
    assert!(listing[0].is_dir());
    assert_eq!(listing[0].size(), None);
    assert_eq!(listing[1].size(), Some(19));
}

#[test]
fn copy_then_remove_matches_move_for_files() {
    let (backend, temp) = seeded_location();

    backend.copy("test.txt", "copied.txt").unwrap();
    backend
        .remove("test.txt", RemoveOptions::default())
        .unwrap();

    let via_copy = fs::read(temp.path().join("copied.txt")).unwrap();

    backend.mv("copied.txt", "moved.txt").unwrap();
    let via_move = fs::read(temp.path().join("moved.txt")).unwrap();

    assert_eq!(via_copy, via_move);
    assert_eq!(via_move, TEST_DATA);
    assert!(!temp.path().join("copied.txt").exists());
}

#[test]
fn listing_sentinel_is_distinct_from_empty_listing() {
    let (backend, _temp) = seeded_location();
    backend.mkdir("empty", MkdirOptions::default()).unwrap();

    assert!(matches!(
        backend.ls("does_not_exist"),
        Err(BackendError::NotFound(_))
    ));
    assert!(matches!(
        backend.ls("test.txt"),
        Err(BackendError::NotADirectory(_))
    ));
    assert_eq!(backend.ls("empty").unwrap().len(), 0);
}

#[test]
fn mkdir_recursion_contract() {
    let (backend, temp) = seeded_location();

    assert!(matches!(
        backend.mkdir(
            "a/b/c",
            MkdirOptions {
                recursive: false,
                ..Default::default()
            }
        ),
        Err(BackendError::NotFound(_))
    ));
    assert!(!temp.path().join("a").exists());

    backend.mkdir("a/b/c", MkdirOptions::default()).unwrap();
    assert!(temp.path().join("a").is_dir());
    assert!(temp.path().join("a/b").is_dir());
    assert!(temp.path().join("a/b/c").is_dir());
}

#[test]
fn copy_and_move_refuse_existing_destinations() {
    let (backend, temp) = seeded_location();
    fs::write(temp.path().join("other.txt"), b"other").unwrap();

    assert!(matches!(
        backend.copy("test.txt", "other.txt"),
        Err(BackendError::AlreadyExists(_))
    ));
    assert!(matches!(
        backend.mv("test.txt", "other.txt"),
        Err(BackendError::AlreadyExists(_))
    ));

    // no side effects
    assert_eq!(fs::read(temp.path().join("other.txt")).unwrap(), b"other");
    assert_eq!(fs::read(temp.path().join("test.txt")).unwrap(), TEST_DATA);
}

#[test]
fn upload_requires_an_existing_destination_directory() {
    let (backend, temp) = seeded_location();

    let staging = temp.path().join("incoming.part");
    fs::write(&staging, b"payload").unwrap();
    let file = FileUpload::new("incoming.txt", &staging, 7);

    assert!(matches!(
        backend.upload(&file, "missing_dir", UploadOptions::default()),
        Err(BackendError::NotADirectory(_))
    ));

    // a refused upload neither consumes the staged file nor creates anything
    assert!(staging.exists());
    assert!(!temp.path().join("missing_dir").exists());
}

#[test]
#[cfg(unix)]
fn failed_recursive_remove_leaves_the_directory_in_place() {
    let (backend, temp) = seeded_location();
    backend.mkdir("outer", MkdirOptions::default()).unwrap();
    // A dangling symlink lists as a child but reads as absent when removed,
    // so the recursion fails on it before touching anything that sorts later.
    std::os::unix::fs::symlink("missing_target", temp.path().join("outer/0_broken")).unwrap();
    fs::write(temp.path().join("outer/pinned.txt"), b"x").unwrap();

    assert!(matches!(
        backend.remove("outer", RemoveOptions::default()),
        Err(BackendError::NotFound(_))
    ));

    // the directory itself only falls once every child is gone
    assert!(temp.path().join("outer").is_dir());
    assert!(temp.path().join("outer/pinned.txt").exists());
}

#[test]
fn equivalent_path_spellings_resolve_identically() {
    let (backend, temp) = seeded_location();
    backend.mkdir("a/b", MkdirOptions::default()).unwrap();

    assert!(backend.ls("/a/b/").unwrap().is_empty());
    assert!(backend.ls("a///b").unwrap().is_empty());
    backend
        .remove("/a//b/", RemoveOptions::default())
        .unwrap();
    assert!(!temp.path().join("a/b").exists());
}
