//! # Local Filesystem Backend

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityData};
use super::errors::{BackendError, BackendResult};
use super::path as logical;
use super::{Backend, FileUpload, MkdirOptions, RemoveOptions, TransferStatus, UploadOptions};

/// Configuration of a local location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root directory every logical path is resolved against
    pub location: PathBuf,

    /// Public URL prefix, when the location has web access
    #[serde(default)]
    pub url: Option<String>,
}

impl LocalConfig {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Storage backend over a local directory tree
#[derive(Debug)]
pub struct LocalBackend {
    config: LocalConfig,
}

impl LocalBackend {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    /// Translate a logical path into a native one under the root
    fn native(&self, path: &str) -> PathBuf {
        let rel = logical::normalize(path);
        if rel.is_empty() {
            self.config.location.clone()
        } else {
            self.config.location.join(rel)
        }
    }
}

#[cfg(unix)]
fn mode_string(metadata: &fs::Metadata) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;
    let octal = format!("{:o}", metadata.permissions().mode());
    let tail = octal.len().saturating_sub(4);
    Some(octal[tail..].to_string())
}

#[cfg(not(unix))]
fn mode_string(_metadata: &fs::Metadata) -> Option<String> {
    None
}

#[cfg(unix)]
fn set_mode(path: &std::path::Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &std::path::Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

impl Backend for LocalBackend {
    fn ls(&self, path: &str) -> BackendResult<Vec<Entity<'_>>> {
        let rel = logical::normalize(path);
        let dir = self.native(&rel);

        if !dir.is_dir() {
            return Err(if dir.exists() {
                BackendError::NotADirectory(rel)
            } else {
                BackendError::NotFound(rel)
            });
        }

        let parent = logical::display_dir(&rel);
        let mut entries = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = entry.metadata()?;
            let is_dir = metadata.is_dir();

            let url = self
                .config
                .url
                .as_ref()
                .map(|u| format!("{}{}{}", u.trim_end_matches('/'), parent, name));

            entries.push(Entity::new(
                EntityData {
                    name,
                    dir: is_dir,
                    url,
                    path: parent.clone(),
                    size: if is_dir { None } else { Some(metadata.len()) },
                    mode: mode_string(&metadata),
                    modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                },
                self,
            ));
        }

        // read_dir order is platform-defined; keep listings deterministic
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }

    fn mkdir(&self, name: &str, options: MkdirOptions) -> BackendResult<()> {
        let target = logical::normalize(name);
        if target.is_empty() || self.native(&target).exists() {
            return Err(BackendError::AlreadyExists(logical::display_dir(&target)));
        }

        if options.recursive {
            let mut current = self.config.location.clone();
            for segment in target.split('/') {
                current.push(segment);
                if current.is_dir() {
                    continue;
                }
                fs::create_dir(&current)?;
                set_mode(&current, options.mode)?;
            }
            Ok(())
        } else {
            let native = self.native(&target);
            fs::create_dir(&native).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BackendError::NotFound(target.clone()),
                io::ErrorKind::AlreadyExists => BackendError::AlreadyExists(target.clone()),
                _ => BackendError::Io(e.to_string()),
            })?;
            set_mode(&native, options.mode)?;
            Ok(())
        }
    }

    fn upload(
        &self,
        file: &FileUpload,
        destination: &str,
        options: UploadOptions,
    ) -> BackendResult<()> {
        if file.status != TransferStatus::Complete {
            return Err(BackendError::TransferIncomplete(file.name.clone()));
        }

        let rel = logical::normalize(destination);
        let dest_dir = self.native(&rel);
        if !dest_dir.is_dir() {
            return Err(BackendError::NotADirectory(rel));
        }

        if !file.tmp_path.is_file() {
            return Err(BackendError::NotFound(
                file.tmp_path.to_string_lossy().into_owned(),
            ));
        }

        let target = dest_dir.join(&file.name);
        if target.exists() && !options.overwrite {
            return Err(BackendError::AlreadyExists(logical::join(&rel, &file.name)));
        }

        // The staged copy is consumed by moving it into place.
        fs::rename(&file.tmp_path, &target)?;
        Ok(())
    }

    fn copy(&self, source: &str, destination: &str) -> BackendResult<()> {
        let src_rel = logical::normalize(source);
        let dst_rel = logical::normalize(destination);
        let src = self.native(&src_rel);
        let dst = self.native(&dst_rel);

        if !src.exists() {
            return Err(BackendError::NotFound(src_rel));
        }
        if dst.exists() {
            return Err(BackendError::AlreadyExists(dst_rel));
        }

        if src.is_dir() {
            self.mkdir(&dst_rel, MkdirOptions::default())?;
            for child in self.ls(&src_rel)? {
                child.copy(&format!("{}/{}", dst_rel, child.name()))?;
            }
            Ok(())
        } else {
            fs::copy(&src, &dst)?;
            Ok(())
        }
    }

    fn mv(&self, source: &str, destination: &str) -> BackendResult<()> {
        let src_rel = logical::normalize(source);
        let dst_rel = logical::normalize(destination);
        let src = self.native(&src_rel);
        let dst = self.native(&dst_rel);

        if !src.exists() {
            return Err(BackendError::NotFound(src_rel));
        }
        if dst.exists() {
            return Err(BackendError::AlreadyExists(dst_rel));
        }

        fs::rename(&src, &dst)?;
        Ok(())
    }

    fn remove(&self, path: &str, options: RemoveOptions) -> BackendResult<()> {
        let rel = logical::normalize(path);
        let native = self.native(&rel);

        if !native.exists() {
            return Err(BackendError::NotFound(rel));
        }

        if native.is_dir() {
            if options.recursive {
                for child in self.ls(&rel)? {
                    child.remove(options)?;
                }
            }
            // Removal of a still-populated directory fails here and the
            // native error is surfaced, not swallowed.
            fs::remove_dir(&native)?;
            Ok(())
        } else {
            fs::remove_file(&native)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend(temp: &TempDir) -> LocalBackend {
        LocalBackend::new(LocalConfig::new(temp.path()))
    }

    #[test]
    fn test_ls_reports_metadata() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), b"hello").unwrap();
        fs::create_dir(temp.path().join("a_dir")).unwrap();

        let config = LocalConfig::new(temp.path()).with_url("http://example.com/tmp/");
        let backend = LocalBackend::new(config);

        let entries = backend.ls("").unwrap();
        assert_eq!(entries.len(), 2);

        // sorted by name
        assert_eq!(entries[0].name(), "a_dir");
        assert!(entries[0].is_dir());
        assert_eq!(entries[0].size(), None);
        assert_eq!(entries[0].path(), "/");

        assert_eq!(entries[1].name(), "b.txt");
        assert!(!entries[1].is_dir());
        assert_eq!(entries[1].size(), Some(5));
        assert_eq!(entries[1].url(), Some("http://example.com/tmp/b.txt"));
        assert!(entries[1].modified().is_some());
        #[cfg(unix)]
        assert!(entries[1].mode().is_some());
    }

    #[test]
    fn test_ls_sentinel_is_distinct_from_empty() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("empty")).unwrap();
        fs::write(temp.path().join("plain.txt"), b"x").unwrap();
        let backend = backend(&temp);

        assert!(matches!(backend.ls("missing"), Err(BackendError::NotFound(_))));
        assert!(matches!(
            backend.ls("plain.txt"),
            Err(BackendError::NotADirectory(_))
        ));
        assert!(backend.ls("empty").unwrap().is_empty());
    }

    #[test]
    fn test_mkdir_recursive_creates_ancestors() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);

        backend.mkdir("a/b/c", MkdirOptions::default()).unwrap();
        assert!(temp.path().join("a/b/c").is_dir());
    }

    #[test]
    fn test_mkdir_non_recursive_requires_ancestors() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        let options = MkdirOptions {
            recursive: false,
            ..Default::default()
        };

        assert!(matches!(
            backend.mkdir("a/b/c", options),
            Err(BackendError::NotFound(_))
        ));
        backend.mkdir("a", options).unwrap();
        assert!(temp.path().join("a").is_dir());
    }

    #[test]
    fn test_mkdir_fails_on_existing_target() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);

        backend.mkdir("a", MkdirOptions::default()).unwrap();
        assert!(matches!(
            backend.mkdir("a", MkdirOptions::default()),
            Err(BackendError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_upload_moves_staged_file() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);

        let staging = temp.path().join("staged.part");
        fs::write(&staging, b"payload").unwrap();

        let file = FileUpload::new("final.txt", &staging, 7);
        backend.upload(&file, "", UploadOptions::default()).unwrap();

        assert!(!staging.exists());
        assert_eq!(fs::read(temp.path().join("final.txt")).unwrap(), b"payload");
    }

    #[test]
    fn test_upload_rejects_incomplete_transfer() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);

        let mut file = FileUpload::new("x.txt", temp.path().join("nope"), 0);
        file.status = TransferStatus::Partial;
        assert!(matches!(
            backend.upload(&file, "", UploadOptions::default()),
            Err(BackendError::TransferIncomplete(_))
        ));
    }

    #[test]
    fn test_upload_respects_overwrite_flag() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        fs::write(temp.path().join("taken.txt"), b"old").unwrap();

        let staging = temp.path().join("staged.part");
        fs::write(&staging, b"new").unwrap();
        let file = FileUpload::new("taken.txt", &staging, 3);

        assert!(matches!(
            backend.upload(&file, "", UploadOptions::default()),
            Err(BackendError::AlreadyExists(_))
        ));

        backend
            .upload(&file, "", UploadOptions { overwrite: true })
            .unwrap();
        assert_eq!(fs::read(temp.path().join("taken.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_copy_directory_recurses() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);

        backend.mkdir("tree/inner", MkdirOptions::default()).unwrap();
        fs::write(temp.path().join("tree/file.txt"), b"data").unwrap();

        backend.copy("tree", "clone").unwrap();
        assert!(temp.path().join("clone/inner").is_dir());
        assert_eq!(fs::read(temp.path().join("clone/file.txt")).unwrap(), b"data");
        // source untouched
        assert!(temp.path().join("tree/file.txt").exists());
    }

    #[test]
    fn test_copy_failure_conditions() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        fs::write(temp.path().join("here.txt"), b"x").unwrap();

        assert!(matches!(
            backend.copy("ghost.txt", "out.txt"),
            Err(BackendError::NotFound(_))
        ));
        assert!(matches!(
            backend.copy("here.txt", "here.txt"),
            Err(BackendError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_mv_renames_and_checks_destination() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        fs::write(temp.path().join("from.txt"), b"x").unwrap();
        fs::write(temp.path().join("busy.txt"), b"y").unwrap();

        assert!(matches!(
            backend.mv("from.txt", "busy.txt"),
            Err(BackendError::AlreadyExists(_))
        ));

        backend.mv("from.txt", "to.txt").unwrap();
        assert!(!temp.path().join("from.txt").exists());
        assert!(temp.path().join("to.txt").exists());
    }

    #[test]
    fn test_remove_non_recursive_keeps_populated_directory() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        backend.mkdir("full", MkdirOptions::default()).unwrap();
        fs::write(temp.path().join("full/kept.txt"), b"x").unwrap();

        let result = backend.remove("full", RemoveOptions { recursive: false });
        assert!(result.is_err());
        assert!(temp.path().join("full/kept.txt").exists());
    }

    #[test]
    fn test_remove_recursive_clears_tree() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        backend.mkdir("full/nested", MkdirOptions::default()).unwrap();
        fs::write(temp.path().join("full/kept.txt"), b"x").unwrap();

        backend.remove("full", RemoveOptions::default()).unwrap();
        assert!(!temp.path().join("full").exists());
    }

    #[test]
    fn test_remove_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let backend = backend(&temp);
        assert!(matches!(
            backend.remove("ghost", RemoveOptions::default()),
            Err(BackendError::NotFound(_))
        ));
    }
}
