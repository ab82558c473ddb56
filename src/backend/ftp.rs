//! # FTP Backend
//!
//! Implements the storage contract over a stateful FTP control connection.
//! The protocol has no native "is this a directory" or "does this exist"
//! primitive, so both are emulated with extra round trips: a path is a
//! directory when its NLST listing carries the `.` and `..` pseudo-entries,
//! and a path exists when it is a directory or SIZE reports more than zero
//! bytes. A SIZE of exactly zero therefore reads as absent; zero-byte
//! remote files are misclassified and that behavior is kept.
//!
//! Remote-to-remote copies cannot stream over a single connection, so a
//! single file is staged through a local temporary file: RETR to the
//! staging file, STOR from it, and the staging file is deleted on every
//! exit path.

use std::fs;
use std::io;
use std::io::{Seek, SeekFrom};
use std::net::ToSocketAddrs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use suppaftp::types::FileType;
use suppaftp::{FtpError, Mode, RustlsConnector, RustlsFtpStream};
use tempfile::NamedTempFile;

use super::entity::{Entity, EntityData};
use super::errors::{BackendError, BackendResult};
use super::path as logical;
use super::{Backend, FileUpload, MkdirOptions, RemoveOptions, TransferStatus, UploadOptions};

fn default_port() -> u16 {
    21
}

fn default_username() -> String {
    "anonymous".to_string()
}

fn default_timeout_secs() -> u64 {
    90
}

/// Configuration of an FTP location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Upgrade the control connection to TLS before logging in
    #[serde(default)]
    pub secure: bool,

    /// Negotiate passive mode for data connections
    #[serde(default)]
    pub passive: bool,

    /// Connect timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Remote root directory every logical path is resolved against
    #[serde(default)]
    pub location: String,

    /// Public URL prefix, when the location has web access
    #[serde(default)]
    pub url: Option<String>,
}

impl FtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: default_username(),
            password: String::new(),
            secure: false,
            passive: false,
            timeout_secs: default_timeout_secs(),
            location: String::new(),
            url: None,
        }
    }
}

/// Storage backend over an FTP server
///
/// The connection is opened by `connect` and closed when the backend is
/// dropped; one backend owns exactly one control connection for its
/// lifetime.
pub struct FtpBackend {
    config: FtpConfig,
    conn: Mutex<RustlsFtpStream>,
}

impl std::fmt::Debug for FtpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpBackend")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("location", &self.config.location)
            .finish()
    }
}

impl FtpBackend {
    /// Open the transport, optionally upgrade to TLS, authenticate, switch
    /// to binary transfers and pick the data-connection mode.
    pub fn connect(config: FtpConfig) -> BackendResult<Self> {
        let addr = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?
            .next()
            .ok_or_else(|| {
                BackendError::ConnectionFailed(format!("{} did not resolve", config.host))
            })?;

        let mut stream =
            RustlsFtpStream::connect_timeout(addr, Duration::from_secs(config.timeout_secs))
                .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        if config.secure {
            let roots = rustls::RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            let tls = rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            stream = stream
                .into_secure(RustlsConnector::from(Arc::new(tls)), &config.host)
                .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        }

        stream
            .login(&config.username, &config.password)
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        stream.transfer_type(FileType::Binary)?;
        stream.set_mode(if config.passive {
            Mode::Passive
        } else {
            Mode::Active
        });

        debug!("connected to ftp://{}:{}", config.host, config.port);
        Ok(Self {
            config,
            conn: Mutex::new(stream),
        })
    }

    fn conn(&self) -> BackendResult<MutexGuard<'_, RustlsFtpStream>> {
        self.conn
            .lock()
            .map_err(|_| BackendError::Internal("Lock poisoned".into()))
    }

    /// Translate a logical path into a remote one under the location root
    fn remote(&self, path: &str) -> String {
        logical::join(&self.config.location, path)
    }

    /// Stage a single remote file locally, then upload it to `dst`.
    /// The staging file is removed on every exit path.
    fn copy_file(&self, src: &str, dst: &str) -> BackendResult<()> {
        let mut staging = NamedTempFile::new()?;
        debug!("staging {} through {}", src, staging.path().display());

        let mut conn = self.conn()?;
        conn.retr(src, |reader| {
            io::copy(reader, staging.as_file_mut()).map_err(FtpError::ConnectionError)?;
            Ok(())
        })?;

        staging
            .as_file_mut()
            .seek(SeekFrom::Start(0))
            .map_err(BackendError::from)?;
        conn.put_file(dst, staging.as_file_mut())?;
        Ok(())
    }
}

/// NLST variant that treats the empty path as "current directory"
fn nlst(conn: &mut RustlsFtpStream, remote: &str) -> suppaftp::FtpResult<Vec<String>> {
    if remote.is_empty() {
        conn.nlst(None)
    } else {
        conn.nlst(Some(remote))
    }
}

/// Emulated is-directory check: a directory's listing carries the `.` and
/// `..` pseudo-entries.
fn is_dir(conn: &mut RustlsFtpStream, remote: &str) -> bool {
    match nlst(conn, remote) {
        Ok(names) => {
            names.iter().any(|n| n == ".") && names.iter().any(|n| n == "..")
        }
        Err(_) => false,
    }
}

/// Emulated existence check: a directory, or a file SIZE reports as
/// non-empty. Zero-byte files read as absent (kept as observed behavior).
fn file_exists(conn: &mut RustlsFtpStream, remote: &str) -> bool {
    if remote.is_empty() {
        return false;
    }
    if is_dir(conn, remote) {
        return true;
    }
    matches!(conn.size(remote), Ok(size) if size > 0)
}

/// MKD plus an explicit SITE CHMOD; failure of either step fails the pair
fn mkdir_one(conn: &mut RustlsFtpStream, remote: &str, mode: u32) -> BackendResult<()> {
    conn.mkdir(remote)?;
    conn.site(format!("CHMOD {:o} {}", mode, remote))?;
    Ok(())
}

/// Delete the staging file once a STOR attempt is over, success or not,
/// then surface the transfer result. A leftover staging file is worth a
/// warning but never changes the outcome.
fn discard_staged(tmp_path: &Path, result: BackendResult<()>) -> BackendResult<()> {
    if let Err(e) = fs::remove_file(tmp_path) {
        warn!("could not delete staged upload {}: {}", tmp_path.display(), e);
    }
    result
}

impl Backend for FtpBackend {
    fn ls(&self, path: &str) -> BackendResult<Vec<Entity<'_>>> {
        let rel = logical::normalize(path);
        let remote = self.remote(&rel);

        let names = {
            let mut conn = self.conn()?;
            if !is_dir(&mut conn, &remote) {
                return Err(if file_exists(&mut conn, &remote) {
                    BackendError::NotADirectory(rel)
                } else {
                    BackendError::NotFound(rel)
                });
            }
            nlst(&mut conn, &remote)?
        };

        let parent = logical::display_dir(&rel);
        let mut entries = Vec::new();

        for name in names {
            if name == "." || name == ".." {
                continue;
            }

            let child = logical::join(&remote, &name);
            let (dir, size) = {
                let mut conn = self.conn()?;
                let dir = is_dir(&mut conn, &child);
                let size = if dir {
                    None
                } else {
                    conn.size(&child).ok().map(|s| s as u64)
                };
                (dir, size)
            };

            let url = self
                .config
                .url
                .as_ref()
                .map(|u| format!("{}{}{}", u.trim_end_matches('/'), parent, name));

            entries.push(Entity::new(
                EntityData {
                    name,
                    dir,
                    url,
                    path: parent.clone(),
                    size,
                    mode: None,
                    modified: None,
                },
                self,
            ));
        }

        Ok(entries)
    }

    fn mkdir(&self, name: &str, options: MkdirOptions) -> BackendResult<()> {
        let rel = logical::normalize(name);
        let target = self.remote(&rel);
        if target.is_empty() {
            return Err(BackendError::AlreadyExists("/".to_string()));
        }

        let mut conn = self.conn()?;

        if options.recursive {
            let mut created = false;
            let mut current = String::new();
            for segment in target.split('/') {
                if current.is_empty() {
                    current = segment.to_string();
                } else {
                    current = format!("{}/{}", current, segment);
                }
                if is_dir(&mut conn, &current) {
                    continue;
                }
                mkdir_one(&mut conn, &current, options.mode)?;
                created = true;
            }
            if !created {
                return Err(BackendError::AlreadyExists(rel));
            }
            Ok(())
        } else {
            if is_dir(&mut conn, &target) {
                return Err(BackendError::AlreadyExists(rel));
            }
            mkdir_one(&mut conn, &target, options.mode)
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
        let dest = self.remote(&rel);

        let mut conn = self.conn()?;
        if !is_dir(&mut conn, &dest) {
            return Err(BackendError::NotADirectory(rel));
        }

        let target = logical::join(&dest, &file.name);
        if !options.overwrite && file_exists(&mut conn, &target) {
            return Err(BackendError::AlreadyExists(logical::join(&rel, &file.name)));
        }

        let mut staged = fs::File::open(&file.tmp_path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                BackendError::NotFound(file.tmp_path.to_string_lossy().into_owned())
            } else {
                BackendError::Io(e.to_string())
            }
        })?;
        let stored = conn.put_file(&target, &mut staged).map(|_| ());
        drop(staged);
        discard_staged(&file.tmp_path, stored.map_err(BackendError::from))
    }

    fn copy(&self, source: &str, destination: &str) -> BackendResult<()> {
        let src_rel = logical::normalize(source);
        let dst_rel = logical::normalize(destination);
        let src = self.remote(&src_rel);
        let dst = self.remote(&dst_rel);

        let src_is_dir = {
            let mut conn = self.conn()?;
            if !file_exists(&mut conn, &src) {
                return Err(BackendError::NotFound(src_rel));
            }
            if file_exists(&mut conn, &dst) {
                return Err(BackendError::AlreadyExists(dst_rel));
            }
            is_dir(&mut conn, &src)
        };

        if src_is_dir {
            self.mkdir(&dst_rel, MkdirOptions::default())?;
            for child in self.ls(&src_rel)? {
                child.copy(&format!("{}/{}", dst_rel, child.name()))?;
            }
            Ok(())
        } else {
            self.copy_file(&src, &dst)
        }
    }

    fn mv(&self, source: &str, destination: &str) -> BackendResult<()> {
        let src_rel = logical::normalize(source);
        let dst_rel = logical::normalize(destination);
        let src = self.remote(&src_rel);
        let dst = self.remote(&dst_rel);

        let mut conn = self.conn()?;
        if !file_exists(&mut conn, &src) {
            return Err(BackendError::NotFound(src_rel));
        }
        if file_exists(&mut conn, &dst) {
            return Err(BackendError::AlreadyExists(dst_rel));
        }

        conn.rename(&src, &dst)?;
        Ok(())
    }

    fn remove(&self, path: &str, options: RemoveOptions) -> BackendResult<()> {
        let rel = logical::normalize(path);
        let remote = self.remote(&rel);

        let dir = {
            let mut conn = self.conn()?;
            if !file_exists(&mut conn, &remote) {
                return Err(BackendError::NotFound(rel));
            }
            is_dir(&mut conn, &remote)
        };

        if dir {
            if options.recursive {
                for child in self.ls(&rel)? {
                    child.remove(options)?;
                }
            }
            // Children must all be gone before the directory itself falls;
            // RMD of a non-empty directory fails and is surfaced.
            let mut conn = self.conn()?;
            conn.rmdir(&remote)?;
            Ok(())
        } else {
            let mut conn = self.conn()?;
            conn.rm(&remote)?;
            Ok(())
        }
    }
}

impl Drop for FtpBackend {
    fn drop(&mut self) {
        if let Ok(conn) = self.conn.get_mut() {
            let _ = conn.quit();
            debug!("disconnected from ftp://{}:{}", self.config.host, self.config.port);
        }
    }
}
