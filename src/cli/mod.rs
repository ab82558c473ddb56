//! CLI argument definitions and dispatch using clap
//!
//! Commands:
//! - fsbridge ls <location> [path]
//! - fsbridge mkdir <location> <name>
//! - fsbridge upload <location> <file> [destination]
//! - fsbridge cp <location> <source> <destination>
//! - fsbridge mv <location> <source> <destination>
//! - fsbridge rm <location> <path>

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::backend::{
    BackendError, BackendResult, FileUpload, MkdirOptions, RemoveOptions, UploadOptions,
};
use crate::facade::Filesystem;
use crate::locations::parse_location_map;

/// fsbridge - uniform file operations over named storage locations
#[derive(Parser, Debug)]
#[command(name = "fsbridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON location map
    #[arg(long, default_value = "./locations.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

fn parse_octal(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s, 8).map_err(|e| format!("invalid octal mode: {}", e))
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory, printing one JSON entity per line
    Ls {
        location: String,
        #[arg(default_value = "")]
        path: String,
    },

    /// Create a directory
    Mkdir {
        location: String,
        name: String,
        /// Permission bits, octal
        #[arg(long, default_value = "777", value_parser = parse_octal)]
        mode: u32,
        /// Do not create missing ancestors
        #[arg(long)]
        flat: bool,
    },

    /// Upload a local file into a destination directory
    Upload {
        location: String,
        /// Local file to upload
        file: PathBuf,
        #[arg(default_value = "")]
        destination: String,
        /// Replace an existing file of the same name
        #[arg(long)]
        overwrite: bool,
    },

    /// Copy a file or directory tree
    Cp {
        location: String,
        source: String,
        destination: String,
    },

    /// Move or rename a file or directory
    Mv {
        location: String,
        source: String,
        destination: String,
    },

    /// Remove a file or directory
    Rm {
        location: String,
        path: String,
        /// Remove directory contents first
        #[arg(short, long)]
        recursive: bool,
    },
}

/// Stage a local file so a backend can consume it as an upload.
///
/// The returned guard owns the staged copy: if the upload never consumes
/// it (validation rejected it, the destination was missing), dropping the
/// guard deletes it.
fn stage_upload(file: &PathBuf) -> BackendResult<(FileUpload, tempfile::NamedTempFile)> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BackendError::Io(format!("{} has no usable file name", file.display())))?
        .to_string();
    let size = fs::metadata(file)?.len();

    let staging = tempfile::NamedTempFile::new()?;
    fs::copy(file, staging.path())?;

    Ok((FileUpload::new(name, staging.path(), size), staging))
}

/// Parse arguments, load the location map and dispatch one command
pub fn run() -> BackendResult<()> {
    let cli = Cli::parse();

    let json = fs::read_to_string(&cli.config)
        .map_err(|e| BackendError::Io(format!("{}: {}", cli.config.display(), e)))?;
    let locations = parse_location_map(&json)?;
    let filesystem = Filesystem::new(&locations);

    match cli.command {
        Command::Ls { location, path } => {
            for entity in filesystem.ls(&location, &path)? {
                let line = serde_json::to_string(&entity)
                    .map_err(|e| BackendError::Internal(e.to_string()))?;
                println!("{}", line);
            }
            Ok(())
        }
        Command::Mkdir {
            location,
            name,
            mode,
            flat,
        } => filesystem.mkdir(
            &location,
            &name,
            MkdirOptions {
                mode,
                recursive: !flat,
            },
        ),
        Command::Upload {
            location,
            file,
            destination,
            overwrite,
        } => {
            // the guard deletes the staged copy if the backend never does
            let (upload, _staging) = stage_upload(&file)?;
            filesystem.upload(
                &location,
                &upload,
                &destination,
                UploadOptions { overwrite },
                &[],
            )
        }
        Command::Cp {
            location,
            source,
            destination,
        } => filesystem.copy(&location, &source, &destination),
        Command::Mv {
            location,
            source,
            destination,
        } => filesystem.mv(&location, &source, &destination),
        Command::Rm {
            location,
            path,
            recursive,
        } => filesystem.remove(&location, &path, RemoveOptions { recursive }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_octal_modes() {
        assert_eq!(parse_octal("777").unwrap(), 0o777);
        assert_eq!(parse_octal("644").unwrap(), 0o644);
        assert!(parse_octal("9z").is_err());
    }

    #[test]
    fn test_staged_copy_is_deleted_when_not_consumed() {
        let temp = tempfile::TempDir::new().unwrap();
        let source = temp.path().join("in.txt");
        fs::write(&source, b"abc").unwrap();

        let staged_path = {
            let (upload, staging) = stage_upload(&source).unwrap();
            assert_eq!(upload.name, "in.txt");
            assert_eq!(upload.size, 3);
            assert_eq!(upload.tmp_path, staging.path());
            assert!(upload.tmp_path.is_file());
            upload.tmp_path.clone()
        };
        assert!(!staged_path.exists());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["fsbridge", "ls", "web", "img"]).unwrap();
        assert!(matches!(cli.command, Command::Ls { .. }));

        let cli = Cli::try_parse_from(["fsbridge", "rm", "web", "old", "--recursive"]).unwrap();
        match cli.command {
            Command::Rm { recursive, .. } => assert!(recursive),
            _ => panic!("expected rm"),
        }
    }
}
