//! Output sinks for rendered pages.
//!
//! Everything the pipeline produces goes through the [`Writer`] trait:
//! a logical, output-root-relative path plus the finished bytes. Three
//! implementations exist, selectable on the command line via
//! `--writer fs=PATH`, `--writer stdout`, or `--writer null`.
//!
//! [`FsWriter`] guarantees atomic replacement: content is written to a
//! temporary file in the target directory and renamed over the destination,
//! so a concurrent reader sees either the old file or the new one, never a
//! torn write.

use std::fs;
use std::io::Write as _;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("atomic replace failed: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("path escapes the output root: {0}")]
    PathEscape(PathBuf),
    #[error("unknown writer spec '{0}' (expected fs=PATH, stdout, or null)")]
    UnknownSpec(String),
}

/// Sink for rendered output. `path` is logical and relative to the sink's
/// own root; implementations must replace any existing file atomically.
pub trait Writer: Send + Sync {
    fn write(&self, path: &Path, content: &[u8]) -> Result<(), WriteError>;
}

/// Build a writer from a command-line spec string.
pub fn for_spec(spec: &str) -> Result<Box<dyn Writer>, WriteError> {
    match spec.split_once('=') {
        Some(("fs", root)) if !root.is_empty() => Ok(Box::new(FsWriter::new(root)?)),
        None if spec == "stdout" => Ok(Box::new(StdoutWriter)),
        None if spec == "null" => Ok(Box::new(NullWriter)),
        _ => Err(WriteError::UnknownSpec(spec.to_string())),
    }
}

/// Writes under a root directory with atomic replacement.
pub struct FsWriter {
    root: PathBuf,
}

impl FsWriter {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, WriteError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

impl Writer for FsWriter {
    fn write(&self, path: &Path, content: &[u8]) -> Result<(), WriteError> {
        // Reject absolute paths and `..` segments: logical paths are always
        // inside the output root.
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::RootDir | Component::Prefix(_) | Component::ParentDir
            )
        });
        if escapes {
            return Err(WriteError::PathEscape(path.to_path_buf()));
        }

        let target = self.root.join(path);
        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(content)?;
        tmp.persist(&target)?;
        Ok(())
    }
}

/// Dumps content to stdout, prefixed with the logical path.
pub struct StdoutWriter;

impl Writer for StdoutWriter {
    fn write(&self, path: &Path, content: &[u8]) -> Result<(), WriteError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "==> {}", path.display())?;
        stdout.write_all(content)?;
        writeln!(stdout)?;
        Ok(())
    }
}

/// Discards everything. Useful for dry runs and timing.
pub struct NullWriter;

impl Writer for NullWriter {
    fn write(&self, _path: &Path, _content: &[u8]) -> Result<(), WriteError> {
        Ok(())
    }
}
