//! Filesystem tree crawling.
//!
//! [`crawl`] walks every entry under a root and hands each one to a visitor
//! callback as `(path, is_dir)`. Sibling entries may be visited concurrently
//! — the walk itself is sequential (directory enumeration is I/O-bound and
//! cheap) but visitor invocations are spread across the rayon thread pool,
//! so per-entry work like parsing runs in parallel.
//!
//! The visitor must therefore be `Sync` and do its own locking around any
//! shared accumulator; see [`crate::aggregate`] for the intended pattern.
//! No ordering guarantee exists between visits.
//!
//! The first error — from the walk or from a visitor — aborts the crawl and
//! is returned to the caller.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Invoke `visit(path, is_dir)` for every filesystem entry under `root`,
/// excluding `root` itself. Visits may run concurrently for sibling entries.
pub fn crawl<F>(root: &Path, visit: F) -> Result<(), CrawlError>
where
    F: Fn(&Path, bool) -> Result<(), CrawlError> + Sync,
{
    // Enumerate first, then fan the visits out. Keeps walkdir's iterator
    // (which is not Sync) off the worker threads.
    let entries: Vec<(PathBuf, bool)> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry?;
            let is_dir = entry.file_type().is_dir();
            Ok((entry.into_path(), is_dir))
        })
        .collect::<Result<_, CrawlError>>()?;

    entries
        .par_iter()
        .try_for_each(|(path, is_dir)| visit(path, *is_dir))
}
