//! Shared test utilities for the blogroll test suite.
//!
//! Fixture trees are built inline with [`write_post`] — one post per
//! directory, the way a real content tree is laid out:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_post(
//!     tmp.path(),
//!     "2018/01/15/maps",
//!     "title: Maps\ndate: 2018-01-15\ntags: [maps]",
//!     "Body text.",
//! );
//! ```

use crate::aggregate::AggregateOptions;
use std::fs;
use std::path::Path;

/// Write `root/<rel_dir>/index.md` with the given header fields and body,
/// creating directories as needed.
pub fn write_post(root: &Path, rel_dir: &str, header: &str, body: &str) {
    let dir = root.join(rel_dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.md"), format!("---\n{header}\n---\n{body}\n")).unwrap();
}

/// Aggregation options for a fixture site: stock input filename and base
/// URL, caller-supplied root and date formats.
pub fn site_options<'a>(site_root: &'a Path, formats: &'a [String]) -> AggregateOptions<'a> {
    AggregateOptions {
        input: "index.md",
        site_root,
        base_url: "/blog",
        date_formats: formats,
    }
}
