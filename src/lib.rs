//! # blogroll
//!
//! A minimal index and search-document generator for markdown blogs.
//! Your filesystem is the data source: one post per directory, organized by
//! publish date (`content/2018/01/15/a-post/index.md`), each post carrying
//! a `---`-delimited front matter header.
//!
//! # Architecture: One Pipeline, Three Projections
//!
//! Every run is a single aggregation pass over the content tree, projected
//! three ways:
//!
//! ```text
//! 1. Index    content/  →  listings + rollups   (grouped by date/author/tag)
//! 2. Html     post      →  standalone page      (one document at a time)
//! 3. Search   content/  →  search documents     (JSON lines for an indexer)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Front matter parsing — header + byte-for-byte body |
//! | [`aggregate`] | Tree crawl, date/permalink back-fill, multi-key grouping |
//! | [`crawl`] | Filesystem walk with parallel visitor dispatch |
//! | [`rollup`] | Listing/rollup synthesis and the index driver |
//! | [`render`] | Markdown → HTML page rendering (body + chrome) |
//! | [`search`] | Search document extraction from the markdown event stream |
//! | [`slug`] | Unicode-aware key → URL-safe slug normalization |
//! | [`writer`] | Atomic output sinks (`fs=PATH`, `stdout`, `null`) |
//! | [`config`] | `config.toml` loading, validation, stock defaults |
//! | [`output`] | CLI output formatting — summaries of pipeline results |
//!
//! # Design Decisions
//!
//! ## Maud Over Template Engines
//!
//! Page chrome is generated with [Maud](https://maud.lambda.xyz/), a
//! compile-time HTML macro system, rather than a runtime template engine:
//! malformed chrome is a build error, interpolation is auto-escaped, and
//! there is no template directory to ship or get out of sync. Listing and
//! rollup *bodies* are synthesized as plain markdown and pushed through the
//! same renderer as post bodies, so listings inherit whatever the renderer
//! does.
//!
//! ## Groups Are Built Fresh Every Pass
//!
//! There is no cache and no ambient state. Each aggregation constructs its
//! own accumulator, guards it with a single mutex held only during inserts,
//! and freezes every group (sorted reverse-chronologically) once the walk
//! completes. Abandoned passes are dropped, never rendered.
//!
//! ## One Bad Post Never Blocks a Rebuild
//!
//! Per-document parse failures are logged and skipped. Only traversal
//! errors — the filesystem lying to us — abort an aggregation, and only
//! write failures fail an individual output.

pub mod aggregate;
pub mod config;
pub mod crawl;
pub mod frontmatter;
pub mod output;
pub mod render;
pub mod rollup;
pub mod search;
pub mod slug;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
