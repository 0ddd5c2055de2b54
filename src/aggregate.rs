//! Directory-crawl aggregation and grouping.
//!
//! The heart of the pipeline: walk a content tree, parse every matching
//! source document, and group the results by one of three key spaces —
//!
//! - **Date**: one synthetic `YYYYMMDD` key per document (every document
//!   lands in exactly one group),
//! - **Authors** / **Tags**: one key per list element (a document appears in
//!   zero, one, or many groups).
//!
//! ## Back-filling
//!
//! Documents may omit `date:` and `permalink:`. Aggregation derives them:
//! the date from the header value (tried against the configured formats),
//! then from `/YYYY/MM/DD/` path segments, then from the file's modification
//! time; the permalink from the document's directory relative to the site
//! root, prefixed with the configured base URL. Every post that reaches a
//! group has both fields resolved.
//!
//! ## Concurrency
//!
//! The crawl visits sibling entries in parallel. Parsing and back-filling
//! run unlocked on the worker threads; only the insert into the shared
//! key→posts map takes the single aggregation mutex. No ordering exists
//! between concurrent visits — each group is sorted by date descending once
//! the walk completes (stable, so equal dates keep arrival order).
//!
//! ## Failure policy
//!
//! A document that cannot be parsed or back-filled is logged and skipped;
//! one malformed post must not block an entire site rebuild. A crawl error
//! aborts the whole pass and is surfaced to the caller. Abandoned passes
//! are simply dropped — a partially populated mapping is never rendered.
//!
//! ## Date-mode recursion
//!
//! In Date mode, subdirectories without a direct index document are
//! reported in [`Aggregation::pending`] so the caller can aggregate each
//! one for its own nested listing (dates are hierarchical: year, month,
//! day rollups). Author/Tag aggregation is one flat, site-global pass and
//! reports nothing.

use crate::crawl::{self, CrawlError};
use crate::frontmatter::{self, Document, FrontMatter};
use chrono::{DateTime, Local, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Which key space groups the aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpace {
    Date,
    Authors,
    Tags,
}

impl KeySpace {
    /// Group keys for one post: a single synthetic date key, or one key
    /// per author/tag. May be empty — such a post joins no group.
    pub fn keys_for(self, post: &Post) -> Vec<String> {
        match self {
            KeySpace::Date => vec![post.date.format("%Y%m%d").to_string()],
            KeySpace::Authors => post.front_matter.authors.clone(),
            KeySpace::Tags => post.front_matter.tags.clone(),
        }
    }

    /// Output subdirectory for grouped listings. Date mode nests by the
    /// source tree's own `YYYY/MM/DD` layout instead.
    pub fn dir_name(self) -> Option<&'static str> {
        match self {
            KeySpace::Date => None,
            KeySpace::Authors => Some("authors"),
            KeySpace::Tags => Some("tags"),
        }
    }
}

impl fmt::Display for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeySpace::Date => "date",
            KeySpace::Authors => "authors",
            KeySpace::Tags => "tags",
        })
    }
}

/// A document's listing identity after back-filling: the front matter plus
/// resolved date and permalink. The body is dropped at this point — groups
/// retain only what listings need.
#[derive(Debug, Clone)]
pub struct Post {
    pub front_matter: FrontMatter,
    pub date: NaiveDate,
    pub permalink: String,
}

/// Result of one aggregation pass.
#[derive(Debug)]
pub struct Aggregation {
    /// Group key → posts, each group sorted by date descending.
    pub groups: BTreeMap<String, Vec<Post>>,
    /// Date mode only: subdirectories (at any depth) without a direct
    /// index document, sorted; candidates for nested aggregation.
    pub pending: Vec<PathBuf>,
}

impl Aggregation {
    /// Total post entries across all groups (multi-membership counts once
    /// per group).
    pub fn total_entries(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Configuration for one aggregation pass, threaded through explicitly —
/// there is no ambient state.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions<'a> {
    /// Base name of per-post source documents, e.g. `index.md`.
    pub input: &'a str,
    /// Root the whole site is anchored at. Stays fixed across date-mode
    /// recursion so permalinks are always site-relative.
    pub site_root: &'a Path,
    /// URL prefix for synthesized permalinks.
    pub base_url: &'a str,
    /// Formats tried against the raw header date, in order.
    pub date_formats: &'a [String],
}

/// Walk the tree rooted at `root` and group every matching document by
/// `key_space`. See the module docs for back-filling, concurrency, and
/// failure policy.
pub fn aggregate(
    root: &Path,
    key_space: KeySpace,
    opts: &AggregateOptions<'_>,
) -> Result<Aggregation, CrawlError> {
    let lookup: Mutex<HashMap<String, Vec<Post>>> = Mutex::new(HashMap::new());
    let pending: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

    crawl::crawl(root, |path, is_dir| {
        if is_dir {
            if key_space == KeySpace::Date && !path.join(opts.input).is_file() {
                pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(path.to_path_buf());
            }
            return Ok(());
        }

        if path.file_name().and_then(|n| n.to_str()) != Some(opts.input) {
            return Ok(());
        }

        let document = match frontmatter::parse_file(path) {
            Ok(document) => document,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unparseable document");
                return Ok(());
            }
        };

        let post = match backfill(document, path, opts) {
            Ok(post) => post,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping document without a resolvable date");
                return Ok(());
            }
        };

        let keys = key_space.keys_for(&post);
        if keys.is_empty() {
            return Ok(());
        }

        // Parsing and back-filling happened unlocked; hold the mutex only
        // for the insert itself.
        let mut lookup = lookup.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            lookup.entry(key).or_default().push(post.clone());
        }
        Ok(())
    })?;

    let mut groups: BTreeMap<String, Vec<Post>> = lookup
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .into_iter()
        .collect();

    for posts in groups.values_mut() {
        // Stable: equal dates keep their arrival order.
        posts.sort_by(|a, b| b.date.cmp(&a.date));
    }

    let mut pending = pending
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    pending.sort();

    Ok(Aggregation { groups, pending })
}

/// Resolve a parsed document into its listing identity, deriving date and
/// permalink where the header omits them. The body is dropped.
pub fn backfill(
    document: Document,
    path: &Path,
    opts: &AggregateOptions<'_>,
) -> Result<Post, std::io::Error> {
    let Document { front_matter, .. } = document;

    let date = resolve_date(&front_matter, path, opts.date_formats)?;
    let permalink = match &front_matter.permalink {
        Some(permalink) => permalink.clone(),
        None => permalink_for(path, opts.site_root, opts.base_url),
    };

    Ok(Post {
        front_matter,
        date,
        permalink,
    })
}

/// Header date (first matching format) → `/YYYY/MM/DD/` path segments →
/// file modification time.
fn resolve_date(
    front_matter: &FrontMatter,
    path: &Path,
    formats: &[String],
) -> Result<NaiveDate, std::io::Error> {
    if let Some(raw) = &front_matter.date {
        for format in formats {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Ok(date);
            }
        }
        warn!(path = %path.display(), raw = %raw, "header date matches no configured format; deriving from path");
    }

    if let Some(date) = date_from_path(path) {
        return Ok(date);
    }

    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).date_naive())
}

/// Find the last `YYYY/MM/DD` run of directory segments in the document's
/// path that forms a valid calendar date.
fn date_from_path(path: &Path) -> Option<NaiveDate> {
    let segments: Vec<&str> = path
        .parent()?
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect();

    segments.windows(3).rev().find_map(|window| {
        let &[year, month, day] = window else {
            return None;
        };
        if !(digits(year, 4) && digits(month, 2) && digits(day, 2)) {
            return None;
        }
        NaiveDate::from_ymd_opt(
            year.parse().ok()?,
            month.parse().ok()?,
            day.parse().ok()?,
        )
    })
}

fn digits(segment: &str, len: usize) -> bool {
    segment.len() == len && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Synthesize a permalink from the document's directory: the path relative
/// to the site root, prefixed with the base URL, with a trailing slash.
fn permalink_for(path: &Path, site_root: &Path, base_url: &str) -> String {
    let dir = path.parent().unwrap_or(site_root);
    let rel = dir.strip_prefix(site_root).unwrap_or(dir);

    let segments: Vec<&str> = rel
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        format!("{base_url}/")
    } else {
        format!("{base_url}/{}/", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{site_options, write_post};
    use std::fs;
    use tempfile::TempDir;

    fn formats() -> Vec<String> {
        vec!["%Y-%m-%d".to_string()]
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    #[test]
    fn date_mode_puts_each_post_in_exactly_one_group() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/one", "date: 2018-01-15", "one");
        write_post(tmp.path(), "2018/01/15/two", "date: 2018-01-15", "two");
        write_post(tmp.path(), "2018/02/01/three", "date: 2018-02-01", "three");

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Date,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        assert_eq!(agg.groups.len(), 2);
        assert_eq!(agg.groups["20180115"].len(), 2);
        assert_eq!(agg.groups["20180201"].len(), 1);
        assert_eq!(agg.total_entries(), 3);
    }

    #[test]
    fn tag_mode_multi_membership() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "2018/01/15/post",
            "date: 2018-01-15\ntags: [a, b]",
            "body",
        );

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Tags,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        let keys: Vec<&str> = agg.groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(agg.groups["a"].len(), 1);
        assert_eq!(agg.groups["b"].len(), 1);
    }

    #[test]
    fn post_without_tags_joins_no_tag_group() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/post", "date: 2018-01-15", "body");

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Tags,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        assert!(agg.groups.is_empty());
    }

    #[test]
    fn groups_sorted_reverse_chronologically() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "2018/01/15/old",
            "title: Old\ndate: 2018-01-15\ntags: [t]",
            "",
        );
        write_post(
            tmp.path(),
            "2019/06/01/new",
            "title: New\ndate: 2019-06-01\ntags: [t]",
            "",
        );
        write_post(
            tmp.path(),
            "2018/09/09/mid",
            "title: Mid\ndate: 2018-09-09\ntags: [t]",
            "",
        );

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Tags,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        let group = &agg.groups["t"];
        let titles: Vec<&str> = group.iter().map(|p| p.front_matter.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Mid", "Old"]);
        for pair in group.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }
    }

    #[test]
    fn unparseable_document_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "2018/01/15/good",
            "date: 2018-01-15\ntags: [t]",
            "fine",
        );
        // Invalid UTF-8 makes the parse fail with an IO error.
        let bad = tmp.path().join("2018/01/16/bad");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("index.md"), [0xff, 0xfe, 0x2d]).unwrap();

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Tags,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        assert_eq!(agg.groups["t"].len(), 1);
    }

    #[test]
    fn crawl_error_aborts_aggregation() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        let formats = formats();
        let result = aggregate(
            &missing,
            KeySpace::Date,
            &site_options(tmp.path(), &formats),
        );
        assert!(result.is_err());
    }

    #[test]
    fn non_matching_filenames_ignored() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/post", "date: 2018-01-15\ntags: [t]", "");
        fs::write(
            tmp.path().join("2018/01/15/post/notes.md"),
            "---\ntags: [t]\n---\n",
        )
        .unwrap();

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Tags,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        assert_eq!(agg.groups["t"].len(), 1);
    }

    // =========================================================================
    // Date-mode recursion bookkeeping
    // =========================================================================

    #[test]
    fn date_mode_reports_subdirs_without_index() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/post", "date: 2018-01-15", "");

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Date,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        // 2018, 2018/01, 2018/01/15 lack an index document; the post
        // directory itself has one.
        assert_eq!(
            agg.pending,
            vec![
                tmp.path().join("2018"),
                tmp.path().join("2018/01"),
                tmp.path().join("2018/01/15"),
            ]
        );
    }

    #[test]
    fn flat_modes_report_no_pending_subdirs() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/post", "date: 2018-01-15\ntags: [t]", "");

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Tags,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        assert!(agg.pending.is_empty());
    }

    // =========================================================================
    // Back-filling
    // =========================================================================

    #[test]
    fn header_date_wins_over_path() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/post", "date: 2019-12-31", "");

        let formats = formats();
        let opts = site_options(tmp.path(), &formats);
        let path = tmp.path().join("2018/01/15/post/index.md");
        let doc = frontmatter::parse_file(&path).unwrap();
        let post = backfill(doc, &path, &opts).unwrap();

        assert_eq!(post.date, NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
    }

    #[test]
    fn missing_date_derived_from_path_segments() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/post", "title: T", "");

        let formats = formats();
        let opts = site_options(tmp.path(), &formats);
        let path = tmp.path().join("2018/01/15/post/index.md");
        let doc = frontmatter::parse_file(&path).unwrap();
        let post = backfill(doc, &path, &opts).unwrap();

        assert_eq!(post.date, NaiveDate::from_ymd_opt(2018, 1, 15).unwrap());
    }

    #[test]
    fn unparseable_header_date_falls_back_to_path() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/post", "date: someday soon", "");

        let formats = formats();
        let opts = site_options(tmp.path(), &formats);
        let path = tmp.path().join("2018/01/15/post/index.md");
        let doc = frontmatter::parse_file(&path).unwrap();
        let post = backfill(doc, &path, &opts).unwrap();

        assert_eq!(post.date, NaiveDate::from_ymd_opt(2018, 1, 15).unwrap());
    }

    #[test]
    fn no_date_anywhere_falls_back_to_mtime() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "drafts/post", "title: T", "");

        let formats = formats();
        let opts = site_options(tmp.path(), &formats);
        let path = tmp.path().join("drafts/post/index.md");
        let doc = frontmatter::parse_file(&path).unwrap();
        let post = backfill(doc, &path, &opts).unwrap();

        // The fixture was written moments ago.
        assert_eq!(post.date, Local::now().date_naive());
    }

    #[test]
    fn invalid_path_date_rejected() {
        // 13th month is not a date; segments must form a valid calendar day.
        assert_eq!(date_from_path(Path::new("blog/2018/13/45/p/index.md")), None);
        assert_eq!(
            date_from_path(Path::new("blog/2018/01/15/p/index.md")),
            NaiveDate::from_ymd_opt(2018, 1, 15)
        );
    }

    #[test]
    fn permalink_synthesized_from_relative_dir() {
        let tmp = TempDir::new().unwrap();
        write_post(tmp.path(), "2018/01/15/a-post", "date: 2018-01-15", "");

        let formats = formats();
        let opts = site_options(tmp.path(), &formats);
        let path = tmp.path().join("2018/01/15/a-post/index.md");
        let doc = frontmatter::parse_file(&path).unwrap();
        let post = backfill(doc, &path, &opts).unwrap();

        assert_eq!(post.permalink, "/blog/2018/01/15/a-post/");
    }

    #[test]
    fn header_permalink_wins() {
        let tmp = TempDir::new().unwrap();
        write_post(
            tmp.path(),
            "2018/01/15/post",
            "date: 2018-01-15\npermalink: /elsewhere/",
            "",
        );

        let formats = formats();
        let opts = site_options(tmp.path(), &formats);
        let path = tmp.path().join("2018/01/15/post/index.md");
        let doc = frontmatter::parse_file(&path).unwrap();
        let post = backfill(doc, &path, &opts).unwrap();

        assert_eq!(post.permalink, "/elsewhere/");
    }

    // =========================================================================
    // Concurrent insertion
    // =========================================================================

    #[test]
    fn parallel_crawl_loses_no_documents() {
        let tmp = TempDir::new().unwrap();
        for i in 0..500 {
            write_post(
                tmp.path(),
                &format!("2018/01/15/post-{i:03}"),
                "date: 2018-01-15\ntags: [fixture]",
                "",
            );
        }

        let formats = formats();
        let agg = aggregate(
            tmp.path(),
            KeySpace::Tags,
            &site_options(tmp.path(), &formats),
        )
        .unwrap();

        assert_eq!(agg.total_entries(), 500);
        assert_eq!(agg.groups["fixture"].len(), 500);
    }
}
