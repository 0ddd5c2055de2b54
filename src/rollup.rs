//! Listing and rollup generation.
//!
//! For every group produced by [`crate::aggregate`], this module synthesizes
//! a front-matter-free markdown listing (posts in reverse-chronological
//! order: linked title, excerpt, author/tag/date byline), renders it to HTML
//! and hands it to the writer — exactly one write per target path:
//!
//! ```text
//! dist/
//! ├── index.html                 # Date mode: everything, newest first
//! ├── 2018/index.html            # ...then one nested listing per
//! ├── 2018/01/index.html         #    year / month / day directory
//! ├── 2018/01/15/index.html
//! ├── authors/
//! │   ├── index.html             # Rollup: all author keys, sorted
//! │   └── alice/index.html       # One listing per author
//! └── tags/
//!     ├── index.html
//!     └── maps/index.html
//! ```
//!
//! Author and tag aggregation is site-global and flat; date aggregation
//! recurses into subdirectories that lack their own index document, so each
//! year/month/day gets a rollup of its subtree. Keys whose slug normalizes
//! to the empty string ("no usable key") are skipped with a warning and
//! never referenced by the rollup page.
//!
//! A failed write is fatal to that one output only — sibling groups keep
//! rendering, and the failure lands in the [`IndexReport`].

use crate::aggregate::{self, AggregateOptions, Aggregation, KeySpace, Post};
use crate::config::SiteConfig;
use crate::crawl::CrawlError;
use crate::render::{self, RenderOptions};
use crate::slug::slugify;
use crate::writer::Writer;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One generated group listing, for reporting.
#[derive(Debug)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    pub path: PathBuf,
}

/// What one indexing pass produced.
#[derive(Debug)]
pub struct IndexReport {
    pub mode: KeySpace,
    pub groups: Vec<GroupSummary>,
    /// Group keys with no usable slug, skipped entirely.
    pub skipped: Vec<String>,
    /// Output paths whose write failed; siblings were still attempted.
    pub failed: Vec<String>,
    pub written: Vec<PathBuf>,
}

impl IndexReport {
    fn new(mode: KeySpace) -> Self {
        Self {
            mode,
            groups: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            written: Vec::new(),
        }
    }
}

/// Aggregate the tree rooted at `root` and write grouped listings plus a
/// rollup through `writer`. Logical output paths are relative to the
/// writer's own root.
pub fn build_index(
    root: &Path,
    mode: KeySpace,
    config: &SiteConfig,
    writer: &dyn Writer,
) -> Result<IndexReport, CrawlError> {
    let opts = AggregateOptions {
        input: &config.input,
        site_root: root,
        base_url: &config.base_url,
        date_formats: &config.date_formats,
    };

    let mut report = IndexReport::new(mode);
    match mode.dir_name() {
        None => index_dates(root, root, config, &opts, writer, &mut report)?,
        Some(dir) => index_flat(root, dir, mode, config, &opts, writer, &mut report)?,
    }
    Ok(report)
}

/// Date mode: one flattened, newest-first listing per directory, recursing
/// into subdirectories without their own index document.
fn index_dates(
    dir: &Path,
    site_root: &Path,
    config: &SiteConfig,
    opts: &AggregateOptions<'_>,
    writer: &dyn Writer,
    report: &mut IndexReport,
) -> Result<(), CrawlError> {
    let agg = aggregate::aggregate(dir, KeySpace::Date, opts)?;

    if agg.total_entries() > 0 {
        // Date keys ascend in the map; walk them backwards so the listing
        // runs newest first.
        let posts: Vec<&Post> = agg.groups.values().rev().flatten().collect();

        let rel_dir = dir.strip_prefix(site_root).unwrap_or(Path::new(""));
        let out_path = rel_dir.join(&config.output);
        let permalink = dir_permalink(rel_dir, &config.base_url);

        let html = render_group(None, &posts, &permalink, config);
        write_output(writer, &out_path, &html, report);
        report.groups.push(GroupSummary {
            key: permalink,
            count: posts.len(),
            path: out_path,
        });
    }

    // Recurse only into topmost pending directories; each nested pass
    // rediscovers its own descendants.
    let mut covered: Vec<&PathBuf> = Vec::new();
    for pending in &agg.pending {
        if covered.iter().any(|c| pending.starts_with(c)) {
            continue;
        }
        covered.push(pending);
        index_dates(pending, site_root, config, opts, writer, report)?;
    }

    Ok(())
}

/// Author/tag mode: one flat site-global pass; per-key listings under
/// `<mode>/<slug>/` plus a rollup of all keys at `<mode>/`.
fn index_flat(
    root: &Path,
    mode_dir: &str,
    mode: KeySpace,
    config: &SiteConfig,
    opts: &AggregateOptions<'_>,
    writer: &dyn Writer,
    report: &mut IndexReport,
) -> Result<(), CrawlError> {
    let agg: Aggregation = aggregate::aggregate(root, mode, opts)?;

    let mut rollup_keys: Vec<&str> = Vec::new();

    for (key, posts) in &agg.groups {
        let slug = slugify(key);
        if slug.is_empty() {
            warn!(key = %key, "skipping group with no usable slug");
            report.skipped.push(key.clone());
            continue;
        }

        let posts: Vec<&Post> = posts.iter().collect();
        let out_path = PathBuf::from(mode_dir).join(&slug).join(&config.output);
        let permalink = format!("{}/{}/{}/", config.base_url, mode_dir, slug);

        let html = render_group(Some(key), &posts, &permalink, config);
        write_output(writer, &out_path, &html, report);
        report.groups.push(GroupSummary {
            key: key.clone(),
            count: posts.len(),
            path: out_path,
        });
        rollup_keys.push(key);
    }

    // Keys arrive from a BTreeMap, so the rollup is already sorted
    // lexicographically ascending.
    if !rollup_keys.is_empty() {
        let out_path = PathBuf::from(mode_dir).join(&config.output);
        let permalink = format!("{}/{}/", config.base_url, mode_dir);
        let html = render_rollup(&rollup_keys, mode_dir, &permalink, config);
        write_output(writer, &out_path, &html, report);
    }

    Ok(())
}

/// Render one group's listing page: synthetic markdown through the HTML
/// renderer.
pub fn render_group(
    title: Option<&str>,
    posts: &[&Post],
    permalink: &str,
    config: &SiteConfig,
) -> Vec<u8> {
    let markdown = listing_markdown(posts, &config.base_url);
    render::render_html(
        &markdown,
        &RenderOptions {
            site_name: &config.site_name,
            title,
            permalink: Some(permalink),
            ..Default::default()
        },
    )
}

/// Render the rollup page: every group key as a link to its listing.
pub fn render_rollup(
    keys: &[&str],
    mode_dir: &str,
    permalink: &str,
    config: &SiteConfig,
) -> Vec<u8> {
    let markdown = rollup_markdown(keys, mode_dir, &config.base_url);
    render::render_html(
        &markdown,
        &RenderOptions {
            site_name: &config.site_name,
            title: Some(mode_dir),
            permalink: Some(permalink),
            ..Default::default()
        },
    )
}

/// Synthesize the listing body for a sequence of posts, assumed already
/// sorted newest first.
pub fn listing_markdown(posts: &[&Post], base_url: &str) -> String {
    let mut markdown = String::new();

    for post in posts {
        let fm = &post.front_matter;
        let title = if fm.title.is_empty() {
            post.permalink.as_str()
        } else {
            fm.title.as_str()
        };

        markdown.push_str(&format!("### [{}]({})\n\n", title, post.permalink));
        if !fm.excerpt.is_empty() {
            markdown.push_str(&format!("> {}\n\n", fm.excerpt));
        }
        markdown.push_str(&byline(post, base_url));
        markdown.push_str("\n\n");
    }

    markdown
}

/// Synthesize the rollup body: one bullet per key, linking to its listing.
pub fn rollup_markdown(keys: &[&str], mode_dir: &str, base_url: &str) -> String {
    let mut markdown = String::new();
    for key in keys {
        let slug = slugify(key);
        markdown.push_str(&format!("* [{key}]({base_url}/{mode_dir}/{slug}/)\n"));
    }
    markdown
}

/// One-line provenance for a listing entry: authors, publication date, tags.
fn byline(post: &Post, base_url: &str) -> String {
    let fm = &post.front_matter;
    let mut line = String::from("Posted");

    if !fm.authors.is_empty() {
        let authors: Vec<String> = fm
            .authors
            .iter()
            .map(|author| keyed_link(author, "authors", base_url))
            .collect();
        line.push_str(&format!(" by {}", join_natural(&authors)));
    }

    line.push_str(&format!(
        " on [{}]({}/{}/)",
        post.date.format("%B %-d, %Y"),
        base_url,
        post.date.format("%Y/%m/%d"),
    ));

    if !fm.tags.is_empty() {
        let tags: Vec<String> = fm
            .tags
            .iter()
            .map(|tag| keyed_link(tag, "tags", base_url))
            .collect();
        line.push_str(&format!(" and tagged {}", join_natural(&tags)));
    }

    line.push('.');
    line
}

/// Markdown link to a key's listing page, or the bare key when it has no
/// usable slug to link to.
fn keyed_link(key: &str, mode_dir: &str, base_url: &str) -> String {
    let slug = slugify(key);
    if slug.is_empty() {
        key.to_string()
    } else {
        format!("[{key}]({base_url}/{mode_dir}/{slug}/)")
    }
}

/// `a` / `a and b` / `a, b and c`.
fn join_natural(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Permalink of a directory listing, relative-dir form.
fn dir_permalink(rel_dir: &Path, base_url: &str) -> String {
    let rel = rel_dir.to_string_lossy();
    if rel.is_empty() {
        format!("{base_url}/")
    } else {
        format!("{base_url}/{rel}/")
    }
}

fn write_output(writer: &dyn Writer, path: &Path, content: &[u8], report: &mut IndexReport) {
    match writer.write(path, content) {
        Ok(()) => report.written.push(path.to_path_buf()),
        Err(err) => {
            warn!(path = %path.display(), %err, "failed to write output");
            report.failed.push(path.display().to_string());
        }
    }
}
