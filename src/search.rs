//! Search document extraction.
//!
//! Turns a parsed [`Document`] into a renderer-independent record of its
//! textual content, suitable for handing to an external indexing sink. The
//! extraction is a single pass over the markdown event stream produced by
//! [`pulldown_cmark`] — each node is classified once, in document order:
//!
//! - plain text outside links/images/code → a trimmed [`SearchDocument::body`]
//!   segment,
//! - hyperlink destinations → counted in [`SearchDocument::links`]; the
//!   anchor text is attributed to the link and never reaches `body`,
//! - image destinations → counted in [`SearchDocument::images`] (kept
//!   separate from hyperlinks; see the field docs),
//! - inline and block code → [`SearchDocument::code`] segments,
//! - purely structural nodes (headings, lists, tables, block quotes, rules)
//!   are traversed but contribute nothing themselves; anything unrecognized
//!   is skipped, never a failure.
//!
//! The pass is deterministic, O(number of events), and never mutates the
//! input document. All four containers are always initialized — an empty
//! body yields an empty-but-complete record.

use crate::frontmatter::Document;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::BTreeMap;

/// Read-only projection of one document for search indexing.
///
/// Owned by the caller that requested extraction; holds no reference back
/// to the source document.
#[derive(Debug, Clone, Serialize)]
pub struct SearchDocument {
    pub title: String,
    pub authors: Vec<String>,
    /// Raw header date, carried over as given (may be absent).
    pub date: Option<String>,
    /// Hyperlink destination → occurrence count.
    pub links: BTreeMap<String, u32>,
    /// Image destination → occurrence count, kept separate from `links`
    /// so indexers can weight embedded media and outbound references
    /// differently.
    pub images: BTreeMap<String, u32>,
    /// Plain-text segments in document reading order.
    pub body: Vec<String>,
    /// Code literals (inline and block) in document reading order.
    pub code: Vec<String>,
}

/// Extract a [`SearchDocument`] from a parsed document.
pub fn extract(doc: &Document) -> SearchDocument {
    let mut links: BTreeMap<String, u32> = BTreeMap::new();
    let mut images: BTreeMap<String, u32> = BTreeMap::new();
    let mut body: Vec<String> = Vec::new();
    let mut code: Vec<String> = Vec::new();

    // Depths rather than flags: links and images nest in pathological
    // markdown, and an unbalanced flag would leak attribution.
    let mut link_depth = 0usize;
    let mut image_depth = 0usize;
    let mut code_block: Option<String> = None;

    for event in Parser::new(&doc.body) {
        match event {
            Event::Start(Tag::Link { dest_url, .. }) => {
                *links.entry(dest_url.into_string()).or_insert(0) += 1;
                link_depth += 1;
            }
            Event::End(TagEnd::Link) => {
                link_depth = link_depth.saturating_sub(1);
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                *images.entry(dest_url.into_string()).or_insert(0) += 1;
                image_depth += 1;
            }
            Event::End(TagEnd::Image) => {
                image_depth = image_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock(_)) => {
                code_block = Some(String::new());
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(literal) = code_block.take() {
                    code.push(literal);
                }
            }
            Event::Text(text) => {
                if let Some(buf) = code_block.as_mut() {
                    buf.push_str(&text);
                } else if link_depth == 0 && image_depth == 0 {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        body.push(trimmed.to_string());
                    }
                }
                // Text inside a link or image is attributed to the link
                // entry recorded on entry; it never reaches `body`.
            }
            Event::Code(literal) => {
                code.push(literal.into_string());
            }
            // Structural starts/ends (headings, lists, tables, quotes,
            // emphasis) carry no payload of their own.
            Event::Start(_) | Event::End(_) => {}
            // Everything else - breaks, rules, raw HTML, footnotes, task
            // markers - is skipped.
            _ => {}
        }
    }

    SearchDocument {
        title: doc.front_matter.title.clone(),
        authors: doc.front_matter.authors.clone(),
        date: doc.front_matter.date.clone(),
        links,
        images,
        body,
        code,
    }
}
