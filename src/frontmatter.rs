//! Front matter parsing.
//!
//! A document is a plain-text file carrying an optional structured header
//! (front matter) followed by a free-text markdown body:
//!
//! ```text
//! ---
//! layout: blog
//! title: A Post About Maps
//! excerpt: "Short summary for listings"
//! authors: [alice, bob]
//! tags: [maps, open-data]
//! date: 2018-01-15
//! published: true
//! ---
//! The body starts here and is preserved byte-for-byte.
//! ```
//!
//! ## Format rules
//!
//! - A header exists if and only if the *first* line is exactly `---`; it is
//!   terminated by the next line that is exactly `---`.
//! - Header lines split on the first `:` into a trimmed key and value.
//!   Surrounding double quotes are stripped from string values. `[a, b, c]`
//!   bracket lists split on `,` with trimmed elements.
//! - Booleans accept case-insensitive `true` / `y` / `yes`; anything else is
//!   false.
//! - Unrecognized keys are ignored. A header line without a `:` is malformed
//!   and skipped — one bad line never fails the whole parse.
//! - `date` is kept as the raw header string. Normalizing it (and deriving a
//!   default when absent) is the caller's job; see [`crate::aggregate`].

use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured metadata extracted from a document header.
///
/// All fields default to empty; a document without a header parses to an
/// entirely empty front matter and a full-length body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub layout: String,
    pub category: String,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    /// Raw `date:` header value, exactly as given. `None` when the header
    /// omits it; normalized and back-filled during aggregation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Raw `permalink:` header value; back-filled during aggregation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    pub published: bool,
}

impl fmt::Display for FrontMatter {
    /// Re-serialize the recognized fields as a `---`-delimited header block.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---")?;
        writeln!(f, "layout: {}", self.layout)?;
        writeln!(f, "title: {}", self.title)?;
        writeln!(f, "category: {}", self.category)?;
        writeln!(f, "excerpt: {}", self.excerpt)?;
        writeln!(f, "authors: [{}]", self.authors.join(", "))?;
        writeln!(f, "tags: [{}]", self.tags.join(", "))?;
        if let Some(image) = &self.image {
            writeln!(f, "image: {image}")?;
        }
        if let Some(date) = &self.date {
            writeln!(f, "date: {date}")?;
        }
        if let Some(permalink) = &self.permalink {
            writeln!(f, "permalink: {permalink}")?;
        }
        writeln!(f, "published: {}", self.published)?;
        write!(f, "---")
    }
}

/// A parsed document: front matter plus the untouched markdown body.
#[derive(Debug, Clone)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Parse a document from a reader.
pub fn parse<R: Read>(reader: R) -> Result<Document, ParseError> {
    let mut front_matter = FrontMatter::default();
    let mut body = String::new();

    let mut lineno = 0usize;
    let mut in_header = false;

    for line in BufReader::new(reader).lines() {
        let line = line?;
        lineno += 1;

        if lineno == 1 && line == "---" {
            in_header = true;
            continue;
        }

        if in_header && line == "---" {
            in_header = false;
            continue;
        }

        if in_header {
            parse_header_line(&line, lineno, &mut front_matter);
            continue;
        }

        body.push_str(&line);
        body.push('\n');
    }

    Ok(Document { front_matter, body })
}

/// Parse a document from a string. Infallible: the only parse failure mode
/// is unreadable input, and a `&str` is already in memory.
pub fn parse_str(content: &str) -> Document {
    let mut front_matter = FrontMatter::default();
    let mut body = String::new();

    let mut in_header = false;
    for (idx, line) in content.lines().enumerate() {
        if idx == 0 && line == "---" {
            in_header = true;
            continue;
        }
        if in_header && line == "---" {
            in_header = false;
            continue;
        }
        if in_header {
            parse_header_line(line, idx + 1, &mut front_matter);
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    Document { front_matter, body }
}

/// Parse a document from a file on disk.
pub fn parse_file(path: &Path) -> Result<Document, ParseError> {
    parse(File::open(path)?)
}

fn parse_header_line(line: &str, lineno: usize, fm: &mut FrontMatter) {
    let Some((key, value)) = line.split_once(':') else {
        // Malformed header line; skip it rather than fail the parse.
        debug!(lineno, line, "skipping header line without a ':'");
        return;
    };

    let key = key.trim();
    let value = unquote(value.trim());

    match key {
        "title" => fm.title = value.to_string(),
        "excerpt" => fm.excerpt = value.to_string(),
        "image" => fm.image = non_empty(value),
        "layout" => fm.layout = value.to_string(),
        "category" => fm.category = value.to_string(),
        "authors" => fm.authors = parse_list(value),
        // `tag` and `tags` are synonyms; both populate the same field.
        "tag" | "tags" => fm.tags = parse_list(value),
        "date" => fm.date = non_empty(value),
        "permalink" => fm.permalink = non_empty(value),
        "published" => fm.published = parse_bool(value),
        _ => {}
    }
}

fn unquote(value: &str) -> &str {
    value
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Split a `[a, b, c]`-style bracket list (brackets optional) on `,`,
/// trimming each element and dropping empties.
fn parse_list(value: &str) -> Vec<String> {
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|s| unquote(s.trim()).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "y" | "yes"
    )
}
