//! Markdown to HTML page rendering.
//!
//! The pipeline's "render" capability: takes a front-matter-free markdown
//! body plus structural hints (title, permalink, date, authors) and produces
//! a complete HTML page.
//!
//! HTML is generated with [maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system:
//!
//! - **Compile-time checking**: malformed chrome is a build error, not a
//!   runtime surprise.
//! - **XSS-safe by default**: all hint interpolation is auto-escaped; only
//!   the markdown-converted body is inserted pre-escaped, and that
//!   conversion ([`pulldown_cmark`]) escapes raw HTML-sensitive text itself.
//!
//! Because the templates are code, the render step has no runtime failure
//! mode of its own. Downstream failures (writing the page) stay fallible;
//! see [`crate::writer`].

use chrono::NaiveDate;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};

/// Structural hints for page chrome. Everything is optional; an empty set
/// of hints yields a bare page titled after the site.
#[derive(Debug, Default, Clone)]
pub struct RenderOptions<'a> {
    pub site_name: &'a str,
    pub title: Option<&'a str>,
    pub permalink: Option<&'a str>,
    pub date: Option<NaiveDate>,
    pub authors: &'a [String],
}

/// Convert a markdown body into a complete HTML page.
pub fn render_html(body: &str, opts: &RenderOptions<'_>) -> Vec<u8> {
    let parser = Parser::new(body);
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, parser);

    page(&body_html, opts).into_string().into_bytes()
}

fn page(body_html: &str, opts: &RenderOptions<'_>) -> Markup {
    let page_title = match opts.title {
        Some(title) if !title.is_empty() => format!("{} · {}", title, opts.site_name),
        _ => opts.site_name.to_string(),
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page_title) }
                @if let Some(permalink) = opts.permalink {
                    link rel="canonical" href=(permalink);
                }
            }
            body {
                header.site-header {
                    @if let Some(title) = opts.title {
                        h1 { (title) }
                    }
                    @if opts.date.is_some() || !opts.authors.is_empty() {
                        p.byline {
                            @if let Some(date) = opts.date {
                                time datetime=(date.format("%Y-%m-%d")) {
                                    (date.format("%B %-d, %Y"))
                                }
                            }
                            @if !opts.authors.is_empty() {
                                " by " (opts.authors.join(", "))
                            }
                        }
                    }
                }
                main {
                    article {
                        (PreEscaped(body_html))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_str(body: &str, opts: &RenderOptions<'_>) -> String {
        String::from_utf8(render_html(body, opts)).unwrap()
    }

    #[test]
    fn converts_markdown_body() {
        let opts = RenderOptions {
            site_name: "Blog",
            ..Default::default()
        };
        let html = render_str("This is **bold** and *italic*.", &opts);
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn title_hint_lands_in_head_and_header() {
        let opts = RenderOptions {
            site_name: "Blog",
            title: Some("A Post"),
            ..Default::default()
        };
        let html = render_str("body", &opts);
        assert!(html.contains("<title>A Post · Blog</title>"));
        assert!(html.contains("<h1>A Post</h1>"));
    }

    #[test]
    fn no_title_falls_back_to_site_name() {
        let opts = RenderOptions {
            site_name: "Blog",
            ..Default::default()
        };
        let html = render_str("body", &opts);
        assert!(html.contains("<title>Blog</title>"));
        assert!(!html.contains("<h1>"));
    }

    #[test]
    fn date_and_authors_render_as_byline() {
        let authors = vec!["alice".to_string(), "bob".to_string()];
        let opts = RenderOptions {
            site_name: "Blog",
            title: Some("A Post"),
            permalink: None,
            date: NaiveDate::from_ymd_opt(2018, 1, 15),
            authors: &authors,
        };
        let html = render_str("body", &opts);
        assert!(html.contains(r#"datetime="2018-01-15""#));
        assert!(html.contains("January 15, 2018"));
        assert!(html.contains("by alice, bob"));
    }

    #[test]
    fn permalink_becomes_canonical_link() {
        let opts = RenderOptions {
            site_name: "Blog",
            permalink: Some("/blog/2018/01/15/a-post/"),
            ..Default::default()
        };
        let html = render_str("body", &opts);
        assert!(html.contains(r#"rel="canonical" href="/blog/2018/01/15/a-post/""#));
    }

    #[test]
    fn hint_interpolation_is_escaped() {
        let opts = RenderOptions {
            site_name: "Blog",
            title: Some("<script>alert('xss')</script>"),
            ..Default::default()
        };
        let html = render_str("body", &opts);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_body_still_renders_a_page() {
        let opts = RenderOptions {
            site_name: "Blog",
            ..Default::default()
        };
        let html = render_str("", &opts);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<article>"));
    }
}
