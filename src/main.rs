use blogroll::aggregate::{AggregateOptions, KeySpace, backfill};
use blogroll::render::RenderOptions;
use blogroll::{config, crawl, frontmatter, output, render, rollup, search, writer};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

#[derive(Parser)]
#[command(name = "blogroll")]
#[command(about = "Index and search-document generator for markdown blogs")]
#[command(long_about = "\
Index and search-document generator for markdown blogs

Your filesystem is the data source. One post per directory, organized by
publish date, each post a markdown file with a front matter header:

  content/
  ├── config.toml                  # Site config (optional)
  └── 2018/01/15/a-post/
      └── index.md                 # ---
                                   # title: A Post
                                   # authors: [alice]
                                   # tags: [maps, open-data]
                                   # ---
                                   # Body markdown...

Posts without a date: header value, then /YYYY/MM/DD/ path segments, then
file modification time. Permalinks default to the post's directory under
the configured base URL.

Run 'blogroll gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output sink: fs=PATH, stdout, or null
    #[arg(long, default_value = "fs=dist", global = true)]
    writer: String,

    /// Per-post source filename (overrides config.toml)
    #[arg(long, global = true)]
    input: Option<String>,

    /// Generated filename per listing/rollup (overrides config.toml)
    #[arg(long, global = true)]
    output: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate grouped listings and a rollup from the content tree
    Index {
        /// Key space to group by
        #[arg(long, value_enum, default_value = "date")]
        mode: Mode,
    },
    /// Render individual documents to standalone HTML pages
    Html {
        /// Markdown files to render (must live under --source)
        files: Vec<PathBuf>,
    },
    /// Extract search documents and emit them as JSON lines
    Search,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Date,
    Authors,
    Tags,
}

impl From<Mode> for KeySpace {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Date => KeySpace::Date,
            Mode::Authors => KeySpace::Authors,
            Mode::Tags => KeySpace::Tags,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if matches!(cli.command, Command::GenConfig) {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = config::load_config(&cli.source)?;
    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    config.validate()?;

    let writer = writer::for_spec(&cli.writer)?;

    match cli.command {
        Command::Index { mode } => {
            let report = rollup::build_index(&cli.source, mode.into(), &config, writer.as_ref())?;
            output::print_index_report(&report);
            if !report.failed.is_empty() {
                return Err(format!("{} outputs failed to write", report.failed.len()).into());
            }
        }
        Command::Html { files } => {
            if files.is_empty() {
                return Err("no files given".into());
            }
            let opts = AggregateOptions {
                input: &config.input,
                site_root: &cli.source,
                base_url: &config.base_url,
                date_formats: &config.date_formats,
            };
            for file in &files {
                let document = frontmatter::parse_file(file)?;
                let body = document.body.clone();
                let post = backfill(document, file, &opts)?;

                let title = post.front_matter.title.as_str();
                let html = render::render_html(
                    &body,
                    &RenderOptions {
                        site_name: &config.site_name,
                        title: (!title.is_empty()).then_some(title),
                        permalink: Some(post.permalink.as_str()),
                        date: Some(post.date),
                        authors: &post.front_matter.authors,
                    },
                );

                let out_path = permalink_to_path(&post.permalink, &config.base_url)
                    .join(&config.output);
                writer.write(&out_path, &html)?;
                println!("{} → {}", file.display(), out_path.display());
            }
        }
        Command::Search => {
            let docs = extract_search_documents(&cli.source, &config.input)?;
            let mut ndjson = Vec::new();
            for doc in &docs {
                serde_json::to_writer(&mut ndjson, doc)?;
                ndjson.push(b'\n');
            }
            let out_path = Path::new("search.ndjson");
            writer.write(out_path, &ndjson)?;
            output::print_search_report(&docs, out_path);
        }
        // Handled before config loading; nothing to do here.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Map a permalink to a writer-relative directory: the base URL prefix is
/// the output root, anything else keeps its own (slash-trimmed) path.
fn permalink_to_path(permalink: &str, base_url: &str) -> PathBuf {
    let rel = permalink
        .strip_prefix(base_url)
        .unwrap_or(permalink)
        .trim_matches('/');
    PathBuf::from(rel)
}

/// Build a search document for every matching file under the root, sorted
/// by path. Unparseable documents are logged and skipped.
fn extract_search_documents(
    root: &Path,
    input: &str,
) -> Result<Vec<search::SearchDocument>, crawl::CrawlError> {
    let found: Mutex<Vec<(PathBuf, search::SearchDocument)>> = Mutex::new(Vec::new());

    crawl::crawl(root, |path, is_dir| {
        if is_dir || path.file_name().and_then(|n| n.to_str()) != Some(input) {
            return Ok(());
        }
        match frontmatter::parse_file(path) {
            Ok(document) => {
                let doc = search::extract(&document);
                found
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((path.to_path_buf(), doc));
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unparseable document");
            }
        }
        Ok(())
    })?;

    let mut found = found.into_inner().unwrap_or_else(PoisonError::into_inner);
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, doc)| doc).collect())
}
