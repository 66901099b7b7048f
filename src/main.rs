//! folio - inspect EPUB files

use std::io;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use folio::{Book, Chapter, HrefTarget, Metadata, Resource, TocEntry};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Inspect EPUB files", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio book.epub                          Show metadata and counts
    folio book.epub --toc                    Print the table of contents
    folio book.epub --resolve Text/c2.xhtml  Resolve an href to a chapter
    folio book.epub --json                   Machine-readable summary")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Print the table of contents
    #[arg(long)]
    toc: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Resolve an href against the package folder
    #[arg(long, value_name = "HREF")]
    resolve: Option<String>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Summary<'a> {
    metadata: &'a Metadata,
    base_folder: &'a str,
    chapters: &'a [Chapter],
    resources: Vec<&'a Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    toc: Option<&'a [TocEntry]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<HrefTarget>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "folio=debug",
        _ => "folio=trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> folio::Result<()> {
    let book = Book::open(&cli.input)?;
    let resolved = cli.resolve.as_deref().map(|href| book.resolve_href(href));

    if cli.json {
        let summary = Summary {
            metadata: book.metadata(),
            base_folder: book.base_folder(),
            chapters: book.chapters(),
            resources: book.resources().values().collect(),
            toc: cli.toc.then(|| book.toc()),
            resolved,
        };
        let json = serde_json::to_string_pretty(&summary).map_err(io::Error::from)?;
        println!("{json}");
        return Ok(());
    }

    if let Some(target) = resolved {
        show_resolved(&book, &target);
    } else if cli.toc {
        show_toc(book.toc());
    } else {
        show_info(&cli.input, &book);
    }

    Ok(())
}

fn show_info(path: &str, book: &Book) {
    let meta = book.metadata();
    println!("File: {path}");
    if let Some(ref title) = meta.title {
        println!("Title: {title}");
    }
    if !meta.authors.is_empty() {
        println!("Authors: {}", meta.authors.join(", "));
    }
    if let Some(ref language) = meta.language {
        println!("Language: {language}");
    }
    if let Some(ref identifier) = meta.identifier {
        println!("Identifier: {identifier}");
    }
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    if let Some(ref desc) = meta.description {
        match desc.char_indices().nth(200) {
            Some((end, _)) => println!("Description: {}...", &desc[..end]),
            None => println!("Description: {desc}"),
        }
    }
    if let Some(ref cover) = meta.cover {
        println!("Cover: {cover}");
    }
    println!("Chapters: {}", book.chapter_count());
    println!("TOC entries: {}", book.toc().len());
    println!("Resources: {}", book.resources().len());
}

fn show_toc(toc: &[TocEntry]) {
    for entry in toc {
        for (depth, item) in entry.flatten() {
            println!("{}{} ({})", "  ".repeat(depth), item.title, item.href);
        }
    }
}

fn show_resolved(book: &Book, target: &HrefTarget) {
    println!("Path: {}", target.normalized_path);
    if let Some(ref fragment) = target.fragment {
        println!("Fragment: {fragment}");
    }
    let chapter = target
        .chapter_index
        .and_then(|i| book.chapter(i).map(|c| (i, c)));
    match chapter {
        Some((index, chapter)) => println!("Chapter: {index} ({})", chapter.id),
        None => println!("Chapter: none"),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_returns_library_errors() {
        let cli = Cli::parse_from(["folio", "/nonexistent/book.epub", "--json", "--toc"]);
        assert!(matches!(run(&cli), Err(folio::Error::Io(_))));
    }
}
