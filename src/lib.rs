//! # folio
//!
//! A small library for reading EPUB files into a normalized document model.
//!
//! ## Features
//!
//! - EPUB 2 and EPUB 3 packages
//! - Metadata, chapters in reading order, images and stylesheets
//! - Table of contents from the NCX, the EPUB 3 nav document, or the spine
//! - Href resolution (`./`, `../`, `#fragment`) to chapters
//! - Random-access ZIP reading: only the entries you need are inflated
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::load_epub;
//!
//! let book = load_epub("input.epub")?;
//! println!("{:?} by {:?}", book.metadata().title, book.metadata().author);
//!
//! for chapter in book.chapters() {
//!     println!("{}: {} bytes", chapter.id, chapter.content.len());
//! }
//!
//! // Follow a link from inside a chapter
//! let target = book.resolve_href("Text/chapter2.xhtml#section-3");
//! println!("{:?} {:?}", target.chapter_index, target.fragment);
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! ## Without a ZIP file
//!
//! Anything implementing [`Archive`] can be loaded, such as an already
//! unpacked book:
//!
//! ```
//! use folio::{Book, LoadConfig, MemoryArchive};
//!
//! let archive = MemoryArchive::new()
//!     .with_file(
//!         "META-INF/container.xml",
//!         r#"<container><rootfiles><rootfile full-path="content.opf"/></rootfiles></container>"#,
//!     )
//!     .with_file(
//!         "content.opf",
//!         r#"<package>
//!              <metadata><title>Tiny</title></metadata>
//!              <manifest><item id="c1" href="c1.xhtml" media-type="application/xhtml+xml"/></manifest>
//!              <spine><itemref idref="c1"/></spine>
//!            </package>"#,
//!     )
//!     .with_file("c1.xhtml", "<html><body><p>Hello</p></body></html>");
//!
//! let book = Book::from_archive(archive, &LoadConfig::default())?;
//! assert_eq!(book.metadata().title.as_deref(), Some("Tiny"));
//! assert_eq!(book.chapter_count(), 1);
//! assert_eq!(book.toc()[0].href, "c1.xhtml");
//! # Ok::<(), folio::Error>(())
//! ```

pub mod archive;
pub mod book;
pub mod epub;
pub mod error;
pub mod href;
pub mod html;
pub mod io;
pub mod model;
pub mod util;
pub mod xml;

use std::path::Path;

pub use archive::{Archive, MemoryArchive, ZipArchiveSource};
pub use book::{Book, ChapterKey, ChapterMatch, HrefTarget, LoadConfig};
pub use epub::{BookParts, TocSource};
pub use error::{Error, Result};
pub use href::{ResolvedHref, normalize_base_folder, resolve_href_path, split_href};
pub use model::{
    Chapter, Manifest, ManifestItem, Metadata, PackageData, Resource, ResourceContent, SpineItem,
    TocEntry,
};

/// Load an EPUB file from disk.
pub fn load_epub(path: impl AsRef<Path>) -> Result<Book> {
    Book::open(path)
}

/// Load an EPUB file from disk with custom options.
pub fn load_epub_with_config(path: impl AsRef<Path>, config: &LoadConfig) -> Result<Book> {
    Book::from_archive(ZipArchiveSource::open(path)?, config)
}

/// Load an EPUB held in memory.
pub fn load_epub_from_bytes(bytes: Vec<u8>) -> Result<Book> {
    Book::from_bytes(bytes)
}

/// Load an EPUB held in memory with custom options.
pub fn load_epub_from_bytes_with_config(bytes: Vec<u8>, config: &LoadConfig) -> Result<Book> {
    Book::from_archive(ZipArchiveSource::from_bytes(bytes)?, config)
}
