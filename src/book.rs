//! The loaded book: a read-only view over metadata, chapters, resources and
//! the table of contents, with href lookup into the chapter list.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::path::Path;

use crate::archive::{Archive, ZipArchiveSource};
use crate::epub::{BookParts, assemble, locate_package, read_package};
use crate::error::Result;
use crate::href::{normalize_base_folder, resolve_href_path};
use crate::model::{Chapter, Metadata, Resource, TocEntry};
use crate::util::{data_uri, image_mime_from_path};

/// Options for loading a book.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Encoding label (e.g. `"iso-8859-1"`) tried when a text entry is not
    /// valid UTF-8. Windows-1252 is used when unset.
    pub encoding: Option<String>,
    /// Whether image and stylesheet resources are read into memory.
    pub load_resources: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            encoding: None,
            load_resources: true,
        }
    }
}

impl LoadConfig {
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn with_load_resources(mut self, load_resources: bool) -> Self {
        self.load_resources = load_resources;
        self
    }
}

/// How to pick a chapter: by position or by spine id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterKey<'a> {
    Index(usize),
    Id(&'a str),
}

impl From<usize> for ChapterKey<'_> {
    fn from(index: usize) -> Self {
        ChapterKey::Index(index)
    }
}

impl<'a> From<&'a str> for ChapterKey<'a> {
    fn from(id: &'a str) -> Self {
        ChapterKey::Id(id)
    }
}

/// Where an href points.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HrefTarget {
    /// Position of the chapter whose file the href names, if any.
    pub chapter_index: Option<usize>,
    /// Percent-decoded fragment.
    pub fragment: Option<String>,
    /// The href resolved against the package folder.
    pub normalized_path: String,
}

/// A chapter found by href, plus the fragment within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMatch<'a> {
    pub chapter: Option<&'a Chapter>,
    pub fragment: Option<String>,
}

/// A loaded EPUB.
///
/// Built once by the load pipeline and never mutated. The archive stays open
/// for [`file`](Self::file) and [`cover_image_data`](Self::cover_image_data).
///
/// # Example
///
/// ```no_run
/// use folio::Book;
///
/// let book = Book::open("book.epub")?;
/// println!("{:?}", book.metadata().title);
///
/// for entry in book.toc() {
///     let target = book.resolve_toc_entry(entry);
///     println!("{} -> {:?}", entry.title, target.chapter_index);
/// }
/// # Ok::<(), folio::Error>(())
/// ```
pub struct Book {
    metadata: Metadata,
    chapters: Vec<Chapter>,
    resources: BTreeMap<String, Resource>,
    toc: Vec<TocEntry>,
    base_folder: String,

    /// Resolved chapter path -> first chapter position with that path.
    chapter_index: HashMap<String, usize>,

    archive: Box<dyn Archive>,
}

impl Book {
    /// Open an EPUB file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let archive = ZipArchiveSource::open(path)?;
        Self::from_archive(archive, &LoadConfig::default())
    }

    /// Load an EPUB held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchiveSource::from_bytes(bytes)?;
        Self::from_archive(archive, &LoadConfig::default())
    }

    /// Run the load pipeline over any archive.
    pub fn from_archive<A: Archive + 'static>(archive: A, config: &LoadConfig) -> Result<Self> {
        let encoding = config.encoding.as_deref();

        let opf_path = locate_package(&archive, encoding)?;
        let package = read_package(&archive, &opf_path, encoding)?;
        let parts = assemble(&archive, package, config);

        Ok(Self::from_parts(parts, Box::new(archive)))
    }

    /// Build a book from already-assembled parts.
    pub fn from_parts(parts: BookParts, archive: Box<dyn Archive>) -> Self {
        let base_folder = normalize_base_folder(&parts.base_folder);

        let mut chapter_index = HashMap::with_capacity(parts.chapters.len());
        for (i, chapter) in parts.chapters.iter().enumerate() {
            let path = resolve_href_path(&base_folder, &chapter.href).normalized;
            chapter_index.entry(path).or_insert(i);
        }

        Self {
            metadata: parts.metadata,
            chapters: parts.chapters,
            resources: parts.resources,
            toc: parts.toc,
            base_folder,
            chapter_index,
            archive,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Chapters in reading order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Images and stylesheets, keyed by manifest id.
    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    /// Folder of the package document, `""` or ending in `/`.
    pub fn base_folder(&self) -> &str {
        &self.base_folder
    }

    /// Look up a chapter by position or by id (first match).
    ///
    /// ```no_run
    /// # let book = folio::Book::open("book.epub")?;
    /// let first = book.chapter(0);
    /// let intro = book.chapter("intro");
    /// # Ok::<(), folio::Error>(())
    /// ```
    pub fn chapter<'k>(&self, key: impl Into<ChapterKey<'k>>) -> Option<&Chapter> {
        match key.into() {
            ChapterKey::Index(i) => self.chapters.get(i),
            ChapterKey::Id(id) => self.chapters.iter().find(|c| c.id == id),
        }
    }

    /// Resolve an href (relative to the package folder) to a chapter.
    ///
    /// The normalized path and fragment are returned even when no chapter
    /// matches.
    pub fn resolve_href(&self, href: &str) -> HrefTarget {
        let resolved = resolve_href_path(&self.base_folder, href);
        let chapter_index = self.chapter_index.get(&resolved.normalized).copied();

        HrefTarget {
            chapter_index,
            fragment: resolved.fragment,
            normalized_path: resolved.normalized,
        }
    }

    /// [`resolve_href`](Self::resolve_href) followed by a chapter lookup.
    pub fn chapter_by_href(&self, href: &str) -> ChapterMatch<'_> {
        let target = self.resolve_href(href);
        ChapterMatch {
            chapter: target.chapter_index.and_then(|i| self.chapters.get(i)),
            fragment: target.fragment,
        }
    }

    /// Resolve a TOC entry's href against this book.
    pub fn resolve_toc_entry(&self, entry: &TocEntry) -> HrefTarget {
        self.resolve_href(&entry.href)
    }

    /// The cover image as a `data:` URI.
    ///
    /// `None` when no cover is declared or its file is missing.
    pub fn cover_image_data(&self) -> Option<String> {
        let path = self.metadata.cover.as_deref()?;
        let data = self.file(path)?;
        Some(data_uri(image_mime_from_path(path), &data))
    }

    /// Raw bytes of an archive entry.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.archive.read(path) {
            Ok(data) => Some(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!(path, error = %e, "failed to read archive entry");
                None
            }
        }
    }

    /// Names of all archive entries.
    pub fn entries(&self) -> Vec<String> {
        self.archive.entries()
    }
}

impl fmt::Debug for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Book")
            .field("metadata", &self.metadata)
            .field("chapters", &self.chapters.len())
            .field("resources", &self.resources.len())
            .field("toc", &self.toc.len())
            .field("base_folder", &self.base_folder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;

    fn chapter(id: &str, href: &str) -> Chapter {
        Chapter::new(id, id, format!("<p>{}</p>", id), href)
    }

    fn book_with(chapters: Vec<Chapter>, archive: MemoryArchive, cover: Option<&str>) -> Book {
        let mut metadata = Metadata::new("Test");
        metadata.cover = cover.map(str::to_string);

        let parts = BookParts {
            metadata,
            chapters,
            base_folder: "OEBPS/".into(),
            ..Default::default()
        };
        Book::from_parts(parts, Box::new(archive))
    }

    fn sample_book() -> Book {
        book_with(
            vec![
                chapter("c14", "Text/14_Chapter_3.html"),
                chapter("c15", "./Text/15_Chapter_4.html"),
                chapter("c16", "../other/16.html"),
            ],
            MemoryArchive::new(),
            None,
        )
    }

    #[test]
    fn test_resolve_href_to_chapter() {
        let book = sample_book();

        let target = book.resolve_href("Text/14_Chapter_3.html#s7");
        assert_eq!(target.chapter_index, Some(0));
        assert_eq!(target.fragment.as_deref(), Some("s7"));
        assert_eq!(target.normalized_path, "OEBPS/Text/14_Chapter_3.html");

        let target = book.resolve_href("Text/15_Chapter_4.html");
        assert_eq!(target.chapter_index, Some(1));
        assert_eq!(target.fragment, None);

        let target = book.resolve_href("../other/16.html#part");
        assert_eq!(target.chapter_index, Some(2));
        assert_eq!(target.fragment.as_deref(), Some("part"));
        assert_eq!(target.normalized_path, "other/16.html");
    }

    #[test]
    fn test_resolve_href_unmatched_keeps_fragment() {
        let target = sample_book().resolve_href("Text/missing.html#note-3");
        assert_eq!(target.chapter_index, None);
        assert_eq!(target.fragment.as_deref(), Some("note-3"));
        assert_eq!(target.normalized_path, "OEBPS/Text/missing.html");
    }

    #[test]
    fn test_resolve_href_is_deterministic() {
        let book = sample_book();
        assert_eq!(book.resolve_href("./Text/../Text/14_Chapter_3.html#a"), book.resolve_href("Text/14_Chapter_3.html#a"));
    }

    #[test]
    fn test_duplicate_chapter_paths_first_wins() {
        let book = book_with(
            vec![
                chapter("a", "Text/a.html"),
                chapter("b", "Text/b.html"),
                chapter("a-again", "./Text/a.html"),
            ],
            MemoryArchive::new(),
            None,
        );
        assert_eq!(book.resolve_href("Text/a.html").chapter_index, Some(0));
    }

    #[test]
    fn test_chapter_by_key() {
        let book = sample_book();

        assert_eq!(book.chapter(1).map(|c| c.id.as_str()), Some("c15"));
        assert!(book.chapter(3).is_none());
        assert_eq!(book.chapter("c16").map(|c| c.href.as_str()), Some("../other/16.html"));
        assert!(book.chapter("nope").is_none());
        assert_eq!(book.chapter_count(), 3);
    }

    #[test]
    fn test_chapter_by_href() {
        let book = sample_book();

        let found = book.chapter_by_href("Text/15_Chapter_4.html#top");
        assert_eq!(found.chapter.map(|c| c.id.as_str()), Some("c15"));
        assert_eq!(found.fragment.as_deref(), Some("top"));

        let missing = book.chapter_by_href("nowhere.html#x");
        assert!(missing.chapter.is_none());
        assert_eq!(missing.fragment.as_deref(), Some("x"));
    }

    #[test]
    fn test_resolve_toc_entry() {
        let book = sample_book();
        let entry = TocEntry::new("Chapter 3", "Text/14_Chapter_3.html#s7");
        assert_eq!(book.resolve_toc_entry(&entry), book.resolve_href(&entry.href));
    }

    #[test]
    fn test_cover_image_data() {
        let archive = MemoryArchive::new().with_file("OEBPS/Images/cover.PNG", vec![1, 2, 3]);
        let book = book_with(Vec::new(), archive, Some("OEBPS/Images/cover.PNG"));
        assert_eq!(book.cover_image_data().as_deref(), Some("data:image/png;base64,AQID"));
    }

    #[test]
    fn test_cover_image_data_defaults_to_jpeg() {
        let archive = MemoryArchive::new().with_file("cover.webp", vec![0xFF]);
        let book = book_with(Vec::new(), archive, Some("cover.webp"));
        assert_eq!(book.cover_image_data().as_deref(), Some("data:image/jpeg;base64,/w=="));
    }

    #[test]
    fn test_cover_image_data_absent() {
        assert!(sample_book().cover_image_data().is_none());

        let book = book_with(Vec::new(), MemoryArchive::new(), Some("OEBPS/missing.jpg"));
        assert!(book.cover_image_data().is_none());
    }

    #[test]
    fn test_file_passthrough() {
        let archive = MemoryArchive::new().with_file("META-INF/com.apple.ibooks.display-options.xml", "<x/>");
        let book = book_with(Vec::new(), archive, None);

        assert_eq!(book.file("META-INF/com.apple.ibooks.display-options.xml").as_deref(), Some(&b"<x/>"[..]));
        assert!(book.file("nope").is_none());
        assert_eq!(book.entries(), vec!["META-INF/com.apple.ibooks.display-options.xml"]);
    }

    #[test]
    fn test_base_folder_is_normalized() {
        let parts = BookParts {
            base_folder: "/OPS//".into(),
            chapters: vec![chapter("a", "a.xhtml")],
            ..Default::default()
        };
        let book = Book::from_parts(parts, Box::new(MemoryArchive::new()));
        assert_eq!(book.base_folder(), "OPS/");
        assert_eq!(book.resolve_href("a.xhtml").chapter_index, Some(0));
    }

    #[test]
    fn test_debug_omits_archive() {
        let debug = format!("{:?}", sample_book());
        assert!(debug.starts_with("Book {"));
        assert!(debug.contains("chapters: 3"));
        assert!(!debug.contains("archive"));
    }

    #[test]
    fn test_book_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Book>();
    }
}
