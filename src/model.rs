//! Plain data types produced by the load pipeline.

use std::collections::HashMap;

use crate::util::data_uri;

/// Media type of an EPUB 2 NCX table of contents.
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
/// Media type of XHTML content documents (and the EPUB 3 nav document).
pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";
/// Media type of stylesheets.
pub const CSS_MEDIA_TYPE: &str = "text/css";

/// Book metadata (Dublin Core). Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Metadata {
    pub title: Option<String>,
    /// First `dc:creator`.
    pub author: Option<String>,
    pub language: Option<String>,
    /// First `dc:identifier`.
    pub identifier: Option<String>,
    /// Archive path of the cover image, already resolved against the
    /// package folder.
    pub cover: Option<String>,

    /// Every `dc:creator`, in document order.
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub subjects: Vec<String>,
    pub date: Option<String>,
    pub rights: Option<String>,
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        if self.author.is_none() {
            self.author = Some(author.clone());
        }
        self.authors.push(author);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_cover(mut self, path: impl Into<String>) -> Self {
        self.cover = Some(path.into());
        self
    }
}

/// A `<manifest>` item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ManifestItem {
    pub id: String,
    /// Href as written, relative to the package document.
    pub href: String,
    /// Empty when the attribute is missing.
    pub media_type: String,
    /// Space-separated EPUB 3 properties (`nav`, `cover-image`, ...).
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    /// Whether the properties list contains `property` as a whole token.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == property))
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image")
    }

    pub fn is_stylesheet(&self) -> bool {
        self.media_type == CSS_MEDIA_TYPE
    }
}

/// The manifest: items keyed by id, iterated in document order.
///
/// Inserting an id that is already present replaces the item but keeps the
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    positions: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: ManifestItem) {
        match self.positions.get(&item.id) {
            Some(&pos) => self.items[pos] = item,
            None => {
                self.positions.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ManifestItem> {
        self.positions.get(id).map(|&pos| &self.items[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ManifestItem> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestItem>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for item in iter {
            manifest.insert(item);
        }
        manifest
    }
}

/// A `<spine>` entry; spine order is reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpineItem {
    pub idref: String,
}

impl SpineItem {
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
        }
    }
}

/// Everything read from the package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageData {
    pub metadata: Metadata,
    pub manifest: Manifest,
    pub spine: Vec<SpineItem>,
    /// Folder of the package document: `""` or a path ending in one `/`.
    pub base_folder: String,
}

/// A content document from the spine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Chapter {
    /// The spine idref.
    pub id: String,
    /// Display label. Manifest items have no title of their own, so the
    /// loader fills this with the manifest id.
    pub title: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    pub content: String,
    /// Href as written in the manifest.
    pub href: String,
}

impl Chapter {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        href: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            href: href.into(),
        }
    }
}

/// Loaded contents of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContent {
    /// Standard base64 of binary data (images).
    Base64(String),
    /// Decoded text (stylesheets).
    Text(String),
}

impl ResourceContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResourceContent::Text(t) => Some(t),
            ResourceContent::Base64(_) => None,
        }
    }

    pub fn as_base64(&self) -> Option<&str> {
        match self {
            ResourceContent::Base64(b) => Some(b),
            ResourceContent::Text(_) => None,
        }
    }
}

/// An image or stylesheet from the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resource {
    pub id: String,
    pub media_type: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    pub content: ResourceContent,
}

impl Resource {
    /// The resource as a `data:` URI.
    pub fn data_uri(&self) -> String {
        match &self.content {
            ResourceContent::Base64(b) => format!("data:{};base64,{}", self.media_type, b),
            ResourceContent::Text(t) => data_uri(&self.media_type, t.as_bytes()),
        }
    }
}

/// A table of contents entry (hierarchical).
///
/// `href` is kept exactly as written in the navigation file; resolve it with
/// [`Book::resolve_toc_entry`](crate::Book::resolve_toc_entry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TocEntry {
    pub title: String,
    pub href: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: TocEntry) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<TocEntry>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// This entry and all descendants, depth-first, with their depth
    /// (this entry is depth 0).
    pub fn flatten(&self) -> Vec<(usize, &TocEntry)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, self)];
        while let Some((depth, entry)) = stack.pop() {
            out.push((depth, entry));
            for child in entry.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}
