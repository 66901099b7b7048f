//! Table of contents: EPUB 2 NCX, EPUB 3 nav document, or the spine.

use roxmltree::Node;

use crate::archive::Archive;
use crate::error::Result;
use crate::html::{self, Element};
use crate::model::{
    Manifest, ManifestItem, NCX_MEDIA_TYPE, PackageData, SpineItem, TocEntry, XHTML_MEDIA_TYPE,
};
use crate::xml::{self, NodeExt};

use super::read_manifest_text;

/// Where the table of contents comes from.
///
/// Chosen once from the manifest. The NCX wins whenever one is declared, even
/// if its file turns out to be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocSource<'a> {
    /// EPUB 2 NCX (`application/x-dtbncx+xml`).
    Ncx(&'a ManifestItem),
    /// EPUB 3 navigation document (XHTML item with the `nav` property).
    Nav(&'a ManifestItem),
    /// Neither: one flat entry per spine item.
    Spine,
}

impl<'a> TocSource<'a> {
    pub fn select(manifest: &'a Manifest) -> Self {
        if let Some(ncx) = manifest.iter().find(|i| i.media_type == NCX_MEDIA_TYPE) {
            return TocSource::Ncx(ncx);
        }
        if let Some(nav) = manifest
            .iter()
            .find(|i| i.media_type == XHTML_MEDIA_TYPE && i.has_property("nav"))
        {
            return TocSource::Nav(nav);
        }
        TocSource::Spine
    }
}

/// Build the table of contents for a parsed package.
///
/// Never fails: a missing or unparsable navigation file gives an empty TOC.
pub fn build_toc(
    archive: &dyn Archive,
    package: &PackageData,
    encoding: Option<&str>,
) -> Vec<TocEntry> {
    let source = TocSource::select(&package.manifest);

    let (item, parse): (&ManifestItem, fn(&str) -> Result<Vec<TocEntry>>) = match source {
        TocSource::Ncx(item) => (item, parse_ncx),
        TocSource::Nav(item) => (item, |content: &str| Ok(parse_nav_document(content))),
        TocSource::Spine => return toc_from_spine(&package.manifest, &package.spine),
    };

    let content = match read_manifest_text(archive, &package.base_folder, &item.href, encoding) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(href = %item.href, error = %e, "navigation file unavailable");
            return Vec::new();
        }
    };

    match parse(&content) {
        Ok(toc) => toc,
        Err(e) => {
            tracing::warn!(href = %item.href, error = %e, "failed to parse table of contents");
            Vec::new()
        }
    }
}

// ----------------------------------------------------------------------------
// NCX
// ----------------------------------------------------------------------------

/// Parse NCX table of contents.
pub fn parse_ncx(content: &str) -> Result<Vec<TocEntry>> {
    let doc = xml::parse(content)?;
    let nav_map = doc.root_element().find("navMap");

    Ok(nav_map.map(parse_nav_points).unwrap_or_default())
}

/// The direct `navPoint` children of `parent`, recursively.
fn parse_nav_points(parent: Node<'_, '_>) -> Vec<TocEntry> {
    parent
        .children()
        .filter(|n| n.is("navPoint"))
        .map(|point| {
            let label = point
                .child("navLabel")
                .and_then(|label| label.find("text"))
                .or_else(|| point.find("text"));
            let src = point.child("content").and_then(|c| c.attribute("src"));

            TocEntry {
                title: label
                    .map(|t| t.text_content().trim().to_string())
                    .unwrap_or_default(),
                href: src.unwrap_or_default().to_string(),
                children: parse_nav_points(point),
            }
        })
        .collect()
}

// ----------------------------------------------------------------------------
// EPUB 3 navigation document
// ----------------------------------------------------------------------------

/// Parse the `toc` nav of an EPUB 3 navigation document.
///
/// The document is read as HTML, so this never fails: markup errors are
/// recovered from, and a document without a usable nav gives an empty TOC.
pub fn parse_nav_document(content: &str) -> Vec<TocEntry> {
    let root = html::parse(content);

    let navs: Vec<&Element> = root.descendants().filter(|e| e.is("nav")).collect();

    // Prefer an explicitly marked nav; otherwise take the first one
    let Some(nav) = navs
        .iter()
        .find(|nav| is_toc_nav(nav))
        .or_else(|| navs.first())
    else {
        return Vec::new();
    };

    let list = nav
        .children()
        .find(|e| is_list(e))
        .or_else(|| nav.descendants().find(|e| is_list(e)));

    list.map(parse_nav_list).unwrap_or_default()
}

/// `epub:type="toc"` (any prefix), `role="doc-toc"` or a bare `type="toc"`.
fn is_toc_nav(nav: &Element) -> bool {
    nav.attributes().any(|(name, value)| {
        let has = |token: &str| value.split_ascii_whitespace().any(|t| t == token);
        match name.split_once(':') {
            Some((_, "type")) => has("toc"),
            None if name == "type" => has("toc"),
            None if name == "role" => has("doc-toc"),
            _ => false,
        }
    })
}

fn is_list(element: &Element) -> bool {
    element.is("ol") || element.is("ul")
}

/// The direct `li` children of a list, recursively.
fn parse_nav_list(list: &Element) -> Vec<TocEntry> {
    list.children_named("li")
        .filter_map(|li| {
            let Some(target) = link_target(li) else {
                tracing::debug!("skipping nav list item without a link");
                return None;
            };

            let children = li
                .children()
                .find(|e| is_list(e))
                .map(parse_nav_list)
                .unwrap_or_default();

            Some(TocEntry {
                title: target.text().trim().to_string(),
                href: target.attr("href").unwrap_or_default().to_string(),
                children,
            })
        })
        .collect()
}

/// The element an `li` links through: its first `<a href>`, else the first
/// element carrying an `href`. Nested lists belong to child entries and are
/// not searched.
fn link_target(li: &Element) -> Option<&Element> {
    fn collect<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
        for child in element.children() {
            if is_list(child) {
                continue;
            }
            if child.attr("href").is_some() {
                out.push(child);
            }
            collect(child, out);
        }
    }

    let mut candidates = Vec::new();
    collect(li, &mut candidates);
    candidates
        .iter()
        .find(|e| e.is("a"))
        .or_else(|| candidates.first())
        .copied()
}

// ----------------------------------------------------------------------------
// Spine fallback
// ----------------------------------------------------------------------------

/// One flat entry per spine item: the manifest id as title, its href as href.
pub fn toc_from_spine(manifest: &Manifest, spine: &[SpineItem]) -> Vec<TocEntry> {
    spine
        .iter()
        .filter_map(|item| manifest.get(&item.idref))
        .map(|item| TocEntry::new(&item.id, &item.href))
        .collect()
}
