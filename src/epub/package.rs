//! The OPF package document: metadata, manifest and spine.

use std::io;

use crate::archive::Archive;
use crate::error::{Error, Result};
use crate::href::normalize_base_folder;
use crate::model::{Manifest, ManifestItem, Metadata, PackageData, SpineItem};
use roxmltree::Node;

use crate::xml::{self, NodeExt};

/// Read and parse the package document at `opf_path`.
pub fn read_package(
    archive: &dyn Archive,
    opf_path: &str,
    encoding: Option<&str>,
) -> Result<PackageData> {
    let content = archive.read_text(opf_path, encoding).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::PackageNotFound(opf_path.to_string()),
        _ => Error::Io(e),
    })?;

    parse_opf(&content, &base_folder_of(opf_path))
}

/// The folder containing `opf_path`, normalized to `""` or `"dir/"`.
pub fn base_folder_of(opf_path: &str) -> String {
    match opf_path.rfind('/') {
        Some(i) => normalize_base_folder(&opf_path[..i]),
        None => String::new(),
    }
}

/// Parse OPF package document content.
///
/// `base_folder` is only used to turn the cover's manifest href into an
/// archive path.
pub fn parse_opf(content: &str, base_folder: &str) -> Result<PackageData> {
    let doc = xml::parse(content)?;
    let root = doc.root_element();
    let base_folder = normalize_base_folder(base_folder);

    let manifest = parse_manifest(root);
    let spine = parse_spine(root);

    let mut metadata = match root.find("metadata") {
        Some(section) => parse_metadata(section),
        None => Metadata::default(),
    };

    // EPUB 2 <meta name="cover">, then the EPUB 3 cover-image property
    let cover_item = root
        .find("metadata")
        .and_then(|section| {
            section
                .descendants()
                .find(|e| e.is("meta") && e.attribute("name") == Some("cover"))
        })
        .and_then(|meta| meta.attribute("content"))
        .and_then(|id| manifest.get(id))
        .or_else(|| manifest.iter().find(|item| item.has_property("cover-image")));
    metadata.cover = cover_item.map(|item| format!("{}{}", base_folder, item.href));

    tracing::debug!(
        manifest = manifest.len(),
        spine = spine.len(),
        base_folder = %base_folder,
        "parsed package document"
    );

    Ok(PackageData {
        metadata,
        manifest,
        spine,
        base_folder,
    })
}

fn parse_metadata(section: Node<'_, '_>) -> Metadata {
    let first = |local: &str| {
        section
            .descendants()
            .find(|e| e.is(local))
            .and_then(non_empty_text)
    };
    let all = |local: &str| -> Vec<String> {
        section
            .descendants()
            .filter(|e| e.is(local))
            .filter_map(non_empty_text)
            .collect()
    };

    Metadata {
        title: first("title"),
        author: first("creator"),
        language: first("language"),
        identifier: first("identifier"),
        cover: None,
        authors: all("creator"),
        publisher: first("publisher"),
        description: first("description"),
        subjects: all("subject"),
        date: first("date"),
        rights: first("rights"),
    }
}

fn non_empty_text(element: Node<'_, '_>) -> Option<String> {
    let text = element.text_content();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_manifest(root: Node<'_, '_>) -> Manifest {
    let mut manifest = Manifest::new();
    let Some(section) = root.child("manifest").or_else(|| root.find("manifest")) else {
        return manifest;
    };

    for item in section.children().filter(|n| n.is("item")) {
        match (item.attribute("id"), item.attribute("href")) {
            (Some(id), Some(href)) if !id.is_empty() && !href.is_empty() => {
                let mut entry =
                    ManifestItem::new(id, href, item.attribute("media-type").unwrap_or_default());
                entry.properties = item.attribute("properties").map(str::to_string);
                manifest.insert(entry);
            }
            _ => tracing::debug!(id = ?item.attribute("id"), "skipping manifest item without id or href"),
        }
    }

    manifest
}

fn parse_spine(root: Node<'_, '_>) -> Vec<SpineItem> {
    let Some(section) = root.child("spine").or_else(|| root.find("spine")) else {
        return Vec::new();
    };

    section
        .children()
        .filter(|n| n.is("itemref"))
        .filter_map(|itemref| match itemref.attribute("idref") {
            Some(idref) if !idref.is_empty() => Some(SpineItem::new(idref)),
            _ => {
                tracing::debug!("skipping spine itemref without idref");
                None
            }
        })
        .collect()
}
