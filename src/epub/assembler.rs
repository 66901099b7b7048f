//! Turn parsed package data into chapters, resources and a TOC.

use std::collections::BTreeMap;

use crate::archive::Archive;
use crate::book::LoadConfig;
use crate::model::{Chapter, Metadata, PackageData, Resource, ResourceContent, TocEntry};
use crate::util::{decode_text, encode_base64};

use super::read_manifest_entry;
use super::toc::build_toc;

/// Everything a [`Book`](crate::Book) is built from, apart from the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookParts {
    pub metadata: Metadata,
    /// Spine order.
    pub chapters: Vec<Chapter>,
    /// Keyed by manifest id.
    pub resources: BTreeMap<String, Resource>,
    pub toc: Vec<TocEntry>,
    pub base_folder: String,
}

/// Read chapters and resources for `package` and build its TOC.
pub fn assemble(archive: &dyn Archive, package: PackageData, config: &LoadConfig) -> BookParts {
    let encoding = config.encoding.as_deref();

    let chapters = load_chapters(archive, &package, encoding);
    let resources = if config.load_resources {
        load_resources(archive, &package, encoding)
    } else {
        BTreeMap::new()
    };
    let toc = build_toc(archive, &package, encoding);

    tracing::debug!(
        chapters = chapters.len(),
        resources = resources.len(),
        toc = toc.len(),
        "assembled book"
    );

    BookParts {
        metadata: package.metadata,
        chapters,
        resources,
        toc,
        base_folder: package.base_folder,
    }
}

fn load_chapters(
    archive: &dyn Archive,
    package: &PackageData,
    encoding: Option<&str>,
) -> Vec<Chapter> {
    let mut chapters = Vec::with_capacity(package.spine.len());

    for spine_item in &package.spine {
        let Some(item) = package.manifest.get(&spine_item.idref) else {
            tracing::debug!(idref = %spine_item.idref, "spine item has no manifest entry");
            continue;
        };

        let data = match read_manifest_entry(archive, &package.base_folder, &item.href) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(href = %item.href, error = %e, "skipping unreadable chapter");
                continue;
            }
        };

        chapters.push(Chapter {
            id: spine_item.idref.clone(),
            title: item.id.clone(),
            content: decode_text(&data, encoding).into_owned(),
            href: item.href.clone(),
        });
    }

    chapters
}

fn load_resources(
    archive: &dyn Archive,
    package: &PackageData,
    encoding: Option<&str>,
) -> BTreeMap<String, Resource> {
    let mut resources = BTreeMap::new();

    for item in package.manifest.iter() {
        let is_text = if item.is_image() {
            false
        } else if item.is_stylesheet() {
            true
        } else {
            continue;
        };

        let data = match read_manifest_entry(archive, &package.base_folder, &item.href) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(href = %item.href, error = %e, "skipping unreadable resource");
                continue;
            }
        };

        let content = if is_text {
            ResourceContent::Text(decode_text(&data, encoding).into_owned())
        } else {
            ResourceContent::Base64(encode_base64(&data))
        };

        resources.insert(
            item.id.clone(),
            Resource {
                id: item.id.clone(),
                media_type: item.media_type.clone(),
                content,
            },
        );
    }

    resources
}
