//! EPUB structure: container, package document, table of contents, and
//! assembly into a [`BookParts`](assembler::BookParts).

pub mod assembler;
pub mod container;
pub mod package;
pub mod toc;

use std::io;

use crate::archive::Archive;
use crate::href::resolve_href_path;

pub use assembler::{BookParts, assemble};
pub use container::{CONTAINER_PATH, locate_package, parse_container_xml};
pub use package::{parse_opf, read_package};
pub use toc::{TocSource, build_toc, parse_nav_document, parse_ncx};

/// Read a manifest item's file as `base_folder + href`.
///
/// When that exact entry is missing and the href has `./` or `../` segments,
/// the resolved path is tried as well.
pub(crate) fn read_manifest_entry(
    archive: &dyn Archive,
    base_folder: &str,
    href: &str,
) -> io::Result<Vec<u8>> {
    let joined = format!("{}{}", base_folder, href);
    match archive.read(&joined) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let resolved = resolve_href_path(base_folder, href).normalized;
            if resolved == joined {
                return Err(e);
            }
            tracing::trace!(href, path = %resolved, "retrying with resolved path");
            archive.read(&resolved)
        }
        result => result,
    }
}

/// [`read_manifest_entry`], decoded as text.
pub(crate) fn read_manifest_text(
    archive: &dyn Archive,
    base_folder: &str,
    href: &str,
    encoding: Option<&str>,
) -> io::Result<String> {
    let bytes = read_manifest_entry(archive, base_folder, href)?;
    Ok(crate::util::decode_text(&bytes, encoding).into_owned())
}
