//! `META-INF/container.xml`: where the package document lives.

use std::io;

use crate::archive::Archive;
use crate::error::{Error, Result};
use crate::xml::{self, NodeExt};

/// Fixed location of the container descriptor in every EPUB.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Read the container descriptor and return the package document path.
pub fn locate_package(archive: &dyn Archive, encoding: Option<&str>) -> Result<String> {
    let text = archive
        .read_text(CONTAINER_PATH, encoding)
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingContainer,
            _ => Error::Io(e),
        })?;

    let path = parse_container_xml(&text)?;
    tracing::debug!(package = %path, "located package document");
    Ok(path)
}

/// Parse container.xml: the first `rootfile`'s `full-path`.
pub fn parse_container_xml(content: &str) -> Result<String> {
    let doc = xml::parse(content)?;

    doc.root_element()
        .find("rootfile")
        .and_then(|r| r.attribute("full-path"))
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .ok_or(Error::MissingRootfile)
}
