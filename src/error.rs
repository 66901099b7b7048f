//! Error types for folio operations.

use thiserror::Error;

/// Errors that abort loading a book.
///
/// Anything not listed here (a missing chapter file, a broken table of
/// contents, an unresolvable cover) degrades to an absent value instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("container.xml not found")]
    MissingContainer,

    #[error("Rootfile path missing in container.xml")]
    MissingRootfile,

    #[error("OPF file not found: {0}")]
    PackageNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
