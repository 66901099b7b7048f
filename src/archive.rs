//! Archive access: the read-only file tree an EPUB lives in.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use zip::ZipArchive;

use crate::error::Result;
use crate::io::{ByteSource, ByteSourceCursor, FileSource, MemorySource};
use crate::util::decode_text;

/// Read-only access to the files inside an EPUB container.
///
/// All reads take `&self`; implementations must be safe to share across
/// threads. A missing entry is reported as [`io::ErrorKind::NotFound`].
pub trait Archive: Send + Sync {
    /// Whether an entry exists at `path`.
    fn contains(&self, path: &str) -> bool;

    /// Read the raw bytes of the entry at `path`.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Names of all entries, in archive order.
    fn entries(&self) -> Vec<String>;

    /// Read the entry at `path` as text.
    ///
    /// See [`decode_text`] for how `encoding` is used.
    fn read_text(&self, path: &str, encoding: Option<&str>) -> io::Result<String> {
        let bytes = self.read(path)?;
        Ok(decode_text(&bytes, encoding).into_owned())
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("File not found in archive: {}", path),
    )
}

// ----------------------------------------------------------------------------
// ZIP
// ----------------------------------------------------------------------------

/// A ZIP archive read by random access.
///
/// The central directory is scanned once; after that each entry is read
/// straight from the byte source and inflated, with no shared cursor.
pub struct ZipArchiveSource {
    source: Arc<dyn ByteSource>,
    index: HashMap<String, ZipEntryLoc>,
    names: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
struct ZipEntryLoc {
    /// Offset of the compressed data within the ZIP file.
    data_offset: u64,
    compressed_size: u64,
    compression: Compression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Compression {
    Stored,
    Deflated,
    Other,
}

impl From<zip::CompressionMethod> for Compression {
    fn from(method: zip::CompressionMethod) -> Self {
        match method {
            zip::CompressionMethod::Stored => Compression::Stored,
            zip::CompressionMethod::Deflated => Compression::Deflated,
            _ => Compression::Other,
        }
    }
}

impl ZipArchiveSource {
    /// Index a ZIP archive held by any [`ByteSource`].
    pub fn new(source: Arc<dyn ByteSource>) -> Result<Self> {
        let cursor = ByteSourceCursor::new(source.clone());
        let mut archive = ZipArchive::new(cursor)?;

        let mut index = HashMap::with_capacity(archive.len());
        let mut names = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();

            index.insert(
                name.clone(),
                ZipEntryLoc {
                    data_offset: file.data_start(),
                    compressed_size: file.compressed_size(),
                    compression: file.compression().into(),
                },
            );
            names.push(name);
        }

        tracing::debug!(entries = names.len(), "indexed ZIP archive");

        Ok(Self {
            source,
            index,
            names,
        })
    }

    /// Open a ZIP file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source = FileSource::open(path)?;
        Self::new(Arc::new(source))
    }

    /// Index a ZIP archive held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Arc::new(MemorySource::new(bytes)))
    }

    /// Look up an entry, retrying with a percent-decoded name.
    ///
    /// Some archives store `My Book.xhtml` while the manifest says
    /// `My%20Book.xhtml`.
    fn locate(&self, path: &str) -> Option<&ZipEntryLoc> {
        if let Some(loc) = self.index.get(path) {
            return Some(loc);
        }

        let decoded = percent_encoding::percent_decode_str(path)
            .decode_utf8()
            .ok()?;
        if decoded == path {
            return None;
        }
        self.index.get(decoded.as_ref())
    }

    fn read_entry(&self, path: &str, loc: ZipEntryLoc) -> io::Result<Vec<u8>> {
        let size = usize::try_from(loc.compressed_size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "entry too large"))?;
        let compressed = self.source.read_at(loc.data_offset, size)?;

        tracing::trace!(path, size, compression = ?loc.compression, "reading ZIP entry");

        match loc.compression {
            Compression::Stored => Ok(compressed),
            Compression::Deflated => {
                let mut decoder = flate2::read::DeflateDecoder::new(&compressed[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                Ok(out)
            }
            Compression::Other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("Unsupported compression method for {}", path),
            )),
        }
    }
}

impl Archive for ZipArchiveSource {
    fn contains(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let loc = *self.locate(path).ok_or_else(|| not_found(path))?;
        self.read_entry(path, loc)
    }

    fn entries(&self) -> Vec<String> {
        self.names.clone()
    }
}

// ----------------------------------------------------------------------------
// In-memory
// ----------------------------------------------------------------------------

/// An already-unpacked archive: a map from entry path to contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an entry.
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), data.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl Archive for MemoryArchive {
    fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn entries(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }
}
