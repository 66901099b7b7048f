//! Shared helpers: build EPUB archives in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Assembles an EPUB ZIP: `mimetype` stored first, everything else deflated.
#[derive(Default)]
pub struct EpubBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with the standard container pointing at `OEBPS/content.opf`.
    pub fn with_container() -> Self {
        Self::new().file("META-INF/container.xml", CONTAINER_XML)
    }

    pub fn file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.to_string(), data.into()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (path, data) in self.files {
            zip.start_file(path, deflated).unwrap();
            zip.write_all(&data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}

pub fn xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{title}</title></head>
<body>{body}</body></html>"#
    )
}

/// An EPUB 2 book with an NCX, a cover and a stylesheet.
pub fn epub2() -> Vec<u8> {
    let opf = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>Short Works</dc:title>
    <dc:creator opf:role="aut">Epictetus</dc:creator>
    <dc:creator opf:role="trl">George Long</dc:creator>
    <dc:language>en-GB</dc:language>
    <dc:identifier id="uid">urn:uuid:7a8c3a6e-0000-4000-8000-000000000001</dc:identifier>
    <meta name="cover" content="cover-image"/>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="css" href="Styles/core.css" media-type="text/css"/>
    <item id="cover-image" href="Images/cover.png" media-type="image/png"/>
    <item id="titlepage" href="Text/titlepage.xhtml" media-type="application/xhtml+xml"/>
    <item id="enchiridion" href="Text/enchiridion.xhtml" media-type="application/xhtml+xml"/>
    <item id="fragments" href="Text/fragments.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="titlepage"/>
    <itemref idref="enchiridion"/>
    <itemref idref="fragments"/>
  </spine>
</package>"#;

    let ncx = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head/>
  <docTitle><text>Short Works</text></docTitle>
  <navMap>
    <navPoint id="np-1" playOrder="1">
      <navLabel><text>Titlepage</text></navLabel>
      <content src="Text/titlepage.xhtml"/>
    </navPoint>
    <navPoint id="np-2" playOrder="2">
      <navLabel><text>The Enchiridion</text></navLabel>
      <content src="Text/enchiridion.xhtml"/>
      <navPoint id="np-3" playOrder="3">
        <navLabel><text>I</text></navLabel>
        <content src="Text/enchiridion.xhtml#chapter-1"/>
      </navPoint>
      <navPoint id="np-4" playOrder="4">
        <navLabel><text>II</text></navLabel>
        <content src="Text/enchiridion.xhtml#chapter-2"/>
      </navPoint>
    </navPoint>
    <navPoint id="np-5" playOrder="5">
      <navLabel><text>Fragments</text></navLabel>
      <content src="Text/fragments.xhtml"/>
    </navPoint>
  </navMap>
</ncx>"#;

    EpubBuilder::with_container()
        .file("OEBPS/content.opf", opf)
        .file("OEBPS/toc.ncx", ncx)
        .file("OEBPS/Styles/core.css", "body { margin: 0 }")
        .file("OEBPS/Images/cover.png", vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
        .file("OEBPS/Text/titlepage.xhtml", xhtml("Titlepage", "<h1>Short Works</h1>"))
        .file(
            "OEBPS/Text/enchiridion.xhtml",
            xhtml(
                "The Enchiridion",
                r#"<section id="chapter-1"><p>Some things are in our control.</p></section>
<section id="chapter-2"><p>Remember that desire demands its object.</p></section>"#,
            ),
        )
        .file("OEBPS/Text/fragments.xhtml", xhtml("Fragments", "<p>Fragments</p>"))
        .build()
}

/// An EPUB 3 book with a nav document and a `cover-image` property.
pub fn epub3() -> Vec<u8> {
    let opf = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:isbn:9780000000002</dc:identifier>
    <dc:title>Modern Book</dc:title>
    <dc:creator>Jane Writer</dc:creator>
    <dc:language>fr</dc:language>
    <dc:publisher>Folio Press</dc:publisher>
    <dc:subject>Essays</dc:subject>
    <meta property="dcterms:modified">2024-01-01T00:00:00Z</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="cover" href="images/cover.jpg" media-type="image/jpeg" properties="cover-image"/>
    <item id="c1" href="text/c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="text/c2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="c1"/>
    <itemref idref="c2"/>
  </spine>
</package>"#;

    let nav = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Contents</title></head>
<body>
  <nav epub:type="landmarks" hidden="">
    <ol><li><a epub:type="bodymatter" href="text/c1.xhtml">Start</a></li></ol>
  </nav>
  <nav epub:type="toc" id="toc">
    <h2>Contents</h2>
    <ol>
      <li><a href="text/c1.xhtml">One</a></li>
      <li><a href="text/c2.xhtml">Two</a>
        <ol><li><a href="text/c2.xhtml#s%201">Two, part 1</a></li></ol>
      </li>
    </ol>
  </nav>
</body>
</html>"#;

    EpubBuilder::with_container()
        .file("OEBPS/content.opf", opf)
        .file("OEBPS/nav.xhtml", nav)
        .file("OEBPS/images/cover.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file("OEBPS/text/c1.xhtml", xhtml("One", "<p>One</p>"))
        .file("OEBPS/text/c2.xhtml", xhtml("Two", r#"<p id="s 1">Two</p>"#))
        .build()
}
