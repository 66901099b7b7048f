//! Href resolution against the package folder.
//!
//! Manifest, spine and TOC hrefs are relative to the package document, may
//! carry `./` and `../` segments, and may end in a `#fragment`. Everything
//! that uses a path as a lookup key goes through [`resolve_href_path`], so the
//! same href always maps to the same archive path.

use percent_encoding::percent_decode_str;

/// An href resolved to an archive path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ResolvedHref {
    /// Archive-relative path: no leading slash, no `.`/`..`, no `//`.
    pub normalized: String,
    /// Percent-decoded fragment, if the href had a `#`.
    pub fragment: Option<String>,
}

/// Split an href into its path and percent-decoded fragment.
///
/// Only the fragment is decoded; the path is returned as written.
///
/// ```
/// use folio::href::split_href;
///
/// assert_eq!(split_href("a.html#s7%20x"), ("a.html", Some("s7 x".to_string())));
/// assert_eq!(split_href("a%20b.html"), ("a%20b.html", None));
/// ```
pub fn split_href(href: &str) -> (&str, Option<String>) {
    match href.split_once('#') {
        Some((path, fragment)) => {
            let fragment = percent_decode_str(fragment).decode_utf8_lossy().into_owned();
            (path, Some(fragment))
        }
        None => (href, None),
    }
}

/// Normalize a base folder to `""` or `"some/path/"`.
///
/// Leading and trailing slashes are stripped, then exactly one trailing
/// slash is added back if anything is left.
pub fn normalize_base_folder(base: &str) -> String {
    let trimmed = base.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Resolve `href` against `base_folder` into an archive path and fragment.
///
/// `.` segments are dropped, `..` removes the previous segment (stopping at
/// the archive root), and an href starting with `/` ignores the base. The
/// base folder's own segments go through the same rules. Empty segments
/// from `//` count as segments for `..` and are only collapsed when the
/// result is joined, as URL resolution does.
///
/// ```
/// use folio::href::resolve_href_path;
///
/// let r = resolve_href_path("OEBPS/Text/", "../cover.jpg");
/// assert_eq!(r.normalized, "OEBPS/cover.jpg");
///
/// let r = resolve_href_path("OEBPS/", "Text/14.html#s7");
/// assert_eq!(r.normalized, "OEBPS/Text/14.html");
/// assert_eq!(r.fragment.as_deref(), Some("s7"));
/// ```
pub fn resolve_href_path(base_folder: &str, href: &str) -> ResolvedHref {
    let (path, fragment) = split_href(href);

    let mut segments: Vec<&str> = Vec::new();
    let base = base_folder.trim_start_matches('/').trim_end_matches('/');
    if !path.starts_with('/') && !base.is_empty() {
        for part in base.split('/') {
            match part {
                "." => {}
                ".." => {
                    segments.pop();
                }
                name => segments.push(name),
            }
        }
    }

    // A path that names a directory ("", "dir/", "..", ".") keeps its
    // trailing slash, as URL resolution does.
    let mut trailing_slash = false;
    let mut parts = path.split('/').peekable();
    while let Some(part) = parts.next() {
        let is_last = parts.peek().is_none();
        match part {
            "." => trailing_slash = is_last,
            ".." => {
                segments.pop();
                trailing_slash = is_last;
            }
            "" if is_last => trailing_slash = true,
            name => {
                segments.push(name);
                trailing_slash = false;
            }
        }
    }

    let kept: Vec<&str> = segments.into_iter().filter(|s| !s.is_empty()).collect();
    let mut normalized = kept.join("/");
    if trailing_slash && !normalized.is_empty() {
        normalized.push('/');
    }

    ResolvedHref {
        normalized,
        fragment,
    }
}
