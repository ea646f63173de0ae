//! Navigation Link Module
//!
//! This module turns the relative hrefs found in navigation documents into
//! archive-relative paths plus optional anchors. Hrefs carrying a
//! recognized network scheme are rejected: navigation targets must live
//! inside the package, and external links are represented at a higher
//! layer, not by this type.

use percent_encoding::percent_decode_str;

use crate::error::EpubError;

/// Network schemes that mark an href as pointing outside the package.
const REMOTE_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// Checks whether an href is an absolute remote URL.
pub(crate) fn is_remote_href(href: &str) -> bool {
    let href = href.trim().as_bytes();
    REMOTE_SCHEMES.iter().any(|scheme| {
        let scheme = scheme.as_bytes();
        href.len() >= scheme.len() && href[..scheme.len()].eq_ignore_ascii_case(scheme)
    })
}

/// Resolves an href against a base directory into a normalized path
///
/// Performs standard relative-path resolution: `..` segments pop the
/// accumulated path, `.` segments are no-ops, and each remaining segment is
/// percent-decoded, since hrefs in package markup are URL-encoded while
/// archive entry names are not.
pub(crate) fn resolve_href(base_dir: &str, href: &str) -> String {
    let mut segments: Vec<String> = base_dir
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(|segment| segment.to_string())
        .collect();

    for segment in href.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            segment => segments.push(percent_decode_str(segment).decode_utf8_lossy().into_owned()),
        }
    }

    segments.join("/")
}

/// A resolved link from a navigation entry to an in-package document
///
/// A navigation link splits an href into its document part and its optional
/// fragment, and resolves the document part to a path relative to the
/// content root. Construction fails for hrefs that point outside the
/// package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationLink {
    href: String,
    path: String,
    anchor: Option<String>,
}

impl NavigationLink {
    /// Creates a link from its already-split parts
    ///
    /// # Parameters
    /// - `href`: The original href with the fragment removed
    /// - `path`: The resolved path, relative to the content root
    /// - `anchor`: The fragment, when the href carried one
    ///
    /// # Return
    /// - `Ok(NavigationLink)`: The validated link
    /// - `Err(EpubError)`: A part was empty or the href points outside the package
    pub fn new(
        href: impl Into<String>,
        path: impl Into<String>,
        anchor: Option<String>,
    ) -> Result<Self, EpubError> {
        let href = href.into();
        let path = path.into();

        if href.is_empty() {
            return Err(EpubError::EmptyField { field: "href" });
        }
        if path.is_empty() {
            return Err(EpubError::EmptyField { field: "path" });
        }
        if is_remote_href(&href) {
            return Err(EpubError::RemoteLink { href });
        }
        if is_remote_href(&path) {
            return Err(EpubError::RemoteLink { href: path });
        }

        Ok(Self { href, path, anchor })
    }

    /// Creates a link by splitting and resolving a raw href
    ///
    /// The href is split on its first `#`; the part before the fragment is
    /// resolved against `base_dir` (usually the directory of the document
    /// the href appeared in), and the fragment becomes the anchor.
    ///
    /// # Parameters
    /// - `href`: The href as it appeared in the navigation markup
    /// - `base_dir`: The directory the href is relative to
    ///
    /// # Return
    /// - `Ok(NavigationLink)`: The resolved link
    /// - `Err(EpubError)`: The href was empty or points outside the package
    pub fn from_href(href: &str, base_dir: &str) -> Result<Self, EpubError> {
        if href.is_empty() {
            return Err(EpubError::EmptyField { field: "href" });
        }
        if is_remote_href(href) {
            return Err(EpubError::RemoteLink {
                href: href.to_string(),
            });
        }

        let (document, anchor) = match href.split_once('#') {
            Some((document, fragment)) => (document, Some(fragment.to_string())),
            None => (href, None),
        };

        Ok(Self {
            href: document.to_string(),
            path: resolve_href(base_dir, document),
            anchor,
        })
    }

    /// The original href, without its fragment.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// The resolved path, relative to the content root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The fragment of the href, when one was present.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }
}
