//! Navigation Tree Module
//!
//! This module builds the recursive navigation item tree a reading
//! application renders as its table of contents. Two small adapters — one
//! for the EPUB 3 navigation document, one for the legacy navigation map —
//! produce the same [NavigationItem] shape, so consumers never special-case
//! the source format.
//!
//! The tree is built fresh on every query from the immutable schema; the
//! crate does not cache it.

use std::sync::Arc;

use crate::{
    content::{ContentTree, LocalTextContent},
    error::EpubError,
    link::NavigationLink,
    schema::{NavDocument, NavNode, NavNodeKind, NavPoint, NcxSchema},
};

/// The kind of one navigation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationItemKind {
    /// The entry links to a content document
    Link,

    /// The entry only labels its nested entries
    Header,
}

/// One entry of the navigation tree
///
/// A link entry carries the resolved [NavigationLink] and, when the link
/// target exists in the book, the matching local text reference. Broken
/// links keep their resolved path but have no content attached.
#[derive(Debug)]
pub struct NavigationItem {
    /// Whether this entry links to a document or only labels its children
    pub kind: NavigationItemKind,

    /// The display title of this entry
    pub title: String,

    /// The resolved link of this entry, absent for headers
    pub link: Option<NavigationLink>,

    /// The content document the link resolves to, when one exists
    pub content: Option<Arc<LocalTextContent>>,

    /// Nested entries, empty when the entry has none
    pub children: Vec<NavigationItem>,
}

/// Returns the directory part of a content-root-relative path.
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |index| &path[..index])
}

/// Builds navigation items from the EPUB 3 navigation document.
pub(crate) fn from_nav_document(
    nav: &NavDocument,
    tree: &ContentTree,
) -> Result<Vec<NavigationItem>, EpubError> {
    let base_dir = parent_dir(&nav.path);

    match nav.toc_section() {
        Some(section) => map_nav_nodes(&section.items, base_dir, tree),
        None => Ok(vec![]),
    }
}

fn map_nav_nodes(
    nodes: &[NavNode],
    base_dir: &str,
    tree: &ContentTree,
) -> Result<Vec<NavigationItem>, EpubError> {
    let mut items = Vec::with_capacity(nodes.len());

    for node in nodes {
        let children = map_nav_nodes(&node.children, base_dir, tree)?;

        let item = match &node.kind {
            NavNodeKind::Link { href } => {
                let link = NavigationLink::from_href(href, base_dir)?;
                let content = tree.local_text(link.path());

                NavigationItem {
                    kind: NavigationItemKind::Link,
                    title: node.label.clone(),
                    link: Some(link),
                    content,
                    children,
                }
            }
            NavNodeKind::Header => NavigationItem {
                kind: NavigationItemKind::Header,
                title: node.label.clone(),
                link: None,
                content: None,
                children,
            },
        };

        items.push(item);
    }

    Ok(items)
}

/// Builds navigation items from the legacy navigation map.
pub(crate) fn from_ncx(
    ncx: &NcxSchema,
    tree: &ContentTree,
) -> Result<Vec<NavigationItem>, EpubError> {
    map_nav_points(&ncx.nav_map, parent_dir(&ncx.path), tree)
}

fn map_nav_points(
    points: &[NavPoint],
    base_dir: &str,
    tree: &ContentTree,
) -> Result<Vec<NavigationItem>, EpubError> {
    let mut ordered: Vec<&NavPoint> = points.iter().collect();
    ordered.sort_by(|left, right| left.play_order.cmp(&right.play_order));

    let mut items = Vec::with_capacity(ordered.len());
    for point in ordered {
        let children = map_nav_points(&point.children, base_dir, tree)?;

        let (link, content) = match &point.content {
            Some(source) => {
                let link = NavigationLink::from_href(source, base_dir)?;
                let content = tree.local_text(link.path());
                (Some(link), content)
            }
            None => (None, None),
        };

        items.push(NavigationItem {
            kind: NavigationItemKind::Link,
            title: point.label.clone(),
            link,
            content,
            children,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        archive::{ArchiveHandle, fixtures::zip_archive},
        content::{
            ContentKind, ContentMetadata, ContentTree, LocalContent, LocalTextContent,
            local::LocalContentLoader,
        },
        error::EpubError,
        navigation::{NavigationItemKind, from_nav_document, from_ncx, parent_dir},
        schema::{NavDocument, NavNode, NavNodeKind, NavPoint, NavSection, NcxSchema},
    };

    fn tree_with_documents(keys: &[&str]) -> ContentTree {
        let archive = Arc::new(ArchiveHandle::new(Box::new(zip_archive(&[]))));
        let loader = Arc::new(LocalContentLoader::new(archive, "OPS", None));

        let mut tree = ContentTree::default();
        for key in keys {
            let metadata =
                ContentMetadata::new(*key, ContentKind::Xhtml, "application/xhtml+xml").unwrap();
            let content =
                Arc::new(LocalTextContent::new(metadata, *key, Arc::clone(&loader)).unwrap());

            tree.html
                .local
                .insert(key.to_string(), Arc::clone(&content));
            tree.all
                .local
                .insert(key.to_string(), LocalContent::Text(content));
        }

        tree
    }

    /// Test the directory extraction used as the link resolution base
    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("toc/nav.xhtml"), "toc");
        assert_eq!(parent_dir("a/b/nav.xhtml"), "a/b");
        assert_eq!(parent_dir("nav.xhtml"), "");
    }

    /// Test building items from a navigation document, with content
    /// attached for resolvable links and absent for broken ones
    #[test]
    fn test_from_nav_document() {
        let tree = tree_with_documents(&["chapter1.xhtml"]);
        let nav = NavDocument {
            path: "nav.xhtml".to_string(),
            sections: vec![NavSection {
                kind: Some("toc".to_string()),
                title: Some("Contents".to_string()),
                items: vec![
                    NavNode {
                        kind: NavNodeKind::Link {
                            href: "chapter1.xhtml#start".to_string(),
                        },
                        label: "Chapter 1".to_string(),
                        children: vec![NavNode {
                            kind: NavNodeKind::Link {
                                href: "missing.xhtml".to_string(),
                            },
                            label: "Broken".to_string(),
                            children: vec![],
                        }],
                    },
                    NavNode {
                        kind: NavNodeKind::Header,
                        label: "Appendices".to_string(),
                        children: vec![],
                    },
                ],
            }],
        };

        let items = from_nav_document(&nav, &tree).unwrap();
        assert_eq!(items.len(), 2);

        let chapter = &items[0];
        assert_eq!(chapter.kind, NavigationItemKind::Link);
        assert_eq!(chapter.title, "Chapter 1");
        let link = chapter.link.as_ref().unwrap();
        assert_eq!(link.path(), "chapter1.xhtml");
        assert_eq!(link.anchor(), Some("start"));
        assert!(chapter.content.is_some());

        let broken = &chapter.children[0];
        assert!(broken.link.is_some());
        assert!(broken.content.is_none());

        let header = &items[1];
        assert_eq!(header.kind, NavigationItemKind::Header);
        assert!(header.link.is_none());
        assert!(header.content.is_none());
    }

    /// Test that a remote navigation href is rejected
    #[test]
    fn test_nav_document_remote_href() {
        let tree = tree_with_documents(&[]);
        let nav = NavDocument {
            path: "nav.xhtml".to_string(),
            sections: vec![NavSection {
                kind: Some("toc".to_string()),
                title: None,
                items: vec![NavNode {
                    kind: NavNodeKind::Link {
                        href: "https://example.com/chapter1.html".to_string(),
                    },
                    label: "External".to_string(),
                    children: vec![],
                }],
            }],
        };

        let result = from_nav_document(&nav, &tree);
        assert!(matches!(result.unwrap_err(), EpubError::RemoteLink { .. }));
    }

    /// Test building items from the legacy map, ordered by play order and
    /// resolved against the NCX document's directory
    #[test]
    fn test_from_ncx() {
        let tree = tree_with_documents(&["content/chapter1.html", "content/chapter2.html"]);
        let ncx = NcxSchema {
            path: "toc/toc.ncx".to_string(),
            title: "Contents".to_string(),
            nav_map: vec![
                NavPoint {
                    label: "Chapter 2".to_string(),
                    content: Some("../content/chapter2.html".to_string()),
                    children: vec![],
                    play_order: Some(2),
                },
                NavPoint {
                    label: "Chapter 1".to_string(),
                    content: Some("../content/chapter1.html#section1".to_string()),
                    children: vec![],
                    play_order: Some(1),
                },
            ],
        };

        let items = from_ncx(&ncx, &tree).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Chapter 1");
        assert_eq!(items[1].title, "Chapter 2");

        let link = items[0].link.as_ref().unwrap();
        assert_eq!(link.path(), "content/chapter1.html");
        assert_eq!(link.anchor(), Some("section1"));
        assert!(items[0].content.is_some());
    }

    /// Test that a navigation point without a source stays a bare entry
    #[test]
    fn test_ncx_point_without_content() {
        let tree = tree_with_documents(&[]);
        let ncx = NcxSchema {
            path: "toc.ncx".to_string(),
            title: String::new(),
            nav_map: vec![NavPoint {
                label: "Placeholder".to_string(),
                content: None,
                children: vec![],
                play_order: None,
            }],
        };

        let items = from_ncx(&ncx, &tree).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].link.is_none());
        assert!(items[0].content.is_none());
    }
}
