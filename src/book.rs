//! Book Handle Module
//!
//! This module defines the lazy top-level handle over one opened
//! publication. Construction is cheap: the handle extracts a few
//! bibliographic scalars, translates the manifest into a tree of content
//! references (metadata only, no decoding) and wires both loaders to the
//! shared archive handle. Every byte access is deferred to the loaders
//! until a caller asks for it.
//!
//! The handle moves through two states: `Open`, with full functionality,
//! and `Disposed`, after which every operation fails fast with a
//! resource-state error. Disposal releases the owned archive exactly once
//! and is idempotent.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    archive::{ArchiveHandle, EpubArchive},
    content::{
        ContentKind, ContentMetadata, ContentTree, LocalByteContent, LocalContent,
        LocalTextContent, RemoteByteContent, RemoteContent, RemoteTextContent,
        local::{LocalContentLoader, MissingContentHandler},
        remote::{ContentFetcher, RemoteContentLoader},
    },
    error::EpubError,
    link::{is_remote_href, resolve_href},
    navigation::{self, NavigationItem},
    schema::{EpubSchema, GuideReference},
};

/// Configuration recognized when opening a book
///
/// All options default to the least surprising behavior: no
/// missing-content recovery, downloads disabled, the library-identifying
/// user agent, and the default fetch capability.
#[derive(Default)]
pub struct ReaderOptions {
    /// The recovery hook consulted when an archive entry is missing
    pub missing_content_handler: Option<MissingContentHandler>,

    /// Whether remote content references may touch the network
    pub downloads_enabled: bool,

    /// Overrides the user agent sent with remote fetches
    pub user_agent: Option<String>,

    /// Overrides the network fetch capability
    pub fetcher: Option<Arc<dyn ContentFetcher>>,
}

/// A lazily-resolved publication
///
/// The book owns its archive exclusively and composes the content
/// reference tree, the loaders and the navigation adapters behind a small
/// query surface: cover, reading order and navigation tree. Queries walk
/// the immutable schema on every call; only the bibliographic scalars are
/// extracted eagerly.
pub struct EpubBook {
    archive: Arc<ArchiveHandle>,
    schema: EpubSchema,
    title: String,
    authors: Vec<String>,
    description: Option<String>,
    content: ContentTree,
}

impl EpubBook {
    /// Creates a book handle over a parsed schema and its archive
    ///
    /// # Parameters
    /// - `archive`: The opened container; the book takes exclusive ownership
    ///   and releases it on disposal
    /// - `content_root`: The archive directory the package document lives
    ///   in; manifest hrefs resolve beneath it. May be empty
    /// - `schema`: The immutable schema produced by the parsing layer
    /// - `options`: The configuration surface, see [ReaderOptions]
    ///
    /// # Return
    /// - `Ok(EpubBook)`: The opened book
    /// - `Err(EpubError)`: A manifest entry produced invalid content metadata
    pub fn new(
        archive: Box<dyn EpubArchive>,
        content_root: impl Into<String>,
        schema: EpubSchema,
        options: ReaderOptions,
    ) -> Result<Self, EpubError> {
        let archive = Arc::new(ArchiveHandle::new(archive));

        let local_loader = Arc::new(LocalContentLoader::new(
            Arc::clone(&archive),
            content_root,
            options.missing_content_handler,
        ));

        let fetcher = match options.fetcher {
            Some(fetcher) => Some(fetcher),
            #[cfg(feature = "http")]
            None => Some(
                Arc::new(crate::content::remote::HttpFetcher::new()) as Arc<dyn ContentFetcher>
            ),
            #[cfg(not(feature = "http"))]
            None => None,
        };
        let remote_loader = Arc::new(RemoteContentLoader::new(
            fetcher,
            options.downloads_enabled,
            options.user_agent,
        ));

        let content = Self::build_content_tree(&schema, &local_loader, &remote_loader)?;

        let title = schema.first_metadata_value("title").unwrap_or_default();
        let authors = schema.metadata_values("creator").unwrap_or_default();
        let description = schema.first_metadata_value("description");

        Ok(Self {
            archive,
            schema,
            title,
            authors,
            description,
            content,
        })
    }

    /// Translates the manifest into the content reference tree
    ///
    /// Each manifest item becomes exactly one reference instance, shared
    /// between its kind collection and the `all` collection. Remote items
    /// are recognized by their absolute URL; everything else resolves to a
    /// content-root-relative key.
    fn build_content_tree(
        schema: &EpubSchema,
        local_loader: &Arc<LocalContentLoader>,
        remote_loader: &Arc<RemoteContentLoader>,
    ) -> Result<ContentTree, EpubError> {
        let mut tree = ContentTree::default();

        for (id, item) in &schema.manifest {
            let kind = ContentKind::from_mime(&item.mime);

            if is_remote_href(&item.href) {
                let url = item.href.trim().to_string();
                if tree.all.remote.contains_key(&url) {
                    debug!("manifest item {} duplicates the remote resource {}", id, url);
                    continue;
                }

                let metadata = ContentMetadata::new(url.clone(), kind, item.mime.clone())?;
                if kind.is_text() {
                    let content =
                        Arc::new(RemoteTextContent::new(metadata, Arc::clone(remote_loader)));
                    match kind {
                        ContentKind::Xhtml => {
                            tree.html.remote.insert(url.clone(), Arc::clone(&content));
                        }
                        ContentKind::Css => {
                            tree.css.remote.insert(url.clone(), Arc::clone(&content));
                        }
                        _ => {}
                    }
                    tree.all.remote.insert(url, RemoteContent::Text(content));
                } else {
                    let content =
                        Arc::new(RemoteByteContent::new(metadata, Arc::clone(remote_loader)));
                    if kind.is_image() {
                        tree.images.remote.insert(url.clone(), Arc::clone(&content));
                    } else if kind.is_font() {
                        tree.fonts.remote.insert(url.clone(), Arc::clone(&content));
                    } else if kind.is_audio() {
                        tree.audio.remote.insert(url.clone(), Arc::clone(&content));
                    }
                    tree.all.remote.insert(url, RemoteContent::Byte(content));
                }

                continue;
            }

            let document = item.href.split('#').next().unwrap_or_default();
            let key = resolve_href("", document);
            if tree.all.local.contains_key(&key) {
                debug!("manifest item {} duplicates the local resource {}", id, key);
                continue;
            }

            let metadata = ContentMetadata::new(key.clone(), kind, item.mime.clone())?;
            if kind.is_text() {
                let content = Arc::new(LocalTextContent::new(
                    metadata,
                    key.clone(),
                    Arc::clone(local_loader),
                )?);

                match kind {
                    ContentKind::Xhtml => {
                        tree.html.local.insert(key.clone(), Arc::clone(&content));
                    }
                    ContentKind::Css => {
                        tree.css.local.insert(key.clone(), Arc::clone(&content));
                    }
                    _ => {}
                }

                if item.has_property("nav") && tree.nav_document.is_none() {
                    tree.nav_document = Some(Arc::clone(&content));
                }

                tree.all.local.insert(key, LocalContent::Text(content));
            } else {
                let content = Arc::new(LocalByteContent::new(
                    metadata,
                    key.clone(),
                    Arc::clone(local_loader),
                )?);

                if kind.is_image() {
                    tree.images.local.insert(key.clone(), Arc::clone(&content));
                } else if kind.is_font() {
                    tree.fonts.local.insert(key.clone(), Arc::clone(&content));
                } else if kind.is_audio() {
                    tree.audio.local.insert(key.clone(), Arc::clone(&content));
                }

                if item.has_property("cover-image") && tree.cover.is_none() {
                    tree.cover = Some(Arc::clone(&content));
                }

                tree.all.local.insert(key, LocalContent::Byte(content));
            }
        }

        // EPUB 2 publications flag their cover through a meta item naming a
        // manifest id instead of a property marker.
        if tree.cover.is_none() {
            let cover_id = schema
                .metadata
                .iter()
                .find(|item| item.property == "cover")
                .map(|item| item.value.clone());

            if let Some(cover_id) = cover_id {
                if let Some(item) = schema.manifest.get(&cover_id) {
                    let key = resolve_href("", item.href.split('#').next().unwrap_or_default());
                    tree.cover = tree.local_byte(&key);
                } else {
                    warn!("cover meta names the unknown manifest id {}", cover_id);
                }
            }
        }

        Ok(tree)
    }

    /// Fails fast when the archive has already been released.
    fn ensure_open(&self) -> Result<(), EpubError> {
        if self.archive.is_disposed() {
            return Err(EpubError::ArchiveDisposed);
        }

        Ok(())
    }

    /// The first declared title, empty when the metadata carries none.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The first declared author, when one exists.
    pub fn author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    /// All declared authors, in declaration order.
    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// The first declared description, when one exists.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The immutable schema this book was opened over.
    pub fn schema(&self) -> &EpubSchema {
        &self.schema
    }

    /// The legacy guide references of the publication.
    pub fn guide(&self) -> &[GuideReference] {
        &self.schema.guide
    }

    /// The content reference tree of the publication.
    pub fn content(&self) -> &ContentTree {
        &self.content
    }

    /// Reads the cover image bytes
    ///
    /// # Return
    /// - `Ok(Some(Vec<u8>))`: The cover bytes
    /// - `Ok(None)`: The publication declares no cover; not an error
    /// - `Err(EpubError)`: The book is disposed or the cover entry failed to read
    pub fn read_cover(&self) -> Result<Option<Vec<u8>>, EpubError> {
        self.ensure_open()?;

        match &self.content.cover {
            Some(cover) => cover.read().map(Some),
            None => Ok(None),
        }
    }

    /// Reads the cover image bytes without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn read_cover_async(&self) -> Result<Option<Vec<u8>>, EpubError> {
        self.ensure_open()?;

        match &self.content.cover {
            Some(cover) => cover.read_async().await.map(Some),
            None => Ok(None),
        }
    }

    /// Returns the linear reading order of the publication
    ///
    /// Walks the spine in document order and resolves each linear item to
    /// its local text document. Items that do not resolve — an unknown
    /// idref, a remote document, a non-document resource — are skipped.
    pub fn reading_order(&self) -> Result<Vec<Arc<LocalTextContent>>, EpubError> {
        self.ensure_open()?;

        let mut order = Vec::new();
        for spine_item in &self.schema.spine {
            if !spine_item.linear {
                continue;
            }

            let Some(manifest_item) = self.schema.manifest.get(&spine_item.idref) else {
                warn!("spine idref {} is not declared in the manifest", spine_item.idref);
                continue;
            };

            let document = manifest_item.href.split('#').next().unwrap_or_default();
            let key = resolve_href("", document);
            match self.content.html.local.get(&key) {
                Some(content) => order.push(Arc::clone(content)),
                None => warn!(
                    "spine idref {} does not resolve to a local text document",
                    spine_item.idref
                ),
            }
        }

        Ok(order)
    }

    /// Returns the linear reading order without blocking the caller.
    ///
    /// The walk touches metadata only, so this form exists for surface
    /// symmetry and performs no offloading.
    #[cfg(feature = "async")]
    pub async fn reading_order_async(&self) -> Result<Vec<Arc<LocalTextContent>>, EpubError> {
        self.reading_order()
    }

    /// Builds the navigation tree of the publication
    ///
    /// # Return
    /// - `Ok(Some(Vec<NavigationItem>))`: The navigation entries, built from
    ///   the EPUB 3 navigation document when present, otherwise from the
    ///   legacy navigation map
    /// - `Ok(None)`: The publication carries neither navigation source;
    ///   distinct from an empty tree
    /// - `Err(EpubError)`: The book is disposed or a navigation href was invalid
    pub fn navigation(&self) -> Result<Option<Vec<NavigationItem>>, EpubError> {
        self.ensure_open()?;

        if let Some(nav) = &self.schema.nav {
            return navigation::from_nav_document(nav, &self.content).map(Some);
        }

        if let Some(ncx) = &self.schema.ncx {
            debug!("no navigation document present, using the legacy navigation map");
            return navigation::from_ncx(ncx, &self.content).map(Some);
        }

        Ok(None)
    }

    /// Builds the navigation tree without blocking the caller.
    ///
    /// The walk touches metadata only, so this form exists for surface
    /// symmetry and performs no offloading.
    #[cfg(feature = "async")]
    pub async fn navigation_async(&self) -> Result<Option<Vec<NavigationItem>>, EpubError> {
        self.navigation()
    }

    /// Releases the owned archive
    ///
    /// The archive is released exactly once; repeated calls are no-ops.
    /// Every operation issued afterwards fails with a resource-state error.
    pub fn dispose(&self) {
        self.archive.dispose();
    }

    /// Checks whether this book has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.archive.is_disposed()
    }
}

impl Drop for EpubBook {
    fn drop(&mut self) {
        self.archive.dispose();
    }
}
