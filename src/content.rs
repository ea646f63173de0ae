//! Content Reference Module
//!
//! This module defines the lazy handles to a publication's content items.
//! A content reference carries metadata only — location, media kind, MIME
//! type — and delegates every byte access to the loader injected at
//! construction, so building the full reference tree for a book costs no
//! I/O at all.
//!
//! References are polymorphic over two independent axes: their location
//! (archive-backed or network-backed) and their encoding (UTF-8 text or
//! opaque bytes), giving four concrete variants. The variants of one book
//! share their loaders, and the same reference instance appears in every
//! collection that lists it.

pub mod local;
pub mod remote;

use std::{io::Read, sync::Arc};

use indexmap::IndexMap;

use crate::{
    content::{local::LocalContentLoader, remote::RemoteContentLoader},
    error::EpubError,
};

/// The media kind of a content item
///
/// A closed classification of the media types that commonly appear in
/// publications. Unrecognized declared types map to [ContentKind::Other]
/// and are still readable as bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Xhtml,
    Css,
    Xml,
    Ncx,
    Smil,
    Script,
    ImageGif,
    ImageJpeg,
    ImagePng,
    ImageSvg,
    ImageWebp,
    FontTruetype,
    FontOpentype,
    FontWoff,
    FontWoff2,
    AudioMpeg,
    AudioMp4,
    AudioOgg,
    Other,
}

impl ContentKind {
    /// Classifies a declared MIME type.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/xhtml+xml" | "text/html" => ContentKind::Xhtml,
            "text/css" => ContentKind::Css,
            "application/xml" | "text/xml" => ContentKind::Xml,
            "application/x-dtbncx+xml" => ContentKind::Ncx,
            "application/smil+xml" => ContentKind::Smil,
            "text/javascript" | "application/javascript" | "application/ecmascript" => {
                ContentKind::Script
            }
            "image/gif" => ContentKind::ImageGif,
            "image/jpeg" => ContentKind::ImageJpeg,
            "image/png" => ContentKind::ImagePng,
            "image/svg+xml" => ContentKind::ImageSvg,
            "image/webp" => ContentKind::ImageWebp,
            "font/ttf" | "application/x-font-truetype" => ContentKind::FontTruetype,
            "font/otf" | "application/vnd.ms-opentype" | "application/x-font-opentype" => {
                ContentKind::FontOpentype
            }
            "font/woff" | "application/font-woff" => ContentKind::FontWoff,
            "font/woff2" => ContentKind::FontWoff2,
            "audio/mpeg" => ContentKind::AudioMpeg,
            "audio/mp4" => ContentKind::AudioMp4,
            "audio/ogg" => ContentKind::AudioOgg,
            _ => ContentKind::Other,
        }
    }

    /// Whether content of this kind is read as UTF-8 text.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ContentKind::Xhtml
                | ContentKind::Css
                | ContentKind::Xml
                | ContentKind::Ncx
                | ContentKind::Smil
                | ContentKind::Script
        )
    }

    /// Whether this kind is an image format.
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            ContentKind::ImageGif
                | ContentKind::ImageJpeg
                | ContentKind::ImagePng
                | ContentKind::ImageSvg
                | ContentKind::ImageWebp
        )
    }

    /// Whether this kind is a font format.
    pub fn is_font(&self) -> bool {
        matches!(
            self,
            ContentKind::FontTruetype
                | ContentKind::FontOpentype
                | ContentKind::FontWoff
                | ContentKind::FontWoff2
        )
    }

    /// Whether this kind is an audio format.
    pub fn is_audio(&self) -> bool {
        matches!(
            self,
            ContentKind::AudioMpeg | ContentKind::AudioMp4 | ContentKind::AudioOgg
        )
    }
}

/// The immutable metadata shared by every content reference
///
/// The key identifies the content item: for archive-backed items it is the
/// file path relative to the content root, for network-backed items the
/// absolute URL. The declared MIME type is kept verbatim next to its
/// classified [ContentKind].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMetadata {
    key: String,
    kind: ContentKind,
    mime: String,
}

impl ContentMetadata {
    /// Creates validated content metadata
    ///
    /// # Return
    /// - `Ok(ContentMetadata)`: The metadata
    /// - `Err(EpubError)`: The key or the MIME type was empty
    pub fn new(
        key: impl Into<String>,
        kind: ContentKind,
        mime: impl Into<String>,
    ) -> Result<Self, EpubError> {
        let key = key.into();
        let mime = mime.into();

        if key.is_empty() {
            return Err(EpubError::EmptyField { field: "key" });
        }
        if mime.is_empty() {
            return Err(EpubError::EmptyField { field: "mime" });
        }

        Ok(Self { key, kind, mime })
    }

    /// The identifying key of the content item.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The classified media kind.
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// The raw declared MIME type.
    pub fn mime(&self) -> &str {
        &self.mime
    }
}

/// Common accessors shared by all four content reference variants.
pub trait ContentItem {
    /// The metadata of this content item.
    fn metadata(&self) -> &ContentMetadata;

    /// The identifying key of this content item.
    fn key(&self) -> &str {
        self.metadata().key()
    }

    /// The classified media kind of this content item.
    fn kind(&self) -> ContentKind {
        self.metadata().kind()
    }

    /// The raw declared MIME type of this content item.
    fn mime(&self) -> &str {
        self.metadata().mime()
    }
}

/// An archive-backed content item read as UTF-8 text
///
/// The reference holds no content of its own; every operation resolves the
/// entry through the shared local loader, so a read always observes the
/// current state of the archive and its missing-content policy.
#[derive(Debug)]
pub struct LocalTextContent {
    metadata: ContentMetadata,
    file_path: String,
    loader: Arc<LocalContentLoader>,
}

impl LocalTextContent {
    pub(crate) fn new(
        metadata: ContentMetadata,
        file_path: impl Into<String>,
        loader: Arc<LocalContentLoader>,
    ) -> Result<Self, EpubError> {
        let file_path = file_path.into();
        if file_path.is_empty() {
            return Err(EpubError::EmptyField { field: "file_path" });
        }

        Ok(Self {
            metadata,
            file_path,
            loader,
        })
    }

    /// The path of this item inside the archive, relative to the content root.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Reads and decodes the full content of this item.
    pub fn read(&self) -> Result<String, EpubError> {
        self.loader.read_text(&self.metadata, &self.file_path)
    }

    /// Opens the content of this item as a caller-owned stream.
    pub fn stream(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream(&self.metadata, &self.file_path)
    }

    /// Reads and decodes the full content without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn read_async(&self) -> Result<String, EpubError> {
        self.loader
            .read_text_async(&self.metadata, &self.file_path)
            .await
    }

    /// Opens the content as a caller-owned stream without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn stream_async(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader
            .stream_async(&self.metadata, &self.file_path)
            .await
    }
}

impl ContentItem for LocalTextContent {
    fn metadata(&self) -> &ContentMetadata {
        &self.metadata
    }
}

/// An archive-backed content item read as raw bytes
pub struct LocalByteContent {
    metadata: ContentMetadata,
    file_path: String,
    loader: Arc<LocalContentLoader>,
}

impl LocalByteContent {
    pub(crate) fn new(
        metadata: ContentMetadata,
        file_path: impl Into<String>,
        loader: Arc<LocalContentLoader>,
    ) -> Result<Self, EpubError> {
        let file_path = file_path.into();
        if file_path.is_empty() {
            return Err(EpubError::EmptyField { field: "file_path" });
        }

        Ok(Self {
            metadata,
            file_path,
            loader,
        })
    }

    /// The path of this item inside the archive, relative to the content root.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Reads the full content of this item.
    pub fn read(&self) -> Result<Vec<u8>, EpubError> {
        self.loader.read_bytes(&self.metadata, &self.file_path)
    }

    /// Opens the content of this item as a caller-owned stream.
    pub fn stream(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream(&self.metadata, &self.file_path)
    }

    /// Reads the full content without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn read_async(&self) -> Result<Vec<u8>, EpubError> {
        self.loader
            .read_bytes_async(&self.metadata, &self.file_path)
            .await
    }

    /// Opens the content as a caller-owned stream without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn stream_async(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader
            .stream_async(&self.metadata, &self.file_path)
            .await
    }
}

impl ContentItem for LocalByteContent {
    fn metadata(&self) -> &ContentMetadata {
        &self.metadata
    }
}

/// A network-backed content item decoded as UTF-8 text
///
/// Operations are named `download` to signal their network cost. Every
/// download consults the remote loader's policy first: with fetching
/// disabled (the default), operations fail without touching the network.
pub struct RemoteTextContent {
    metadata: ContentMetadata,
    loader: Arc<RemoteContentLoader>,
}

impl RemoteTextContent {
    pub(crate) fn new(metadata: ContentMetadata, loader: Arc<RemoteContentLoader>) -> Self {
        Self { metadata, loader }
    }

    /// The absolute URL of this item; identical to its key.
    pub fn url(&self) -> &str {
        self.metadata.key()
    }

    /// Downloads and decodes the full content of this item.
    pub fn download(&self) -> Result<String, EpubError> {
        self.loader.download_text(&self.metadata)
    }

    /// Downloads the content of this item as a caller-owned stream.
    pub fn download_stream(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream(&self.metadata)
    }

    /// Returns the raw fetch stream without any buffering.
    pub fn fetch_stream(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream(&self.metadata)
    }

    /// Downloads and decodes the full content without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn download_async(&self) -> Result<String, EpubError> {
        self.loader.download_text_async(&self.metadata).await
    }

    /// Downloads the content as a caller-owned stream without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn download_stream_async(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream_async(&self.metadata).await
    }
}

impl ContentItem for RemoteTextContent {
    fn metadata(&self) -> &ContentMetadata {
        &self.metadata
    }
}

/// A network-backed content item read as raw bytes
pub struct RemoteByteContent {
    metadata: ContentMetadata,
    loader: Arc<RemoteContentLoader>,
}

impl RemoteByteContent {
    pub(crate) fn new(metadata: ContentMetadata, loader: Arc<RemoteContentLoader>) -> Self {
        Self { metadata, loader }
    }

    /// The absolute URL of this item; identical to its key.
    pub fn url(&self) -> &str {
        self.metadata.key()
    }

    /// Downloads the full content of this item.
    pub fn download(&self) -> Result<Vec<u8>, EpubError> {
        self.loader.download_bytes(&self.metadata)
    }

    /// Downloads the content of this item as a caller-owned stream.
    pub fn download_stream(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream(&self.metadata)
    }

    /// Returns the raw fetch stream without any buffering.
    pub fn fetch_stream(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream(&self.metadata)
    }

    /// Downloads the full content without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn download_async(&self) -> Result<Vec<u8>, EpubError> {
        self.loader.download_bytes_async(&self.metadata).await
    }

    /// Downloads the content as a caller-owned stream without blocking the caller.
    #[cfg(feature = "async")]
    pub async fn download_stream_async(&self) -> Result<Box<dyn Read + Send>, EpubError> {
        self.loader.stream_async(&self.metadata).await
    }
}

impl ContentItem for RemoteByteContent {
    fn metadata(&self) -> &ContentMetadata {
        &self.metadata
    }
}

/// An archive-backed reference of either encoding
///
/// The variants wrap the shared reference instances, so an item listed in
/// both a kind collection and the `all` collection is one object.
#[derive(Clone)]
pub enum LocalContent {
    Text(Arc<LocalTextContent>),
    Byte(Arc<LocalByteContent>),
}

impl LocalContent {
    /// The metadata of the wrapped reference.
    pub fn metadata(&self) -> &ContentMetadata {
        match self {
            LocalContent::Text(content) => content.metadata(),
            LocalContent::Byte(content) => content.metadata(),
        }
    }

    /// The wrapped text reference, when this is a text item.
    pub fn as_text(&self) -> Option<&Arc<LocalTextContent>> {
        match self {
            LocalContent::Text(content) => Some(content),
            LocalContent::Byte(_) => None,
        }
    }

    /// The wrapped byte reference, when this is a byte item.
    pub fn as_byte(&self) -> Option<&Arc<LocalByteContent>> {
        match self {
            LocalContent::Byte(content) => Some(content),
            LocalContent::Text(_) => None,
        }
    }
}

/// A network-backed reference of either encoding
#[derive(Clone)]
pub enum RemoteContent {
    Text(Arc<RemoteTextContent>),
    Byte(Arc<RemoteByteContent>),
}

impl RemoteContent {
    /// The metadata of the wrapped reference.
    pub fn metadata(&self) -> &ContentMetadata {
        match self {
            RemoteContent::Text(content) => content.metadata(),
            RemoteContent::Byte(content) => content.metadata(),
        }
    }

    /// The wrapped text reference, when this is a text item.
    pub fn as_text(&self) -> Option<&Arc<RemoteTextContent>> {
        match self {
            RemoteContent::Text(content) => Some(content),
            RemoteContent::Byte(_) => None,
        }
    }

    /// The wrapped byte reference, when this is a byte item.
    pub fn as_byte(&self) -> Option<&Arc<RemoteByteContent>> {
        match self {
            RemoteContent::Byte(content) => Some(content),
            RemoteContent::Text(_) => None,
        }
    }
}

/// One location-partitioned collection of content references
///
/// Keys are unique within each map; the local map is keyed by
/// content-root-relative paths, the remote map by absolute URLs.
pub struct ContentCollection<L, R> {
    pub local: IndexMap<String, L>,
    pub remote: IndexMap<String, R>,
}

impl<L, R> Default for ContentCollection<L, R> {
    fn default() -> Self {
        Self {
            local: IndexMap::new(),
            remote: IndexMap::new(),
        }
    }
}

impl<L, R> ContentCollection<L, R> {
    /// The total number of references across both locations.
    pub fn len(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    /// Whether the collection holds no references at all.
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }
}

/// A collection of text references (XHTML, CSS)
pub type TextContentCollection = ContentCollection<Arc<LocalTextContent>, Arc<RemoteTextContent>>;

/// A collection of byte references (images, fonts, audio)
pub type ByteContentCollection = ContentCollection<Arc<LocalByteContent>, Arc<RemoteByteContent>>;

/// The complete content reference tree of one book
///
/// The tree partitions the manifest's references by media kind and lists
/// every reference again in `all`. Collections share reference instances:
/// an image present in `images` and in `all` is the same object, so any
/// per-read behavior (such as missing-content replacement) is observed
/// exactly once per read regardless of the collection used.
#[derive(Default)]
pub struct ContentTree {
    /// XHTML content documents
    pub html: TextContentCollection,

    /// Stylesheets
    pub css: TextContentCollection,

    /// Images
    pub images: ByteContentCollection,

    /// Embedded fonts
    pub fonts: ByteContentCollection,

    /// Audio resources
    pub audio: ByteContentCollection,

    /// Every reference of the book, of both encodings
    pub all: ContentCollection<LocalContent, RemoteContent>,

    /// The cover image, when the package declares one
    pub cover: Option<Arc<LocalByteContent>>,

    /// The EPUB 3 navigation document, when the manifest marks one
    pub nav_document: Option<Arc<LocalTextContent>>,
}

impl ContentTree {
    /// Looks up a local text reference by its content-root-relative key.
    pub fn local_text(&self, key: &str) -> Option<Arc<LocalTextContent>> {
        self.all
            .local
            .get(key)
            .and_then(LocalContent::as_text)
            .map(Arc::clone)
    }

    /// Looks up a local byte reference by its content-root-relative key.
    pub fn local_byte(&self, key: &str) -> Option<Arc<LocalByteContent>> {
        self.all
            .local
            .get(key)
            .and_then(LocalContent::as_byte)
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        content::{ContentKind, ContentMetadata},
        error::EpubError,
    };

    /// Test that metadata fields round-trip unchanged through construction
    #[test]
    fn test_metadata_round_trip() {
        let metadata = ContentMetadata::new(
            "content/chapter1.xhtml",
            ContentKind::Xhtml,
            "application/xhtml+xml",
        )
        .unwrap();

        assert_eq!(metadata.key(), "content/chapter1.xhtml");
        assert_eq!(metadata.kind(), ContentKind::Xhtml);
        assert_eq!(metadata.mime(), "application/xhtml+xml");
    }

    /// Test that empty required fields fail with a validation error
    #[test]
    fn test_metadata_validation() {
        let result = ContentMetadata::new("", ContentKind::Xhtml, "application/xhtml+xml");
        assert_eq!(result.unwrap_err(), EpubError::EmptyField { field: "key" });

        let result = ContentMetadata::new("chapter1.xhtml", ContentKind::Xhtml, "");
        assert_eq!(result.unwrap_err(), EpubError::EmptyField { field: "mime" });
    }

    /// Test the MIME classification of common media types
    #[test]
    fn test_kind_from_mime() {
        assert_eq!(
            ContentKind::from_mime("application/xhtml+xml"),
            ContentKind::Xhtml
        );
        assert_eq!(ContentKind::from_mime("text/css"), ContentKind::Css);
        assert_eq!(
            ContentKind::from_mime("application/x-dtbncx+xml"),
            ContentKind::Ncx
        );
        assert_eq!(ContentKind::from_mime("IMAGE/JPEG"), ContentKind::ImageJpeg);
        assert_eq!(ContentKind::from_mime("font/woff2"), ContentKind::FontWoff2);
        assert_eq!(ContentKind::from_mime("audio/mpeg"), ContentKind::AudioMpeg);
        assert_eq!(
            ContentKind::from_mime("application/octet-stream"),
            ContentKind::Other
        );
    }

    /// Test the text/image/font/audio kind partitions
    #[test]
    fn test_kind_partitions() {
        assert!(ContentKind::Xhtml.is_text());
        assert!(ContentKind::Smil.is_text());
        assert!(!ContentKind::ImagePng.is_text());

        assert!(ContentKind::ImageSvg.is_image());
        assert!(ContentKind::FontOpentype.is_font());
        assert!(ContentKind::AudioOgg.is_audio());
        assert!(!ContentKind::Other.is_image());
    }
}
