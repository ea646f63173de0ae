//! Local Content Loader Module
//!
//! This module materializes bytes for archive-backed content references.
//! The loader is stateless per call: it resolves the entry path, checks the
//! archive's lifecycle state, applies the missing-content recovery protocol
//! and the oversized-entry rejection policy, and then reads or streams the
//! entry. Nothing is cached between calls.

use std::{
    io::{self, Read},
    sync::Arc,
};

use crate::{
    archive::ArchiveHandle,
    content::{ContentKind, ContentMetadata},
    error::EpubError,
    utils::DecodeBytes,
};

/// The largest archive entry the loader will read
///
/// Entries above this uncompressed length are rejected outright rather than
/// partially read. The ceiling is the maximum size representable as a
/// 32-bit signed count, an archive-format limitation that does not apply to
/// remote content.
pub const MAX_ENTRY_LENGTH: u64 = i32::MAX as u64;

/// The information handed to a missing-content handler
///
/// Describes the content item whose archive entry was not found: its key,
/// the resolved entry path that was probed, and its declared media
/// classification.
pub struct MissingContentContext<'a> {
    /// The key of the content reference being read
    pub key: &'a str,

    /// The absolute entry path that was looked up in the archive
    pub file_path: &'a str,

    /// The classified media kind of the reference
    pub kind: ContentKind,

    /// The raw declared MIME type of the reference
    pub mime: &'a str,
}

/// The outcome a missing-content handler settles on
///
/// A handler may set at most one outcome per invocation. Returning
/// [MissingContentOutcome::Unhandled] — or registering no handler at all —
/// lets the read fail with a content-not-found error.
pub enum MissingContentOutcome {
    /// The handler does not cover this item; the read fails
    Unhandled,

    /// Treat the item as present with zero-length content
    Suppress,

    /// Use the given stream as a substitute for this call only
    Replace(Box<dyn Read + Send>),
}

/// The missing-content recovery hook
///
/// Invoked synchronously on every read whose entry is absent from the
/// archive. The hook fires fresh on each affected call; its outcome is
/// never cached, so a replacement stream is consumed once and produced
/// again on the next read.
pub type MissingContentHandler =
    Arc<dyn Fn(MissingContentContext<'_>) -> MissingContentOutcome + Send + Sync>;

/// Loader materializing bytes for archive-backed content references
///
/// The loader shares the archive handle with the owning book and prefixes
/// every reference's relative path with the content root before lookup.
/// All state is immutable configuration; individual reads never affect
/// each other.
#[derive(Clone)]
pub struct LocalContentLoader {
    archive: Arc<ArchiveHandle>,
    root: String,
    missing_handler: Option<MissingContentHandler>,
}

impl std::fmt::Debug for LocalContentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalContentLoader")
            .field("archive", &self.archive)
            .field("root", &self.root)
            .field("missing_handler", &self.missing_handler.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

impl LocalContentLoader {
    /// Creates a loader over the given archive
    ///
    /// # Parameters
    /// - `archive`: The shared archive handle
    /// - `root`: The content-root prefix entry paths are resolved under;
    ///   may be empty when the package lives at the archive root
    /// - `missing_handler`: The optional recovery hook for absent entries
    pub fn new(
        archive: Arc<ArchiveHandle>,
        root: impl Into<String>,
        missing_handler: Option<MissingContentHandler>,
    ) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }

        Self {
            archive,
            root,
            missing_handler,
        }
    }

    /// Resolves a reference's relative path to its absolute entry path.
    fn entry_path(&self, file_path: &str) -> String {
        if self.root.is_empty() {
            file_path.to_string()
        } else {
            format!("{}/{}", self.root, file_path)
        }
    }

    /// Runs the missing-content recovery protocol for one read.
    fn recover(
        &self,
        metadata: &ContentMetadata,
        path: &str,
    ) -> Result<Box<dyn Read + Send>, EpubError> {
        let not_found = || EpubError::ContentNotFound {
            key: metadata.key().to_string(),
            path: path.to_string(),
        };

        let Some(handler) = &self.missing_handler else {
            return Err(not_found());
        };

        let context = MissingContentContext {
            key: metadata.key(),
            file_path: path,
            kind: metadata.kind(),
            mime: metadata.mime(),
        };

        match handler(context) {
            MissingContentOutcome::Unhandled => Err(not_found()),
            MissingContentOutcome::Suppress => Ok(Box::new(io::empty())),
            MissingContentOutcome::Replace(stream) => Ok(stream),
        }
    }

    /// Opens the entry backing one read request
    ///
    /// This is the single materialization path all read modes go through:
    /// disposed-archive check, missing-entry recovery, oversized rejection,
    /// then the open entry stream. The recovery hook runs after the archive
    /// lock is released, so a handler may read other content.
    fn open_entry(
        &self,
        metadata: &ContentMetadata,
        file_path: &str,
    ) -> Result<Box<dyn Read + Send>, EpubError> {
        let path = self.entry_path(file_path);

        let entry = self.archive.with(|archive| {
            if !archive.contains(&path) {
                return Ok(None);
            }

            let length = archive.entry_len(&path)?;
            if length > MAX_ENTRY_LENGTH {
                return Err(EpubError::ContentOversized {
                    path: path.clone(),
                    length,
                });
            }

            archive.open(&path).map(Some)
        })?;

        match entry {
            Some(stream) => Ok(stream),
            None => self.recover(metadata, &path),
        }
    }

    /// Reads an entry and decodes it as UTF-8 text.
    pub fn read_text(
        &self,
        metadata: &ContentMetadata,
        file_path: &str,
    ) -> Result<String, EpubError> {
        self.read_bytes(metadata, file_path)?.decode()
    }

    /// Reads an entry's raw bytes.
    pub fn read_bytes(
        &self,
        metadata: &ContentMetadata,
        file_path: &str,
    ) -> Result<Vec<u8>, EpubError> {
        let mut stream = self.open_entry(metadata, file_path)?;
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).map_err(EpubError::from)?;

        Ok(buffer)
    }

    /// Opens an entry as a caller-owned stream positioned at offset 0.
    pub fn stream(
        &self,
        metadata: &ContentMetadata,
        file_path: &str,
    ) -> Result<Box<dyn Read + Send>, EpubError> {
        self.open_entry(metadata, file_path)
    }

    /// Reads and decodes an entry without blocking the caller's thread.
    #[cfg(feature = "async")]
    pub async fn read_text_async(
        &self,
        metadata: &ContentMetadata,
        file_path: &str,
    ) -> Result<String, EpubError> {
        let loader = self.clone();
        let metadata = metadata.clone();
        let file_path = file_path.to_string();

        tokio::task::spawn_blocking(move || loader.read_text(&metadata, &file_path)).await?
    }

    /// Reads an entry's raw bytes without blocking the caller's thread.
    #[cfg(feature = "async")]
    pub async fn read_bytes_async(
        &self,
        metadata: &ContentMetadata,
        file_path: &str,
    ) -> Result<Vec<u8>, EpubError> {
        let loader = self.clone();
        let metadata = metadata.clone();
        let file_path = file_path.to_string();

        tokio::task::spawn_blocking(move || loader.read_bytes(&metadata, &file_path)).await?
    }

    /// Opens an entry as a caller-owned stream without blocking the caller's thread.
    #[cfg(feature = "async")]
    pub async fn stream_async(
        &self,
        metadata: &ContentMetadata,
        file_path: &str,
    ) -> Result<Box<dyn Read + Send>, EpubError> {
        let loader = self.clone();
        let metadata = metadata.clone();
        let file_path = file_path.to_string();

        tokio::task::spawn_blocking(move || loader.stream(&metadata, &file_path)).await?
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Cursor, Read},
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use crate::{
        archive::{ArchiveHandle, EpubArchive, fixtures::zip_archive},
        content::{
            ContentKind, ContentMetadata,
            local::{LocalContentLoader, MAX_ENTRY_LENGTH, MissingContentOutcome},
        },
        error::EpubError,
    };

    fn chapter_metadata() -> ContentMetadata {
        ContentMetadata::new("chapter1.xhtml", ContentKind::Xhtml, "application/xhtml+xml")
            .unwrap()
    }

    fn loader_over(
        entries: &[(&str, &[u8])],
        handler: Option<crate::content::local::MissingContentHandler>,
    ) -> (LocalContentLoader, Arc<ArchiveHandle>) {
        let archive = Arc::new(ArchiveHandle::new(Box::new(zip_archive(entries))));
        let loader = LocalContentLoader::new(Arc::clone(&archive), "OPS", handler);

        (loader, archive)
    }

    /// Test that an existing entry returns exactly its stored bytes
    #[test]
    fn test_read_existing_entry() {
        let (loader, _archive) =
            loader_over(&[("OPS/chapter1.xhtml", b"<html>Hello</html>".as_slice())], None);

        let metadata = chapter_metadata();
        let text = loader.read_text(&metadata, "chapter1.xhtml").unwrap();
        assert_eq!(text, "<html>Hello</html>");

        let bytes = loader.read_bytes(&metadata, "chapter1.xhtml").unwrap();
        assert_eq!(bytes, b"<html>Hello</html>");

        let mut stream = loader.stream(&metadata, "chapter1.xhtml").unwrap();
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).unwrap();
        assert_eq!(buffer, b"<html>Hello</html>");
    }

    /// Test that a missing entry without a handler fails with a content error
    #[test]
    fn test_missing_entry_without_handler() {
        let (loader, _archive) = loader_over(&[], None);

        let result = loader.read_text(&chapter_metadata(), "chapter1.xhtml");
        assert_eq!(
            result.unwrap_err(),
            EpubError::ContentNotFound {
                key: "chapter1.xhtml".to_string(),
                path: "OPS/chapter1.xhtml".to_string(),
            }
        );
    }

    /// Test that a suppressing handler yields empty content
    #[test]
    fn test_missing_entry_suppressed() {
        let (loader, _archive) = loader_over(
            &[],
            Some(Arc::new(|_context| MissingContentOutcome::Suppress)),
        );

        let metadata = chapter_metadata();
        assert_eq!(loader.read_text(&metadata, "chapter1.xhtml").unwrap(), "");
        assert_eq!(
            loader.read_bytes(&metadata, "chapter1.xhtml").unwrap(),
            Vec::<u8>::new()
        );
    }

    /// Test that a replacing handler substitutes its stream and fires again
    /// on every read instead of being cached
    #[test]
    fn test_missing_entry_replaced_and_reinvoked() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);

        let (loader, _archive) = loader_over(
            &[],
            Some(Arc::new(move |context| {
                assert_eq!(context.key, "chapter1.xhtml");
                assert_eq!(context.file_path, "OPS/chapter1.xhtml");
                assert_eq!(context.kind, ContentKind::Xhtml);

                counter.fetch_add(1, Ordering::SeqCst);
                MissingContentOutcome::Replace(Box::new(Cursor::new(b"<html>stub</html>".to_vec())))
            })),
        );

        let metadata = chapter_metadata();
        assert_eq!(
            loader.read_text(&metadata, "chapter1.xhtml").unwrap(),
            "<html>stub</html>"
        );
        assert_eq!(
            loader.read_text(&metadata, "chapter1.xhtml").unwrap(),
            "<html>stub</html>"
        );
        assert_eq!(invocations.load(Ordering::SeqCst), 2);
    }

    /// Test that an unhandled outcome still fails with a content error
    #[test]
    fn test_missing_entry_unhandled_outcome() {
        let (loader, _archive) = loader_over(
            &[],
            Some(Arc::new(|_context| MissingContentOutcome::Unhandled)),
        );

        let result = loader.read_bytes(&chapter_metadata(), "chapter1.xhtml");
        assert!(matches!(
            result.unwrap_err(),
            EpubError::ContentNotFound { .. }
        ));
    }

    /// Stub archive whose single entry declares a 4 GiB length.
    struct OversizedArchive;

    impl EpubArchive for OversizedArchive {
        fn contains(&mut self, _path: &str) -> bool {
            true
        }

        fn entry_len(&mut self, _path: &str) -> Result<u64, EpubError> {
            Ok(4 * 1024 * 1024 * 1024)
        }

        fn open(&mut self, _path: &str) -> Result<Box<dyn Read + Send>, EpubError> {
            Ok(Box::new(Cursor::new(Vec::new())))
        }
    }

    /// Test that an oversized entry is rejected in every read mode
    #[test]
    fn test_oversized_entry_rejected() {
        let archive = Arc::new(ArchiveHandle::new(Box::new(OversizedArchive)));
        let loader = LocalContentLoader::new(archive, "OPS", None);
        let metadata = chapter_metadata();

        let expected = EpubError::ContentOversized {
            path: "OPS/chapter1.xhtml".to_string(),
            length: 4 * 1024 * 1024 * 1024,
        };

        assert_eq!(
            loader.read_text(&metadata, "chapter1.xhtml").unwrap_err(),
            expected
        );
        assert_eq!(
            loader.read_bytes(&metadata, "chapter1.xhtml").unwrap_err(),
            expected
        );
        assert_eq!(
            loader.stream(&metadata, "chapter1.xhtml").err().unwrap(),
            expected
        );
        assert!(4 * 1024 * 1024 * 1024_u64 > MAX_ENTRY_LENGTH);
    }

    /// Test that a disposed archive fails every operation with a
    /// resource-state error
    #[test]
    fn test_disposed_archive() {
        let (loader, archive) =
            loader_over(&[("OPS/chapter1.xhtml", b"<html/>".as_slice())], None);

        archive.dispose();

        let metadata = chapter_metadata();
        assert_eq!(
            loader.read_text(&metadata, "chapter1.xhtml").unwrap_err(),
            EpubError::ArchiveDisposed
        );
        assert_eq!(
            loader.read_bytes(&metadata, "chapter1.xhtml").unwrap_err(),
            EpubError::ArchiveDisposed
        );
        assert!(loader.stream(&metadata, "chapter1.xhtml").is_err());
    }

    /// Test that an empty root prefix leaves entry paths untouched
    #[test]
    fn test_empty_root_prefix() {
        let archive = Arc::new(ArchiveHandle::new(Box::new(zip_archive(&[(
            "chapter1.xhtml",
            b"<html/>".as_slice(),
        )]))));
        let loader = LocalContentLoader::new(archive, "", None);

        let text = loader
            .read_text(&chapter_metadata(), "chapter1.xhtml")
            .unwrap();
        assert_eq!(text, "<html/>");
    }

    #[cfg(feature = "async")]
    mod async_tests {
        use std::sync::Arc;

        use crate::{
            archive::{ArchiveHandle, fixtures::zip_archive},
            content::local::LocalContentLoader,
            error::EpubError,
        };

        use super::chapter_metadata;

        /// Test the asynchronous read path against a live archive
        #[tokio::test]
        async fn test_read_text_async() {
            let archive = Arc::new(ArchiveHandle::new(Box::new(zip_archive(&[(
                "OPS/chapter1.xhtml",
                b"<html>Hello</html>".as_slice(),
            )]))));
            let loader = LocalContentLoader::new(archive, "OPS", None);

            let text = loader
                .read_text_async(&chapter_metadata(), "chapter1.xhtml")
                .await
                .unwrap();
            assert_eq!(text, "<html>Hello</html>");
        }

        /// Test that disposal surfaces through the asynchronous path
        #[tokio::test]
        async fn test_read_async_after_dispose() {
            let archive = Arc::new(ArchiveHandle::new(Box::new(zip_archive(&[]))));
            let loader = LocalContentLoader::new(Arc::clone(&archive), "OPS", None);

            archive.dispose();

            let result = loader
                .read_bytes_async(&chapter_metadata(), "chapter1.xhtml")
                .await;
            assert_eq!(result.unwrap_err(), EpubError::ArchiveDisposed);
        }
    }
}
