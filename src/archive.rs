//! Archive Capability Module
//!
//! This module defines the narrow archive capability the content loaders
//! consume — entry existence, entry length, entry opening — together with
//! the ZIP-backed implementation used for ordinary EPUB containers and the
//! shared, disposable handle that owns the archive for a book's lifetime.

use std::{
    io::{Cursor, Read, Seek},
    sync::Mutex,
};

use zip::{CompressionMethod, ZipArchive};

use crate::error::EpubError;

/// The archive capability consumed by the local content loader
///
/// An implementation provides access to the entries of one opened e-book
/// container. The trait is deliberately small so that tests and alternative
/// backends (an unpacked directory, a caching layer) can stand in for a
/// real ZIP container.
///
/// Methods take `&mut self` because ZIP central-directory access is
/// stateful; the [ArchiveHandle] serializes all access behind a mutex.
pub trait EpubArchive: Send {
    /// Checks whether an entry exists at the given path.
    fn contains(&mut self, path: &str) -> bool;

    /// Returns the declared uncompressed length of the entry at the given path.
    fn entry_len(&mut self, path: &str) -> Result<u64, EpubError>;

    /// Opens the entry at the given path for reading.
    ///
    /// The returned reader is owned by the caller and positioned at offset 0.
    fn open(&mut self, path: &str) -> Result<Box<dyn Read + Send>, EpubError>;
}

/// ZIP-backed implementation of the [EpubArchive] capability
///
/// Wraps a `zip::ZipArchive` over any readable, seekable source. The
/// constructor verifies that every entry uses a compression method allowed
/// by the OCF specification before any content is served.
pub struct ZipEpubArchive<R: Read + Seek + Send> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek + Send> ZipEpubArchive<R> {
    /// Creates a new archive over the given reader
    ///
    /// # Parameters
    /// - `reader`: The data source that implements the `Read` and `Seek`
    ///   traits, usually a file or memory buffer
    ///
    /// # Return
    /// - `Ok(ZipEpubArchive<R>)`: The opened and verified archive
    /// - `Err(EpubError)`: The container is corrupt or uses an unsupported
    ///   compression method
    pub fn new(reader: R) -> Result<Self, EpubError> {
        let mut archive = ZipArchive::new(reader).map_err(EpubError::from)?;
        compression_method_check(&mut archive)?;

        Ok(Self { archive })
    }
}

impl<R: Read + Seek + Send> EpubArchive for ZipEpubArchive<R> {
    fn contains(&mut self, path: &str) -> bool {
        self.archive.by_name(path).is_ok()
    }

    fn entry_len(&mut self, path: &str) -> Result<u64, EpubError> {
        let file = self.archive.by_name(path).map_err(EpubError::from)?;
        Ok(file.size())
    }

    fn open(&mut self, path: &str) -> Result<Box<dyn Read + Send>, EpubError> {
        // Decompressed entries borrow the central directory, so the bytes
        // are buffered here and handed out as an owned cursor.
        let mut file = self.archive.by_name(path).map_err(EpubError::from)?;
        let mut buffer = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buffer).map_err(EpubError::from)?;

        Ok(Box::new(Cursor::new(buffer)))
    }
}

/// Checks if the compression method of all entries in the container
/// conforms to the specification requirements.
///
/// According to the OCF (Open Container Format) specification, EPUB files
/// can only use either Stored (uncompressed) or Deflated (deflate compression).
/// If any other compression method is found, an error will be returned.
fn compression_method_check<R: Read + Seek>(
    zip_archive: &mut ZipArchive<R>,
) -> Result<(), EpubError> {
    for index in 0..zip_archive.len() {
        let file = zip_archive.by_index(index)?;

        match file.compression() {
            CompressionMethod::Stored | CompressionMethod::Deflated => continue,
            _ => {
                return Err(EpubError::UnusableCompressionMethod {
                    file: file.name().to_string(),
                    method: file.compression().to_string(),
                });
            }
        };
    }

    Ok(())
}

/// Shared, disposable owner of one archive
///
/// The handle owns the archive exclusively for the lifetime of a book and
/// guards it behind a mutex, since the ZIP backend is not reentrant. Once
/// [ArchiveHandle::dispose] has run, every subsequent operation fails with
/// a resource-state error; disposal itself is idempotent.
pub struct ArchiveHandle {
    inner: Mutex<Option<Box<dyn EpubArchive>>>,
}

impl std::fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHandle").finish_non_exhaustive()
    }
}

impl ArchiveHandle {
    /// Creates a new handle owning the given archive.
    pub fn new(archive: Box<dyn EpubArchive>) -> Self {
        Self {
            inner: Mutex::new(Some(archive)),
        }
    }

    /// Runs an operation against the live archive
    ///
    /// # Return
    /// - `Ok(T)`: The operation's result
    /// - `Err(EpubError)`: The archive has been disposed, the lock was
    ///   poisoned, or the operation itself failed
    pub(crate) fn with<T, F>(&self, op: F) -> Result<T, EpubError>
    where
        F: FnOnce(&mut dyn EpubArchive) -> Result<T, EpubError>,
    {
        let mut guard = self.inner.lock()?;

        match guard.as_mut() {
            Some(archive) => op(archive.as_mut()),
            None => Err(EpubError::ArchiveDisposed),
        }
    }

    /// Releases the owned archive
    ///
    /// The archive is dropped exactly once; calling this again is a no-op.
    /// Operations issued after disposal fail with a resource-state error.
    pub fn dispose(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = None;
        }
    }

    /// Checks whether the owned archive has been released.
    pub fn is_disposed(&self) -> bool {
        match self.inner.lock() {
            Ok(guard) => guard.is_none(),
            Err(_) => false,
        }
    }
}
