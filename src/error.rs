//! Error Type Definition Module
//!
//! This module defines the various error types that may be encountered while
//! resolving EPUB content. All errors are uniformly wrapped in the
//! `EpubError` enumeration for convenient error handling by the caller.
//!
//! Every error additionally maps to an [ErrorCategory], so a caller can
//! decide whether to suppress, substitute or abort without matching on
//! individual variants.

use thiserror::Error;

/// Coarse classification of an [EpubError].
///
/// The categories mirror how a caller is expected to react to a failure:
/// validation and resource-state errors are programming or lifecycle
/// mistakes, content errors may be recoverable through the missing-content
/// protocol, fetch errors are network-policy or transport failures, and
/// link errors reject out-of-package navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A required argument was empty or otherwise malformed at construction time
    Validation,

    /// An operation was attempted after the owning archive was released
    ResourceState,

    /// A content item could not be materialized from the archive
    Content,

    /// Remote fetching was disabled or the fetch itself failed
    Fetch,

    /// A navigation href pointed outside the package
    Link,

    /// An underlying I/O or task failure
    Io,
}

/// Types of errors that can occur while reading EPUB content
///
/// This enumeration defines the error cases that can be encountered when
/// materializing content from an opened EPUB publication, including archive
/// problems, missing or oversized resources, disabled network fetches and
/// invalid navigation targets.
#[derive(Debug, Error)]
pub enum EpubError {
    /// Disposed archive error
    ///
    /// This error occurs when any content operation is attempted after the
    /// book handle or its archive has been released. The failing call is
    /// fatal, but the remaining state is not corrupted.
    #[error("Archive disposed: The archive backing this book has already been released.")]
    ArchiveDisposed,

    /// ZIP archive related errors
    ///
    /// Errors occur when processing the ZIP structure of EPUB files,
    /// such as file corruption, unreadability, etc.
    #[error("Archive error: {source}")]
    ArchiveError { source: zip::result::ZipError },

    /// Missing content error
    ///
    /// This error occurs when a local content reference points to an entry
    /// that does not exist in the archive and no missing-content handler
    /// produced a substitute for it.
    #[error("Content not found: Unable to find the \"{key}\" content at \"{path}\".")]
    ContentNotFound { key: String, path: String },

    /// Oversized content error
    ///
    /// This error occurs when an archive entry declares an uncompressed
    /// length above the supported ceiling. Oversized entries are rejected
    /// outright rather than partially read, and the missing-content
    /// handler is never consulted for them.
    #[error("Content oversized: The \"{path}\" entry declares {length} bytes.")]
    ContentOversized { path: String, length: u64 },

    /// Empty required field error
    ///
    /// Triggered when a constructor receives an empty value for a field
    /// that must be non-empty, such as a content key or a link href.
    #[error("Empty field: The \"{field}\" field must not be empty.")]
    EmptyField { field: &'static str },

    /// Remote fetching disabled error
    ///
    /// This error occurs when a download operation is requested while
    /// remote content fetching is turned off. No network attempt is made.
    #[error("Fetch disabled: Downloading \"{url}\" requires remote content fetching to be enabled.")]
    FetchDisabled { url: String },

    /// Remote fetch failure error
    ///
    /// This error wraps a failure reported by the injected fetch
    /// capability. It is propagated unchanged as a transport error.
    #[error("Fetch failed: Unable to download \"{url}\": {source}")]
    FetchFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("IO error: {source}")]
    IOError { source: std::io::Error },

    /// Mutex error
    ///
    /// This error occurs when a mutex is poisoned, which means
    /// that a thread has panicked while holding a lock on the mutex.
    #[error("Mutex error: Mutex was poisoned.")]
    MutexError,

    /// Remote navigation target error
    ///
    /// This error occurs when a navigation href carries a recognized
    /// network scheme. Navigation links must point at in-package
    /// documents; external links belong to a higher layer.
    #[error("Remote link: The \"{href}\" href does not point inside the package.")]
    RemoteLink { href: String },

    /// Background task error
    ///
    /// This error occurs when the blocking body of an asynchronous
    /// operation could not be joined back onto the caller's runtime.
    #[cfg(feature = "async")]
    #[error("Background task error: {source}")]
    TaskError { source: tokio::task::JoinError },

    /// Unusable compression method error
    ///
    /// This error occurs when an EPUB file uses an unsupported compression method.
    #[error(
        "Unusable compression method: The \"{file}\" file uses the unsupported \"{method}\" compression method."
    )]
    UnusableCompressionMethod { file: String, method: String },

    /// UTF-8 decoding error
    ///
    /// This error occurs when attempting to decode byte data into a UTF-8 string
    /// but the data is not formatted correctly.
    #[error("Decode error: {source}")]
    Utf8DecodeError { source: std::string::FromUtf8Error },
}

impl EpubError {
    /// Returns the coarse [ErrorCategory] of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EpubError::EmptyField { .. } => ErrorCategory::Validation,
            EpubError::ArchiveDisposed | EpubError::MutexError => ErrorCategory::ResourceState,
            EpubError::ContentNotFound { .. }
            | EpubError::ContentOversized { .. }
            | EpubError::UnusableCompressionMethod { .. }
            | EpubError::Utf8DecodeError { .. } => ErrorCategory::Content,
            EpubError::FetchDisabled { .. } | EpubError::FetchFailed { .. } => ErrorCategory::Fetch,
            EpubError::RemoteLink { .. } => ErrorCategory::Link,
            EpubError::ArchiveError { .. } | EpubError::IOError { .. } => ErrorCategory::Io,
            #[cfg(feature = "async")]
            EpubError::TaskError { .. } => ErrorCategory::Io,
        }
    }
}

impl From<zip::result::ZipError> for EpubError {
    fn from(value: zip::result::ZipError) -> Self {
        EpubError::ArchiveError { source: value }
    }
}

impl From<std::io::Error> for EpubError {
    fn from(value: std::io::Error) -> Self {
        EpubError::IOError { source: value }
    }
}

impl From<std::string::FromUtf8Error> for EpubError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        EpubError::Utf8DecodeError { source: value }
    }
}

impl<T> From<std::sync::PoisonError<T>> for EpubError {
    fn from(_value: std::sync::PoisonError<T>) -> Self {
        EpubError::MutexError
    }
}

#[cfg(feature = "async")]
impl From<tokio::task::JoinError> for EpubError {
    fn from(value: tokio::task::JoinError) -> Self {
        EpubError::TaskError { source: value }
    }
}

#[cfg(test)]
impl PartialEq for EpubError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::ContentNotFound {
                    key: l_key,
                    path: l_path,
                },
                Self::ContentNotFound {
                    key: r_key,
                    path: r_path,
                },
            ) => l_key == r_key && l_path == r_path,
            (
                Self::ContentOversized {
                    path: l_path,
                    length: l_length,
                },
                Self::ContentOversized {
                    path: r_path,
                    length: r_length,
                },
            ) => l_path == r_path && l_length == r_length,
            (Self::EmptyField { field: l_field }, Self::EmptyField { field: r_field }) => {
                l_field == r_field
            }
            (Self::FetchDisabled { url: l_url }, Self::FetchDisabled { url: r_url }) => {
                l_url == r_url
            }
            (Self::FetchFailed { url: l_url, .. }, Self::FetchFailed { url: r_url, .. }) => {
                l_url == r_url
            }
            (Self::RemoteLink { href: l_href }, Self::RemoteLink { href: r_href }) => {
                l_href == r_href
            }
            (
                Self::UnusableCompressionMethod {
                    file: l_file,
                    method: l_method,
                },
                Self::UnusableCompressionMethod {
                    file: r_file,
                    method: r_method,
                },
            ) => l_file == r_file && l_method == r_method,
            (
                Self::Utf8DecodeError { source: l_source },
                Self::Utf8DecodeError { source: r_source },
            ) => l_source == r_source,

            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EpubError, ErrorCategory};

    /// Test that every variant maps to the expected category
    #[test]
    fn test_error_categories() {
        let validation = EpubError::EmptyField { field: "key" };
        assert_eq!(validation.category(), ErrorCategory::Validation);

        assert_eq!(
            EpubError::ArchiveDisposed.category(),
            ErrorCategory::ResourceState
        );

        let content = EpubError::ContentNotFound {
            key: "chapter1.xhtml".to_string(),
            path: "OPS/chapter1.xhtml".to_string(),
        };
        assert_eq!(content.category(), ErrorCategory::Content);

        let oversized = EpubError::ContentOversized {
            path: "OPS/video.bin".to_string(),
            length: 4 * 1024 * 1024 * 1024,
        };
        assert_eq!(oversized.category(), ErrorCategory::Content);

        let fetch = EpubError::FetchDisabled {
            url: "https://example.com/style.css".to_string(),
        };
        assert_eq!(fetch.category(), ErrorCategory::Fetch);

        let link = EpubError::RemoteLink {
            href: "https://example.com/chapter1.html".to_string(),
        };
        assert_eq!(link.category(), ErrorCategory::Link);
    }

    /// Test the display formatting of a content error
    #[test]
    fn test_error_display() {
        let error = EpubError::ContentNotFound {
            key: "chapter1.xhtml".to_string(),
            path: "OPS/chapter1.xhtml".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Content not found: Unable to find the \"chapter1.xhtml\" content at \"OPS/chapter1.xhtml\"."
        );
    }
}
