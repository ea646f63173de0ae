//! Remote Content Loader Module
//!
//! This module materializes bytes for network-backed content references.
//! Fetching is disabled by default: publications may declare remote
//! resources, but no network traffic happens until the caller opts in.
//! The transport itself is an injected capability, so applications can
//! substitute their own client; the `http` feature supplies a default
//! implementation backed by a blocking HTTP client.

use std::{io::Read, sync::Arc};

use crate::{content::ContentMetadata, error::EpubError, utils::DecodeBytes};

/// The user agent sent when the caller does not override it.
pub const DEFAULT_USER_AGENT: &str = concat!("EpubReader/", env!("CARGO_PKG_VERSION"));

/// The network fetch capability consumed by the remote content loader
///
/// An implementation turns a URL into an open byte stream. Failures are
/// propagated unchanged as transport errors; the loader never retries and
/// never applies the missing-content recovery protocol to remote items.
pub trait ContentFetcher: Send + Sync {
    /// Fetches the resource at the given URL.
    fn fetch(&self, url: &str, user_agent: &str) -> Result<Box<dyn Read + Send>, EpubError>;
}

/// Loader materializing bytes for network-backed content references
///
/// The loader holds the fetch policy of one book: whether downloads are
/// allowed, which user agent identifies them, and which fetch capability
/// performs them. Unlike archive entries, remote content has no size
/// ceiling — that limit is an archive-format constraint.
#[derive(Clone)]
pub struct RemoteContentLoader {
    fetcher: Option<Arc<dyn ContentFetcher>>,
    downloads_enabled: bool,
    user_agent: String,
}

impl RemoteContentLoader {
    /// Creates a loader with the given fetch policy
    ///
    /// # Parameters
    /// - `fetcher`: The fetch capability, when one is available
    /// - `downloads_enabled`: Whether download operations may touch the network
    /// - `user_agent`: An optional override of [DEFAULT_USER_AGENT]
    pub fn new(
        fetcher: Option<Arc<dyn ContentFetcher>>,
        downloads_enabled: bool,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            downloads_enabled,
            user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Opens the fetch stream backing one download request.
    fn open(&self, metadata: &ContentMetadata) -> Result<Box<dyn Read + Send>, EpubError> {
        let url = metadata.key();

        if !self.downloads_enabled {
            return Err(EpubError::FetchDisabled {
                url: url.to_string(),
            });
        }

        let Some(fetcher) = &self.fetcher else {
            return Err(EpubError::FetchFailed {
                url: url.to_string(),
                source: Box::new(std::io::Error::other(
                    "no fetch capability has been configured",
                )),
            });
        };

        fetcher.fetch(url, &self.user_agent)
    }

    /// Downloads a resource and decodes it as UTF-8 text.
    pub fn download_text(&self, metadata: &ContentMetadata) -> Result<String, EpubError> {
        self.download_bytes(metadata)?.decode()
    }

    /// Downloads a resource's raw bytes.
    pub fn download_bytes(&self, metadata: &ContentMetadata) -> Result<Vec<u8>, EpubError> {
        let mut stream = self.open(metadata)?;
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).map_err(EpubError::from)?;

        Ok(buffer)
    }

    /// Opens a resource's fetch stream without buffering it.
    pub fn stream(&self, metadata: &ContentMetadata) -> Result<Box<dyn Read + Send>, EpubError> {
        self.open(metadata)
    }

    /// Downloads and decodes a resource without blocking the caller's thread.
    #[cfg(feature = "async")]
    pub async fn download_text_async(
        &self,
        metadata: &ContentMetadata,
    ) -> Result<String, EpubError> {
        let loader = self.clone();
        let metadata = metadata.clone();

        tokio::task::spawn_blocking(move || loader.download_text(&metadata)).await?
    }

    /// Downloads a resource's raw bytes without blocking the caller's thread.
    #[cfg(feature = "async")]
    pub async fn download_bytes_async(
        &self,
        metadata: &ContentMetadata,
    ) -> Result<Vec<u8>, EpubError> {
        let loader = self.clone();
        let metadata = metadata.clone();

        tokio::task::spawn_blocking(move || loader.download_bytes(&metadata)).await?
    }

    /// Opens a resource's fetch stream without blocking the caller's thread.
    #[cfg(feature = "async")]
    pub async fn stream_async(
        &self,
        metadata: &ContentMetadata,
    ) -> Result<Box<dyn Read + Send>, EpubError> {
        let loader = self.clone();
        let metadata = metadata.clone();

        tokio::task::spawn_blocking(move || loader.stream(&metadata)).await?
    }
}

/// HTTP implementation of the [ContentFetcher] capability
///
/// Performs plain GET requests with a blocking client. Responses with
/// error status codes are reported as transport errors rather than being
/// read as content.
#[cfg(feature = "http")]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
impl ContentFetcher for HttpFetcher {
    fn fetch(&self, url: &str, user_agent: &str) -> Result<Box<dyn Read + Send>, EpubError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|source| EpubError::FetchFailed {
                url: url.to_string(),
                source: Box::new(source),
            })?;

        Ok(Box::new(response))
    }
}
