//! Epub reader library
//!
//! A Rust library for lazily reading EPUB eBook files.
//!
//! This library resolves an opened EPUB publication into a navigable
//! object model whose content bytes are read on demand. Content embedded
//! in the archive and content hosted on the network sit behind one
//! uniform access contract: every manifest resource becomes a lazy
//! content reference that can be read in full or streamed, synchronously
//! or asynchronously, without ever decoding the whole book up front.
//!
//! ## Features
//!
//! - Lazy content references over two axes: archive/network location and
//!   text/byte encoding.
//! - A missing-content recovery hook to suppress or substitute absent
//!   archive entries per read.
//! - Opt-in remote content downloads with an injectable fetch capability.
//! - Reading order and navigation tree queries over the parsed schema,
//!   covering both EPUB 2 and EPUB 3 navigation sources.
//! - Narration timestamps for media-overlay audio synchronization.
//!
//! ## Quick Start
//!
//! ### Read an opened book
//!
//! ```rust, ignore
//! # use epub_reader::book::{EpubBook, ReaderOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // `archive` and `schema` come from the container and parsing layers.
//! let book = EpubBook::new(archive, "OPS", schema, ReaderOptions::default())?;
//!
//! println!("Title: {}", book.title());
//!
//! // Walk the reading order; bytes are read only here.
//! for chapter in book.reading_order()? {
//!     let _text = chapter.read()?;
//! }
//!
//! // Release the archive when done.
//! book.dispose();
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! This crate uses 2 feature flags to reduce the needless code for your
//! project. Both are enabled by default.
//!
//! - `async`: Enables the asynchronous twins of every read operation.
//!   The blocking body runs on the caller's runtime via its blocking
//!   task pool; the crate starts no threads of its own.
//! - `http`: Enables the default HTTP implementation of the network
//!   fetch capability. Without it, remote downloads require an injected
//!   fetcher.

pub(crate) mod utils;

pub mod archive;
pub mod book;
pub mod content;
pub mod error;
pub mod link;
pub mod navigation;
pub mod overlay;
pub mod schema;

pub use utils::DecodeBytes;
