use crate::error::EpubError;

/// Provides functionality to decode byte data into strings
///
/// This trait is used to decode raw byte data (such as text content read
/// from an EPUB archive) into a UTF-8 string. A leading UTF-8 BOM (Byte
/// Order Mark) is tolerated and stripped, since packaging tools routinely
/// emit one in front of XHTML and CSS documents.
///
/// ## Implementation
/// Currently, this trait is implemented for the `Vec<u8>` type,
/// primarily used for processing text content in EPUB files.
///
/// ## Notes
/// - Empty data decodes to an empty string. Suppressed missing content is
///   materialized as zero bytes and must round-trip through this path.
pub trait DecodeBytes {
    fn decode(&self) -> Result<String, EpubError>;
}

impl DecodeBytes for Vec<u8> {
    fn decode(&self) -> Result<String, EpubError> {
        let data = match self.as_slice() {
            // Strip UTF-8 BOM (0xEF, 0xBB, 0xBF)
            [0xEF, 0xBB, 0xBF, rest @ ..] => rest,
            data => data,
        };

        String::from_utf8(data.to_vec()).map_err(EpubError::from)
    }
}
