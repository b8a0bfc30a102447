use crate::envelope::Envelope;
use crate::{Error, Result};

use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zstd,
    Gzip,
}

impl Compression {
    /// Maps an HTTP `Content-Encoding` value; unknown encodings yield `None`.
    pub fn from_content_encoding(encoding: &str) -> Option<Self> {
        match encoding.trim().to_ascii_lowercase().as_str() {
            "" | "identity" => Some(Compression::None),
            "gzip" | "x-gzip" => Some(Compression::Gzip),
            "zstd" => Some(Compression::Zstd),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CompressedDecodeWorkspace {
    plain: Vec<u8>,
}

#[cfg(not(all(feature = "compression-gzip", feature = "compression-zstd")))]
fn feature_disabled(name: &str) -> Error {
    Error::Decompress(format!("{name} compression feature not enabled"))
}

/// Streaming decoder over a compressed body.
fn body_reader<'a>(bytes: &'a [u8], c: Compression) -> Result<Box<dyn Read + 'a>> {
    match c {
        Compression::None => Ok(Box::new(bytes)),
        #[cfg(feature = "compression-gzip")]
        Compression::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(bytes))),
        #[cfg(not(feature = "compression-gzip"))]
        Compression::Gzip => Err(feature_disabled("gzip")),
        #[cfg(feature = "compression-zstd")]
        Compression::Zstd => match zstd::stream::read::Decoder::new(bytes) {
            Ok(dec) => Ok(Box::new(dec)),
            Err(e) => Err(Error::Decompress(e.to_string())),
        },
        #[cfg(not(feature = "compression-zstd"))]
        Compression::Zstd => Err(feature_disabled("zstd")),
    }
}

/// Inflates into `out`, reading at most one byte past the bound.
fn inflate_into(
    bytes: &[u8],
    c: Compression,
    max_uncompressed_len: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    out.clear();
    let limit = u64::try_from(max_uncompressed_len)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    body_reader(bytes, c)?
        .take(limit)
        .read_to_end(out)
        .map_err(|e| Error::Decompress(e.to_string()))?;
    if out.len() > max_uncompressed_len {
        return Err(Error::Decompress(
            "decompressed body exceeds max_uncompressed_len".to_string(),
        ));
    }
    Ok(())
}

/// Parses a response body that may be compressed.
///
/// `max_uncompressed_len` bounds the inflated size; an uncompressed body is
/// checked against it directly.
pub fn decode_envelope_compressed(
    bytes: &[u8],
    c: Compression,
    max_uncompressed_len: usize,
) -> Result<Envelope> {
    let mut ws = CompressedDecodeWorkspace::default();
    decode_envelope_compressed_with_workspace(bytes, c, max_uncompressed_len, &mut ws)
}

pub fn decode_envelope_compressed_with_workspace(
    bytes: &[u8],
    c: Compression,
    max_uncompressed_len: usize,
    ws: &mut CompressedDecodeWorkspace,
) -> Result<Envelope> {
    match c {
        Compression::None => {
            if bytes.len() > max_uncompressed_len {
                return Err(Error::Decompress(
                    "body exceeds max_uncompressed_len".to_string(),
                ));
            }
            Envelope::from_slice(bytes)
        }
        Compression::Gzip | Compression::Zstd => {
            inflate_into(bytes, c, max_uncompressed_len, &mut ws.plain)?;
            Envelope::from_slice(ws.plain.as_slice())
        }
    }
}
