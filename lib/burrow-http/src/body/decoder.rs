/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io::{self, Read};
use std::str::FromStr;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unsupported content encoding '{0}'")]
pub struct UnsupportedContentEncoding(pub String);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ContentEncoding {
    #[default]
    Identity,
    Gzip,
    Deflate,
}

impl FromStr for ContentEncoding {
    type Err = UnsupportedContentEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "identity" => Ok(ContentEncoding::Identity),
            "gzip" | "x-gzip" => Ok(ContentEncoding::Gzip),
            "deflate" => Ok(ContentEncoding::Deflate),
            other => Err(UnsupportedContentEncoding(other.to_string())),
        }
    }
}

/// Decode one fully framed message payload. The framing layer has already
/// stripped content-length / chunked transfer structure, so the input here
/// is the raw coded byte stream.
pub fn decode_content(encoding: ContentEncoding, data: &[u8]) -> io::Result<Vec<u8>> {
    match encoding {
        ContentEncoding::Identity => Ok(data.to_vec()),
        ContentEncoding::Gzip => {
            let mut out = Vec::with_capacity(data.len().saturating_mul(2));
            GzDecoder::new(data).read_to_end(&mut out)?;
            Ok(out)
        }
        ContentEncoding::Deflate => {
            let mut out = Vec::with_capacity(data.len().saturating_mul(2));
            match ZlibDecoder::new(data).read_to_end(&mut out) {
                Ok(_) => Ok(out),
                Err(_) => {
                    // some servers send raw deflate without the zlib wrapper
                    out.clear();
                    DeflateDecoder::new(data).read_to_end(&mut out)?;
                    Ok(out)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use std::io::Write;

    #[test]
    fn encoding_names() {
        assert_eq!(
            ContentEncoding::from_str("GZIP").unwrap(),
            ContentEncoding::Gzip
        );
        assert_eq!(
            ContentEncoding::from_str("deflate").unwrap(),
            ContentEncoding::Deflate
        );
        assert_eq!(
            ContentEncoding::from_str("").unwrap(),
            ContentEncoding::Identity
        );
        assert!(ContentEncoding::from_str("br").is_err());
    }

    #[test]
    fn gzip_roundtrip() {
        let plain = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plain).unwrap();
        let coded = encoder.finish().unwrap();

        let decoded = decode_content(ContentEncoding::Gzip, &coded).unwrap();
        assert_eq!(decoded, plain);
    }

    #[test]
    fn deflate_zlib_roundtrip() {
        let plain = b"abc123";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(plain).unwrap();
        let coded = encoder.finish().unwrap();

        let decoded = decode_content(ContentEncoding::Deflate, &coded).unwrap();
        assert_eq!(decoded, plain);
    }

    #[test]
    fn deflate_raw_fallback() {
        let plain = b"abc123";
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(plain).unwrap();
        let coded = encoder.finish().unwrap();

        let decoded = decode_content(ContentEncoding::Deflate, &coded).unwrap();
        assert_eq!(decoded, plain);
    }

    #[test]
    fn identity_passthrough() {
        let data = b"plain";
        assert_eq!(decode_content(ContentEncoding::Identity, data).unwrap(), data);
    }

    #[test]
    fn gzip_garbage_fails() {
        assert!(decode_content(ContentEncoding::Gzip, b"not gzip at all").is_err());
    }
}
