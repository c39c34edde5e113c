/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

//! Length-prefixed string array codec.
//!
//! Used both by the `ap://` proxy url payload and by the Azadi tunnel
//! request/reply plaintext: a `u32` LE item count followed by, per item,
//! a `u32` LE byte length and the UTF-8 bytes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrArrayDecodeError {
    #[error("truncated input")]
    Truncated,
    #[error("oversized item length {0}")]
    OversizedItem(u32),
    #[error("invalid utf-8 item")]
    InvalidUtf8,
    #[error("trailing bytes after last item")]
    TrailingBytes,
}

const ITEM_MAX_LENGTH: u32 = 4096;

pub fn encode_str_array<S: AsRef<str>>(items: &[S]) -> Vec<u8> {
    let mut size = 4;
    for item in items {
        size += 4 + item.as_ref().len();
    }
    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(&(items.len() as u32).to_le_bytes());
    for item in items {
        let s = item.as_ref();
        buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }
    buf
}

pub fn decode_str_array(buf: &[u8]) -> Result<Vec<String>, StrArrayDecodeError> {
    let mut offset = 0usize;

    let count = read_u32(buf, &mut offset)?;
    let mut items = Vec::with_capacity(count.min(16) as usize);
    for _ in 0..count {
        let len = read_u32(buf, &mut offset)?;
        if len > ITEM_MAX_LENGTH {
            return Err(StrArrayDecodeError::OversizedItem(len));
        }
        let end = offset
            .checked_add(len as usize)
            .ok_or(StrArrayDecodeError::Truncated)?;
        if end > buf.len() {
            return Err(StrArrayDecodeError::Truncated);
        }
        let s = std::str::from_utf8(&buf[offset..end])
            .map_err(|_| StrArrayDecodeError::InvalidUtf8)?;
        items.push(s.to_string());
        offset = end;
    }

    if offset != buf.len() {
        return Err(StrArrayDecodeError::TrailingBytes);
    }
    Ok(items)
}

fn read_u32(buf: &[u8], offset: &mut usize) -> Result<u32, StrArrayDecodeError> {
    let end = *offset + 4;
    if end > buf.len() {
        return Err(StrArrayDecodeError::Truncated);
    }
    let v = u32::from_le_bytes(buf[*offset..end].try_into().unwrap());
    *offset = end;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let items = ["example.com", "443", "secret"];
        let buf = encode_str_array(&items);
        let decoded = decode_str_array(&buf).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn empty_array() {
        let buf = encode_str_array::<&str>(&[]);
        assert_eq!(buf, [0u8; 4]);
        assert!(decode_str_array(&buf).unwrap().is_empty());
    }

    #[test]
    fn truncated() {
        let mut buf = encode_str_array(&["host", "80"]);
        buf.truncate(buf.len() - 1);
        assert!(matches!(
            decode_str_array(&buf),
            Err(StrArrayDecodeError::Truncated)
        ));
    }

    #[test]
    fn trailing_bytes() {
        let mut buf = encode_str_array(&["host"]);
        buf.push(0);
        assert!(matches!(
            decode_str_array(&buf),
            Err(StrArrayDecodeError::TrailingBytes)
        ));
    }
}
