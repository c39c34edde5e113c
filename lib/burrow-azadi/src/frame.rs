/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};

/// the Poly1305 tag travels FIRST on the wire: `tag || ciphertext`
pub const TAG_LEN: usize = 16;

pub fn seal_frame(key: &[u8; 32], nonce: &[u8; 12], plaintext: &[u8]) -> Option<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let sealed = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .ok()?;
    // the aead api appends the tag, the wire wants it first
    let ct_len = sealed.len() - TAG_LEN;
    let mut frame = Vec::with_capacity(sealed.len());
    frame.extend_from_slice(&sealed[ct_len..]);
    frame.extend_from_slice(&sealed[..ct_len]);
    Some(frame)
}

pub fn open_frame(key: &[u8; 32], nonce: &[u8; 12], frame: &[u8]) -> Option<Vec<u8>> {
    if frame.len() < TAG_LEN {
        return None;
    }
    let (tag, ciphertext) = frame.split_at(TAG_LEN);
    let mut sealed = Vec::with_capacity(frame.len());
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher.decrypt(Nonce::from_slice(nonce), sealed.as_slice()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive_key_nonce;

    #[test]
    fn roundtrip() {
        let (key, nonce) = derive_key_nonce("secret");
        let frame = seal_frame(&key, &nonce, b"payload").unwrap();
        assert_eq!(frame.len(), TAG_LEN + 7);
        let plain = open_frame(&key, &nonce, &frame).unwrap();
        assert_eq!(plain, b"payload");
    }

    #[test]
    fn tampered_tag_fails() {
        let (key, nonce) = derive_key_nonce("secret");
        let mut frame = seal_frame(&key, &nonce, b"payload").unwrap();
        frame[0] ^= 0x01;
        assert!(open_frame(&key, &nonce, &frame).is_none());
    }

    #[test]
    fn wrong_key_fails() {
        let (key, nonce) = derive_key_nonce("secret");
        let frame = seal_frame(&key, &nonce, b"payload").unwrap();
        let (other_key, _) = derive_key_nonce("other");
        assert!(open_frame(&other_key, &nonce, &frame).is_none());
    }

    #[test]
    fn short_frame_fails() {
        let (key, nonce) = derive_key_nonce("secret");
        assert!(open_frame(&key, &nonce, &[0u8; 8]).is_none());
    }
}
