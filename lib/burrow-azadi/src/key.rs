/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use md5::{Digest, Md5};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;

const PBKDF2_ITERATIONS: u32 = 1000;

/// Derive the cipher key and nonce from the shared secret:
/// PBKDF2-HMAC-SHA1 over the secret with MD5(secret) as the salt,
/// 1000 rounds, split 32/12.
///
/// The nonce is a pure function of the secret and therefore constant
/// across connections; see the crate documentation for why that is unsound.
pub fn derive_key_nonce(secret: &str) -> ([u8; 32], [u8; 12]) {
    let salt = Md5::digest(secret.as_bytes());

    let mut derived = [0u8; 44];
    pbkdf2_hmac::<Sha1>(secret.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut derived);

    let mut key = [0u8; 32];
    let mut nonce = [0u8; 12];
    key.copy_from_slice(&derived[..32]);
    nonce.copy_from_slice(&derived[32..]);
    (key, nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let (key_a, nonce_a) = derive_key_nonce("opensesame");
        let (key_b, nonce_b) = derive_key_nonce("opensesame");
        assert_eq!(key_a, key_b);
        assert_eq!(nonce_a, nonce_b);
    }

    #[test]
    fn secret_changes_everything() {
        let (key_a, nonce_a) = derive_key_nonce("one");
        let (key_b, nonce_b) = derive_key_nonce("two");
        assert_ne!(key_a, key_b);
        assert_ne!(nonce_a, nonce_b);
    }
}
