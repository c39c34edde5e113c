/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

//! Client side of the Azadi tunnel protocol.
//!
//! One sealed message travels in each direction: the client sends the
//! destination (and optional credentials) as a length-prefixed string
//! array, the proxy answers with a 4-byte status. Both messages are
//! encrypted with ChaCha20-Poly1305 under a key and nonce derived from the
//! shared secret.
//!
//! # Security
//!
//! The deployed proxy population derives a FIXED nonce from the secret and
//! reuses it for both directions of every connection. Nonce reuse under the
//! same key voids the confidentiality and integrity guarantees of
//! ChaCha20-Poly1305; this implementation keeps the scheme only for wire
//! compatibility. Do not use the tunnel as a security boundary.

mod key;
pub use key::derive_key_nonce;

mod frame;
pub use frame::{TAG_LEN, open_frame, seal_frame};

mod error;
pub use error::AzadiConnectError;

pub mod client;
