/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod reader;
pub use reader::HttpBodyReader;

mod decoder;
pub use decoder::{ContentEncoding, UnsupportedContentEncoding, decode_content};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HttpBodyType {
    ContentLength(u64),
    Chunked,
    ReadUntilEnd,
}
