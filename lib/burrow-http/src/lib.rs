/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod parse;
pub use parse::{HttpChunkedLine, HttpHeaderLine, HttpLineParseError, HttpStatusLine};

pub mod body;
pub mod client;
pub mod connect;
pub mod header;

pub use body::{HttpBodyReader, HttpBodyType};
