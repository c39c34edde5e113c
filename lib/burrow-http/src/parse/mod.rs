/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod error;
pub use error::HttpLineParseError;

mod chunked_line;
mod header_line;
mod status_line;

pub use chunked_line::HttpChunkedLine;
pub use header_line::HttpHeaderLine;
pub use status_line::HttpStatusLine;
