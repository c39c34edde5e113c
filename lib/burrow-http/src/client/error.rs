/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;

use http::Version;
use thiserror::Error;

use crate::HttpLineParseError;

#[derive(Debug, Error)]
pub enum HttpResponseParseError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    /// the peer closed (or went quiet) before any status line byte arrived;
    /// on a reused connection this is the trigger for a silent reconnect
    #[error("remote closed with empty message body")]
    RemoteClosed,
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("invalid status line: {0}")]
    InvalidStatusLine(HttpLineParseError),
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("unsupported version {0:?}")]
    InvalidVersion(Version),
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("invalid chunked transfer-encoding")]
    InvalidChunkedTransferEncoding,
}

impl HttpResponseParseError {
    /// true iff the failure was an empty response on an otherwise healthy
    /// read path
    pub fn is_empty_message_body(&self) -> bool {
        matches!(self, HttpResponseParseError::RemoteClosed)
    }
}
