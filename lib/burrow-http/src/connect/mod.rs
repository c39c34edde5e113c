/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;

use thiserror::Error;

use crate::HttpLineParseError;

mod request;
pub use request::HttpConnectRequest;

mod response;
pub use response::HttpConnectResponse;

pub mod client;

#[derive(Debug, Error)]
pub enum HttpConnectResponseError {
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("invalid status line: {0}")]
    InvalidStatusLine(HttpLineParseError),
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("invalid chunked transfer-encoding")]
    InvalidChunkedTransferEncoding,
}

#[derive(Debug, Error)]
pub enum HttpConnectError {
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("remote closed")]
    RemoteClosed,
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] HttpConnectResponseError),
    #[error("peer timeout, code {0}")]
    PeerTimeout(u16),
    #[error("unexpected status code {0} {1}")]
    UnexpectedStatusCode(u16, String),
}
