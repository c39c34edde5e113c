/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;

use thiserror::Error;

use burrow_azadi::AzadiConnectError;
use burrow_http::body::UnsupportedContentEncoding;
use burrow_http::client::HttpResponseParseError;
use burrow_http::connect::HttpConnectError;
use burrow_socks::SocksConnectError;

pub use crate::cookie::InvalidCookie;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("tcp connect failed: {0:?}")]
    ConnectFailed(io::Error),
    #[error("tcp connect timed out")]
    TimedOut,
    #[error("dns resolve failed: {0:?}")]
    ResolveFailed(io::Error),
    #[error("no address resolved")]
    NoResolvedAddress,
    #[error("ssl handshake failed: {0}")]
    SslHandshakeFailed(String),
    #[error("cancelled by caller")]
    Cancelled,
}

/// protocol-level rejection by a proxy, after the socket was fine
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("http connect failed: {0}")]
    HttpConnect(#[from] HttpConnectError),
    #[error("socks connect failed: {0}")]
    Socks(#[from] SocksConnectError),
    #[error("azadi connect failed: {0}")]
    Azadi(#[from] AzadiConnectError),
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("write timed out")]
    TimedOut,
}

#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("read timed out")]
    TimedOut,
    /// the peer closed (or went quiet) before any status line byte arrived
    #[error("empty response")]
    RemoteClosed,
    #[error("invalid response: {0}")]
    InvalidResponse(HttpResponseParseError),
    #[error("invalid content encoding: {0}")]
    InvalidEncoding(#[from] UnsupportedContentEncoding),
}

impl From<HttpResponseParseError> for ReceiveError {
    fn from(e: HttpResponseParseError) -> Self {
        match e {
            HttpResponseParseError::RemoteClosed => ReceiveError::RemoteClosed,
            HttpResponseParseError::ReadFailed(e) => ReceiveError::ReadFailed(e),
            other => ReceiveError::InvalidResponse(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("connect failed: {0}")]
    Connect(#[from] ConnectError),
    #[error("proxy error: {0}")]
    Proxy(#[from] ProxyError),
    #[error("send failed: {0}")]
    Send(#[from] SendError),
    #[error("receive failed: {0}")]
    Receive(#[from] ReceiveError),
    #[error("protocol error: status {0}")]
    ProtocolStatus(u16),
    #[error("protocol error: redirect limit {0} exceeded")]
    RedirectLimitExceeded(usize),
    #[error("protocol error: invalid redirect location '{0}'")]
    InvalidRedirectLocation(String),
    #[error("invalid cookie: {0}")]
    InvalidCookie(#[from] InvalidCookie),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl HttpClientError {
    /// true for failures the fail-reconnect loop may redo
    pub(crate) fn is_retryable_io(&self) -> bool {
        matches!(
            self,
            HttpClientError::Connect(ConnectError::ConnectFailed(_))
                | HttpClientError::Connect(ConnectError::TimedOut)
                | HttpClientError::Send(_)
                | HttpClientError::Receive(ReceiveError::ReadFailed(_))
                | HttpClientError::Receive(ReceiveError::TimedOut)
        )
    }
}
