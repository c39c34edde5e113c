/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use bytes::Bytes;
use http::{HeaderMap, HeaderName, Version};

/// captured during connection establishment, useful for debugging a TLS
/// or reconnect problem after the fact
#[derive(Debug, Clone, Default)]
pub struct ResponseDiagnostics {
    pub negotiated_cipher: Option<String>,
    pub tls_protocol: Option<String>,
    pub peer_cert_der: Option<Vec<u8>>,
    /// fail-reconnect attempts this response cost; silent keep-alive
    /// reconnects are not counted
    pub reconnect_count: u32,
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub version: Version,
    pub headers: HeaderMap,
    /// headers of every intermediate redirect response, last occurrence
    /// wins; present only when middle headers were requested
    pub middle_headers: Option<HeaderMap>,
    pub body: Bytes,
    pub diagnostics: ResponseDiagnostics,
    pub(crate) keep_alive: bool,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// a response redirects iff its status is 3xx or it carries a
    /// `Location`/`Redirect-Location` header
    pub fn has_redirect(&self) -> bool {
        (300..400).contains(&self.status) || self.redirect_location().is_some()
    }

    pub fn redirect_location(&self) -> Option<&str> {
        let location = self
            .headers
            .get(http::header::LOCATION)
            .or_else(|| self.headers.get(HeaderName::from_static("redirect-location")))?;
        location.to_str().ok()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> Response {
        Response {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            middle_headers: None,
            body: Bytes::new(),
            diagnostics: ResponseDiagnostics::default(),
            keep_alive: true,
        }
    }

    #[test]
    fn redirect_detection() {
        assert!(response(302).has_redirect());
        assert!(!response(200).has_redirect());

        let mut with_location = response(200);
        with_location
            .headers
            .insert(http::header::LOCATION, "/next".parse().unwrap());
        assert!(with_location.has_redirect());

        let mut with_alias = response(200);
        with_alias.headers.insert(
            HeaderName::from_static("redirect-location"),
            "/next".parse().unwrap(),
        );
        assert_eq!(with_alias.redirect_location(), Some("/next"));
    }

    #[test]
    fn ok_range() {
        assert!(response(200).is_ok());
        assert!(response(304).is_ok());
        assert!(!response(404).is_ok());
        assert!(!response(500).is_ok());
    }
}
