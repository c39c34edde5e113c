/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::sync::Arc;
use std::time::Duration;

use http::Version;

use burrow_types::net::{HttpKeepAliveConfig, OpensslClientConfigBuilder, Proxy};

use crate::cookie::CookieJar;

const MINIMAL_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);
const MINIMAL_RW_TIMEOUT: Duration = Duration::from_millis(100);

/// Engine-level settings. What the predecessor kept in process-wide mutable
/// state (debug proxy, protocol version, buffer sizes) lives here instead.
#[derive(Clone)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub read_write_timeout: Duration,
    pub max_header_size: usize,
    pub body_line_max_size: usize,
    /// request bodies are written in slices of this size
    pub send_buffer_size: usize,
    /// capacity of the buffered response reader
    pub recv_buffer_size: usize,
    pub http_version: Version,
    pub keep_alive: HttpKeepAliveConfig,
    pub max_redirects: usize,
    pub reconnect: bool,
    pub reconnect_limit: u32,
    pub reconnect_delay: Duration,
    pub locale: String,
    pub charset: String,
    pub proxy: Option<Proxy>,
    pub bypass_proxy_for_loopback: bool,
    pub tls: OpensslClientConfigBuilder,
    pub cookie_jar: Option<Arc<CookieJar>>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        HttpClientConfig {
            connect_timeout: Duration::from_secs(15),
            read_write_timeout: Duration::from_secs(30),
            max_header_size: 65536,
            body_line_max_size: 2048,
            send_buffer_size: 8 * 1024,
            recv_buffer_size: 16 * 1024,
            http_version: Version::HTTP_11,
            keep_alive: HttpKeepAliveConfig::default(),
            max_redirects: 8,
            reconnect: false,
            reconnect_limit: 3,
            reconnect_delay: Duration::from_millis(1000),
            locale: "en-US".to_string(),
            charset: "utf-8".to_string(),
            proxy: None,
            bypass_proxy_for_loopback: false,
            tls: OpensslClientConfigBuilder::default(),
            cookie_jar: None,
        }
    }
}

impl HttpClientConfig {
    pub fn check(&mut self) {
        if self.connect_timeout < MINIMAL_CONNECT_TIMEOUT {
            self.connect_timeout = MINIMAL_CONNECT_TIMEOUT;
        }
        if self.read_write_timeout < MINIMAL_RW_TIMEOUT {
            self.read_write_timeout = MINIMAL_RW_TIMEOUT;
        }
        if self.send_buffer_size == 0 {
            self.send_buffer_size = 8 * 1024;
        }
        if self.recv_buffer_size == 0 {
            self.recv_buffer_size = 16 * 1024;
        }
        if self.max_header_size < 1024 {
            self.max_header_size = 1024;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_clamps() {
        let mut config = HttpClientConfig {
            connect_timeout: Duration::ZERO,
            send_buffer_size: 0,
            ..Default::default()
        };
        config.check();
        assert_eq!(config.connect_timeout, MINIMAL_CONNECT_TIMEOUT);
        assert_eq!(config.send_buffer_size, 8 * 1024);
    }
}
