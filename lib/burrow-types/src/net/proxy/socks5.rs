/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use url::Url;

use super::ProxyParseError;
use crate::auth::{Password, Username};
use crate::net::{SocksAuth, UpstreamAddr};

const DEFAULT_SOCKS_PROXY_PORT: u16 = 1080;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Socks5Proxy {
    peer: UpstreamAddr,
    pub auth: SocksAuth,
}

impl Socks5Proxy {
    pub fn new(peer: UpstreamAddr) -> Self {
        Socks5Proxy {
            peer,
            auth: SocksAuth::None,
        }
    }

    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    pub(super) fn with_userinfo(
        peer: UpstreamAddr,
        user: &str,
        pass: &str,
    ) -> Result<Self, ProxyParseError> {
        let mut proxy = Socks5Proxy::new(peer);
        if !user.is_empty() && !pass.is_empty() {
            proxy.auth = SocksAuth::User(
                Username::from_encoded(user)?,
                Password::from_encoded(pass)?,
            );
        }
        Ok(proxy)
    }

    pub(super) fn from_url_authority(url: &Url) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(DEFAULT_SOCKS_PROXY_PORT);
        let peer = UpstreamAddr::from_url_host_and_port(host.to_owned(), port);

        Socks5Proxy::with_userinfo(peer, url.username(), url.password().unwrap_or_default())
    }
}
