/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use url::Url;

use super::ProxyParseError;
use crate::net::UpstreamAddr;

const DEFAULT_SOCKS_PROXY_PORT: u16 = 1080;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Socks4Proxy {
    peer: UpstreamAddr,
    user_id: String,
    /// SOCKS4 resolves the target host locally; SOCKS4a lets the proxy do it
    resolve_locally: bool,
}

impl Socks4Proxy {
    pub fn new(peer: UpstreamAddr, user_id: &str, resolve_locally: bool) -> Self {
        Socks4Proxy {
            peer,
            user_id: user_id.to_string(),
            resolve_locally,
        }
    }

    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn resolve_locally(&self) -> bool {
        self.resolve_locally
    }

    pub(super) fn from_url_authority(
        url: &Url,
        resolve_locally: bool,
    ) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(DEFAULT_SOCKS_PROXY_PORT);
        let peer = UpstreamAddr::from_url_host_and_port(host.to_owned(), port);

        Ok(Socks4Proxy {
            peer,
            user_id: url.username().to_string(),
            resolve_locally,
        })
    }
}
