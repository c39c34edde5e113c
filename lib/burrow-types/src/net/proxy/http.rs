/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use url::Url;

use super::ProxyParseError;
use crate::auth::{Password, Username};
use crate::net::{HttpAuth, HttpBasicAuth, OpensslClientConfigBuilder, UpstreamAddr};

const DEFAULT_HTTP_PROXY_PORT: u16 = 8080;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HttpProxy {
    peer: UpstreamAddr,
    pub auth: HttpAuth,
    pub tls_config: Option<OpensslClientConfigBuilder>,
    /// use the absolute target uri in the request line when forwarding
    /// through this proxy without a CONNECT tunnel
    pub absolute_uri_in_start_line: bool,
}

impl HttpProxy {
    pub fn new(peer: UpstreamAddr) -> Self {
        HttpProxy {
            peer,
            auth: HttpAuth::None,
            tls_config: None,
            absolute_uri_in_start_line: true,
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
        let mut proxy = HttpProxy::new(peer);
        if !user.is_empty() {
            let username = Username::from_encoded(user)?;
            let password = Password::from_encoded(pass)?;
            proxy.auth = HttpAuth::Basic(HttpBasicAuth::new(username, password));
        }
        Ok(proxy)
    }

    pub(super) fn from_url_authority(url: &Url) -> Result<Self, ProxyParseError> {
        let host = url.host().ok_or(ProxyParseError::NoHostFound)?;
        let port = url.port().unwrap_or(DEFAULT_HTTP_PROXY_PORT);
        let peer = UpstreamAddr::from_url_host_and_port(host.to_owned(), port);

        let auth = HttpAuth::try_from(url)?;

        Ok(HttpProxy {
            peer,
            auth,
            tls_config: None,
            absolute_uri_in_start_line: true,
        })
    }

    pub(super) fn from_url_authority_with_tls(url: &Url) -> Result<Self, ProxyParseError> {
        let mut v = HttpProxy::from_url_authority(url)?;
        v.tls_config = Some(OpensslClientConfigBuilder::default());
        Ok(v)
    }
}
