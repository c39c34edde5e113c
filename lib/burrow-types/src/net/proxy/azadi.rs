/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::str::FromStr;

use url::Url;

use super::ProxyParseError;
use crate::auth::{Password, Username};
use crate::codec::decode_str_array;
use crate::net::{SocksAuth, UpstreamAddr};

/// The Azadi tunnel endpoint. The shared secret seeds the key derivation of
/// the handshake; it is part of the proxy identity.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AzadiProxy {
    peer: UpstreamAddr,
    secret: String,
    pub auth: SocksAuth,
}

impl AzadiProxy {
    pub fn new(peer: UpstreamAddr, secret: &str) -> Self {
        AzadiProxy {
            peer,
            secret: secret.to_string(),
            auth: SocksAuth::None,
        }
    }

    pub fn peer(&self) -> &UpstreamAddr {
        &self.peer
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// `ap://<hex>` where the hex payload is the length-prefixed string
    /// array `[host, port, secret]`. Optional userinfo carries tunnel
    /// credentials.
    pub(super) fn from_url_payload(url: &Url) -> Result<Self, ProxyParseError> {
        let payload = url.host_str().ok_or(ProxyParseError::NoHostFound)?;
        let bytes = hex::decode(payload).map_err(|_| ProxyParseError::InvalidHexPayload)?;
        let items = decode_str_array(&bytes)?;
        let [host, port, secret] = items.as_slice() else {
            return Err(ProxyParseError::InvalidHexPayload);
        };

        let port = u16::from_str(port).map_err(|_| ProxyParseError::InvalidPort)?;
        let peer = UpstreamAddr::from_host_str_and_port(host, port)?;

        let mut proxy = AzadiProxy::new(peer, secret);
        let user = url.username();
        if !user.is_empty() {
            let username = Username::from_encoded(user)?;
            let password = Password::from_encoded(url.password().unwrap_or_default())?;
            proxy.auth = SocksAuth::User(username, password);
        }
        Ok(proxy)
    }
}
