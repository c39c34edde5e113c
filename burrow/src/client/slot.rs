/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::time::Duration;

use tokio::io::BufReader;
use tokio::time::Instant;
use url::Url;

use burrow_types::net::{HttpKeepAliveConfig, Proxy, UpstreamAddr, scheme_default_port};

use crate::connect::{BoxStreamReader, BoxStreamWriter, TlsInfo};

/// scheme, host, port
pub(crate) type Origin = (String, String, u16);

pub(crate) fn origin_of(url: &Url) -> Option<Origin> {
    let host = url.host_str()?;
    let port = url.port().or_else(|| scheme_default_port(url.scheme()))?;
    Some((url.scheme().to_string(), host.to_string(), port))
}

/// The one live connection the client owns between requests.
pub(crate) struct ConnectionSlot {
    pub(crate) reader: BufReader<BoxStreamReader>,
    pub(crate) writer: BoxStreamWriter,
    pub(crate) tls: Option<TlsInfo>,
    pub(crate) forward_mode: bool,
    /// the proxy identity at establishment time
    pub(crate) proxy: Option<Proxy>,
    pub(crate) origin: Origin,
    pub(crate) idle_since: Instant,
    pub(crate) served_requests: usize,
    /// effective limits, defaults merged with what the server advertised
    pub(crate) keep_alive: HttpKeepAliveConfig,
}

impl ConnectionSlot {
    pub(crate) fn reusable_for(&self, proxy: Option<&Proxy>, origin: &Origin) -> bool {
        if !self.keep_alive.is_enabled() {
            return false;
        }
        if self.proxy.as_ref() != proxy {
            return false;
        }
        if &self.origin != origin {
            return false;
        }
        if self.served_requests >= self.keep_alive.max_requests() {
            return false;
        }
        if self.idle_since.elapsed() >= self.keep_alive.idle_expire() {
            return false;
        }
        true
    }

    /// record one served request and the server-advertised limits
    pub(crate) fn stamp(&mut self, timeout: Option<Duration>, max: Option<usize>) {
        self.keep_alive = self.keep_alive.apply_advertised(timeout, max);
        self.served_requests += 1;
        self.idle_since = Instant::now();
    }
}

pub(crate) fn dest_of(url: &Url) -> Option<UpstreamAddr> {
    UpstreamAddr::try_from(url).ok()
}
