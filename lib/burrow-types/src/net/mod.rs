/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod host;
mod http;
mod openssl;
mod proxy;
mod socks;
mod upstream;

pub use host::{Host, HostParseError};
pub use http::{HttpAuth, HttpBasicAuth, HttpKeepAliveConfig};
pub use openssl::{OpensslClientConfig, OpensslClientConfigBuilder, OpensslProtocol};
pub use proxy::{
    AzadiProxy, HttpProxy, Proxy, ProxyKind, ProxyParseError, Socks4Proxy, Socks5Proxy,
};
pub use socks::SocksAuth;
pub use upstream::{UpstreamAddr, UpstreamAddrParseError, scheme_default_port};
