/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use super::Host;
use super::host::HostParseError;

#[derive(Debug, Error)]
pub enum UpstreamAddrParseError {
    #[error("no host found")]
    NoHostFound,
    #[error("invalid host: {0}")]
    InvalidHost(#[from] HostParseError),
    #[error("invalid port")]
    InvalidPort,
    #[error("unsupported scheme")]
    UnsupportedScheme,
}

pub fn scheme_default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UpstreamAddr {
    host: Host,
    port: u16,
}

impl UpstreamAddr {
    pub fn new(host: Host, port: u16) -> Self {
        UpstreamAddr { host, port }
    }

    pub fn from_ip_and_port(ip: IpAddr, port: u16) -> Self {
        UpstreamAddr {
            host: Host::Ip(ip),
            port,
        }
    }

    pub fn from_host_str_and_port(host: &str, port: u16) -> Result<Self, HostParseError> {
        Ok(UpstreamAddr {
            host: Host::from_str(host)?,
            port,
        })
    }

    pub fn from_url_host_and_port(host: url::Host, port: u16) -> Self {
        UpstreamAddr {
            host: host.into(),
            port,
        }
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_str(&self) -> String {
        self.host.to_string()
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match &self.host {
            Host::Ip(ip) => Some(*ip),
            Host::Domain(_) => None,
        }
    }
}

impl fmt::Display for UpstreamAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Host::Ip(IpAddr::V6(ip6)) => write!(f, "[{ip6}]:{}", self.port),
            host => write!(f, "{host}:{}", self.port),
        }
    }
}

impl From<SocketAddr> for UpstreamAddr {
    fn from(addr: SocketAddr) -> Self {
        UpstreamAddr::from_ip_and_port(addr.ip(), addr.port())
    }
}

impl TryFrom<&Url> for UpstreamAddr {
    type Error = UpstreamAddrParseError;

    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        let host = url.host().ok_or(UpstreamAddrParseError::NoHostFound)?;
        let port = url
            .port()
            .or_else(|| scheme_default_port(url.scheme()))
            .ok_or(UpstreamAddrParseError::UnsupportedScheme)?;
        Ok(UpstreamAddr::from_url_host_and_port(host.to_owned(), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url() {
        let url = Url::parse("https://example.com/path").unwrap();
        let addr = UpstreamAddr::try_from(&url).unwrap();
        assert_eq!(addr.host_str(), "example.com");
        assert_eq!(addr.port(), 443);

        let url = Url::parse("http://example.com:8080/").unwrap();
        let addr = UpstreamAddr::try_from(&url).unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn display_bracketed_ip6() {
        let addr = UpstreamAddr::from_host_str_and_port("[::1]", 443).unwrap();
        assert_eq!(addr.to_string(), "[::1]:443");
        let addr = UpstreamAddr::from_host_str_and_port("example.com", 80).unwrap();
        assert_eq!(addr.to_string(), "example.com:80");
    }
}
