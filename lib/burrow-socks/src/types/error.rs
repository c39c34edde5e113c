/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::fmt;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocksNegotiationError {
    #[error("invalid version code")]
    InvalidVersion,
    #[error("invalid auth method")]
    InvalidAuthMethod,
    #[error("invalid domain string")]
    InvalidDomainString,
    #[error("invalid addr type")]
    InvalidAddrType,
}

/// Every rejection the two protocol generations can signal, kept apart so
/// callers can tell them apart.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SocksRejectReason {
    // rfc1928 reply codes
    GeneralServerFailure,
    ForbiddenByRule,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
    ConnectionTimedOut,
    Unassigned(u8),
    // socks4 reply codes 0x5B/0x5C/0x5D
    RequestRejected,
    IdentdUnreachable,
    IdentdMismatch,
}

impl fmt::Display for SocksRejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            // messages from rfc1928
            SocksRejectReason::GeneralServerFailure => "General SOCKS server failure",
            SocksRejectReason::ForbiddenByRule => "Connection not allowed by ruleset",
            SocksRejectReason::NetworkUnreachable => "Network unreachable",
            SocksRejectReason::HostUnreachable => "Host unreachable",
            SocksRejectReason::ConnectionRefused => "Connection refused",
            SocksRejectReason::TtlExpired => "TTL expired",
            SocksRejectReason::CommandNotSupported => "Command not supported",
            SocksRejectReason::AddressTypeNotSupported => "Address type not supported",
            SocksRejectReason::ConnectionTimedOut => "Connection attempt timed out",
            SocksRejectReason::Unassigned(_) => "unassigned reply code",
            SocksRejectReason::RequestRejected => "Request rejected or failed",
            SocksRejectReason::IdentdUnreachable => "Identd is not reachable",
            SocksRejectReason::IdentdMismatch => "Identd user-id mismatch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SocksReplyParseError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("invalid socks protocol: {0}")]
    InvalidProtocol(#[from] SocksNegotiationError),
}

#[derive(Debug, Error)]
pub enum SocksConnectError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("dns resolve failed: {0:?}")]
    ResolveFailed(io::Error),
    #[error("no usable ipv4 address resolved")]
    NoResolvedIpv4Addr,
    #[error("no auth method available")]
    NoAuthMethodAvailable,
    #[error("unsupported auth version")]
    UnsupportedAuthVersion,
    #[error("auth failed")]
    AuthFailed,
    #[error("invalid socks protocol: {0}")]
    InvalidProtocol(#[from] SocksNegotiationError),
    #[error("request failed: {0}")]
    RequestFailed(SocksRejectReason),
}

impl From<SocksReplyParseError> for SocksConnectError {
    fn from(e: SocksReplyParseError) -> Self {
        match e {
            SocksReplyParseError::ReadFailed(e) => SocksConnectError::ReadFailed(e),
            SocksReplyParseError::InvalidProtocol(e) => SocksConnectError::InvalidProtocol(e),
        }
    }
}
