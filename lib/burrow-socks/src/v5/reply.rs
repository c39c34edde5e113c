/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{SocksNegotiationError, SocksRejectReason, SocksReplyParseError};

pub enum Socks5Reply {
    Succeeded(Option<SocketAddr>),
    Rejected(SocksRejectReason),
}

impl Socks5Reply {
    fn new(code: u8, addr: Option<SocketAddr>) -> Self {
        match code {
            0x00 => Socks5Reply::Succeeded(addr),
            0x01 => Socks5Reply::Rejected(SocksRejectReason::GeneralServerFailure),
            0x02 => Socks5Reply::Rejected(SocksRejectReason::ForbiddenByRule),
            0x03 => Socks5Reply::Rejected(SocksRejectReason::NetworkUnreachable),
            0x04 => Socks5Reply::Rejected(SocksRejectReason::HostUnreachable),
            0x05 => Socks5Reply::Rejected(SocksRejectReason::ConnectionRefused),
            0x06 => Socks5Reply::Rejected(SocksRejectReason::TtlExpired),
            0x07 => Socks5Reply::Rejected(SocksRejectReason::CommandNotSupported),
            0x08 => Socks5Reply::Rejected(SocksRejectReason::AddressTypeNotSupported),
            0x09 => Socks5Reply::Rejected(SocksRejectReason::ConnectionTimedOut),
            n => Socks5Reply::Rejected(SocksRejectReason::Unassigned(n)),
        }
    }

    /// Read one reply, draining exactly the bytes its address type
    /// advertises.
    pub(crate) async fn recv<R>(reader: &mut R) -> Result<Self, SocksReplyParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await?;
        let version = buf[0];
        if version != 0x05 {
            return Err(SocksNegotiationError::InvalidVersion.into());
        }

        let code = buf[1];

        let _rsv = buf[2];

        let addr = match buf[3] {
            0x01 => {
                let mut left_bytes = [0u8; 6];
                reader.read_exact(&mut left_bytes).await?;
                let ip_bytes: [u8; 4] = left_bytes[0..4].try_into().unwrap();
                let port = u16::from_be_bytes(left_bytes[4..6].try_into().unwrap());
                Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::from(ip_bytes)), port))
            }
            0x03 => {
                let len = reader.read_u8().await?;
                let mut domain = vec![0u8; len as usize + 2];
                reader.read_exact(&mut domain).await?;
                // a bound domain name has no socket address to report
                None
            }
            0x04 => {
                let mut left_bytes: [u8; 18] = [0; 18];
                reader.read_exact(&mut left_bytes).await?;
                let ip_bytes: [u8; 16] = left_bytes[0..16].try_into().unwrap();
                let port = u16::from_be_bytes(left_bytes[16..18].try_into().unwrap());
                Some(SocketAddr::new(IpAddr::V6(Ipv6Addr::from(ip_bytes)), port))
            }
            _ => return Err(SocksNegotiationError::InvalidAddrType.into()),
        };

        Ok(Socks5Reply::new(code, addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeeded_ipv4() {
        let bytes: [u8; 10] = [0x05, 0x00, 0x00, 0x01, 127, 0, 0, 1, 0x1F, 0x90];
        let rsp = Socks5Reply::recv(&mut bytes.as_slice()).await.unwrap();
        let Socks5Reply::Succeeded(Some(addr)) = rsp else {
            panic!("expected success");
        };
        assert_eq!(addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[tokio::test]
    async fn succeeded_domain_drains_exactly() {
        let mut bytes = vec![0x05, 0x00, 0x00, 0x03, 0x04];
        bytes.extend_from_slice(b"gway");
        bytes.extend_from_slice(&[0x00, 0x50]);
        bytes.extend_from_slice(b"rest"); // tunneled payload after the reply
        let mut cursor = bytes.as_slice();
        let rsp = Socks5Reply::recv(&mut cursor).await.unwrap();
        assert!(matches!(rsp, Socks5Reply::Succeeded(None)));
        assert_eq!(cursor, b"rest");
    }

    #[tokio::test]
    async fn refused() {
        let bytes: [u8; 10] = [0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
        let rsp = Socks5Reply::recv(&mut bytes.as_slice()).await.unwrap();
        let Socks5Reply::Rejected(reason) = rsp else {
            panic!("expected rejection");
        };
        assert_eq!(reason, SocksRejectReason::ConnectionRefused);
    }
}
