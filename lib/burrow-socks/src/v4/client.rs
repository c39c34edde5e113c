/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::net::{IpAddr, Ipv4Addr};

use tokio::io::{AsyncRead, AsyncWrite};

use burrow_types::net::{Host, UpstreamAddr};

use super::{SocksCommand, SocksConnectError, SocksV4Reply, SocksV4Request};

/// Establish a TCP tunnel through a SOCKS4 or SOCKS4a proxy.
///
/// With `resolve_locally` the destination host is resolved here through the
/// system resolver and sent as an IPv4 address (classic SOCKS4); otherwise
/// the literal host name travels in the request (SOCKS4a).
pub async fn socks4_connect_to<R, W>(
    reader: &mut R,
    writer: &mut W,
    user_id: &str,
    addr: &UpstreamAddr,
    resolve_locally: bool,
) -> Result<(), SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if resolve_locally {
        let ip4 = resolve_to_ipv4(addr).await?;
        SocksV4Request::send_resolved(
            writer,
            SocksCommand::TcpConnect,
            user_id,
            ip4,
            addr.port(),
        )
        .await
        .map_err(SocksConnectError::WriteFailed)?;
    } else {
        SocksV4Request::send_by_name(writer, SocksCommand::TcpConnect, user_id, addr)
            .await
            .map_err(SocksConnectError::WriteFailed)?;
    }

    let rsp = SocksV4Reply::recv(reader).await?;
    match rsp {
        SocksV4Reply::RequestGranted => Ok(()),
        SocksV4Reply::Rejected(reason) => Err(SocksConnectError::RequestFailed(reason)),
    }
}

async fn resolve_to_ipv4(addr: &UpstreamAddr) -> Result<Ipv4Addr, SocksConnectError> {
    match addr.host() {
        Host::Ip(IpAddr::V4(ip4)) => Ok(*ip4),
        Host::Ip(IpAddr::V6(_)) => Err(SocksConnectError::NoResolvedIpv4Addr),
        Host::Domain(domain) => {
            let addrs = tokio::net::lookup_host((domain.as_str(), addr.port()))
                .await
                .map_err(SocksConnectError::ResolveFailed)?;
            for resolved in addrs {
                if let IpAddr::V4(ip4) = resolved.ip() {
                    return Ok(ip4);
                }
            }
            Err(SocksConnectError::NoResolvedIpv4Addr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SocksRejectReason;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn socks4a_granted() {
        let (client, mut server) = tokio::io::duplex(512);
        let (mut r, mut w) = tokio::io::split(client);

        let addr = UpstreamAddr::from_host_str_and_port("example.com", 80).unwrap();
        let connect =
            tokio::spawn(
                async move { socks4_connect_to(&mut r, &mut w, "", &addr, false).await },
            );

        let mut request = vec![0u8; 64];
        let nr = server.read(&mut request).await.unwrap();
        let mut expected = vec![0x04, 0x01, 0x00, 0x50, 0, 0, 0, 1, 0x00];
        expected.extend_from_slice(b"example.com");
        expected.push(0x00);
        assert_eq!(&request[..nr], expected);

        server
            .write_all(&[0x00, 0x5A, 0, 0, 0, 0, 0, 0])
            .await
            .unwrap();

        connect.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn socks4_rejected() {
        let (client, mut server) = tokio::io::duplex(512);
        let (mut r, mut w) = tokio::io::split(client);

        let addr = UpstreamAddr::from_host_str_and_port("10.0.0.9", 80).unwrap();
        let connect =
            tokio::spawn(async move { socks4_connect_to(&mut r, &mut w, "", &addr, true).await });

        let mut request = vec![0u8; 64];
        let nr = server.read(&mut request).await.unwrap();
        assert_eq!(&request[..nr], [0x04, 0x01, 0x00, 0x50, 10, 0, 0, 9, 0x00]);

        server
            .write_all(&[0x00, 0x5B, 0, 0, 0, 0, 0, 0])
            .await
            .unwrap();

        let err = connect.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            SocksConnectError::RequestFailed(SocksRejectReason::RequestRejected)
        ));
    }
}
