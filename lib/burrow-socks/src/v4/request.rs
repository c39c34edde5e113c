/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;
use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWrite;

use burrow_io_ext::LimitedWriteExt;
use burrow_types::net::{Host, UpstreamAddr};

use super::SocksCommand;

/// the sentinel "invalid" destination ip of a SOCKS4a request
const V4A_SENTINEL_IP: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 1);

pub struct SocksV4Request;

impl SocksV4Request {
    /// classic SOCKS4, the destination was resolved locally
    pub(crate) async fn send_resolved<W>(
        writer: &mut W,
        command: SocksCommand,
        user_id: &str,
        ip: Ipv4Addr,
        port: u16,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(16 + user_id.len());
        buf.put_u8(0x04);
        buf.put_u8(command.code());
        buf.put_u16(port);
        buf.put_slice(&ip.octets());
        buf.put_slice(user_id.as_bytes());
        buf.put_u8(0x00);
        writer.write_all_flush(buf.as_ref()).await
    }

    /// SOCKS4a, the proxy resolves the literal host appended after the
    /// user-id terminator
    pub(crate) async fn send_by_name<W>(
        writer: &mut W,
        command: SocksCommand,
        user_id: &str,
        addr: &UpstreamAddr,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match addr.host() {
            Host::Ip(std::net::IpAddr::V4(ip4)) => {
                SocksV4Request::send_resolved(writer, command, user_id, *ip4, addr.port()).await
            }
            _ => {
                let host = addr.host_str();
                let mut buf = BytesMut::with_capacity(17 + user_id.len() + host.len());
                buf.put_u8(0x04);
                buf.put_u8(command.code());
                buf.put_u16(addr.port());
                buf.put_slice(&V4A_SENTINEL_IP.octets());
                buf.put_slice(user_id.as_bytes());
                buf.put_u8(0x00);
                buf.put_slice(host.as_bytes());
                buf.put_u8(0x00);
                writer.write_all_flush(buf.as_ref()).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolved_bytes() {
        let mut buf = Vec::new();
        SocksV4Request::send_resolved(
            &mut buf,
            SocksCommand::TcpConnect,
            "bob",
            Ipv4Addr::new(10, 1, 2, 3),
            80,
        )
        .await
        .unwrap();
        assert_eq!(buf, [0x04, 0x01, 0x00, 0x50, 10, 1, 2, 3, b'b', b'o', b'b', 0x00]);
    }

    #[tokio::test]
    async fn by_name_bytes() {
        let addr = UpstreamAddr::from_host_str_and_port("example.com", 443).unwrap();
        let mut buf = Vec::new();
        SocksV4Request::send_by_name(&mut buf, SocksCommand::TcpConnect, "", &addr)
            .await
            .unwrap();
        let mut expected = vec![0x04, 0x01, 0x01, 0xBB, 0, 0, 0, 1, 0x00];
        expected.extend_from_slice(b"example.com");
        expected.push(0x00);
        assert_eq!(buf, expected);
    }
}
