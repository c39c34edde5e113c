/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;
use std::net::IpAddr;

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncWrite;

use burrow_io_ext::LimitedWriteExt;
use burrow_types::net::{Host, UpstreamAddr};

use super::SocksCommand;

pub struct Socks5Request;

impl Socks5Request {
    pub(crate) async fn send<W>(
        writer: &mut W,
        command: SocksCommand,
        addr: &UpstreamAddr,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_u8(0x05);
        buf.put_u8(command.code());
        buf.put_u8(0x00);
        match addr.host() {
            Host::Domain(domain) => {
                let len: u8 = domain.len() as u8;
                buf.put_u8(0x03);
                buf.put_u8(len);
                buf.put_slice(&domain.as_bytes()[0..len as usize]);
                buf.put_u16(addr.port());
            }
            Host::Ip(IpAddr::V4(ip4)) => {
                buf.put_u8(0x01);
                buf.put_slice(&ip4.octets());
                buf.put_u16(addr.port());
            }
            Host::Ip(IpAddr::V6(ip6)) => {
                buf.put_u8(0x04);
                buf.put_slice(&ip6.octets());
                buf.put_u16(addr.port());
            }
        }
        writer.write_all_flush(buf.as_ref()).await
    }
}
