/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use burrow_types::auth::{Password, Username};
use burrow_types::net::SocksAuth;

use super::{SocksAuthMethod, SocksConnectError, SocksNegotiationError};

async fn recv_method_from_remote<R>(reader: &mut R) -> Result<SocksAuthMethod, SocksConnectError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 2];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(SocksConnectError::ReadFailed)?;
    if buf[0] != 0x05 {
        return Err(SocksNegotiationError::InvalidVersion.into());
    }
    Ok(SocksAuthMethod::from(buf[1]))
}

/// the greeting offers exactly one method: user/pass when credentials are
/// set, anonymous otherwise
async fn send_method_to_remote<W>(writer: &mut W, auth: &SocksAuth) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let method = match auth {
        SocksAuth::None => 0x00,
        SocksAuth::User(_, _) => 0x02,
    };
    let msg = [0x05, 0x01, method];
    writer.write_all(&msg).await?;
    writer.flush().await
}

pub(crate) async fn send_and_recv_method<R, W>(
    reader: &mut R,
    writer: &mut W,
    auth: &SocksAuth,
) -> Result<SocksAuthMethod, SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    send_method_to_remote(writer, auth)
        .await
        .map_err(SocksConnectError::WriteFailed)?;
    recv_method_from_remote(reader).await
}

pub(crate) async fn proceed_with_user<R, W>(
    reader: &mut R,
    writer: &mut W,
    username: &Username,
    password: &Password,
) -> Result<(), SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(513);
    buf.put_u8(0x01);
    buf.put_u8(username.len());
    buf.put_slice(username.as_original().as_bytes());
    buf.put_u8(password.len());
    buf.put_slice(password.as_original().as_bytes());

    writer
        .write_all(buf.as_ref())
        .await
        .map_err(SocksConnectError::WriteFailed)?;
    writer
        .flush()
        .await
        .map_err(SocksConnectError::WriteFailed)?;

    let mut rsp = [0u8; 2];
    reader
        .read_exact(&mut rsp)
        .await
        .map_err(SocksConnectError::ReadFailed)?;
    if rsp[0] != 0x01 {
        return Err(SocksConnectError::UnsupportedAuthVersion);
    }
    if rsp[1] != 0x00 {
        Err(SocksConnectError::AuthFailed)
    } else {
        Ok(())
    }
}
