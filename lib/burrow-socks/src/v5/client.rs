/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use tokio::io::{AsyncRead, AsyncWrite};

use burrow_types::net::{SocksAuth, UpstreamAddr};

use super::{
    Socks5Reply, Socks5Request, SocksAuthMethod, SocksCommand, SocksConnectError, auth,
};

/// Establish a TCP tunnel through a SOCKS5 proxy, negotiating user/password
/// auth when credentials are configured.
pub async fn socks5_connect_to<R, W>(
    reader: &mut R,
    writer: &mut W,
    auth: &SocksAuth,
    addr: &UpstreamAddr,
) -> Result<(), SocksConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let method = auth::send_and_recv_method(reader, writer, auth).await?;
    match method {
        SocksAuthMethod::None => {}
        SocksAuthMethod::User => match auth {
            SocksAuth::User(username, password) => {
                auth::proceed_with_user(reader, writer, username, password).await?;
            }
            SocksAuth::None => return Err(SocksConnectError::NoAuthMethodAvailable),
        },
        _ => return Err(SocksConnectError::NoAuthMethodAvailable),
    }

    Socks5Request::send(writer, SocksCommand::TcpConnect, addr)
        .await
        .map_err(SocksConnectError::WriteFailed)?;

    let rsp = Socks5Reply::recv(reader).await?;
    match rsp {
        Socks5Reply::Succeeded(_) => Ok(()),
        Socks5Reply::Rejected(reason) => Err(SocksConnectError::RequestFailed(reason)),
    }
}
