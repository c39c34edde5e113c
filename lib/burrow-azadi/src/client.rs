/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use burrow_io_ext::LimitedWriteExt;
use burrow_types::codec::encode_str_array;
use burrow_types::net::{SocksAuth, UpstreamAddr};

use super::{AzadiConnectError, TAG_LEN, derive_key_nonce, open_frame, seal_frame};

/// the reply plaintext is one little-endian status word
const REPLY_FRAME_LEN: usize = TAG_LEN + 4;

const STATUS_SUCCESS: u32 = 1;
const STATUS_LOGIN: u32 = 2;
const STATUS_HOST: u32 = 3;
const STATUS_REMOTE: u32 = 4;

/// Establish a TCP tunnel through an Azadi proxy.
///
/// The request plaintext is `[host, port]`, or `[user, pass, host, port]`
/// when credentials are configured.
pub async fn azadi_connect_to<R, W>(
    reader: &mut R,
    writer: &mut W,
    secret: &str,
    auth: &SocksAuth,
    addr: &UpstreamAddr,
) -> Result<(), AzadiConnectError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (key, nonce) = derive_key_nonce(secret);

    let host = addr.host_str();
    let port = addr.port().to_string();
    let plaintext = match auth {
        SocksAuth::None => encode_str_array(&[host.as_str(), port.as_str()]),
        SocksAuth::User(username, password) => encode_str_array(&[
            username.as_original(),
            password.as_original(),
            host.as_str(),
            port.as_str(),
        ]),
    };

    let frame = seal_frame(&key, &nonce, &plaintext).ok_or(AzadiConnectError::SealFailed)?;
    writer
        .write_all_flush(&frame)
        .await
        .map_err(AzadiConnectError::WriteFailed)?;

    let mut reply = [0u8; REPLY_FRAME_LEN];
    reader
        .read_exact(&mut reply)
        .await
        .map_err(AzadiConnectError::ReadFailed)?;

    let plain = open_frame(&key, &nonce, &reply).ok_or(AzadiConnectError::OpenFailed)?;
    let status: [u8; 4] = plain
        .as_slice()
        .try_into()
        .map_err(|_| AzadiConnectError::InvalidReply)?;
    match u32::from_le_bytes(status) {
        STATUS_SUCCESS => Ok(()),
        STATUS_LOGIN => Err(AzadiConnectError::Login),
        STATUS_HOST => Err(AzadiConnectError::Host),
        STATUS_REMOTE => Err(AzadiConnectError::Remote),
        n => Err(AzadiConnectError::Unknown(n)),
    }
}
