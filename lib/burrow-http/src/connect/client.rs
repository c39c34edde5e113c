/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use tokio::io::{AsyncBufRead, AsyncWrite};

use burrow_types::net::{HttpAuth, UpstreamAddr};

use super::{HttpConnectError, HttpConnectRequest, HttpConnectResponse};

pub async fn http_connect_to<R, W>(
    reader: &mut R,
    writer: &mut W,
    auth: &HttpAuth,
    addr: &UpstreamAddr,
) -> Result<(), HttpConnectError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut req = HttpConnectRequest::new(addr);

    match auth {
        HttpAuth::None => {}
        HttpAuth::Basic(a) => {
            let line = crate::header::proxy_authorization_basic(&a.username, &a.password);
            req.append_dyn_header(line);
        }
    }

    req.send(writer)
        .await
        .map_err(HttpConnectError::WriteFailed)?;

    let _ = HttpConnectResponse::recv(reader, 2048).await?;

    Ok(())
}
