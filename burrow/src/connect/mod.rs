/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::net::SocketAddr;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio_openssl::SslStream;

use burrow_azadi::client::azadi_connect_to;
use burrow_http::connect::client::http_connect_to;
use burrow_io_ext::AggregatedIo;
use burrow_socks::v4::client::socks4_connect_to;
use burrow_socks::v5::client::socks5_connect_to;
use burrow_types::net::{
    Host, HttpProxy, OpensslClientConfig, OpensslClientConfigBuilder, Proxy, UpstreamAddr,
};

use crate::error::{ConnectError, ProxyError};
use crate::request::RequestOptions;
use crate::{HttpClientConfig, HttpClientError};

pub(crate) type BoxStreamReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxStreamWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Clone, Default)]
pub(crate) struct TlsInfo {
    pub(crate) cipher: Option<String>,
    pub(crate) protocol: Option<String>,
    pub(crate) peer_cert_der: Option<Vec<u8>>,
}

pub(crate) struct EstablishedStream {
    pub(crate) reader: BoxStreamReader,
    pub(crate) writer: BoxStreamWriter,
    pub(crate) tls: Option<TlsInfo>,
    /// the request line carries the absolute uri and hop headers use
    /// `Proxy-*` names when forwarding through an http proxy untunneled
    pub(crate) forward_mode: bool,
}

/// Build the tunneled (and possibly TLS-wrapped) stream for one origin.
pub(crate) async fn establish(
    dest: &UpstreamAddr,
    use_tls: bool,
    proxy: Option<&Proxy>,
    tls_override: Option<&OpensslClientConfigBuilder>,
    config: &HttpClientConfig,
    options: &RequestOptions,
) -> Result<EstablishedStream, HttpClientError> {
    if options.is_cancelled() {
        return Err(ConnectError::Cancelled.into());
    }

    let peer = proxy.map(|p| p.peer()).unwrap_or(dest);
    let connect_timeout = options.connect_timeout.unwrap_or(config.connect_timeout);

    let handshake = async {
        let stream = tcp_connect_to(peer).await?;
        proxy_handshake(stream, proxy, dest, use_tls).await
    };
    let (reader, writer, forward_mode) = match tokio::time::timeout(connect_timeout, handshake)
        .await
    {
        Ok(result) => result?,
        Err(_) => return Err(ConnectError::TimedOut.into()),
    };

    if !use_tls {
        return Ok(EstablishedStream {
            reader,
            writer,
            tls: None,
            forward_mode,
        });
    }

    if options.is_cancelled() {
        return Err(ConnectError::Cancelled.into());
    }
    let builder = tls_override.unwrap_or(&config.tls);
    let tls_config = builder
        .build()
        .map_err(|e| ConnectError::SslHandshakeFailed(e.to_string()))?;
    let (tls_stream, info) = tls_handshake_over(
        &tls_config,
        dest.host(),
        dest.port(),
        AggregatedIo::new(reader, writer),
    )
    .await?;
    let (r, w) = tokio::io::split(tls_stream);
    Ok(EstablishedStream {
        reader: Box::new(r),
        writer: Box::new(w),
        tls: Some(info),
        forward_mode,
    })
}

async fn tcp_connect_to(peer: &UpstreamAddr) -> Result<TcpStream, HttpClientError> {
    let addr = resolve_peer(peer).await?;
    TcpStream::connect(addr)
        .await
        .map_err(|e| ConnectError::ConnectFailed(e).into())
}

async fn resolve_peer(peer: &UpstreamAddr) -> Result<SocketAddr, HttpClientError> {
    match peer.host() {
        Host::Ip(ip) => Ok(SocketAddr::new(*ip, peer.port())),
        Host::Domain(domain) => {
            let mut addrs = tokio::net::lookup_host((domain.as_str(), peer.port()))
                .await
                .map_err(|e| HttpClientError::from(ConnectError::ResolveFailed(e)))?;
            addrs
                .next()
                .ok_or_else(|| ConnectError::NoResolvedAddress.into())
        }
    }
}

async fn proxy_handshake(
    stream: TcpStream,
    proxy: Option<&Proxy>,
    dest: &UpstreamAddr,
    use_tls: bool,
) -> Result<(BoxStreamReader, BoxStreamWriter, bool), HttpClientError> {
    match proxy {
        None => {
            let (r, w) = stream.into_split();
            Ok((Box::new(r), Box::new(w), false))
        }
        Some(Proxy::Http(http_proxy)) => {
            if let Some(tls_builder) = &http_proxy.tls_config {
                let tls_config = tls_builder
                    .build()
                    .map_err(|e| ConnectError::SslHandshakeFailed(e.to_string()))?;
                let (tls_stream, _) = tls_handshake_over(
                    &tls_config,
                    http_proxy.peer().host(),
                    http_proxy.peer().port(),
                    stream,
                )
                .await?;
                let (r, w) = tokio::io::split(tls_stream);
                http_proxy_setup(Box::new(r), Box::new(w), http_proxy, dest, use_tls).await
            } else {
                let (r, w) = stream.into_split();
                http_proxy_setup(Box::new(r), Box::new(w), http_proxy, dest, use_tls).await
            }
        }
        Some(Proxy::Socks4(socks4_proxy)) => {
            let (mut r, mut w) = stream.into_split();
            socks4_connect_to(
                &mut r,
                &mut w,
                socks4_proxy.user_id(),
                dest,
                socks4_proxy.resolve_locally(),
            )
            .await
            .map_err(ProxyError::Socks)?;
            Ok((Box::new(r), Box::new(w), false))
        }
        Some(Proxy::Socks5(socks5_proxy)) => {
            let (mut r, mut w) = stream.into_split();
            socks5_connect_to(&mut r, &mut w, &socks5_proxy.auth, dest)
                .await
                .map_err(ProxyError::Socks)?;
            Ok((Box::new(r), Box::new(w), false))
        }
        Some(Proxy::Azadi(azadi_proxy)) => {
            let (mut r, mut w) = stream.into_split();
            azadi_connect_to(
                &mut r,
                &mut w,
                azadi_proxy.secret(),
                &azadi_proxy.auth,
                dest,
            )
            .await
            .map_err(ProxyError::Azadi)?;
            Ok((Box::new(r), Box::new(w), false))
        }
    }
}

async fn http_proxy_setup(
    reader: BoxStreamReader,
    mut writer: BoxStreamWriter,
    proxy: &HttpProxy,
    dest: &UpstreamAddr,
    use_tls: bool,
) -> Result<(BoxStreamReader, BoxStreamWriter, bool), HttpClientError> {
    if !use_tls && dest.port() == 80 {
        // plain port-80 requests are forwarded without a tunnel
        return Ok((reader, writer, true));
    }

    let mut buf_r = BufReader::new(reader);
    http_connect_to(&mut buf_r, &mut writer, &proxy.auth, dest)
        .await
        .map_err(ProxyError::HttpConnect)?;
    Ok((Box::new(buf_r), writer, false))
}

async fn tls_handshake_over<S>(
    tls_config: &OpensslClientConfig,
    tls_name: &Host,
    port: u16,
    stream: S,
) -> Result<(SslStream<S>, TlsInfo), HttpClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ssl = tls_config
        .build_ssl(tls_name, port)
        .map_err(|e| ConnectError::SslHandshakeFailed(e.to_string()))?;
    let mut tls_stream = SslStream::new(ssl, stream)
        .map_err(|e| ConnectError::SslHandshakeFailed(e.to_string()))?;
    match tokio::time::timeout(
        tls_config.handshake_timeout,
        Pin::new(&mut tls_stream).connect(),
    )
    .await
    {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(ConnectError::SslHandshakeFailed(format!(
                "tls connect to {tls_name} failed: {e}"
            ))
            .into());
        }
        Err(_) => {
            return Err(ConnectError::SslHandshakeFailed(format!(
                "tls connect to {tls_name} timed out"
            ))
            .into());
        }
    }

    let ssl_ref = tls_stream.ssl();
    let info = TlsInfo {
        cipher: ssl_ref.current_cipher().map(|c| c.name().to_string()),
        protocol: Some(ssl_ref.version_str().to_string()),
        peer_cert_der: ssl_ref.peer_certificate().and_then(|c| c.to_der().ok()),
    };
    Ok((tls_stream, info))
}
