/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::time::Duration;

use bytes::Bytes;
use futures_util::FutureExt;
use http::{HeaderMap, Method};
use tokio::io::{AsyncReadExt, BufReader};
use tokio::time::Instant;
use url::Url;

use burrow_http::HttpBodyReader;
use burrow_http::body::{ContentEncoding, decode_content};
use burrow_http::client::HttpResponseHead;
use burrow_io_ext::{LimitedBufReadExt, LimitedWriteExt};
use burrow_types::net::{Proxy, UpstreamAddr};

use crate::debug::log_msg;
use crate::error::{ReceiveError, SendError};
use crate::response::ResponseDiagnostics;
use crate::{HttpClientConfig, HttpClientError, Request, Response};

mod framer;
use framer::{FramerEnv, assemble_request_head};

mod slot;
use slot::{ConnectionSlot, Origin, dest_of, origin_of};

const CLOSE_WAIT_TIMEOUT: Duration = Duration::from_secs(4);

/// The one-shot send façade. Owns at most one live connection between
/// requests and decides per send whether to reuse or rebuild it.
pub struct HttpClient {
    config: HttpClientConfig,
    slot: Option<ConnectionSlot>,
}

impl HttpClient {
    pub fn new(mut config: HttpClientConfig) -> Self {
        config.check();
        HttpClient { config, slot: None }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Drop the live connection, if any.
    pub fn dispose(&mut self) {
        self.slot = None;
    }

    /// Send one request, following redirects per policy. The request's
    /// content source is consumed by the exchange, success or not.
    pub async fn send(&mut self, request: &mut Request) -> Result<Response, HttpClientError> {
        let result = self.send_following_redirects(request).await;
        request.content = None;
        request.temporary_headers.clear();
        result
    }

    async fn send_following_redirects(
        &mut self,
        request: &mut Request,
    ) -> Result<Response, HttpClientError> {
        let max_redirects = request
            .options
            .max_redirects
            .unwrap_or(self.config.max_redirects);
        let mut middle_headers: Option<HeaderMap> = request
            .options
            .enable_middle_headers
            .then(HeaderMap::new);
        let mut redirect_count = 0usize;

        loop {
            let mut rsp = self.send_once(request).await?;

            if !(request.options.allow_auto_redirect() && rsp.has_redirect()) {
                rsp.middle_headers = middle_headers;
                if !request.options.ignore_protocol_errors && rsp.status >= 400 {
                    return Err(HttpClientError::ProtocolStatus(rsp.status));
                }
                return Ok(rsp);
            }

            redirect_count += 1;
            if redirect_count > max_redirects {
                return Err(HttpClientError::RedirectLimitExceeded(max_redirects));
            }

            let Some(location) = rsp.redirect_location().map(str::to_string) else {
                // a 3xx without any location is surfaced as-is
                rsp.middle_headers = middle_headers;
                return Ok(rsp);
            };
            let next = match Url::parse(&location) {
                Ok(absolute) => absolute,
                Err(_) => request
                    .uri
                    .join(&location)
                    .map_err(|_| HttpClientError::InvalidRedirectLocation(location.clone()))?,
            };
            match next.scheme() {
                "http" | "https" => {}
                _ => {
                    // an external redirect is handed back untouched
                    rsp.middle_headers = middle_headers;
                    return Ok(rsp);
                }
            }

            if let Some(middle) = middle_headers.as_mut() {
                for (name, value) in rsp.headers.iter() {
                    middle.insert(name.clone(), value.clone());
                }
            }

            let host_changed = next.host_str() != request.uri.host_str();
            if rsp.status != 307 && rsp.status != 308 {
                request.method = Method::GET;
                request.content = None;
            }
            if host_changed {
                request.headers.remove(http::header::ORIGIN);
            }
            if !(request.options.keep_temporary_headers_on_redirect && !host_changed) {
                request.temporary_headers.clear();
            }

            log_msg!("following redirect {} -> {}", request.uri, next);
            request.uri = next;
        }
    }

    /// One request/response exchange, redone through the fail-reconnect
    /// loop on send/receive io failures when enabled.
    async fn send_once(&mut self, request: &mut Request) -> Result<Response, HttpClientError> {
        let mut reconnect_count = 0u32;
        loop {
            match self.send_on_connection(request).await {
                Ok(mut rsp) => {
                    rsp.diagnostics.reconnect_count = reconnect_count;
                    return Ok(rsp);
                }
                Err(e)
                    if self.config.reconnect
                        && reconnect_count < self.config.reconnect_limit
                        && e.is_retryable_io() =>
                {
                    log_msg!("request failed ({e}), reconnecting");
                    self.slot = None;
                    tokio::time::sleep(self.config.reconnect_delay).await;
                    reconnect_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_on_connection(
        &mut self,
        request: &mut Request,
    ) -> Result<Response, HttpClientError> {
        let use_tls = request.uri.scheme() == "https";
        let dest = dest_of(&request.uri)
            .ok_or_else(|| HttpClientError::InvalidInput("unresolvable request uri".to_string()))?;
        let origin = origin_of(&request.uri)
            .ok_or_else(|| HttpClientError::InvalidInput("unresolvable request uri".to_string()))?;

        let mut proxy = request
            .options
            .proxy
            .clone()
            .or_else(|| self.config.proxy.clone());
        if proxy.is_some() && self.config.bypass_proxy_for_loopback && dest.host().is_loopback() {
            log_msg!("bypassing proxy for loopback destination {}", dest);
            proxy = None;
        }

        let (mut slot, reused) = match self.take_reusable_slot(proxy.as_ref(), &origin) {
            Some(slot) => (slot, true),
            None => (
                self.build_slot(request, proxy.clone(), &dest, use_tls, origin.clone())
                    .await?,
                false,
            ),
        };
        if reused {
            log_msg!("reusing connection to {} ({} served)", dest, slot.served_requests);
        }

        match self.exchange(&mut slot, request).await {
            Ok((rsp, advertised)) => self.finish_exchange(slot, rsp, advertised).await,
            Err(HttpClientError::Receive(ReceiveError::RemoteClosed)) if reused => {
                // the server dropped the idle connection under us; retry the
                // same request on a fresh one, exactly once and invisibly
                log_msg!("idle connection to {} was closed, reopening", dest);
                drop(slot);
                let mut fresh = self
                    .build_slot(request, proxy, &dest, use_tls, origin)
                    .await?;
                match self.exchange(&mut fresh, request).await {
                    Ok((rsp, advertised)) => self.finish_exchange(fresh, rsp, advertised).await,
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn take_reusable_slot(
        &mut self,
        proxy: Option<&Proxy>,
        origin: &Origin,
    ) -> Option<ConnectionSlot> {
        let slot = self.slot.take()?;
        if !slot.reusable_for(proxy, origin) {
            return None;
        }
        let mut slot = slot;
        // a peer that already closed shows instant EOF; anything readable
        // before we sent a request also disqualifies the connection
        match slot.reader.fill_wait_data().now_or_never() {
            None => Some(slot),
            Some(_) => None,
        }
    }

    async fn build_slot(
        &self,
        request: &Request,
        proxy: Option<Proxy>,
        dest: &UpstreamAddr,
        use_tls: bool,
        origin: Origin,
    ) -> Result<ConnectionSlot, HttpClientError> {
        let established = crate::connect::establish(
            dest,
            use_tls,
            proxy.as_ref(),
            request.options.tls.as_ref(),
            &self.config,
            &request.options,
        )
        .await?;
        Ok(ConnectionSlot {
            reader: BufReader::with_capacity(self.config.recv_buffer_size, established.reader),
            writer: established.writer,
            tls: established.tls,
            forward_mode: established.forward_mode,
            proxy,
            origin,
            idle_since: Instant::now(),
            served_requests: 0,
            keep_alive: self.config.keep_alive,
        })
    }

    async fn finish_exchange(
        &mut self,
        mut slot: ConnectionSlot,
        rsp: Response,
        advertised: (Option<Duration>, Option<usize>),
    ) -> Result<Response, HttpClientError> {
        if rsp.keep_alive {
            slot.stamp(advertised.0, advertised.1);
            self.slot = Some(slot);
        } else {
            use tokio::io::AsyncWriteExt;
            let _ = tokio::time::timeout(CLOSE_WAIT_TIMEOUT, slot.writer.shutdown()).await;
        }
        Ok(rsp)
    }

    async fn exchange(
        &self,
        slot: &mut ConnectionSlot,
        request: &mut Request,
    ) -> Result<(Response, (Option<Duration>, Option<usize>)), HttpClientError> {
        let jar = request.effective_jar(&self.config);
        let rw_timeout = request
            .options
            .read_write_timeout
            .unwrap_or(self.config.read_write_timeout);

        let content_meta = match (&request.content, request.method_has_body()) {
            (Some(content), true) => {
                let length = content
                    .content_length()
                    .await
                    .map_err(|e| HttpClientError::Send(SendError::WriteFailed(e)))?;
                Some((content.content_type(), length))
            }
            _ => None,
        };
        // a body of unknown length is delimited by connection close
        let unsized_body = content_meta.as_ref().is_some_and(|(_, l)| l.is_none());
        let keep_alive_policy = self.config.keep_alive.is_enabled() && !unsized_body;

        let env = FramerEnv {
            forward_proxy: match (&slot.proxy, slot.forward_mode) {
                (Some(Proxy::Http(p)), true) => Some(p),
                _ => None,
            },
            keep_alive: keep_alive_policy,
            http_version: self.config.http_version,
            locale: &self.config.locale,
            charset: &self.config.charset,
        };
        let head = assemble_request_head(request, content_meta.as_ref(), jar.as_deref(), &env);

        let body_len = content_meta.as_ref().and_then(|(_, l)| *l);
        let upload_total = head.len() as u64 + body_len.unwrap_or(0);

        match tokio::time::timeout(rw_timeout, slot.writer.write_all_flush(&head)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(SendError::WriteFailed(e).into()),
            Err(_) => return Err(SendError::TimedOut.into()),
        }
        if let Some(on_progress) = &request.options.upload_progress {
            on_progress(head.len() as u64, upload_total);
        }

        let write_body = content_meta
            .as_ref()
            .is_some_and(|(_, l)| l.is_none_or(|n| n > 0));
        if write_body {
            let head_len = head.len() as u64;
            let on_progress = request.options.upload_progress.clone();
            let mut on_write = move |body_written: u64| {
                if let Some(on_progress) = &on_progress {
                    on_progress(head_len + body_written, upload_total);
                }
            };
            let content = request
                .content
                .as_mut()
                .ok_or_else(|| HttpClientError::InvalidInput("missing content source".into()))?;
            match tokio::time::timeout(
                rw_timeout,
                content.write_to(&mut slot.writer, self.config.send_buffer_size, &mut on_write),
            )
            .await
            {
                Ok(Ok(_written)) => {}
                Ok(Err(e)) => return Err(SendError::WriteFailed(e).into()),
                Err(_) => return Err(SendError::TimedOut.into()),
            }
        }

        let head_rsp = match tokio::time::timeout(
            rw_timeout,
            HttpResponseHead::parse(
                &mut slot.reader,
                &request.method,
                keep_alive_policy,
                self.config.max_header_size,
            ),
        )
        .await
        {
            Ok(Ok(head_rsp)) => head_rsp,
            Ok(Err(e)) => return Err(HttpClientError::Receive(e.into())),
            Err(_) => return Err(ReceiveError::TimedOut.into()),
        };

        // jar mutations follow header arrival order
        if request.options.use_cookies() {
            if let Some(jar) = &jar {
                for value in head_rsp.headers.get_all(http::header::SET_COOKIE) {
                    if let Ok(raw) = value.to_str() {
                        jar.set(&request.uri, raw)?;
                    }
                }
            }
        }

        let encoding = head_rsp
            .content_encoding()
            .map_err(|e| HttpClientError::Receive(ReceiveError::InvalidEncoding(e)))?;

        let wire_body = match head_rsp.body_type(&request.method) {
            Some(body_type) => {
                self.read_body(slot, request, body_type, head_rsp.origin_header_size(), rw_timeout)
                    .await?
            }
            None => Vec::new(),
        };

        let body = if wire_body.is_empty() || encoding == ContentEncoding::Identity {
            wire_body
        } else {
            decode_content(encoding, &wire_body)
                .map_err(|e| HttpClientError::Receive(ReceiveError::ReadFailed(e)))?
        };

        let advertised = head_rsp.advertised_keep_alive();
        let keep_alive = keep_alive_policy && head_rsp.keep_alive();

        let rsp = Response {
            status: head_rsp.code,
            version: head_rsp.version,
            headers: head_rsp.headers,
            middle_headers: None,
            body: Bytes::from(body),
            diagnostics: ResponseDiagnostics {
                negotiated_cipher: slot.tls.as_ref().and_then(|t| t.cipher.clone()),
                tls_protocol: slot.tls.as_ref().and_then(|t| t.protocol.clone()),
                peer_cert_der: slot.tls.as_ref().and_then(|t| t.peer_cert_der.clone()),
                reconnect_count: 0,
            },
            keep_alive,
        };
        Ok((rsp, advertised))
    }

    async fn read_body(
        &self,
        slot: &mut ConnectionSlot,
        request: &Request,
        body_type: burrow_http::HttpBodyType,
        header_size: usize,
        rw_timeout: Duration,
    ) -> Result<Vec<u8>, HttpClientError> {
        let download_total: i64 = match body_type {
            burrow_http::HttpBodyType::ContentLength(n) => header_size as i64 + n as i64,
            _ => -1,
        };
        let on_progress = request.options.download_progress.clone();

        let mut body_reader =
            HttpBodyReader::new(&mut slot.reader, body_type, self.config.body_line_max_size);
        let mut body = Vec::new();
        let mut chunk = vec![0u8; self.config.recv_buffer_size];
        loop {
            let nr = match tokio::time::timeout(rw_timeout, body_reader.read(&mut chunk)).await {
                Ok(Ok(nr)) => nr,
                Ok(Err(e)) => {
                    return Err(HttpClientError::Receive(ReceiveError::ReadFailed(e)));
                }
                Err(_) => return Err(ReceiveError::TimedOut.into()),
            };
            if nr == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..nr]);
            if let Some(on_progress) = &on_progress {
                on_progress(header_size as u64 + body.len() as u64, download_total);
            }
        }
        Ok(body)
    }
}
