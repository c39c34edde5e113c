/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::str::FromStr;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use tokio::io::AsyncBufRead;

use burrow_io_ext::LimitedBufReadExt;

use super::HttpResponseParseError;
use crate::body::{ContentEncoding, UnsupportedContentEncoding};
use crate::header::parse_keep_alive_value;
use crate::{HttpBodyType, HttpHeaderLine, HttpLineParseError, HttpStatusLine};

#[derive(Debug)]
pub struct HttpResponseHead {
    pub version: Version,
    pub code: u16,
    pub reason: String,
    pub headers: HeaderMap,
    origin_header_size: usize,
    keep_alive: bool,
    advertised_keep_alive_timeout: Option<Duration>,
    advertised_keep_alive_max: Option<usize>,
    content_length: u64,
    chunked_transfer: bool,
    has_transfer_encoding: bool,
    has_content_length: bool,
    content_encoding: Option<String>,
}

impl HttpResponseHead {
    fn new(version: Version, code: u16, reason: String) -> Self {
        HttpResponseHead {
            version,
            code,
            reason,
            headers: HeaderMap::new(),
            origin_header_size: 0,
            keep_alive: false,
            advertised_keep_alive_timeout: None,
            advertised_keep_alive_max: None,
            content_length: 0,
            chunked_transfer: false,
            has_transfer_encoding: false,
            has_content_length: false,
            content_encoding: None,
        }
    }

    pub fn origin_header_size(&self) -> usize {
        self.origin_header_size
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// limits advertised through `Keep-Alive: timeout=, max=`
    pub fn advertised_keep_alive(&self) -> (Option<Duration>, Option<usize>) {
        (
            self.advertised_keep_alive_timeout,
            self.advertised_keep_alive_max,
        )
    }

    pub fn content_encoding(&self) -> Result<ContentEncoding, UnsupportedContentEncoding> {
        match &self.content_encoding {
            Some(v) => ContentEncoding::from_str(v),
            None => Ok(ContentEncoding::Identity),
        }
    }

    fn expect_no_body(&self, method: &Method) -> bool {
        self.code < 200 || self.code == 204 || self.code == 304 || method.eq(&Method::HEAD)
    }

    pub fn body_type(&self, method: &Method) -> Option<HttpBodyType> {
        // see https://datatracker.ietf.org/doc/html/rfc7230#section-3.3.3
        if self.expect_no_body(method) {
            None
        } else if self.chunked_transfer {
            Some(HttpBodyType::Chunked)
        } else if self.has_content_length {
            if self.content_length > 0 {
                Some(HttpBodyType::ContentLength(self.content_length))
            } else {
                None
            }
        } else {
            Some(HttpBodyType::ReadUntilEnd)
        }
    }

    pub async fn parse<R>(
        reader: &mut R,
        method: &Method,
        keep_alive: bool,
        max_header_size: usize,
    ) -> Result<Self, HttpResponseParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let mut header_size: usize = 0;

        // stray CRLF pairs before the status line are tolerated, a closed
        // stream with no bytes at all is the empty-message-body failure
        let mut rsp = loop {
            if header_size >= max_header_size {
                return Err(HttpResponseParseError::TooLargeHeader(max_header_size));
            }
            line_buf.clear();
            let max_len = max_header_size - header_size;
            let (found, nr) = reader
                .limited_read_until(b'\n', max_len, &mut line_buf)
                .await?;
            if nr == 0 {
                return Err(HttpResponseParseError::RemoteClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpResponseParseError::RemoteClosed)
                } else {
                    Err(HttpResponseParseError::TooLargeHeader(max_header_size))
                };
            }
            header_size += nr;
            if is_line_end(&line_buf) {
                continue;
            }
            break HttpResponseHead::build_from_status_line(line_buf.as_ref())?;
        };
        rsp.keep_alive = keep_alive;

        loop {
            if header_size >= max_header_size {
                return Err(HttpResponseParseError::TooLargeHeader(max_header_size));
            }
            line_buf.clear();
            let max_len = max_header_size - header_size;
            let (found, nr) = reader
                .limited_read_until(b'\n', max_len, &mut line_buf)
                .await?;
            if nr == 0 {
                return Err(HttpResponseParseError::RemoteClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpResponseParseError::RemoteClosed)
                } else {
                    Err(HttpResponseParseError::TooLargeHeader(max_header_size))
                };
            }
            header_size += nr;
            if is_line_end(&line_buf) {
                // header end line
                break;
            }

            rsp.parse_header_line(line_buf.as_ref())?;
        }
        rsp.origin_header_size = header_size;

        rsp.post_check_and_fix(method);
        Ok(rsp)
    }

    /// do some necessary check and fix
    fn post_check_and_fix(&mut self, method: &Method) {
        if !self.chunked_transfer && !self.expect_no_body(method) && !self.has_content_length {
            // read to end and close the connection
            self.keep_alive = false;
        }
    }

    fn build_from_status_line(line_buf: &[u8]) -> Result<Self, HttpResponseParseError> {
        let rsp =
            HttpStatusLine::parse(line_buf).map_err(HttpResponseParseError::InvalidStatusLine)?;
        let version = match rsp.version {
            0 => Version::HTTP_10,
            1 => Version::HTTP_11,
            2 => return Err(HttpResponseParseError::InvalidVersion(Version::HTTP_2)),
            _ => unreachable!(),
        };

        Ok(HttpResponseHead::new(
            version,
            rsp.code,
            rsp.reason.to_string(),
        ))
    }

    fn parse_header_line(&mut self, line_buf: &[u8]) -> Result<(), HttpResponseParseError> {
        let header =
            HttpHeaderLine::parse(line_buf).map_err(HttpResponseParseError::InvalidHeaderLine)?;
        self.handle_header(header)
    }

    fn handle_header(&mut self, header: HttpHeaderLine) -> Result<(), HttpResponseParseError> {
        let name = HeaderName::from_str(header.name).map_err(|_| {
            HttpResponseParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;

        match name.as_str() {
            "connection" | "proxy-connection" => {
                // proxy-connection is not standard, but common enough
                let value = header.value.to_lowercase();
                for v in value.as_str().split(',') {
                    match v.trim() {
                        "keep-alive" => {
                            // keep the policy requested by us
                        }
                        "close" => {
                            self.keep_alive = false;
                        }
                        _ => {}
                    }
                }
            }
            "keep-alive" => {
                let (timeout, max) = parse_keep_alive_value(header.value);
                self.advertised_keep_alive_timeout = timeout;
                self.advertised_keep_alive_max = max;
            }
            "transfer-encoding" => {
                self.has_transfer_encoding = true;
                if self.has_content_length {
                    // delete content-length
                    self.headers.remove(http::header::CONTENT_LENGTH);
                    self.content_length = 0;
                    self.keep_alive = false; // according to rfc9112 Section 6.1
                }

                let v = header.value.to_lowercase();
                if v.ends_with("chunked") {
                    self.chunked_transfer = true;
                } else if v.contains("chunked") {
                    return Err(HttpResponseParseError::InvalidChunkedTransferEncoding);
                }
            }
            "content-length" => {
                if self.has_transfer_encoding {
                    // ignore content-length
                    self.keep_alive = false; // according to rfc9112 Section 6.1
                    return Ok(());
                }

                let content_length = u64::from_str(header.value)
                    .map_err(|_| HttpResponseParseError::InvalidContentLength)?;

                if self.has_content_length && self.content_length != content_length {
                    return Err(HttpResponseParseError::InvalidContentLength);
                }
                self.has_content_length = true;
                self.content_length = content_length;
            }
            "content-encoding" => {
                self.content_encoding = Some(header.value.to_string());
            }
            _ => {}
        }

        let value = HeaderValue::from_str(header.value).map_err(|_| {
            HttpResponseParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;
        if name == http::header::SET_COOKIE {
            // every cookie line is kept, in arrival order, for the jar
            self.headers.append(name, value);
        } else {
            // repeated plain headers overwrite
            self.headers.insert(name, value);
        }
        Ok(())
    }
}

fn is_line_end(line_buf: &[u8]) -> bool {
    (line_buf.len() == 1 && line_buf[0] == b'\n')
        || (line_buf.len() == 2 && line_buf[0] == b'\r' && line_buf[1] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::io::{BufReader, Result};
    use tokio_util::io::StreamReader;

    async fn parse_bytes(content: &'static [u8], method: Method) -> HttpResponseHead {
        let stream = tokio_stream::iter(vec![Result::Ok(Bytes::from_static(content))]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);
        HttpResponseHead::parse(&mut buf_stream, &method, true, 4096)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn read_get() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Date: Fri, 11 Nov 2022 03:22:03 GMT\r\n\
            Content-Type: text/plain; charset=utf-8\r\n\
            Content-Length: 4\r\n\
            Connection: keep-alive\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert_eq!(rsp.code, 200);
        assert!(rsp.keep_alive());
        assert_eq!(
            rsp.body_type(&Method::GET),
            Some(HttpBodyType::ContentLength(4))
        );
    }

    #[tokio::test]
    async fn read_get_to_end() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Type: text/plain\r\n\
            Connection: close\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert_eq!(rsp.code, 200);
        assert!(!rsp.keep_alive());
        assert_eq!(rsp.body_type(&Method::GET), Some(HttpBodyType::ReadUntilEnd));
    }

    #[tokio::test]
    async fn read_head() {
        let content = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n";
        let rsp = parse_bytes(content, Method::HEAD).await;
        assert_eq!(rsp.body_type(&Method::HEAD), None);
        assert!(rsp.keep_alive());
    }

    #[tokio::test]
    async fn no_body_status() {
        let content = b"HTTP/1.1 304 Not Modified\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert_eq!(rsp.body_type(&Method::GET), None);
        assert!(rsp.keep_alive());
    }

    #[tokio::test]
    async fn chunked_wins_over_content_length() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Length: 10\r\n\
            Transfer-Encoding: chunked\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert_eq!(rsp.body_type(&Method::GET), Some(HttpBodyType::Chunked));
        assert!(rsp.headers.get(http::header::CONTENT_LENGTH).is_none());
    }

    #[tokio::test]
    async fn leading_blank_lines_skipped() {
        let content = b"\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert_eq!(rsp.code, 204);
    }

    #[tokio::test]
    async fn keep_alive_advertised() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Length: 0\r\n\
            Keep-Alive: timeout=30, max=2\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        let (timeout, max) = rsp.advertised_keep_alive();
        assert_eq!(timeout, Some(Duration::from_secs(30)));
        assert_eq!(max, Some(2));
        assert_eq!(rsp.body_type(&Method::GET), None);
    }

    #[tokio::test]
    async fn set_cookie_kept_in_order() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Set-Cookie: a=1; Path=/\r\n\
            Content-Length: 0\r\n\
            Set-Cookie: b=2\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        let all: Vec<_> = rsp
            .headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], "a=1; Path=/");
        assert_eq!(all[1], "b=2");
    }

    #[tokio::test]
    async fn repeated_header_overwrites() {
        let content = b"HTTP/1.1 200 OK\r\n\
            X-Trace: first\r\n\
            X-Trace: second\r\n\
            Content-Length: 0\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert_eq!(rsp.headers.get("x-trace").unwrap(), "second");
        assert_eq!(rsp.headers.get_all("x-trace").iter().count(), 1);
    }

    #[tokio::test]
    async fn content_encoding_captured() {
        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Encoding: gzip\r\n\
            Content-Length: 2\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert_eq!(rsp.content_encoding().unwrap(), ContentEncoding::Gzip);

        let content = b"HTTP/1.1 200 OK\r\n\
            Content-Encoding: br\r\n\
            Content-Length: 2\r\n\r\n";
        let rsp = parse_bytes(content, Method::GET).await;
        assert!(rsp.content_encoding().is_err());
    }

    #[tokio::test]
    async fn empty_read_is_remote_closed() {
        let stream = tokio_stream::iter(Vec::<Result<Bytes>>::new());
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);
        let err = HttpResponseHead::parse(&mut buf_stream, &Method::GET, true, 4096)
            .await
            .unwrap_err();
        assert!(err.is_empty_message_body());
    }
}
