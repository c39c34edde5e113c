/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;

use tokio::io::AsyncWrite;

use burrow_io_ext::LimitedWriteExt;
use burrow_types::net::UpstreamAddr;

/// the extra header lines should end with \r\n
pub struct HttpConnectRequest<'a> {
    host: &'a UpstreamAddr,
    dyn_headers: Vec<String>,
}

impl<'a> HttpConnectRequest<'a> {
    pub fn new(host: &'a UpstreamAddr) -> Self {
        HttpConnectRequest {
            host,
            dyn_headers: Vec::new(),
        }
    }

    pub fn append_dyn_header(&mut self, line: String) {
        assert!(line.ends_with("\r\n"));
        self.dyn_headers.push(line);
    }

    pub async fn send<W>(&'a self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::<u8>::with_capacity(256);
        buf.extend_from_slice(format!("CONNECT {} HTTP/1.1\r\n", self.host).as_bytes());
        buf.extend_from_slice(format!("Host: {}\r\n", self.host).as_bytes());
        for line in &self.dyn_headers {
            buf.extend_from_slice(line.as_bytes());
        }
        buf.extend_from_slice(b"Proxy-Connection: Keep-Alive\r\n");
        buf.extend_from_slice(b"\r\n");
        writer.write_all_flush(&buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serialize() {
        let addr = UpstreamAddr::from_host_str_and_port("example.com", 443).unwrap();
        let mut req = HttpConnectRequest::new(&addr);
        req.append_dyn_header("Proxy-Authorization: Basic dXNlcjpwYXNz\r\n".to_string());

        let mut buf = Vec::new();
        req.send(&mut buf).await.unwrap();
        assert_eq!(
            buf,
            b"CONNECT example.com:443 HTTP/1.1\r\n\
              Host: example.com:443\r\n\
              Proxy-Authorization: Basic dXNlcjpwYXNz\r\n\
              Proxy-Connection: Keep-Alive\r\n\r\n"
        );
    }
}
