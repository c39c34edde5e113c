/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// One field of a multipart/form-data body.
pub struct MultipartPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl MultipartPart {
    pub fn field(name: &str, data: impl Into<Bytes>) -> Self {
        MultipartPart {
            name: name.to_string(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    pub fn file(name: &str, filename: &str, content_type: &str, data: impl Into<Bytes>) -> Self {
        MultipartPart {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            data: data.into(),
        }
    }

    fn header_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        buf.extend_from_slice(self.name.as_bytes());
        buf.push(b'"');
        if let Some(filename) = &self.filename {
            buf.extend_from_slice(b"; filename=\"");
            buf.extend_from_slice(filename.as_bytes());
            buf.push(b'"');
        }
        buf.extend_from_slice(b"\r\n");
        if let Some(content_type) = &self.content_type {
            buf.extend_from_slice(b"Content-Type: ");
            buf.extend_from_slice(content_type.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// A request body producer. Every variant can state its exact byte count
/// up front (a streamed body may not), and stream itself into the socket
/// in bounded slices.
pub enum ContentSource {
    Bytes {
        data: Bytes,
        content_type: String,
    },
    Text {
        text: String,
        content_type: String,
    },
    File {
        path: PathBuf,
        content_type: String,
    },
    /// url-encoded form fields
    Form {
        fields: Vec<(String, String)>,
    },
    Stream {
        reader: Box<dyn AsyncRead + Send + Unpin>,
        length: Option<u64>,
        content_type: String,
    },
    Multipart {
        parts: Vec<MultipartPart>,
        boundary: String,
    },
}

impl ContentSource {
    pub fn from_bytes(data: impl Into<Bytes>, content_type: &str) -> Self {
        ContentSource::Bytes {
            data: data.into(),
            content_type: content_type.to_string(),
        }
    }

    pub fn from_text(text: &str) -> Self {
        ContentSource::Text {
            text: text.to_string(),
            content_type: "text/plain; charset=utf-8".to_string(),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>, content_type: &str) -> Self {
        ContentSource::File {
            path: path.into(),
            content_type: content_type.to_string(),
        }
    }

    pub fn form(fields: Vec<(String, String)>) -> Self {
        ContentSource::Form { fields }
    }

    pub fn stream(
        reader: Box<dyn AsyncRead + Send + Unpin>,
        length: Option<u64>,
        content_type: &str,
    ) -> Self {
        ContentSource::Stream {
            reader,
            length,
            content_type: content_type.to_string(),
        }
    }

    pub fn multipart(parts: Vec<MultipartPart>) -> io::Result<Self> {
        let mut random = [0u8; 12];
        openssl::rand::rand_bytes(&mut random)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(ContentSource::Multipart {
            parts,
            boundary: format!("----------------{}", hex::encode(random)),
        })
    }

    pub fn content_type(&self) -> String {
        match self {
            ContentSource::Bytes { content_type, .. }
            | ContentSource::Text { content_type, .. }
            | ContentSource::File { content_type, .. }
            | ContentSource::Stream { content_type, .. } => content_type.clone(),
            ContentSource::Form { .. } => "application/x-www-form-urlencoded".to_string(),
            ContentSource::Multipart { boundary, .. } => {
                format!("multipart/form-data; boundary={boundary}")
            }
        }
    }

    /// The exact number of body bytes `write_to` will emit, when knowable.
    pub async fn content_length(&self) -> io::Result<Option<u64>> {
        match self {
            ContentSource::Bytes { data, .. } => Ok(Some(data.len() as u64)),
            ContentSource::Text { text, .. } => Ok(Some(text.len() as u64)),
            ContentSource::File { path, .. } => {
                let meta = tokio::fs::metadata(path).await?;
                Ok(Some(meta.len()))
            }
            ContentSource::Form { fields } => Ok(Some(encode_form(fields).len() as u64)),
            ContentSource::Stream { length, .. } => Ok(*length),
            ContentSource::Multipart { parts, boundary } => {
                Ok(Some(assemble_multipart(parts, boundary).len() as u64))
            }
        }
    }

    /// Stream the body into `writer` in `chunk_size` slices, reporting each
    /// slice through `on_write`. Returns the total byte count written.
    pub(crate) async fn write_to<W>(
        &mut self,
        writer: &mut W,
        chunk_size: usize,
        on_write: &mut dyn FnMut(u64),
    ) -> io::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        match self {
            ContentSource::Bytes { data, .. } => {
                write_sliced(writer, data, chunk_size, on_write).await
            }
            ContentSource::Text { text, .. } => {
                write_sliced(writer, text.as_bytes(), chunk_size, on_write).await
            }
            ContentSource::Form { fields } => {
                let body = encode_form(fields);
                write_sliced(writer, body.as_bytes(), chunk_size, on_write).await
            }
            ContentSource::Multipart { parts, boundary } => {
                let body = assemble_multipart(parts, boundary);
                write_sliced(writer, &body, chunk_size, on_write).await
            }
            ContentSource::File { path, .. } => {
                let mut file = tokio::fs::File::open(path.as_path()).await?;
                copy_sliced(&mut file, writer, chunk_size, on_write).await
            }
            ContentSource::Stream { reader, .. } => {
                copy_sliced(reader, writer, chunk_size, on_write).await
            }
        }
    }
}

fn encode_form(fields: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in fields {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

fn assemble_multipart(parts: &[MultipartPart], boundary: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(parts.iter().map(|p| p.data.len() + 128).sum::<usize>() + 32);
    for part in parts {
        buf.extend_from_slice(b"--");
        buf.extend_from_slice(boundary.as_bytes());
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&part.header_bytes());
        buf.extend_from_slice(&part.data);
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(b"--");
    buf.extend_from_slice(boundary.as_bytes());
    buf.extend_from_slice(b"--\r\n");
    buf
}

async fn write_sliced<W>(
    writer: &mut W,
    data: &[u8],
    chunk_size: usize,
    on_write: &mut dyn FnMut(u64),
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    for chunk in data.chunks(chunk_size.max(1)) {
        writer.write_all(chunk).await?;
        written += chunk.len() as u64;
        on_write(written);
    }
    writer.flush().await?;
    Ok(written)
}

async fn copy_sliced<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    on_write: &mut dyn FnMut(u64),
) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut written = 0u64;
    loop {
        let nr = reader.read(&mut buf).await?;
        if nr == 0 {
            break;
        }
        writer.write_all(&buf[..nr]).await?;
        written += nr as u64;
        on_write(written);
    }
    writer.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bytes_length_matches_written() {
        let mut source = ContentSource::from_bytes(&b"hello world"[..], "text/plain");
        let expected = source.content_length().await.unwrap().unwrap();

        let mut sink = Vec::new();
        let mut ticks = Vec::new();
        let written = source
            .write_to(&mut sink, 4, &mut |n| ticks.push(n))
            .await
            .unwrap();
        assert_eq!(written, expected);
        assert_eq!(sink, b"hello world");
        assert_eq!(ticks, [4, 8, 11]);
    }

    #[tokio::test]
    async fn form_encoding() {
        let mut source = ContentSource::form(vec![
            ("q".to_string(), "a b".to_string()),
            ("lang".to_string(), "en&us".to_string()),
        ]);
        let mut sink = Vec::new();
        source
            .write_to(&mut sink, 1024, &mut |_| {})
            .await
            .unwrap();
        assert_eq!(sink, b"q=a+b&lang=en%26us");
        assert_eq!(
            source.content_type(),
            "application/x-www-form-urlencoded"
        );
    }

    #[tokio::test]
    async fn multipart_length_is_exact() {
        let parts = vec![
            MultipartPart::field("title", &b"hello"[..]),
            MultipartPart::file("upload", "a.bin", "application/octet-stream", &b"\x00\x01"[..]),
        ];
        let mut source = ContentSource::multipart(parts).unwrap();
        let expected = source.content_length().await.unwrap().unwrap();

        let mut sink = Vec::new();
        let written = source
            .write_to(&mut sink, 16, &mut |_| {})
            .await
            .unwrap();
        assert_eq!(written, expected);
        assert_eq!(sink.len() as u64, expected);

        let text = String::from_utf8_lossy(&sink);
        assert!(text.starts_with("--"));
        assert!(text.contains("Content-Disposition: form-data; name=\"title\""));
        assert!(text.contains("filename=\"a.bin\""));
        assert!(text.trim_end().ends_with("--"));
    }

    #[tokio::test]
    async fn stream_source() {
        let reader = Box::new(&b"streamed bytes"[..]);
        let mut source = ContentSource::stream(reader, None, "application/octet-stream");
        assert_eq!(source.content_length().await.unwrap(), None);

        let mut sink = Vec::new();
        let written = source
            .write_to(&mut sink, 5, &mut |_| {})
            .await
            .unwrap();
        assert_eq!(written, 14);
        assert_eq!(sink, b"streamed bytes");
    }
}
