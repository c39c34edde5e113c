/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

use super::HttpBodyType;
use crate::HttpChunkedLine;

enum NextReadType {
    EndOfFile,
    UntilEnd,
    FixedLength,
    ChunkSize,
    ChunkDataEnd,
    Trailer,
}

/// Reads exactly one framed message body from the wire.
///
/// The wrapped stream must be the same buffered reader the response head was
/// parsed from, so that body bytes already pulled into its buffer are
/// consumed before the socket is touched again.
pub struct HttpBodyReader<'a, R> {
    stream: &'a mut R,
    body_type: HttpBodyType,
    next_read_type: NextReadType,
    body_line_max_len: usize,

    left_chunk_size: u64,
    chunk_size_line_cache: Vec<u8>,
    chunk_data_end_char: u8,
    trailer_line_length: usize,

    finished: bool,
    read_content_length: u64,
}

impl<'a, R> HttpBodyReader<'a, R>
where
    R: AsyncBufRead + Unpin,
{
    const DEFAULT_LINE_SIZE: usize = 64;

    pub fn new(stream: &'a mut R, body_type: HttpBodyType, body_line_max_len: usize) -> Self {
        let mut left_chunk_size = 0u64;
        let next_read_type = match &body_type {
            HttpBodyType::ContentLength(size) => {
                left_chunk_size = *size;
                NextReadType::FixedLength
            }
            HttpBodyType::Chunked => NextReadType::ChunkSize,
            HttpBodyType::ReadUntilEnd => NextReadType::UntilEnd,
        };
        HttpBodyReader {
            stream,
            body_type,
            next_read_type,
            body_line_max_len,
            left_chunk_size,
            chunk_size_line_cache: Vec::with_capacity(Self::DEFAULT_LINE_SIZE),
            chunk_data_end_char: 0,
            trailer_line_length: 0,
            finished: false,
            read_content_length: 0,
        }
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// total message payload bytes handed out so far (chunk payloads only
    /// for chunked transfer)
    pub fn read_content_length(&self) -> u64 {
        self.read_content_length
    }

    fn poll_until_end(
        &mut self,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let old_remaining = buf.remaining();
        ready!(Pin::new(&mut *self.stream).poll_read(cx, buf))?;
        let nr = old_remaining - buf.remaining();
        if nr == 0 {
            // io closed, which indicates the end of body
            self.finished = true;
            self.next_read_type = NextReadType::EndOfFile;
        } else {
            self.read_content_length += nr as u64;
        }
        Poll::Ready(Ok(()))
    }

    fn poll_fixed(&mut self, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if self.left_chunk_size == 0 {
            self.finish_fixed_run();
            return Poll::Ready(Ok(()));
        }
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        let to_read = usize::try_from(self.left_chunk_size)
            .unwrap_or(usize::MAX)
            .min(buf.remaining());
        let mut limited_buf = ReadBuf::new(buf.initialize_unfilled_to(to_read));
        ready!(Pin::new(&mut *self.stream).poll_read(cx, &mut limited_buf))?;
        let nr = limited_buf.filled().len();
        if nr == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "reader closed while reading fixed length body",
            )));
        }
        buf.advance(nr);

        self.read_content_length += nr as u64;
        self.left_chunk_size -= nr as u64;

        if self.left_chunk_size == 0 {
            self.finish_fixed_run();
        }

        Poll::Ready(Ok(()))
    }

    fn finish_fixed_run(&mut self) {
        match self.body_type {
            HttpBodyType::ContentLength(_) => {
                self.finished = true;
                self.next_read_type = NextReadType::EndOfFile;
            }
            HttpBodyType::Chunked => {
                self.chunk_data_end_char = 0;
                self.next_read_type = NextReadType::ChunkDataEnd;
            }
            HttpBodyType::ReadUntilEnd => unreachable!(),
        }
    }

    fn poll_chunk_size(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            let mut reader = Pin::new(&mut *self.stream);
            let cache = ready!(reader.as_mut().poll_fill_buf(cx))?;
            if cache.is_empty() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "reader closed while reading chunk size line",
                )));
            }

            let (line_done, used) = match memchr::memchr(b'\n', cache) {
                Some(i) => {
                    self.chunk_size_line_cache.extend_from_slice(&cache[..=i]);
                    (true, i + 1)
                }
                None => {
                    self.chunk_size_line_cache.extend_from_slice(cache);
                    (false, cache.len())
                }
            };
            reader.as_mut().consume(used);

            if self.chunk_size_line_cache.len() > self.body_line_max_len {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "too long chunk size line",
                )));
            }
            if !line_done {
                continue;
            }

            let line = HttpChunkedLine::parse(&self.chunk_size_line_cache)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            if line.chunk_size == 0 {
                self.trailer_line_length = 0;
                self.next_read_type = NextReadType::Trailer;
            } else {
                self.left_chunk_size = line.chunk_size;
                self.next_read_type = NextReadType::FixedLength;
            }
            self.chunk_size_line_cache.clear();
            return Poll::Ready(Ok(()));
        }
    }

    fn poll_chunk_data_end(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            let mut reader = Pin::new(&mut *self.stream);
            let cache = ready!(reader.as_mut().poll_fill_buf(cx))?;
            if cache.is_empty() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "reader closed while reading chunk data end",
                )));
            }

            match (self.chunk_data_end_char, cache[0]) {
                (0, b'\r') => {
                    reader.as_mut().consume(1);
                    self.chunk_data_end_char = b'\r';
                }
                (0, b'\n') | (b'\r', b'\n') => {
                    reader.as_mut().consume(1);
                    self.next_read_type = NextReadType::ChunkSize;
                    return Poll::Ready(Ok(()));
                }
                _ => {
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "invalid chunk data end",
                    )));
                }
            }
        }
    }

    fn poll_trailer(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            let mut reader = Pin::new(&mut *self.stream);
            let cache = ready!(reader.as_mut().poll_fill_buf(cx))?;
            if cache.is_empty() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "reader closed while reading trailer",
                )));
            }

            let mut consumed = cache.len();
            let mut done = false;
            for (i, c) in cache.iter().enumerate() {
                match c {
                    b'\n' => {
                        if self.trailer_line_length == 0 {
                            consumed = i + 1;
                            done = true;
                            break;
                        }
                        self.trailer_line_length = 0;
                    }
                    b'\r' => {}
                    _ => {
                        self.trailer_line_length += 1;
                        if self.trailer_line_length > self.body_line_max_len {
                            return Poll::Ready(Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                "too long trailer line",
                            )));
                        }
                    }
                }
            }
            reader.as_mut().consume(consumed);
            if done {
                self.finished = true;
                self.next_read_type = NextReadType::EndOfFile;
                return Poll::Ready(Ok(()));
            }
        }
    }
}

impl<R> AsyncRead for HttpBodyReader<'_, R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = self.get_mut();
        loop {
            match me.next_read_type {
                NextReadType::EndOfFile => return Poll::Ready(Ok(())),
                NextReadType::UntilEnd => return me.poll_until_end(cx, buf),
                NextReadType::FixedLength => return me.poll_fixed(cx, buf),
                NextReadType::ChunkSize => ready!(me.poll_chunk_size(cx))?,
                NextReadType::ChunkDataEnd => ready!(me.poll_chunk_data_end(cx))?,
                NextReadType::Trailer => ready!(me.poll_trailer(cx))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::io::{AsyncReadExt, BufReader, Result};
    use tokio_util::io::StreamReader;

    #[tokio::test]
    async fn content_length() {
        let content = b"hello world";
        let stream = tokio_stream::iter(vec![Result::Ok(Bytes::from_static(content))]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader =
            HttpBodyReader::new(&mut buf_stream, HttpBodyType::ContentLength(5), 1024);
        let mut body = Vec::new();
        body_reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello");
        assert!(body_reader.finished());
        assert_eq!(body_reader.read_content_length(), 5);

        // the rest stays in the stream
        let mut left = Vec::new();
        buf_stream.read_to_end(&mut left).await.unwrap();
        assert_eq!(left, b" world");
    }

    #[tokio::test]
    async fn content_length_split_input() {
        let stream = tokio_stream::iter(vec![
            Result::Ok(Bytes::from_static(b"he")),
            Result::Ok(Bytes::from_static(b"llo")),
        ]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader =
            HttpBodyReader::new(&mut buf_stream, HttpBodyType::ContentLength(5), 1024);
        let mut body = Vec::new();
        body_reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn content_length_closed_early() {
        let stream = tokio_stream::iter(vec![Result::Ok(Bytes::from_static(b"he"))]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader =
            HttpBodyReader::new(&mut buf_stream, HttpBodyType::ContentLength(5), 1024);
        let mut body = Vec::new();
        let err = body_reader.read_to_end(&mut body).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn read_until_end() {
        let stream = tokio_stream::iter(vec![
            Result::Ok(Bytes::from_static(b"all of ")),
            Result::Ok(Bytes::from_static(b"this")),
        ]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader =
            HttpBodyReader::new(&mut buf_stream, HttpBodyType::ReadUntilEnd, 1024);
        let mut body = Vec::new();
        body_reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"all of this");
        assert!(body_reader.finished());
    }

    #[tokio::test]
    async fn chunked_single() {
        let content = b"5\r\nhello\r\n0\r\n\r\n";
        let stream = tokio_stream::iter(vec![Result::Ok(Bytes::from_static(content))]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader = HttpBodyReader::new(&mut buf_stream, HttpBodyType::Chunked, 1024);
        let mut body = Vec::new();
        body_reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello");
        assert!(body_reader.finished());
        assert_eq!(body_reader.read_content_length(), 5);
    }

    #[tokio::test]
    async fn chunked_split_chunks() {
        let stream = tokio_stream::iter(vec![
            Result::Ok(Bytes::from_static(b"3\r\nab")),
            Result::Ok(Bytes::from_static(b"c\r\n3\r\n12")),
            Result::Ok(Bytes::from_static(b"3\r\n0\r\n\r\n")),
        ]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader = HttpBodyReader::new(&mut buf_stream, HttpBodyType::Chunked, 1024);
        let mut body = Vec::new();
        body_reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"abc123");
        assert_eq!(body_reader.read_content_length(), 6);
    }

    #[tokio::test]
    async fn chunked_with_trailer() {
        let content = b"4\r\nwire\r\n0\r\nExpires: never\r\n\r\n";
        let stream = tokio_stream::iter(vec![Result::Ok(Bytes::from_static(content))]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader = HttpBodyReader::new(&mut buf_stream, HttpBodyType::Chunked, 1024);
        let mut body = Vec::new();
        body_reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"wire");
        assert!(body_reader.finished());
    }

    #[tokio::test]
    async fn chunked_bad_size_line() {
        let content = b"zz\r\nhello\r\n";
        let stream = tokio_stream::iter(vec![Result::Ok(Bytes::from_static(content))]);
        let stream = StreamReader::new(stream);
        let mut buf_stream = BufReader::new(stream);

        let mut body_reader = HttpBodyReader::new(&mut buf_stream, HttpBodyType::Chunked, 1024);
        let mut body = Vec::new();
        let err = body_reader.read_to_end(&mut body).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
