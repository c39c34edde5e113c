/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use tokio::io::{AsyncBufRead, AsyncWrite};

mod fill_wait_data;
mod limited_read_until;
mod write_all_flush;

use fill_wait_data::FillWaitData;
use limited_read_until::LimitedReadUntil;
use write_all_flush::WriteAllFlush;

pub trait LimitedBufReadExt: AsyncBufRead {
    fn limited_read_until<'a>(
        &'a mut self,
        delimiter: u8,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadUntil<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadUntil::new(self, delimiter, max_len, buf)
    }

    /// return Ok(true) if data can be read, Ok(false) on EOF
    fn fill_wait_data(&mut self) -> FillWaitData<'_, Self>
    where
        Self: Unpin,
    {
        FillWaitData::new(self)
    }
}

impl<R: AsyncBufRead + ?Sized> LimitedBufReadExt for R {}

pub trait LimitedWriteExt: AsyncWrite {
    fn write_all_flush<'a>(&'a mut self, buf: &'a [u8]) -> WriteAllFlush<'a, Self>
    where
        Self: Unpin,
    {
        WriteAllFlush::new(self, buf)
    }
}

impl<W: AsyncWrite + ?Sized> LimitedWriteExt for W {}
