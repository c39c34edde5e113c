/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AzadiConnectError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("failed to seal request message")]
    SealFailed,
    #[error("reply does not authenticate")]
    OpenFailed,
    #[error("malformed reply message")]
    InvalidReply,
    #[error("login rejected")]
    Login,
    #[error("destination host rejected")]
    Host,
    #[error("remote connect failed")]
    Remote,
    #[error("unknown reply status {0}")]
    Unknown(u32),
}
