/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use thiserror::Error;

mod user;
pub use user::{Password, Username};

#[derive(Debug, Error)]
pub enum AuthParseError {
    #[error("invalid base64 encoding")]
    InvalidBase64Encoding,
    #[error("invalid utf-8 encoding")]
    InvalidUtf8Encoding,
    #[error("invalid username")]
    InvalidUsername,
    #[error("invalid password")]
    InvalidPassword,
    #[error("no delimiter found")]
    NoDelimiterFound,
}
