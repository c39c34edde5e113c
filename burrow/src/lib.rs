/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

//! A hand-driven HTTP/1.1 client.
//!
//! burrow writes request bytes and parses response bytes itself, over a
//! plain or TLS stream that may be tunneled through an HTTP CONNECT,
//! SOCKS4/4a/5 or Azadi proxy. A single connection slot is kept alive
//! between requests, redirects are followed with the usual method and
//! header rewrites, and a shareable cookie jar is consulted on both the
//! send and receive path.

pub mod client;
pub mod config;
pub mod content;
pub mod cookie;
pub mod error;
pub mod request;
pub mod response;

mod connect;
mod debug;

pub use client::HttpClient;
pub use config::HttpClientConfig;
pub use error::HttpClientError;
pub use request::Request;
pub use response::Response;

pub(crate) use debug::BURROW_DEBUG_LOG_TARGET;
