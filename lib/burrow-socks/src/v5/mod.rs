/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use super::types::*;

mod reply;
mod request;

pub use reply::Socks5Reply;
pub use request::Socks5Request;

pub mod auth;
pub mod client;
