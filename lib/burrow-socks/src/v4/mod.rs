/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use super::types::*;

mod reply;
mod request;

pub use reply::SocksV4Reply;
pub use request::SocksV4Request;

pub mod client;
