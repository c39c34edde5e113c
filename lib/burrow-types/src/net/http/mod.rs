/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod auth;
pub use auth::{HttpAuth, HttpBasicAuth};

mod keepalive;
pub use keepalive::HttpKeepAliveConfig;
