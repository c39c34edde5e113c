/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod protocol;
pub use protocol::OpensslProtocol;

mod client;
pub use client::{OpensslClientConfig, OpensslClientConfigBuilder};
