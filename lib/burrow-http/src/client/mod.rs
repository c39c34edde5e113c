/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod error;
pub use error::HttpResponseParseError;

mod response;
pub use response::HttpResponseHead;
