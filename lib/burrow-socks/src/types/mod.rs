/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod cmd;
pub use cmd::SocksCommand;

mod auth;
pub use auth::SocksAuthMethod;

mod error;
pub use error::{SocksConnectError, SocksNegotiationError, SocksRejectReason, SocksReplyParseError};
