/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

pub(crate) const BURROW_DEBUG_LOG_TARGET: &str = "burrow";

macro_rules! log_msg {
    ($s:literal, $($arg:tt)+) => (
        log::debug!(target: $crate::BURROW_DEBUG_LOG_TARGET, $s, $($arg)+)
    );
    ($s:literal) => (
        log::debug!(target: $crate::BURROW_DEBUG_LOG_TARGET, $s)
    )
}

pub(crate) use log_msg;
