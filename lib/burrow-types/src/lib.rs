/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

pub mod auth;
pub mod codec;
pub mod net;
