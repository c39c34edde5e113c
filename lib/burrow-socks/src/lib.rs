/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod types;
pub use types::*;

pub mod v4;
pub mod v5;
