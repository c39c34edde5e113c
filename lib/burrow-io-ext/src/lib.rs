/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

mod ext;
pub use ext::{LimitedBufReadExt, LimitedWriteExt};

mod aggregated;
pub use aggregated::AggregatedIo;
