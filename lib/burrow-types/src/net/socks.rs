/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use crate::auth::{Password, Username};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SocksAuth {
    None,
    User(Username, Password),
}

impl SocksAuth {
    pub fn code(&self) -> u8 {
        match self {
            SocksAuth::None => 0x00,
            SocksAuth::User(_, _) => 0x02,
        }
    }

    pub fn from_optional(username: Option<Username>, password: Option<Password>) -> Self {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => SocksAuth::User(u, p),
            _ => SocksAuth::None,
        }
    }
}
