/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::str::FromStr;

use anyhow::anyhow;
use openssl::ssl::SslVersion;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OpensslProtocol {
    Tls1,
    Tls11,
    Tls12,
    Tls13,
}

impl OpensslProtocol {
    pub(crate) fn ssl_version(&self) -> SslVersion {
        match self {
            OpensslProtocol::Tls1 => SslVersion::TLS1,
            OpensslProtocol::Tls11 => SslVersion::TLS1_1,
            OpensslProtocol::Tls12 => SslVersion::TLS1_2,
            OpensslProtocol::Tls13 => SslVersion::TLS1_3,
        }
    }
}

impl FromStr for OpensslProtocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tls1" | "tls10" | "tls1.0" | "tls1_0" => Ok(OpensslProtocol::Tls1),
            "tls11" | "tls1.1" | "tls1_1" => Ok(OpensslProtocol::Tls11),
            "tls12" | "tls1.2" | "tls1_2" => Ok(OpensslProtocol::Tls12),
            "tls13" | "tls1.3" | "tls1_3" => Ok(OpensslProtocol::Tls13),
            _ => Err(anyhow!("unsupported tls protocol {s}")),
        }
    }
}
