/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SocksCommand {
    TcpConnect,
    TcpBind,
    UdpAssociate,
}

impl SocksCommand {
    pub fn code(&self) -> u8 {
        match self {
            SocksCommand::TcpConnect => 0x01,
            SocksCommand::TcpBind => 0x02,
            SocksCommand::UdpAssociate => 0x03,
        }
    }
}
