/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{SocksRejectReason, SocksReplyParseError};

pub enum SocksV4Reply {
    RequestGranted,
    Rejected(SocksRejectReason),
}

impl SocksV4Reply {
    pub(crate) async fn recv<R>(reader: &mut R) -> Result<Self, SocksReplyParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).await?;

        // buf[0] is the reply version byte, ignored for compatibility with
        // servers that echo 0x04 instead of 0x00
        match buf[1] {
            0x5A => Ok(SocksV4Reply::RequestGranted),
            0x5B => Ok(SocksV4Reply::Rejected(SocksRejectReason::RequestRejected)),
            0x5C => Ok(SocksV4Reply::Rejected(SocksRejectReason::IdentdUnreachable)),
            0x5D => Ok(SocksV4Reply::Rejected(SocksRejectReason::IdentdMismatch)),
            n => Ok(SocksV4Reply::Rejected(SocksRejectReason::Unassigned(n))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn granted() {
        let bytes: [u8; 8] = [0x00, 0x5A, 0, 0, 0, 0, 0, 0];
        let rsp = SocksV4Reply::recv(&mut bytes.as_slice()).await.unwrap();
        assert!(matches!(rsp, SocksV4Reply::RequestGranted));
    }

    #[tokio::test]
    async fn rejected_kinds() {
        for (code, reason) in [
            (0x5Bu8, SocksRejectReason::RequestRejected),
            (0x5C, SocksRejectReason::IdentdUnreachable),
            (0x5D, SocksRejectReason::IdentdMismatch),
        ] {
            let bytes: [u8; 8] = [0x00, code, 0, 0, 0, 0, 0, 0];
            let rsp = SocksV4Reply::recv(&mut bytes.as_slice()).await.unwrap();
            let SocksV4Reply::Rejected(got) = rsp else {
                panic!("expected rejection");
            };
            assert_eq!(got, reason);
        }
    }
}
