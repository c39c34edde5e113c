/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use percent_encoding::{AsciiSet, CONTROLS};

use super::AuthParseError;

// both fit the single length byte of SOCKS5 user/pass sub-negotiation
const USERNAME_MAX_LENGTH: usize = u8::MAX as usize;
const PASSWORD_MAX_LENGTH: usize = u8::MAX as usize;

const USER_INFO_PCT_ENCODING_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'|');

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Username {
    inner: String,
    len: u8,
}

impl Username {
    pub fn empty() -> Self {
        Username {
            inner: String::new(),
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn from_original(s: &str) -> Result<Self, AuthParseError> {
        if s.len() > USERNAME_MAX_LENGTH {
            return Err(AuthParseError::InvalidUsername);
        }
        if s.contains(':') {
            return Err(AuthParseError::InvalidUsername);
        }
        Ok(Username {
            inner: s.to_string(),
            len: s.len() as u8,
        })
    }

    pub fn from_encoded(s: &str) -> Result<Self, AuthParseError> {
        let decoded = percent_encoding::percent_decode_str(s)
            .decode_utf8()
            .map_err(|_| AuthParseError::InvalidUtf8Encoding)?;
        Username::from_original(decoded.as_ref())
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }

    pub fn to_encoded(&self) -> String {
        percent_encoding::utf8_percent_encode(self.as_original(), USER_INFO_PCT_ENCODING_SET)
            .to_string()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Password {
    inner: String,
    len: u8,
}

impl Password {
    pub fn empty() -> Self {
        Password {
            inner: String::new(),
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn from_original(s: &str) -> Result<Self, AuthParseError> {
        if s.len() > PASSWORD_MAX_LENGTH {
            return Err(AuthParseError::InvalidPassword);
        }
        Ok(Password {
            inner: s.to_string(),
            len: s.len() as u8,
        })
    }

    pub fn from_encoded(s: &str) -> Result<Self, AuthParseError> {
        let decoded = percent_encoding::percent_decode_str(s)
            .decode_utf8()
            .map_err(|_| AuthParseError::InvalidUtf8Encoding)?;
        Password::from_original(decoded.as_ref())
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }

    pub fn to_encoded(&self) -> String {
        percent_encoding::utf8_percent_encode(self.as_original(), USER_INFO_PCT_ENCODING_SET)
            .to_string()
    }
}
