/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

//! Byte serialization of a jar.
//!
//! A deliberately explicit format: one version byte, two policy flag
//! bytes, then length-prefixed cookie records. Timestamps travel as
//! seconds relative to the unix epoch, fields as u32-length-prefixed
//! UTF-8. Everything round-trips, including tombstones.

use std::fs;
use std::io;
use std::path::Path;

use chrono::DateTime;
use thiserror::Error;

use super::{Cookie, CookieJar, CookieJarPolicy};

const FORMAT_VERSION: u8 = 1;

const POLICY_ESCAPE_ON_RECEIVE: u8 = 0x01;
const POLICY_UNESCAPE_SET: u8 = 0x02;
const POLICY_UNESCAPE_VALUE: u8 = 0x04;
const POLICY_IGNORE_INVALID: u8 = 0x08;
const POLICY_IGNORE_SET_EXPIRED: u8 = 0x10;
const POLICY_EXPIRE_BEFORE_SET: u8 = 0x20;

const FILTER_TRIM: u8 = 0x01;
const FILTER_ROOT_PATH: u8 = 0x02;
const FILTER_EXPIRE_YEAR: u8 = 0x04;
const FILTER_TRAILING_COMMA: u8 = 0x08;

const COOKIE_SECURE: u8 = 0x01;
const COOKIE_HTTP_ONLY: u8 = 0x02;
const COOKIE_EXPIRED: u8 = 0x04;

#[derive(Debug, Error)]
pub enum JarDecodeError {
    #[error("truncated input")]
    Truncated,
    #[error("unsupported format version {0}")]
    InvalidVersion(u8),
    #[error("invalid utf-8 field")]
    InvalidUtf8,
    #[error("invalid timestamp field")]
    InvalidTimestamp,
}

impl CookieJar {
    pub fn to_bytes(&self) -> Vec<u8> {
        let cookies = self.snapshot_all();

        let mut buf = Vec::with_capacity(16 + cookies.len() * 64);
        buf.push(FORMAT_VERSION);

        let p = self.policy();
        let mut policy_bits = 0u8;
        if p.escape_values_on_receive {
            policy_bits |= POLICY_ESCAPE_ON_RECEIVE;
        }
        if let Some(v) = p.unescape_values_on_send {
            policy_bits |= POLICY_UNESCAPE_SET;
            if v {
                policy_bits |= POLICY_UNESCAPE_VALUE;
            }
        }
        if p.ignore_invalid_cookie {
            policy_bits |= POLICY_IGNORE_INVALID;
        }
        if p.ignore_set_for_expired {
            policy_bits |= POLICY_IGNORE_SET_EXPIRED;
        }
        if p.expire_before_set {
            policy_bits |= POLICY_EXPIRE_BEFORE_SET;
        }
        buf.push(policy_bits);

        let mut filter_bits = 0u8;
        if p.filter_trim {
            filter_bits |= FILTER_TRIM;
        }
        if p.filter_root_path {
            filter_bits |= FILTER_ROOT_PATH;
        }
        if p.filter_expire_year {
            filter_bits |= FILTER_EXPIRE_YEAR;
        }
        if p.filter_trailing_comma {
            filter_bits |= FILTER_TRAILING_COMMA;
        }
        buf.push(filter_bits);

        buf.extend_from_slice(&(cookies.len() as u32).to_le_bytes());
        for cookie in &cookies {
            put_str(&mut buf, &cookie.name);
            put_str(&mut buf, &cookie.value);
            put_str(&mut buf, &cookie.domain);
            put_str(&mut buf, &cookie.path);
            match cookie.expires {
                Some(expires) => {
                    buf.push(1);
                    buf.extend_from_slice(&expires.and_utc().timestamp().to_le_bytes());
                }
                None => buf.push(0),
            }
            let mut bits = 0u8;
            if cookie.secure {
                bits |= COOKIE_SECURE;
            }
            if cookie.http_only {
                bits |= COOKIE_HTTP_ONLY;
            }
            if cookie.expired {
                bits |= COOKIE_EXPIRED;
            }
            buf.push(bits);
        }
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, JarDecodeError> {
        let mut offset = 0usize;

        let version = get_u8(buf, &mut offset)?;
        if version != FORMAT_VERSION {
            return Err(JarDecodeError::InvalidVersion(version));
        }

        let policy_bits = get_u8(buf, &mut offset)?;
        let filter_bits = get_u8(buf, &mut offset)?;
        let policy = CookieJarPolicy {
            escape_values_on_receive: policy_bits & POLICY_ESCAPE_ON_RECEIVE != 0,
            unescape_values_on_send: if policy_bits & POLICY_UNESCAPE_SET != 0 {
                Some(policy_bits & POLICY_UNESCAPE_VALUE != 0)
            } else {
                None
            },
            ignore_invalid_cookie: policy_bits & POLICY_IGNORE_INVALID != 0,
            ignore_set_for_expired: policy_bits & POLICY_IGNORE_SET_EXPIRED != 0,
            expire_before_set: policy_bits & POLICY_EXPIRE_BEFORE_SET != 0,
            filter_trim: filter_bits & FILTER_TRIM != 0,
            filter_root_path: filter_bits & FILTER_ROOT_PATH != 0,
            filter_expire_year: filter_bits & FILTER_EXPIRE_YEAR != 0,
            filter_trailing_comma: filter_bits & FILTER_TRAILING_COMMA != 0,
        };

        let jar = CookieJar::new(policy);

        let count = get_u32(buf, &mut offset)?;
        for _ in 0..count {
            let name = get_str(buf, &mut offset)?;
            let value = get_str(buf, &mut offset)?;
            let domain = get_str(buf, &mut offset)?;
            let path = get_str(buf, &mut offset)?;
            let expires = match get_u8(buf, &mut offset)? {
                0 => None,
                _ => {
                    let secs = get_i64(buf, &mut offset)?;
                    let dt = DateTime::from_timestamp(secs, 0)
                        .ok_or(JarDecodeError::InvalidTimestamp)?;
                    Some(dt.naive_utc())
                }
            };
            let bits = get_u8(buf, &mut offset)?;
            jar.add(Cookie {
                name,
                value,
                domain,
                path,
                expires,
                secure: bits & COOKIE_SECURE != 0,
                http_only: bits & COOKIE_HTTP_ONLY != 0,
                expired: bits & COOKIE_EXPIRED != 0,
            });
        }

        Ok(jar)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_bytes())
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let buf = fs::read(path)?;
        CookieJar::from_bytes(&buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn get_u8(buf: &[u8], offset: &mut usize) -> Result<u8, JarDecodeError> {
    let v = *buf.get(*offset).ok_or(JarDecodeError::Truncated)?;
    *offset += 1;
    Ok(v)
}

fn get_u32(buf: &[u8], offset: &mut usize) -> Result<u32, JarDecodeError> {
    let end = *offset + 4;
    if end > buf.len() {
        return Err(JarDecodeError::Truncated);
    }
    let v = u32::from_le_bytes(buf[*offset..end].try_into().unwrap());
    *offset = end;
    Ok(v)
}

fn get_i64(buf: &[u8], offset: &mut usize) -> Result<i64, JarDecodeError> {
    let end = *offset + 8;
    if end > buf.len() {
        return Err(JarDecodeError::Truncated);
    }
    let v = i64::from_le_bytes(buf[*offset..end].try_into().unwrap());
    *offset = end;
    Ok(v)
}

fn get_str(buf: &[u8], offset: &mut usize) -> Result<String, JarDecodeError> {
    let len = get_u32(buf, offset)? as usize;
    let end = offset.checked_add(len).ok_or(JarDecodeError::Truncated)?;
    if end > buf.len() {
        return Err(JarDecodeError::Truncated);
    }
    let s = std::str::from_utf8(&buf[*offset..end]).map_err(|_| JarDecodeError::InvalidUtf8)?;
    *offset = end;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use url::Url;

    #[test]
    fn roundtrip() {
        let jar = CookieJar::new(CookieJarPolicy {
            escape_values_on_receive: true,
            unescape_values_on_send: Some(false),
            ignore_set_for_expired: true,
            ..Default::default()
        });
        let url = Url::parse("https://www.example.com/app/home").unwrap();
        jar.set(&url, "sid=abc; Path=/app; Secure; HttpOnly").unwrap();
        jar.set(&url, "lang=en; Domain=.example.com").unwrap();
        let mut tomb = Cookie::new("gone", "x", "www.example.com");
        tomb.expired = true;
        tomb.expires = NaiveDate::from_ymd_opt(2030, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0);
        jar.add(tomb);

        let bytes = jar.to_bytes();
        let restored = CookieJar::from_bytes(&bytes).unwrap();

        assert_eq!(restored.snapshot_all(), jar.snapshot_all());
        assert_eq!(
            restored.policy().unescape_values_on_send,
            jar.policy().unescape_values_on_send
        );
        assert_eq!(
            restored.policy().ignore_set_for_expired,
            jar.policy().ignore_set_for_expired
        );

        // serializing again yields identical bytes
        assert_eq!(restored.to_bytes(), bytes);
    }

    #[test]
    fn empty_jar_roundtrip() {
        let jar = CookieJar::default();
        let restored = CookieJar::from_bytes(&jar.to_bytes()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn bad_version_rejected() {
        let mut bytes = CookieJar::default().to_bytes();
        bytes[0] = 9;
        assert!(matches!(
            CookieJar::from_bytes(&bytes),
            Err(JarDecodeError::InvalidVersion(9))
        ));
    }

    #[test]
    fn truncated_rejected() {
        let jar = CookieJar::default();
        let url = Url::parse("http://example.com/").unwrap();
        jar.set(&url, "a=1").unwrap();
        let bytes = jar.to_bytes();
        assert!(matches!(
            CookieJar::from_bytes(&bytes[..bytes.len() - 2]),
            Err(JarDecodeError::Truncated)
        ));
    }
}
