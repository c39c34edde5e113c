/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

//! Repair filters applied to raw `Set-Cookie` strings before parsing.
//!
//! Real-world servers emit a handful of recurring defects; each filter
//! fixes exactly one of them and can be toggled off on the jar policy.

/// Strip the leading dot of a single-label domain attribute; deeper
/// domains keep their dot. Empty or whitespace-only input yields nothing.
pub fn filter_domain(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(rest) = value.strip_prefix('.') {
        if !rest.contains('.') {
            return Some(rest.to_string());
        }
    }
    Some(value.to_string())
}

/// Truncate everything between `path=/` and the next `;` so a junk-bearing
/// root path attribute collapses to the root.
pub fn filter_root_path(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    let Some(start) = lower.find("path=/") else {
        return raw.to_string();
    };
    let rest_at = start + "path=/".len();
    if rest_at >= raw.len() || raw.as_bytes()[rest_at] == b';' {
        return raw.to_string();
    }
    let end = memchr::memchr(b';', &raw.as_bytes()[rest_at..])
        .map(|i| rest_at + i)
        .unwrap_or(raw.len());
    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..rest_at]);
    out.push_str(&raw[end..]);
    out
}

/// Rewrite a year-9999 expiry to 9998 in place, so downstream date parsers
/// with a year-9999 overflow stay safe. Only the final digit of the first
/// `9999` run after `expires=` changes.
pub fn filter_invalid_expire_year(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    let Some(attr) = lower.find("expires=") else {
        return raw.to_string();
    };
    let Some(found) = lower[attr..].find("9999") else {
        return raw.to_string();
    };
    let mut out = raw.as_bytes().to_vec();
    out[attr + found + 3] = b'8';
    // the filter only touches ascii digits, the string stays valid utf-8
    String::from_utf8(out).unwrap_or_else(|_| raw.to_string())
}

/// Percent-escape a `,` that ends the value segment (the char right before
/// the first `;`, or the final char when no attribute follows).
pub fn filter_trailing_comma(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let Some(eq) = memchr::memchr(b'=', bytes) else {
        return raw.to_string();
    };
    let boundary = memchr::memchr(b';', &bytes[eq..])
        .map(|i| eq + i)
        .unwrap_or(raw.len());
    if boundary == 0 || bytes[boundary - 1] != b',' {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len() + 2);
    out.push_str(&raw[..boundary - 1]);
    out.push_str("%2C");
    out.push_str(&raw[boundary..]);
    out
}
