/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::time::Duration;

use burrow_types::auth::{Password, Username};
use burrow_types::net::HttpBasicAuth;

pub fn proxy_authorization_basic(username: &Username, password: &Password) -> String {
    let auth = HttpBasicAuth::new(username.clone(), password.clone());
    format!("Proxy-Authorization: Basic {}\r\n", auth.encoded_value())
}

pub fn authorization_basic(username: &Username, password: &Password) -> String {
    let auth = HttpBasicAuth::new(username.clone(), password.clone());
    format!("Authorization: Basic {}\r\n", auth.encoded_value())
}

/// Parse a `Keep-Alive: timeout=N, max=M` header value. Unknown parameters
/// are ignored.
pub fn parse_keep_alive_value(value: &str) -> (Option<Duration>, Option<usize>) {
    let mut timeout = None;
    let mut max = None;
    for part in value.split(',') {
        let part = part.trim();
        if let Some((k, v)) = part.split_once('=') {
            match k.trim().to_ascii_lowercase().as_str() {
                "timeout" => {
                    if let Ok(n) = v.trim().parse::<u64>() {
                        timeout = Some(Duration::from_secs(n));
                    }
                }
                "max" => {
                    if let Ok(n) = v.trim().parse::<usize>() {
                        max = Some(n);
                    }
                }
                _ => {}
            }
        }
    }
    (timeout, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_lines() {
        let username = Username::from_original("user").unwrap();
        let password = Password::from_original("pass").unwrap();
        assert_eq!(
            proxy_authorization_basic(&username, &password),
            "Proxy-Authorization: Basic dXNlcjpwYXNz\r\n"
        );
        assert_eq!(
            authorization_basic(&username, &password),
            "Authorization: Basic dXNlcjpwYXNz\r\n"
        );
    }

    #[test]
    fn keep_alive_value() {
        let (timeout, max) = parse_keep_alive_value("timeout=30, max=2");
        assert_eq!(timeout, Some(Duration::from_secs(30)));
        assert_eq!(max, Some(2));

        let (timeout, max) = parse_keep_alive_value("timeout=5");
        assert_eq!(timeout, Some(Duration::from_secs(5)));
        assert_eq!(max, None);

        let (timeout, max) = parse_keep_alive_value("garbage");
        assert_eq!(timeout, None);
        assert_eq!(max, None);
    }
}
