/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::io::Write;

use http::{HeaderMap, Version};
use url::Url;

use burrow_types::net::{HttpAuth, HttpProxy, scheme_default_port};

use crate::Request;
use crate::cookie::CookieJar;

/// per-send framing context
pub(crate) struct FramerEnv<'a> {
    /// set iff the request is forwarded untunneled through an http proxy
    pub(crate) forward_proxy: Option<&'a HttpProxy>,
    pub(crate) keep_alive: bool,
    /// the client-wide protocol version, used when the request has no
    /// override
    pub(crate) http_version: Version,
    pub(crate) locale: &'a str,
    pub(crate) charset: &'a str,
}

/// `Host` value: the uri authority, port elided when it is the scheme
/// default.
pub(crate) fn host_header_value(uri: &Url) -> String {
    let host = uri.host_str().unwrap_or_default();
    match uri.port() {
        Some(port) if scheme_default_port(uri.scheme()) != Some(port) => {
            format!("{host}:{port}")
        }
        _ => host.to_string(),
    }
}

fn path_and_query(uri: &Url) -> String {
    match uri.query() {
        Some(query) => format!("{}?{query}", uri.path()),
        None => uri.path().to_string(),
    }
}

fn version_token(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "HTTP/1.0",
        _ => "HTTP/1.1",
    }
}

fn accept_language_value(locale: &str) -> Option<String> {
    if locale.is_empty() {
        return None;
    }
    if locale.starts_with("en") {
        return Some(locale.to_string());
    }
    let lang = locale.split(['-', '_']).next().unwrap_or(locale);
    Some(format!("{locale},{lang};q=0.8,en-US;q=0.6,en;q=0.4"))
}

fn accept_charset_value(charset: &str) -> Option<String> {
    if charset.is_empty() {
        return None;
    }
    if charset.eq_ignore_ascii_case("utf-8") {
        Some("utf-8;q=0.7,*;q=0.3".to_string())
    } else {
        Some(format!("{charset},utf-8;q=0.7,*;q=0.3"))
    }
}

/// case-insensitive last-writer-wins overlay that keeps the position of a
/// replaced header
fn overlay(headers: &mut Vec<(String, String)>, map: &HeaderMap, allow_empty: bool) {
    for (name, value) in map.iter() {
        let Ok(value) = value.to_str() else {
            continue;
        };
        if value.is_empty() && !allow_empty {
            continue;
        }
        match headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name.as_str()))
        {
            Some(slot) => slot.1 = value.to_string(),
            None => headers.push((name.as_str().to_string(), value.to_string())),
        }
    }
}

/// Assemble the start line and the full header block, in the fixed order:
/// host, connection policy, proxy credentials, origin credentials, accept
/// negotiation, body metadata; then the permanent and temporary overlays;
/// then cookies from the jar unless one was set directly.
pub(crate) fn assemble_request_head(
    request: &Request,
    content_meta: Option<&(String, Option<u64>)>,
    jar: Option<&CookieJar>,
    env: &FramerEnv<'_>,
) -> Vec<u8> {
    let mut headers: Vec<(String, String)> = Vec::with_capacity(16);

    headers.push(("Host".to_string(), host_header_value(&request.uri)));

    let conn_value = if env.keep_alive { "keep-alive" } else { "close" };
    if env.forward_proxy.is_some() {
        headers.push(("Proxy-Connection".to_string(), conn_value.to_string()));
    } else {
        headers.push(("Connection".to_string(), conn_value.to_string()));
    }

    if let Some(proxy) = env.forward_proxy {
        if let HttpAuth::Basic(basic) = &proxy.auth {
            headers.push((
                "Proxy-Authorization".to_string(),
                format!("Basic {}", basic.encoded_value()),
            ));
        }
    }

    if let HttpAuth::Basic(basic) = &request.options.auth {
        headers.push((
            "Authorization".to_string(),
            format!("Basic {}", basic.encoded_value()),
        ));
    }

    if request.options.accept_content_encoding() {
        headers.push(("Accept-Encoding".to_string(), "gzip,deflate".to_string()));
    }

    if let Some(v) = accept_language_value(env.locale) {
        headers.push(("Accept-Language".to_string(), v));
    }
    if let Some(v) = accept_charset_value(env.charset) {
        headers.push(("Accept-Charset".to_string(), v));
    }

    if let Some((content_type, content_length)) = content_meta {
        headers.push(("Content-Type".to_string(), content_type.clone()));
        if let Some(len) = content_length {
            headers.push(("Content-Length".to_string(), len.to_string()));
        }
    }

    overlay(
        &mut headers,
        &request.headers,
        request.options.allow_empty_header_values,
    );
    overlay(
        &mut headers,
        &request.temporary_headers,
        request.options.allow_empty_header_values,
    );

    let cookie_set_directly = headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("cookie"));
    if request.options.use_cookies() && !cookie_set_directly {
        if let Some(jar) = jar {
            if request.options.cookie_single_header() {
                if let Some(v) = jar.header_value(&request.uri) {
                    headers.push(("Cookie".to_string(), v));
                }
            } else {
                for v in jar.header_values(&request.uri) {
                    headers.push(("Cookie".to_string(), v));
                }
            }
        }
    }

    let mut buf = Vec::with_capacity(512);
    let target = match env.forward_proxy {
        Some(proxy) if proxy.absolute_uri_in_start_line => format!(
            "{}://{}{}",
            request.uri.scheme(),
            host_header_value(&request.uri),
            path_and_query(&request.uri)
        ),
        _ => path_and_query(&request.uri),
    };
    let _ = write!(
        buf,
        "{} {} {}\r\n",
        request.method,
        target,
        version_token(request.version.unwrap_or(env.http_version))
    );
    for (name, value) in &headers {
        let _ = write!(buf, "{name}: {value}\r\n");
    }
    buf.extend_from_slice(b"\r\n");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use url::Url;

    use burrow_types::net::UpstreamAddr;

    fn env<'a>() -> FramerEnv<'a> {
        FramerEnv {
            forward_proxy: None,
            keep_alive: true,
            http_version: Version::HTTP_11,
            locale: "en-US",
            charset: "utf-8",
        }
    }

    fn head_to_lines(buf: &[u8]) -> Vec<String> {
        let text = std::str::from_utf8(buf).unwrap();
        assert!(text.ends_with("\r\n\r\n"));
        text.trim_end().lines().map(str::to_string).collect()
    }

    #[test]
    fn host_value_elides_default_port() {
        let uri = Url::parse("https://example.com:443/a").unwrap();
        assert_eq!(host_header_value(&uri), "example.com");
        let uri = Url::parse("http://example.com:8080/a").unwrap();
        assert_eq!(host_header_value(&uri), "example.com:8080");
    }

    #[test]
    fn base_assembly_order() {
        let request = Request::new(Method::GET, "http://example.com/a?b=1").unwrap();
        let head = assemble_request_head(&request, None, None, &env());
        let lines = head_to_lines(&head);
        assert_eq!(lines[0], "GET /a?b=1 HTTP/1.1");
        assert_eq!(lines[1], "Host: example.com");
        assert_eq!(lines[2], "Connection: keep-alive");
        assert_eq!(lines[3], "Accept-Encoding: gzip,deflate");
        assert_eq!(lines[4], "Accept-Language: en-US");
        assert_eq!(lines[5], "Accept-Charset: utf-8;q=0.7,*;q=0.3");
        assert_eq!(lines.len(), 6);

        // exactly one host header
        let hosts = lines
            .iter()
            .filter(|l| l.to_ascii_lowercase().starts_with("host:"))
            .count();
        assert_eq!(hosts, 1);
    }

    #[test]
    fn body_meta_appended() {
        let request = Request::new(Method::POST, "http://example.com/x").unwrap();
        let meta = ("text/plain".to_string(), Some(3u64));
        let head = assemble_request_head(&request, Some(&meta), None, &env());
        let lines = head_to_lines(&head);
        assert!(lines.contains(&"Content-Type: text/plain".to_string()));
        assert!(lines.contains(&"Content-Length: 3".to_string()));
    }

    #[test]
    fn overlay_replaces_in_place() {
        let mut request = Request::new(Method::GET, "http://example.com/").unwrap();
        request.set_header("Accept-Language", "fr").unwrap();
        request.set_temporary_header("X-Trace", "t1").unwrap();
        let head = assemble_request_head(&request, None, None, &env());
        let lines = head_to_lines(&head);
        // replaced value keeps the base position
        assert_eq!(lines[4], "Accept-Language: fr");
        assert_eq!(lines.last().unwrap(), "X-Trace: t1");
    }

    #[test]
    fn empty_header_values_skipped_by_default() {
        let mut request = Request::new(Method::GET, "http://example.com/").unwrap();
        request.set_header("X-Empty", "").unwrap();
        let head = assemble_request_head(&request, None, None, &env());
        assert!(!String::from_utf8(head).unwrap().contains("X-Empty"));

        let mut request = Request::new(Method::GET, "http://example.com/").unwrap();
        request.options.allow_empty_header_values = true;
        request.set_header("X-Empty", "").unwrap();
        let head = assemble_request_head(&request, None, None, &env());
        assert!(String::from_utf8(head).unwrap().contains("X-Empty: \r\n"));
    }

    #[test]
    fn forward_proxy_uses_absolute_uri() {
        let request = Request::new(Method::GET, "http://example.com/a").unwrap();
        let peer = UpstreamAddr::from_host_str_and_port("proxy.local", 8080).unwrap();
        let proxy = HttpProxy::new(peer);
        let env = FramerEnv {
            forward_proxy: Some(&proxy),
            keep_alive: true,
            http_version: Version::HTTP_11,
            locale: "en-US",
            charset: "utf-8",
        };
        let head = assemble_request_head(&request, None, None, &env);
        let lines = head_to_lines(&head);
        assert_eq!(lines[0], "GET http://example.com/a HTTP/1.1");
        assert_eq!(lines[2], "Proxy-Connection: keep-alive");
    }

    #[test]
    fn cookie_from_jar_idempotent() {
        use crate::cookie::CookieJar;

        let jar = CookieJar::default();
        let uri = Url::parse("http://example.com/").unwrap();
        jar.set(&uri, "a=1").unwrap();
        jar.set(&uri, "b=2").unwrap();

        let request = Request::new(Method::GET, "http://example.com/").unwrap();
        let first = assemble_request_head(&request, None, Some(&jar), &env());
        let second = assemble_request_head(&request, None, Some(&jar), &env());
        assert_eq!(first, second);
        assert!(
            String::from_utf8(first)
                .unwrap()
                .contains("Cookie: a=1; b=2\r\n")
        );
    }

    #[test]
    fn direct_cookie_header_wins_over_jar() {
        use crate::cookie::CookieJar;

        let jar = CookieJar::default();
        let uri = Url::parse("http://example.com/").unwrap();
        jar.set(&uri, "a=1").unwrap();

        let mut request = Request::new(Method::GET, "http://example.com/").unwrap();
        request.set_header("Cookie", "manual=1").unwrap();
        let head = assemble_request_head(&request, None, Some(&jar), &env());
        let text = String::from_utf8(head).unwrap();
        assert!(text.contains("Cookie: manual=1\r\n"));
        assert!(!text.contains("a=1"));
    }

    #[test]
    fn per_cookie_headers() {
        use crate::cookie::CookieJar;

        let jar = CookieJar::default();
        let uri = Url::parse("http://example.com/").unwrap();
        jar.set(&uri, "a=1").unwrap();
        jar.set(&uri, "b=2").unwrap();

        let mut request = Request::new(Method::GET, "http://example.com/").unwrap();
        request.options.cookie_single_header = Some(false);
        let head = assemble_request_head(&request, None, Some(&jar), &env());
        let text = String::from_utf8(head).unwrap();
        assert!(text.contains("Cookie: a=1\r\n"));
        assert!(text.contains("Cookie: b=2\r\n"));
    }

    #[test]
    fn accept_language_for_other_locales() {
        assert_eq!(accept_language_value("en-GB").unwrap(), "en-GB");
        assert_eq!(
            accept_language_value("de-DE").unwrap(),
            "de-DE,de;q=0.8,en-US;q=0.6,en;q=0.4"
        );
        assert_eq!(accept_language_value(""), None);
    }

    #[test]
    fn accept_charset_for_other_charsets() {
        assert_eq!(accept_charset_value("utf-8").unwrap(), "utf-8;q=0.7,*;q=0.3");
        assert_eq!(
            accept_charset_value("iso-8859-1").unwrap(),
            "iso-8859-1,utf-8;q=0.7,*;q=0.3"
        );
    }

    #[test]
    fn close_policy() {
        let request = Request::new(Method::GET, "http://example.com/").unwrap();
        let env = FramerEnv {
            forward_proxy: None,
            keep_alive: false,
            http_version: Version::HTTP_11,
            locale: "en-US",
            charset: "utf-8",
        };
        let head = assemble_request_head(&request, None, None, &env);
        assert!(
            String::from_utf8(head)
                .unwrap()
                .contains("Connection: close\r\n")
        );
    }

    #[test]
    fn version_tokens() {
        assert_eq!(version_token(Version::HTTP_10), "HTTP/1.0");
        assert_eq!(version_token(Version::HTTP_11), "HTTP/1.1");
    }

    #[test]
    fn configured_version_drives_start_line() {
        let mut request = Request::new(Method::GET, "http://example.com/a").unwrap();
        let env = FramerEnv {
            http_version: Version::HTTP_10,
            ..env()
        };
        let head = assemble_request_head(&request, None, None, &env);
        let lines = head_to_lines(&head);
        assert_eq!(lines[0], "GET /a HTTP/1.0");

        // a per-request override beats the client configuration
        request.set_version(Version::HTTP_11);
        let head = assemble_request_head(&request, None, None, &env);
        let lines = head_to_lines(&head);
        assert_eq!(lines[0], "GET /a HTTP/1.1");
    }
}
