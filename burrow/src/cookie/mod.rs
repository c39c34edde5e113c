/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use thiserror::Error;
use url::Url;

mod filter;
pub use filter::{
    filter_domain, filter_invalid_expire_year, filter_root_path, filter_trailing_comma,
};

mod serial;
pub use serial::JarDecodeError;

#[derive(Debug, Error)]
#[error("invalid cookie name '{0}'")]
pub struct InvalidCookie(pub String);

/// characters a stored cookie value gets percent-escaped with
const VALUE_ESCAPE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'\\');

const NAME_FORBIDDEN_CHARS: [char; 7] = [' ', '\t', '\r', '\n', '=', ';', ','];

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// may carry a leading dot for subdomain-wide cookies
    pub domain: String,
    pub path: String,
    pub expires: Option<NaiveDateTime>,
    pub secure: bool,
    pub http_only: bool,
    /// tombstone set by expire-before-set
    pub expired: bool,
}

impl Cookie {
    pub fn new(name: &str, value: &str, domain: &str) -> Self {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            expired: false,
        }
    }

    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        if self.expired {
            return true;
        }
        match self.expires {
            Some(expires) => expires <= now,
            None => false,
        }
    }

    /// rfc6265 domain-match: host equals the domain, or the domain has a
    /// leading dot and the host ends with it
    pub fn domain_matches(&self, host: &str) -> bool {
        if self.domain.starts_with('.') {
            host.ends_with(self.domain.as_str())
        } else {
            host.eq_ignore_ascii_case(self.domain.as_str())
        }
    }

    pub fn path_matches(&self, path: &str) -> bool {
        path.starts_with(self.path.as_str())
    }
}

/// parsers downstream of the jar overflow on year 9999, so expiry stops one
/// day short of it
fn max_expiry() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(9998, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or(NaiveDateTime::MAX)
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

fn parse_expires(value: &str) -> Option<NaiveDateTime> {
    let parsed = DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.with_timezone(&Local).naive_local())
        .ok()
        .or_else(|| {
            // tolerate the old dashed netscape format, and a weekday left
            // inconsistent by the year-9999 repair (rfc2822 parsing checks
            // it, this path does not)
            let tail = value
                .split_once(',')
                .map(|(_, tail)| tail.trim())
                .unwrap_or(value)
                .replace('-', " ");
            NaiveDateTime::parse_from_str(&tail, "%d %b %Y %H:%M:%S GMT")
                .ok()
                .map(|naive| naive.and_utc().with_timezone(&Local).naive_local())
        })?;
    if parsed.date().year() >= 9999 {
        Some(max_expiry())
    } else {
        Some(parsed)
    }
}

#[derive(Debug, Clone)]
pub struct CookieJarPolicy {
    /// percent-escape values as they are stored
    pub escape_values_on_receive: bool,
    /// unescape values as they are sent; `None` follows
    /// `escape_values_on_receive`
    pub unescape_values_on_send: Option<bool>,
    /// silently drop cookies with reserved characters in the name instead
    /// of raising `InvalidCookie`
    pub ignore_invalid_cookie: bool,
    /// drop incoming cookies that are already expired
    pub ignore_set_for_expired: bool,
    /// mark same-(domain, name) cookies expired before every insert
    pub expire_before_set: bool,
    pub filter_trim: bool,
    pub filter_root_path: bool,
    pub filter_expire_year: bool,
    pub filter_trailing_comma: bool,
}

impl Default for CookieJarPolicy {
    fn default() -> Self {
        CookieJarPolicy {
            escape_values_on_receive: false,
            unescape_values_on_send: None,
            ignore_invalid_cookie: true,
            ignore_set_for_expired: false,
            expire_before_set: true,
            filter_trim: true,
            filter_root_path: false,
            filter_expire_year: true,
            filter_trailing_comma: true,
        }
    }
}

impl CookieJarPolicy {
    fn unescape_on_send(&self) -> bool {
        self.unescape_values_on_send
            .unwrap_or(self.escape_values_on_receive)
    }
}

type CookieKey = (String, String, String); // (domain, path, name)

/// A domain-scoped cookie store, shareable between requests. Mutations are
/// serialized through the inner lock; reads take a consistent snapshot.
#[derive(Default)]
pub struct CookieJar {
    policy: CookieJarPolicy,
    inner: Mutex<HashMap<CookieKey, Cookie>>,
}

impl CookieJar {
    pub fn new(policy: CookieJarPolicy) -> Self {
        CookieJar {
            policy,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &CookieJarPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.lock_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_map().is_empty()
    }

    pub fn clear(&self) {
        self.lock_map().clear();
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<CookieKey, Cookie>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a cookie as-is, replacing any cookie with the same
    /// (domain, path, name).
    pub fn add(&self, cookie: Cookie) {
        let key = (
            cookie.domain.clone(),
            cookie.path.clone(),
            cookie.name.clone(),
        );
        self.lock_map().insert(key, cookie);
    }

    /// Accept one raw `Set-Cookie` value for the given request url.
    pub fn set(&self, url: &Url, raw_value: &str) -> Result<(), InvalidCookie> {
        let mut raw = raw_value.to_string();
        if self.policy.filter_trim {
            raw = raw.trim().to_string();
        }
        if self.policy.filter_trailing_comma {
            raw = filter_trailing_comma(&raw);
        }
        if self.policy.filter_expire_year {
            raw = filter_invalid_expire_year(&raw);
        }
        if self.policy.filter_root_path {
            raw = filter_root_path(&raw);
        }

        let mut tokens = raw.split(';').map(str::trim).filter(|t| !t.is_empty());

        let Some(pair) = tokens.next() else {
            return self.reject(raw_value);
        };
        let Some((name, value)) = pair.split_once('=') else {
            return self.reject(pair);
        };
        let name = name.trim();
        if name.is_empty() || name.starts_with('$') || name.contains(NAME_FORBIDDEN_CHARS) {
            return self.reject(name);
        }

        let value = value.trim();
        let value = if self.policy.escape_values_on_receive {
            utf8_percent_encode(value, VALUE_ESCAPE_SET).to_string()
        } else {
            value.to_string()
        };

        let mut expires = None;
        let mut path_attr: Option<String> = None;
        let mut domain_attr: Option<String> = None;
        let mut secure = false;
        let mut http_only = false;

        for token in tokens {
            match token.split_once('=') {
                Some((k, v)) => match k.trim().to_ascii_lowercase().as_str() {
                    "expires" => expires = parse_expires(v.trim()),
                    "path" => path_attr = Some(v.trim().to_string()),
                    "domain" => domain_attr = filter_domain(v),
                    _ => {}
                },
                None => match token.to_ascii_lowercase().as_str() {
                    "secure" => secure = true,
                    "httponly" => http_only = true,
                    _ => {}
                },
            }
        }

        // with no domain attribute the request host scopes the cookie,
        // unless a dotted non-path "path" attribute is really a domain
        let host = url.host_str().unwrap_or_default().to_string();
        let domain = match domain_attr {
            Some(d) => d,
            None => match &path_attr {
                Some(p) if !p.is_empty() && !p.starts_with('/') => {
                    if p.contains('.') {
                        let d = p.clone();
                        path_attr = None;
                        d
                    } else {
                        host
                    }
                }
                _ => host,
            },
        };

        let path = match path_attr {
            Some(p) if !p.is_empty() => p,
            _ => "/".to_string(),
        };

        let cookie = Cookie {
            name: name.to_string(),
            value,
            domain: domain.clone(),
            path: path.clone(),
            expires,
            secure,
            http_only,
            expired: false,
        };

        if self.policy.ignore_set_for_expired && cookie.is_expired_at(now_local()) {
            return Ok(());
        }

        let mut map = self.lock_map();
        if self.policy.expire_before_set {
            for (key, existing) in map.iter_mut() {
                if key.0 == domain && key.2 == name {
                    existing.expired = true;
                }
            }
        }
        map.insert((domain, path, name.to_string()), cookie);
        Ok(())
    }

    fn reject(&self, name: &str) -> Result<(), InvalidCookie> {
        if self.policy.ignore_invalid_cookie {
            Ok(())
        } else {
            Err(InvalidCookie(name.to_string()))
        }
    }

    /// Snapshot of the cookies to send for one request url, ordered by
    /// (domain, path, name) so repeated calls format identically.
    pub fn cookies_for(&self, url: &Url) -> Vec<Cookie> {
        let host = url.host_str().unwrap_or_default();
        let path = url.path();
        let secure_scheme = url.scheme().eq_ignore_ascii_case("https");
        let now = now_local();

        let map = self.lock_map();
        let mut matched: Vec<Cookie> = map
            .values()
            .filter(|c| {
                !c.is_expired_at(now)
                    && c.domain_matches(host)
                    && c.path_matches(path)
                    && (!c.secure || secure_scheme)
            })
            .cloned()
            .collect();
        drop(map);

        matched.sort_by(|a, b| {
            (&a.domain, &a.path, &a.name).cmp(&(&b.domain, &b.path, &b.name))
        });
        matched
    }

    fn send_value(&self, cookie: &Cookie) -> String {
        if self.policy.unescape_on_send() {
            percent_decode_str(&cookie.value)
                .decode_utf8()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| cookie.value.clone())
        } else {
            cookie.value.clone()
        }
    }

    /// One combined `Cookie` header value, or nothing when no cookie
    /// matches.
    pub fn header_value(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies_for(url);
        if cookies.is_empty() {
            return None;
        }
        let parts: Vec<String> = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, self.send_value(c)))
            .collect();
        Some(parts.join("; "))
    }

    /// One `k=v` value per matching cookie, for one-header-per-cookie mode.
    pub fn header_values(&self, url: &Url) -> Vec<String> {
        self.cookies_for(url)
            .iter()
            .map(|c| format!("{}={}", c.name, self.send_value(c)))
            .collect()
    }

    pub(crate) fn snapshot_all(&self) -> Vec<Cookie> {
        let map = self.lock_map();
        let mut all: Vec<Cookie> = map.values().cloned().collect();
        drop(map);
        all.sort_by(|a, b| (&a.domain, &a.path, &a.name).cmp(&(&b.domain, &b.path, &b.name)));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn set_and_match() {
        let jar = CookieJar::default();
        jar.set(&url("http://www.example.com/a/b"), "sid=abc123; Path=/a")
            .unwrap();

        assert_eq!(
            jar.header_value(&url("http://www.example.com/a/b")).unwrap(),
            "sid=abc123"
        );
        // path does not prefix
        assert!(jar.header_value(&url("http://www.example.com/c")).is_none());
        // other host
        assert!(jar.header_value(&url("http://other.example.com/a")).is_none());
    }

    #[test]
    fn dotted_domain_matches_subdomains() {
        let jar = CookieJar::default();
        jar.set(
            &url("http://www.example.com/"),
            "lang=en; Domain=.example.com",
        )
        .unwrap();

        assert!(jar.header_value(&url("http://www.example.com/")).is_some());
        assert!(jar.header_value(&url("http://a.b.example.com/")).is_some());
        // the bare apex does not end with ".example.com"
        assert!(jar.header_value(&url("http://example.com/")).is_none());
    }

    #[test]
    fn secure_requires_https() {
        let jar = CookieJar::default();
        jar.set(&url("https://example.com/"), "token=1; Secure")
            .unwrap();
        assert!(jar.header_value(&url("https://example.com/")).is_some());
        assert!(jar.header_value(&url("http://example.com/")).is_none());
    }

    #[test]
    fn expired_not_sent() {
        let jar = CookieJar::default();
        jar.set(
            &url("http://example.com/"),
            "old=1; expires=Fri, 01 Jan 2010 00:00:00 GMT",
        )
        .unwrap();
        assert!(jar.header_value(&url("http://example.com/")).is_none());
    }

    #[test]
    fn year_9999_clamped() {
        let jar = CookieJar::default();
        jar.set(
            &url("http://example.com/"),
            "forever=1; expires=Fri, 31 Dec 9999 23:59:59 GMT",
        )
        .unwrap();
        let cookies = jar.cookies_for(&url("http://example.com/"));
        assert_eq!(cookies.len(), 1);
        let expires = cookies[0].expires.unwrap();
        assert_eq!(expires.date().year(), 9998);
    }

    #[test]
    fn expire_before_set_tombstones() {
        let jar = CookieJar::default();
        jar.set(&url("http://example.com/"), "sid=one; Path=/a").unwrap();
        jar.set(&url("http://example.com/"), "sid=two; Path=/b").unwrap();

        // the /a cookie was tombstoned when /b arrived
        assert!(jar.header_value(&url("http://example.com/a")).is_none());
        assert_eq!(
            jar.header_value(&url("http://example.com/b")).unwrap(),
            "sid=two"
        );
    }

    #[test]
    fn invalid_names_dropped_or_raised() {
        let jar = CookieJar::default();
        jar.set(&url("http://example.com/"), "$bad=1").unwrap();
        jar.set(&url("http://example.com/"), "no-equals-sign").unwrap();
        assert!(jar.is_empty());

        let strict = CookieJar::new(CookieJarPolicy {
            ignore_invalid_cookie: false,
            ..Default::default()
        });
        assert!(strict.set(&url("http://example.com/"), "$bad=1").is_err());
    }

    #[test]
    fn escape_and_unescape_roundtrip() {
        let jar = CookieJar::new(CookieJarPolicy {
            escape_values_on_receive: true,
            ..Default::default()
        });
        jar.set(&url("http://example.com/"), "q=a b;").unwrap();

        let cookies = jar.cookies_for(&url("http://example.com/"));
        assert_eq!(cookies[0].value, "a%20b");
        // unescape follows escape by default
        assert_eq!(
            jar.header_value(&url("http://example.com/")).unwrap(),
            "q=a b"
        );
    }

    #[test]
    fn match_is_idempotent() {
        let jar = CookieJar::default();
        jar.set(&url("http://example.com/"), "a=1").unwrap();
        jar.set(&url("http://example.com/"), "b=2").unwrap();
        let u = url("http://example.com/");
        let first = jar.header_value(&u).unwrap();
        let second = jar.header_value(&u).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "a=1; b=2");
    }

    #[test]
    fn path_attribute_as_domain() {
        let jar = CookieJar::default();
        // a dotted non-path "path" attribute is really a domain
        jar.set(&url("http://example.com/"), "x=1; path=tracker.example.com")
            .unwrap();
        let cookies = jar.cookies_for(&url("http://tracker.example.com/deep/path"));
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].path, "/");
    }
}
