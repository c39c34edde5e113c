/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the Burrow project authors.
 */

use std::time::Duration;

const DEFAULT_HTTP_KEEPALIVE_IDLE: u64 = 30;
const DEFAULT_HTTP_KEEPALIVE_MAX_REQUESTS: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HttpKeepAliveConfig {
    enabled: bool,
    idle_expire: Duration,
    max_requests: usize,
}

impl Default for HttpKeepAliveConfig {
    fn default() -> Self {
        HttpKeepAliveConfig {
            enabled: true,
            idle_expire: Duration::from_secs(DEFAULT_HTTP_KEEPALIVE_IDLE),
            max_requests: DEFAULT_HTTP_KEEPALIVE_MAX_REQUESTS,
        }
    }
}

impl HttpKeepAliveConfig {
    pub fn new(idle_expire: Duration, max_requests: usize) -> Self {
        HttpKeepAliveConfig {
            enabled: true,
            idle_expire,
            max_requests,
        }
    }

    pub fn set_enable(&mut self, enable: bool) {
        self.enabled = enable;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_idle_expire(&mut self, idle_expire: Duration) {
        self.idle_expire = idle_expire;
    }

    #[inline]
    pub fn idle_expire(&self) -> Duration {
        if self.enabled {
            self.idle_expire
        } else {
            Duration::ZERO
        }
    }

    pub fn set_max_requests(&mut self, max_requests: usize) {
        self.max_requests = max_requests;
    }

    #[inline]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Fold in limits advertised by the server through `Keep-Alive: timeout=, max=`.
    #[must_use]
    pub fn apply_advertised(self, timeout: Option<Duration>, max: Option<usize>) -> Self {
        HttpKeepAliveConfig {
            enabled: self.enabled,
            idle_expire: timeout.unwrap_or(self.idle_expire),
            max_requests: max.unwrap_or(self.max_requests),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertised_overrides() {
        let config = HttpKeepAliveConfig::default();
        let adjusted = config.apply_advertised(Some(Duration::from_secs(5)), Some(2));
        assert_eq!(adjusted.idle_expire(), Duration::from_secs(5));
        assert_eq!(adjusted.max_requests(), 2);

        let kept = config.apply_advertised(None, None);
        assert_eq!(kept, config);
    }

    #[test]
    fn disabled_idle_is_zero() {
        let mut config = HttpKeepAliveConfig::default();
        config.set_enable(false);
        assert_eq!(config.idle_expire(), Duration::ZERO);
    }
}
