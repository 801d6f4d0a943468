//! Rate-limit aware GET client shared by every request made against one host.
use log::*;
use reqwest::{Url, header::HeaderMap};
use serde::de::DeserializeOwned;
use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{
    error::{CensusError, Result},
    http::{
        clock::Clock,
        transport::{HttpResponse, Transport},
    },
};

/// Upper bound on pages followed by [`RateLimitedClient::get_paginated`].
pub const MAX_PAGES: usize = 100;

const RETRY_AFTER_HEADER: &str = "retry-after";
const REMAINING_HEADERS: [&str; 2] =
    ["x-ratelimit-remaining", "ratelimit-remaining"];
const RESET_HEADERS: [&str; 2] = ["x-ratelimit-reset", "ratelimit-reset"];

/// Limits on waiting and retrying.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Throttled responses tolerated before giving up on a request.
    pub max_throttle_retries: u32,
    /// Upper bound on the sum of all rate-limit waits for one request.
    pub max_total_wait: Duration,
    /// Wait used when a throttled response carries no usable reset hint.
    pub throttle_backoff: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
    /// Retries after a transient network error.
    pub max_transient_retries: u32,
    /// First transient backoff, doubled on each further attempt.
    pub transient_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_throttle_retries: 10,
            max_total_wait: Duration::from_secs(2 * 60 * 60),
            throttle_backoff: Duration::from_secs(2),
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(3660),
            max_transient_retries: 3,
            transient_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    pub remaining: Option<u64>,
    pub reset_at: Option<SystemTime>,
}

/// Quota bookkeeping for a single host. Updated from every response.
#[derive(Debug, Default)]
pub struct RateLimiter {
    state: Mutex<RateLimitState>,
}

impl RateLimiter {
    #[cfg(test)]
    pub fn snapshot(&self) -> RateLimitState {
        *self.lock()
    }

    /// Records quota headers, leaving fields the response omits untouched.
    pub fn update(&self, headers: &HeaderMap) {
        let remaining = header_u64(headers, &REMAINING_HEADERS);
        let reset_at = header_u64(headers, &RESET_HEADERS)
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));

        let mut state = self.lock();
        if remaining.is_some() {
            state.remaining = remaining;
        }
        if reset_at.is_some() {
            state.reset_at = reset_at;
        }
    }

    /// Time left until the quota resets, if it is currently exhausted.
    pub fn pending_wait(&self, now: SystemTime) -> Option<Duration> {
        let state = self.lock();
        match (state.remaining, state.reset_at) {
            (Some(0), Some(reset_at)) => reset_at
                .duration_since(now)
                .ok()
                .filter(|wait| !wait.is_zero()),
            _ => None,
        }
    }

    pub fn clear(&self) {
        *self.lock() = RateLimitState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RateLimitState> {
        // the state is plain data, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// GET client that waits out throttling and retries transient failures.
///
/// Non-2xx responses other than 403/429 are handed back untouched so callers
/// can treat 404 as "try the next location".
pub struct RateLimitedClient {
    transport: Box<dyn Transport>,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl RateLimitedClient {
    pub fn new(
        transport: Box<dyn Transport>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            clock,
            limiter: RateLimiter::default(),
            policy,
        }
    }

    pub async fn get(
        &self,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<HttpResponse> {
        let mut throttled = 0;
        let mut transient = 0;
        let mut total_wait = Duration::ZERO;

        loop {
            if let Some(wait) = self.limiter.pending_wait(self.clock.now()) {
                let wait = self.clamp(wait);
                total_wait += wait;
                if total_wait > self.policy.max_total_wait {
                    return Err(CensusError::RateLimitExceeded {
                        url: url.to_string(),
                        attempts: throttled,
                    });
                }
                info!(
                    "rate limit quota exhausted: waiting {}s before \
                     requesting {url}",
                    wait.as_secs()
                );
                self.clock.sleep(wait).await;
                self.limiter.clear();
            }

            let response = match self.transport.send(url, headers).await {
                Ok(response) => response,
                Err(err) if err.is_transient() => {
                    transient += 1;
                    if transient > self.policy.max_transient_retries {
                        return Err(err);
                    }
                    let backoff =
                        self.policy.transient_backoff * 2u32.pow(transient - 1);
                    warn!(
                        "request to {url} failed: {err}: retrying in {}s",
                        backoff.as_secs()
                    );
                    self.clock.sleep(backoff).await;
                    continue;
                }
                Err(err) => return Err(err),
            };

            self.limiter.update(&response.headers);

            if !is_throttled(&response) {
                return Ok(response);
            }

            throttled += 1;
            if throttled > self.policy.max_throttle_retries {
                return Err(CensusError::RateLimitExceeded {
                    url: url.to_string(),
                    attempts: throttled,
                });
            }

            let wait = self.throttle_wait(&response.headers);
            total_wait += wait;
            if total_wait > self.policy.max_total_wait {
                return Err(CensusError::RateLimitExceeded {
                    url: url.to_string(),
                    attempts: throttled,
                });
            }

            warn!(
                "rate limit exceeded ({}): waiting {}s before retrying {url}",
                response.status,
                wait.as_secs()
            );
            self.clock.sleep(wait).await;
            self.limiter.clear();
        }
    }

    /// Follows `Link: rel="next"` headers, collecting every page. Stops at an
    /// empty page, a missing link, or [`MAX_PAGES`].
    pub async fn get_paginated<T: DeserializeOwned>(
        &self,
        first_page: Url,
        headers: &HeaderMap,
    ) -> Result<Vec<T>> {
        let mut items = vec![];
        let mut next = Some(first_page);
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages >= MAX_PAGES {
                warn!("stopping pagination after {MAX_PAGES} pages at {url}");
                break;
            }
            pages += 1;

            debug!("fetching page {pages}: {url}");
            let response =
                self.get(&url, headers).await?.error_for_status(&url)?;
            let page: Vec<T> = response.json()?;

            if page.is_empty() {
                break;
            }

            items.extend(page);
            next = next_page_url(&response.headers);
        }

        Ok(items)
    }

    fn throttle_wait(&self, headers: &HeaderMap) -> Duration {
        if let Some(secs) = header_u64(headers, &[RETRY_AFTER_HEADER]) {
            return self.clamp(Duration::from_secs(secs));
        }

        let now = self.clock.now();
        let until_reset = header_u64(headers, &RESET_HEADERS)
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
            .and_then(|reset_at| reset_at.duration_since(now).ok())
            .filter(|wait| !wait.is_zero());

        self.clamp(until_reset.unwrap_or(self.policy.throttle_backoff))
    }

    fn clamp(&self, wait: Duration) -> Duration {
        wait.clamp(self.policy.min_wait, self.policy.max_wait)
    }
}

fn is_throttled(response: &HttpResponse) -> bool {
    matches!(response.status.as_u16(), 403 | 429)
}

fn header_u64(headers: &HeaderMap, names: &[&str]) -> Option<u64> {
    names.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    })
}

/// Extracts the `rel="next"` target from an RFC 5988 `Link` header.
pub fn next_page_url(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get("link")?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let mut sections = part.split(';');
        let target = sections.next()?.trim();
        let is_next = sections.any(|param| {
            let param = param.trim().replace(' ', "");
            param == r#"rel="next""# || param == "rel=next"
        });

        if !is_next {
            return None;
        }

        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}
