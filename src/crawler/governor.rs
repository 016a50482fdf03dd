//! Fetch governor
//!
//! Every request to the target site passes through one `FetchGovernor`. It
//! spaces requests process-wide, adds random jitter, retries rate-limited
//! responses with linear backoff and a rotated user agent, and aborts any
//! wait as soon as the caller's cancellation token fires.

use crate::config::{Config, FetchConfig, UserAgentConfig};
use crate::state::FetchState;
use crate::{AvitologError, FetchCause, Result};
use rand::Rng;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// A successful (2xx) response body
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Outcome of a single send, before retry policy is applied
enum Attempt {
    Done(RawResponse),
    RateLimited,
}

/// Shared rate limiter and retry controller
#[derive(Debug)]
pub struct FetchGovernor {
    client: Client,
    state: Mutex<FetchState>,
    fetch: FetchConfig,
    user_agents: UserAgentConfig,
}

impl FetchGovernor {
    /// Creates a governor around an already-built HTTP client
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            state: Mutex::new(FetchState::new(&config.fetch)),
            fetch: config.fetch.clone(),
            user_agents: config.user_agent.clone(),
        }
    }

    /// Waits for the next request slot
    ///
    /// The slot is reserved under the state lock and the lock is released
    /// before sleeping, so concurrent callers queue up at `min_interval`
    /// spacing without blocking each other's bookkeeping. Returns the granted
    /// slot, or `Canceled` if the token fires first; a canceled reservation
    /// still counts as the last request time.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Instant> {
        if cancel.is_cancelled() {
            return Err(AvitologError::Canceled);
        }

        let jitter = self.jitter();
        let slot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.reserve_slot(Instant::now(), jitter)
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tracing::debug!("Waiting {}ms for next request slot", wait.as_millis());
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(AvitologError::Canceled),
            _ = sleep_until(slot) => Ok(slot),
        }
    }

    /// Fetches `url`, retrying on HTTP 429 with backoff and identity rotation
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 429 | Pause, then up to `max_retries` re-attempts, waiting `backoff_base * n` |
    /// | Other status | `Fetch { cause: Status }`, no retry |
    /// | Transport error | `Fetch { cause: Transport }`, no retry |
    /// | Cancellation | `Canceled` from any wait or in-flight request |
    pub async fn perform_with_retry(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<RawResponse> {
        self.acquire(cancel).await?;
        if let Attempt::Done(response) = self.send(url, &self.user_agents.default, cancel).await? {
            return Ok(response);
        }

        let pause = self.fetch.rate_limit_pause();
        tracing::warn!(
            url,
            pause_ms = pause.as_millis() as u64,
            "Rate limited, pausing before retries"
        );
        self.pause(pause, cancel).await?;

        let max_retries = self.max_retries();
        for attempt in 1..=max_retries {
            let delay = self.fetch.backoff_base() * attempt;
            let user_agent = self.user_agents.for_attempt(attempt);
            tracing::warn!(
                url,
                attempt,
                max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retrying rate-limited request with rotated user agent"
            );
            self.pause(delay, cancel).await?;
            self.acquire(cancel).await?;

            if let Attempt::Done(response) = self.send(url, user_agent, cancel).await? {
                tracing::info!(url, attempt, "Request succeeded after rate-limit retry");
                return Ok(response);
            }
        }

        Err(AvitologError::RateLimitExceeded {
            url: url.to_string(),
            attempts: 1 + max_retries,
        })
    }

    /// Number of request slots granted so far
    pub fn requests_made(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .request_count
    }

    /// Re-attempts allowed after an HTTP 429
    pub fn max_retries(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .max_retries
    }

    async fn send(
        &self,
        url: &str,
        user_agent: &str,
        cancel: &CancellationToken,
    ) -> Result<Attempt> {
        tracing::debug!("GET {}", url);
        let request = self.client.get(url).header(USER_AGENT, user_agent).send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(AvitologError::Canceled),
            response = request => response.map_err(|e| transport_error(url, &e))?,
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::RateLimited);
        }
        if !status.is_success() {
            return Err(AvitologError::Fetch {
                url: url.to_string(),
                cause: FetchCause::Status(status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(AvitologError::Canceled),
            body = response.text() => body.map_err(|e| transport_error(url, &e))?,
        };

        Ok(Attempt::Done(RawResponse {
            url: final_url,
            status: status.as_u16(),
            body,
        }))
    }

    /// Sleeps for `duration` unless canceled first
    pub async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            _ = cancel.cancelled() => Err(AvitologError::Canceled),
            _ = sleep(duration) => Ok(()),
        }
    }

    fn jitter(&self) -> Duration {
        if self.fetch.jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=self.fetch.jitter_ms))
    }
}

fn transport_error(url: &str, error: &reqwest::Error) -> AvitologError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    };
    AvitologError::Fetch {
        url: url.to_string(),
        cause: FetchCause::Transport(message),
    }
}
