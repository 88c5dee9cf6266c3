//! HTTP transport with bounded periodic retries.
//!
//! A failed request is re-sent on a fixed tick until it succeeds or a
//! wall-clock budget elapses. Only transport failures (connection errors,
//! timeouts) are retried: any HTTP response, whatever its status, is
//! handed back to the caller.
//!
//! Dropping the future returned by [`RetryingTransport::send`] aborts the
//! retry loop, so callers bound a whole resolution with
//! `tokio::time::timeout`.

use crate::errors::{Error, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Something able to execute a single HTTP request.
pub trait Transport: Send + Sync + fmt::Debug {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'_, Result<reqwest::Response>>;
}

impl Transport for reqwest::Client {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'_, Result<reqwest::Response>> {
        Box::pin(async move { Ok(self.execute(request).await?) })
    }
}

/// Retry schedule: one attempt every `interval`, for at most `max_elapsed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_elapsed: Duration::from_secs(5),
        }
    }
}

/// Shortest retry tick; shorter intervals are raised to it.
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// A [`Transport`] decorator adding periodic retries.
#[derive(Clone, Debug)]
pub struct RetryingTransport {
    inner: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(inner: Arc<dyn Transport>, mut policy: RetryPolicy) -> Self {
        if policy.interval < MIN_RETRY_INTERVAL {
            warn!(
                "Retry interval {:?} too short, using {:?}",
                policy.interval, MIN_RETRY_INTERVAL
            );
            policy.interval = MIN_RETRY_INTERVAL;
        }
        Self { inner, policy }
    }

    /// Send `request`, retrying transport failures per the policy.
    pub async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        let url = request.url().to_string();
        let template = match request.try_clone() {
            Some(t) => t,
            None => {
                trace!("Request to {} has a streaming body, not retrying", url);
                return self.inner.send(request).await;
            }
        };

        let mut last = match self.inner.send(request).await {
            Ok(res) => return Ok(res),
            Err(e) => e,
        };
        debug!(
            "Request to {} failed ({}), retrying every {:?} for {:?}",
            url, last, self.policy.interval, self.policy.max_elapsed
        );

        let started = Instant::now();
        let deadline = time::sleep_until(started + self.policy.max_elapsed);
        tokio::pin!(deadline);
        let mut ticker = time::interval_at(started + self.policy.interval, self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Both the wait for the next tick and the attempt itself race the deadline.
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = ticker.tick() => {}
            }

            let attempt = match template.try_clone() {
                Some(a) => a,
                None => return Err(last),
            };
            trace!("Retrying request to {}", url);
            tokio::select! {
                _ = &mut deadline => {
                    debug!("Request to {} still pending at the retry deadline", url);
                    break;
                }
                res = self.inner.send(attempt) => match res {
                    Ok(res) => {
                        debug!("Request to {} succeeded after {:?}", url, started.elapsed());
                        return Ok(res);
                    }
                    Err(e) => last = e,
                },
            }
        }

        Err(Error::RetriesExhausted {
            url,
            elapsed: started.elapsed(),
            last: Box::new(last),
        })
    }
}
