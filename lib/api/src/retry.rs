// Retry loop for HTTP 429 responses
use chessgraph_core::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// How long to wait after a 429 and how often to try again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Total attempts including the first one; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(15),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Uniformly random delay in `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        let low = self.min_delay.min(self.max_delay).as_millis() as u64;
        let high = self.min_delay.max(self.max_delay).as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(low..=high))
    }
}

/// Run `op` until it returns something other than [`Error::RateLimited`],
/// sleeping a jittered interval between attempts. Every other error is
/// returned as is.
pub async fn retry_on_rate_limit<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(Error::RateLimited { url }) => {
                attempt += 1;
                if policy.max_attempts.is_some_and(|max| attempt >= max) {
                    return Err(Error::RateLimited { url });
                }
                let delay = policy.next_delay();
                warn!(%url, attempt, delay_ms = delay.as_millis() as u64, "rate limited, retrying");
                sleep(delay).await;
            }
            other => return other,
        }
    }
}
