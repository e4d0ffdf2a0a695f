//! Interval polling with a total timeout and shutdown cancellation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

/// Interval and timeout of a [`PollingWaiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout: Duration::from_secs(180),
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        let defaults = Self::default();
        Self {
            interval: if interval.is_zero() {
                defaults.interval
            } else {
                interval
            },
            timeout: if timeout.is_zero() {
                defaults.timeout
            } else {
                timeout
            },
        }
    }
}

/// Repeats a read until it reports readiness, the timeout passes, or
/// shutdown is signalled.
#[derive(Debug, Clone)]
pub struct PollingWaiter {
    name: &'static str,
    config: PollConfig,
    shutdown: watch::Receiver<bool>,
}

impl PollingWaiter {
    pub fn new(name: &'static str, config: PollConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            name,
            config,
            shutdown,
        }
    }

    /// Poll `read` until it yields a value.
    ///
    /// `read` receives the 1-based attempt number. `Ok(None)` means not ready
    /// yet; errors are logged and polling continues. Returns `None` on
    /// timeout or shutdown.
    pub async fn wait<T, E, F, Fut>(&self, subject: &str, mut read: F) -> Option<T>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let deadline = Instant::now() + self.config.timeout;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = tokio::select! {
                result = read(attempt) => result,
                _ = shutdown_requested(self.shutdown.clone()) => {
                    info!(waiter = self.name, subject, attempt, "Polling cancelled by shutdown");
                    return None;
                }
            };

            match result {
                Ok(Some(value)) => {
                    info!(waiter = self.name, subject, attempt, ready = true, "Poll");
                    return Some(value);
                }
                Ok(None) => {
                    if attempt == 1 || attempt % 5 == 0 {
                        info!(waiter = self.name, subject, attempt, ready = false, "Poll");
                    }
                }
                Err(e) => {
                    warn!(waiter = self.name, subject, attempt, "Poll read failed: {}", e);
                }
            }

            if Instant::now() >= deadline {
                info!(waiter = self.name, subject, attempt, "Polling timed out");
                return None;
            }

            tokio::select! {
                _ = sleep(self.config.interval) => {}
                _ = shutdown_requested(self.shutdown.clone()) => {
                    info!(waiter = self.name, subject, attempt, "Polling cancelled by shutdown");
                    return None;
                }
            }
        }
    }
}

/// Resolves once shutdown is requested; never resolves if the sender is gone.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn waiter(shutdown: watch::Receiver<bool>) -> PollingWaiter {
        PollingWaiter::new("test", PollConfig::default(), shutdown)
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_ready_value() {
        let (_tx, rx) = watch::channel(false);
        let start = Instant::now();

        let value = waiter(rx)
            .wait("bm", |attempt| async move {
                Ok::<_, Infallible>((attempt == 3).then_some(attempt))
            })
            .await;

        assert_eq!(value, Some(3));
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_boundary() {
        let (_tx, rx) = watch::channel(false);
        let config = PollConfig::default();
        let start = Instant::now();

        let value: Option<()> = waiter(rx)
            .wait("bm", |_| async { Ok::<_, Infallible>(None) })
            .await;

        let elapsed = start.elapsed();
        assert!(value.is_none());
        assert!(elapsed >= config.timeout);
        assert!(elapsed <= config.timeout + config.interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_polling() {
        let (_tx, rx) = watch::channel(false);
        let value = waiter(rx)
            .wait("bm", |attempt| async move {
                if attempt < 3 {
                    Err("boom")
                } else {
                    Ok(Some("done"))
                }
            })
            .await;
        assert_eq!(value, Some("done"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_promptly() {
        let (tx, rx) = watch::channel(false);
        let start = Instant::now();

        let handle = tokio::spawn(async move {
            waiter(rx)
                .wait("bm", |_| async { Ok::<Option<()>, Infallible>(None) })
                .await
        });

        sleep(Duration::from_secs(10)).await;
        tx.send(true).unwrap();

        assert!(handle.await.unwrap().is_none());
        assert!(start.elapsed() < Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_does_not_cancel() {
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let value = waiter(rx)
            .wait("bm", |attempt| async move {
                Ok::<_, Infallible>((attempt == 2).then_some(()))
            })
            .await;
        assert!(value.is_some());
    }

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let config = PollConfig::new(Duration::ZERO, Duration::from_secs(10));
        assert_eq!(config.interval, Duration::from_secs(3));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
