//! Bounded polling for visibility checks

use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default time to wait for a condition
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay between two probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to wait and how often to look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Paces probe attempts until a deadline.
///
/// The first [`Poller::tick`] returns immediately. Later ticks sleep for the
/// poll interval, clamped to the deadline, so the last probe happens at the
/// deadline itself. Once the deadline has passed, `tick` returns `false`.
#[derive(Debug)]
pub struct Poller {
    started: Instant,
    deadline: Instant,
    interval: Duration,
    attempts: usize,
}

impl Poller {
    pub fn new(config: WaitConfig) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + config.timeout,
            interval: config.poll_interval,
            attempts: 0,
        }
    }

    /// Wait for the next probe slot. `false` means give up.
    pub async fn tick(&mut self) -> bool {
        if self.attempts > 0 {
            let now = Instant::now();
            if now >= self.deadline {
                return false;
            }
            sleep(self.interval.min(self.deadline - now)).await;
        }
        self.attempts += 1;
        true
    }

    /// Probes made so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Time since the poller was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let mut poller = Poller::new(WaitConfig::with_timeout(Duration::from_secs(1)));
        assert!(poller.tick().await);
        assert_eq!(poller.elapsed(), Duration::ZERO);
        assert_eq!(poller.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_deadline() {
        let config = WaitConfig {
            timeout: Duration::from_millis(250),
            poll_interval: Duration::from_millis(100),
        };
        let mut poller = Poller::new(config);
        while poller.tick().await {}

        // t=0, 100, 200, then a final probe clamped to 250
        assert_eq!(poller.attempts(), 4);
        assert_eq!(poller.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_probes_once() {
        let mut poller = Poller::new(WaitConfig::with_timeout(Duration::ZERO));
        assert!(poller.tick().await);
        assert!(!poller.tick().await);
        assert_eq!(poller.attempts(), 1);
    }
}
