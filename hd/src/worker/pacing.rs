//! Per-item pacing for workers

use std::time::Duration;

use rand::Rng;

/// Pause taken after each item, a fixed delay plus random jitter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pacing {
    pub delay: Duration,
    pub jitter: Duration,
}

impl Pacing {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { delay, jitter }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.delay.is_zero() && self.jitter.is_zero()
    }

    /// Length of the next pause
    pub fn next_pause(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let jitter_us = u64::try_from(self.jitter.as_micros()).unwrap_or(u64::MAX);
        self.delay
            .saturating_add(Duration::from_micros(rand::rng().random_range(0..=jitter_us)))
    }

    /// Sleep for the next pause, if any
    pub async fn pause(&self) {
        if self.is_none() {
            return;
        }
        tokio::time::sleep(self.next_pause()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none() {
        assert!(Pacing::none().is_none());
        assert_eq!(Pacing::none().next_pause(), Duration::ZERO);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let pacing = Pacing::new(Duration::from_millis(5), Duration::from_millis(3));
        for _ in 0..100 {
            let pause = pacing.next_pause();
            assert!(pause >= Duration::from_millis(5));
            assert!(pause <= Duration::from_millis(8));
        }
    }

    #[tokio::test]
    async fn test_pause_waits_at_least_delay() {
        let pacing = Pacing::new(Duration::from_millis(15), Duration::ZERO);
        let started = std::time::Instant::now();
        pacing.pause().await;
        assert!(started.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_oversized_jitter_saturates() {
        let pacing = Pacing::new(Duration::from_secs(1), Duration::MAX);
        for _ in 0..10 {
            assert!(pacing.next_pause() >= Duration::from_secs(1));
        }
    }
}
