//! Start-time rate limiter shared by all workers.
//!
//! Paces how frequently new outbound requests may BEGIN, independent
//! of how long each request takes. A single shared "next allowed start
//! time" is advanced under a mutex; the sleep happens outside the
//! lock, so waiting workers never serialize each other's waits.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Paces request starts so that successive grants are separated by at
/// least the configured minimum interval, globally across all callers.
///
/// # Algorithm
///
/// Under the lock: read the clock, take the later of "now" and the
/// stored next-allowed time as this caller's slot, and advance the
/// stored time by one interval. The advance happens while still
/// holding the lock, so no two callers ever compute the same slot.
/// The caller then sleeps until its slot outside the lock.
pub struct StartRateLimiter {
    min_interval: Duration,
    next_start: Mutex<Option<Instant>>,
}

impl StartRateLimiter {
    /// Create a limiter with the given minimum interval between
    /// request starts. A zero interval grants every turn immediately.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_start: Mutex::new(None),
        }
    }

    /// The configured minimum interval.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until it is this caller's turn to begin a request.
    ///
    /// Returns having reserved the next slot; the caller should start
    /// its request immediately.
    pub async fn wait_turn(&self) {
        let slot = {
            // Lock covers only the read-modify-write of the slot
            // clock; no await happens while it is held.
            let mut next = self.next_start.lock().unwrap();
            let now = Instant::now();
            let slot = match *next {
                Some(scheduled) if scheduled > now => scheduled,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };
        sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_turn_is_immediate() {
        let limiter = StartRateLimiter::new(Duration::from_millis(100));
        let before = Instant::now();
        limiter.wait_turn().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn serial_turns_are_spaced_by_interval() {
        let interval = Duration::from_millis(80);
        let limiter = StartRateLimiter::new(interval);

        let start = Instant::now();
        limiter.wait_turn().await;
        limiter.wait_turn().await;
        assert_eq!(Instant::now() - start, interval);
        limiter.wait_turn().await;
        assert_eq!(Instant::now() - start, interval * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_turns_never_share_a_slot() {
        let interval = Duration::from_millis(50);
        let limiter = Arc::new(StartRateLimiter::new(interval));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.wait_turn().await;
                Instant::now()
            }));
        }

        let mut resumed = Vec::new();
        for handle in handles {
            resumed.push(handle.await.unwrap());
        }
        resumed.sort();

        for pair in resumed.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= interval,
                "adjacent resume gap {gap:?} below interval {interval:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_grants_immediately() {
        let limiter = StartRateLimiter::new(Duration::ZERO);
        let before = Instant::now();
        for _ in 0..100 {
            limiter.wait_turn().await;
        }
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn slot_clock_does_not_drift_when_idle() {
        // A long idle gap must not accumulate credit: the next two
        // turns after the gap are still spaced by one interval.
        let interval = Duration::from_millis(100);
        let limiter = StartRateLimiter::new(interval);

        limiter.wait_turn().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let resume_a = {
            limiter.wait_turn().await;
            Instant::now()
        };
        limiter.wait_turn().await;
        let resume_b = Instant::now();

        assert_eq!(resume_b - resume_a, interval);
    }
}
