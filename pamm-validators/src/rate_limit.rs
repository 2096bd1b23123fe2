use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// A token bucket pacing outgoing requests.
///
/// Holds up to `capacity` tokens and gains one token per `interval`. A zero
/// interval disables pacing entirely.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    tokens: u32,
    interval: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket that starts full.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            tokens: capacity,
            interval,
            last_refill: Instant::now(),
        }
    }

    /// One request immediately, then one per `interval`.
    pub fn every(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    pub fn unlimited() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Add the tokens earned since the last refill.
    pub fn refill(&mut self) {
        if self.interval.is_zero() {
            self.tokens = self.capacity;
            return;
        }
        let elapsed = Instant::now().duration_since(self.last_refill);
        let earned = (elapsed.as_nanos() / self.interval.as_nanos()) as u64;
        if earned == 0 {
            return;
        }
        if self.tokens as u64 + earned >= self.capacity as u64 {
            self.tokens = self.capacity;
            self.last_refill = Instant::now();
        } else {
            self.tokens += earned as u32;
            // Keep the fractional progress towards the next token.
            self.last_refill += self.interval * earned as u32;
        }
    }

    /// Take a token if one is available.
    pub fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&mut self) {
        while !self.try_acquire() {
            let next = self.last_refill + self.interval;
            tracing::trace!(wait_ms = next.saturating_duration_since(Instant::now()).as_millis() as u64, "pacing request");
            sleep_until(next).await;
        }
    }

    pub fn available(&self) -> u32 {
        self.tokens
    }
}
