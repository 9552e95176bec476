//! Dual token-bucket rate limiter: a burst bucket and a sustained bucket,
//! both must yield before a write proceeds. A token taken from one bucket
//! while the other is exhausted is restored — failing the gate never leaks
//! capacity.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(rate_per_sec: f64) -> Self {
        Self {
            capacity: rate_per_sec,
            tokens: rate_per_sec,
            refill_per_sec: rate_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn try_take(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn restore(&mut self) {
        self.tokens = (self.tokens + 1.0).min(self.capacity);
    }

    fn wait_for_next_token(&self, now: Instant) -> Duration {
        let deficit = 1.0 - self.tokens;
        if deficit <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(deficit / self.refill_per_sec)
        }
    }
}

pub struct RateLimiter {
    burst: Mutex<Bucket>,
    sustained: Mutex<Bucket>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(burst_per_sec: f64, sustained_per_sec: f64) -> Self {
        Self {
            burst: Mutex::new(Bucket::new(burst_per_sec)),
            sustained: Mutex::new(Bucket::new(sustained_per_sec)),
        }
    }

    /// Blocks (cooperatively) until both buckets yield a token.
    pub async fn acquire(&self) {
        loop {
            let now = Instant::now();
            let burst_ok = self.burst.lock().try_take(now);
            let sustained_ok = self.sustained.lock().try_take(now);

            match (burst_ok, sustained_ok) {
                (true, true) => return,
                (true, false) => {
                    self.burst.lock().restore();
                }
                (false, true) => {
                    self.sustained.lock().restore();
                }
                (false, false) => {}
            }

            let burst_wait = self.burst.lock().wait_for_next_token(now);
            let sustained_wait = self.sustained.lock().wait_for_next_token(now);
            tokio::time::sleep(burst_wait.min(sustained_wait).max(Duration::from_millis(1))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_does_not_leak_a_token_when_one_bucket_is_exhausted() {
        let limiter = RateLimiter::new(1.0, 1000.0);
        limiter.acquire().await;
        // Burst bucket is now empty; sustained is plentiful. A second
        // acquire must wait for burst refill rather than draining sustained.
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn bucket_refills_over_time() {
        let limiter = RateLimiter::new(2.0, 2.0);
        limiter.acquire().await;
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
