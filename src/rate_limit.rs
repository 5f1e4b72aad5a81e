use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;
use tracing::debug;

const MIN_SLEEP: Duration = Duration::from_millis(10);

/// Spaces out requests going through one client so the stats source never
/// sees a burst. Blocking: callers are strictly sequential.
pub struct RequestPacer {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    clock: DefaultClock,
    interval: Duration,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        // A zero interval means "unpaced".
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
        RequestPacer {
            limiter: RateLimiter::direct(quota),
            clock: DefaultClock::default(),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the next request may go out.
    pub fn wait(&self) {
        while let Err(not_until) = self.limiter.check() {
            let wait = not_until.wait_time_from(self.clock.now()).max(MIN_SLEEP);
            debug!(wait_ms = wait.as_millis() as u64, "pacing request");
            thread::sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn first_request_is_immediate() {
        let pacer = RequestPacer::new(Duration::from_secs(30));
        let started = Instant::now();
        pacer.wait();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn second_request_waits_for_the_interval() {
        let pacer = RequestPacer::new(Duration::from_millis(200));
        pacer.wait();
        let started = Instant::now();
        pacer.wait();
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[test]
    fn zero_interval_never_blocks() {
        let pacer = RequestPacer::new(Duration::ZERO);
        let started = Instant::now();
        for _ in 0..50 {
            pacer.wait();
        }
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(pacer.interval(), Duration::ZERO);
    }
}
