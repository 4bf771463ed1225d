use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use super::Clock;

/// Wall clock.
///
/// Sleeps go through [`tokio::time::sleep`], so `tokio::time::pause` also applies to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, dur: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(dur))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_follows_tokio_time() {
        let clock = SystemClock;
        let started = tokio::time::Instant::now();
        clock.sleep(Duration::from_secs(5)).await;
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
