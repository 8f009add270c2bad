use std::time::Duration;
use tokio::time::sleep;

/// Fixed pause between probes so slow or rate-limited peers are not hammered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Throttle {
    delay: Option<Duration>,
}

impl Throttle {
    pub fn new(delay: Option<Duration>) -> Self {
        Self {
            delay: delay.filter(|delay| !delay.is_zero()),
        }
    }

    pub async fn pause(&self) {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn pauses_for_configured_delay() {
        let throttle = Throttle::new(Some(Duration::from_millis(250)));
        let start = Instant::now();
        throttle.pause().await;
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_is_disabled() {
        let throttle = Throttle::new(Some(Duration::ZERO));
        let start = Instant::now();
        throttle.pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
