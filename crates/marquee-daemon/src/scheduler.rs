use std::time::Duration;

use marquee_proto::config::TimingConfig;

/// Which delay the controller asks for between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Next scroll frame.
    Tick,
    /// Next refresh attempt after a failure or an idle status.
    Retry,
}

#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    tick: Duration,
    retry: Duration,
}

impl Scheduler {
    pub fn new(tick: Duration, retry: Duration) -> Self {
        Self { tick, retry }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.tick(), timing.retry())
    }

    pub fn duration(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Tick => self.tick,
            Cadence::Retry => self.retry,
        }
    }

    pub async fn wait(&self, cadence: Cadence) {
        tokio::time::sleep(self.duration(cadence)).await;
    }

    pub async fn sleep_until_next_tick(&self) {
        self.wait(Cadence::Tick).await;
    }

    pub async fn sleep_until_next_retry(&self) {
        self.wait(Cadence::Retry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations_from_config() {
        let timing = TimingConfig::default();
        let s = Scheduler::from_config(&timing);
        assert_eq!(s.duration(Cadence::Tick), Duration::from_millis(timing.tick_ms));
        assert_eq!(s.duration(Cadence::Retry), Duration::from_millis(timing.retry_ms));
        assert!(s.duration(Cadence::Tick) < s.duration(Cadence::Retry));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_for_cadence() {
        let s = Scheduler::new(Duration::from_millis(60), Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        s.sleep_until_next_tick().await;
        assert!(start.elapsed() >= Duration::from_millis(60));
        s.sleep_until_next_retry().await;
        assert!(start.elapsed() >= Duration::from_millis(5060));
    }
}
