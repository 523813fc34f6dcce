//! Replay pacing configuration

use std::time::Duration;

/// Lowest accepted speed factor; smaller values are raised to this
pub const MIN_SPEED_FACTOR: f64 = 0.1;

/// Replay driver configuration options
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Base interval between records
    pub interval: Duration,

    /// Playback speed multiplier (2.0 = twice as fast)
    pub speed_factor: f64,

    /// Restart from the first batch when the sequence ends
    pub loop_replay: bool,

    /// Floor for the inter-record delay
    pub min_delay: Duration,

    /// Pause between viewer checks while nobody is connected
    pub idle_poll: Duration,

    /// Pause between discovery attempts while no batches exist
    pub discovery_poll: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            speed_factor: 1.0,
            loop_replay: true,
            min_delay: Duration::from_millis(10),
            idle_poll: Duration::from_millis(500),
            discovery_poll: Duration::from_secs(2),
        }
    }
}

impl ReplayConfig {
    /// Delay between broadcasts: `max(min_delay, interval / speed_factor)`
    pub fn delay(&self) -> Duration {
        let speed = self.speed_factor.max(MIN_SPEED_FACTOR);
        let scaled = Duration::try_from_secs_f64(self.interval.as_secs_f64() / speed)
            .unwrap_or(Duration::MAX);

        scaled.max(self.min_delay)
    }

    /// Set the base interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the speed factor
    pub fn speed_factor(mut self, factor: f64) -> Self {
        self.speed_factor = factor;
        self
    }

    /// Enable or disable looping
    pub fn loop_replay(mut self, enabled: bool) -> Self {
        self.loop_replay = enabled;
        self
    }

    /// Set the delay floor
    pub fn min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// Set the no-viewer poll interval
    pub fn idle_poll(mut self, interval: Duration) -> Self {
        self.idle_poll = interval;
        self
    }

    /// Set the no-source poll interval
    pub fn discovery_poll(mut self, interval: Duration) -> Self {
        self.discovery_poll = interval;
        self
    }
}
