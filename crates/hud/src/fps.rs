use std::time::{Duration, Instant};

/// Minimum time between two FPS recomputations.
pub const FPS_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Frames-per-second estimate throttled to avoid display jitter.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    value: u32,
    last_refresh: Option<Instant>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported value.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Recompute from `frame_delta` if the refresh interval has elapsed since
    /// the previous recomputation (or none happened yet); otherwise reuse.
    pub fn sample(&mut self, now: Instant, frame_delta: Duration) -> u32 {
        let due = match self.last_refresh {
            None => true,
            Some(prev) => now.saturating_duration_since(prev) >= FPS_REFRESH_INTERVAL,
        };
        if due {
            self.value = fps_from_delta(frame_delta);
            self.last_refresh = Some(now);
        }
        self.value
    }
}

fn fps_from_delta(frame_delta: Duration) -> u32 {
    let secs = frame_delta.as_secs_f64();
    if secs <= 0.0 {
        return 0;
    }
    (1.0 / secs).floor() as u32
}
