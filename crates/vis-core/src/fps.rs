//! Frame-rate and frame-cost counter.
//!
//! Time is passed in by the caller so the counter works the same under test
//! as in the render loop.

use instant::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpsReading {
    pub fps: u32,
    /// Seconds spent between `begin_frame` and `end_frame` over the window.
    pub cpu_seconds: f64,
}

#[derive(Debug)]
pub struct FpsCounter {
    interval: Duration,
    window_start: Option<Instant>,
    frame_start: Option<Instant>,
    frames: u32,
    busy: Duration,
    latest: Option<FpsReading>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FpsCounter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: None,
            frame_start: None,
            frames: 0,
            busy: Duration::ZERO,
            latest: None,
        }
    }

    pub fn begin_frame(&mut self, now: Instant) {
        self.window_start.get_or_insert(now);
        self.frame_start = Some(now);
    }

    /// Close the frame; returns a fresh reading once per interval.
    pub fn end_frame(&mut self, now: Instant) -> Option<FpsReading> {
        let start = self.frame_start.take()?;
        self.busy += now.saturating_duration_since(start);
        self.frames += 1;

        let window_start = *self.window_start.get_or_insert(start);
        let elapsed = now.saturating_duration_since(window_start);
        if elapsed < self.interval {
            return None;
        }
        let scale = self.interval.as_secs_f64() / elapsed.as_secs_f64();
        let reading = FpsReading {
            fps: (self.frames as f64 * scale).round() as u32,
            cpu_seconds: self.busy.as_secs_f64(),
        };
        self.window_start = Some(now);
        self.frames = 0;
        self.busy = Duration::ZERO;
        self.latest = Some(reading);
        Some(reading)
    }

    pub fn latest(&self) -> Option<FpsReading> {
        self.latest
    }
}
