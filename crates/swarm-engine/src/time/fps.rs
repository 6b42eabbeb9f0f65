use std::time::{Duration, Instant};

/// Frames-per-second over a rolling window.
///
/// The first call only starts timing. After that each call counts a frame,
/// and once more than `interval` has passed the rate is recomputed and the
/// window restarts.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    interval: Duration,
    window_start: Option<Instant>,
    frames: u32,
    fps: f32,
}

impl FpsMeter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: None,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Latest measured rate; 0 until the first window closes.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Counts one frame. Returns the new rate when a window just closed.
    pub fn frame(&mut self, now: Instant) -> Option<f32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };

        self.frames += 1;
        let elapsed = now.saturating_duration_since(start);
        if elapsed <= self.interval {
            return None;
        }

        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = Some(now);
        Some(self.fps)
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_only_starts_timing() {
        let mut meter = FpsMeter::default();
        assert_eq!(meter.frame(Instant::now()), None);
        assert_eq!(meter.fps(), 0.0);
    }

    #[test]
    fn rate_is_reported_after_the_interval() {
        let mut meter = FpsMeter::default();
        let t0 = Instant::now();
        meter.frame(t0);

        for i in 1..60 {
            assert_eq!(meter.frame(t0 + Duration::from_millis(i * 16)), None);
        }
        let fps = meter.frame(t0 + Duration::from_millis(1200)).unwrap();
        assert!((fps - 50.0).abs() < 1e-3);

        // Window restarted.
        assert_eq!(meter.frame(t0 + Duration::from_millis(1300)), None);
        assert_eq!(meter.fps(), fps);
    }
}
