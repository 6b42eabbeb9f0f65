use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock started, summed from clamped deltas.
    pub elapsed: f32,

    pub now: Instant,
    pub frame_index: u64,
}

/// Produces one [`FrameTime`] per presented frame.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// push the simulation a long way in a single step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the delta baseline, e.g. after the window was hidden.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max)
            .as_secs_f32();

        self.last = now;
        self.elapsed += dt;

        let ft = FrameTime {
            dt,
            elapsed: self.elapsed,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_stalls_are_clamped() {
        let mut clock = FrameClock::new();
        let start = clock.last;

        let t = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(t.dt, 0.25);
        assert_eq!(t.frame_index, 0);

        let t = clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(t.dt, Duration::from_micros(100).as_secs_f32());
        assert_eq!(t.frame_index, 1);
        assert!((t.elapsed - 0.2501).abs() < 1e-6);
    }
}
