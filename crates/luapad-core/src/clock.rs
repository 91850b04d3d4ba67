use std::time::{Duration, Instant};

/// Default aggregation window for the reported frame rate
pub const DEFAULT_FPS_WINDOW: Duration = Duration::from_millis(500);

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f64,

    /// Monotonic frame counter, starting at 1 for the first tick.
    pub frame_index: u64,
}

/// Delta-time and frame-rate bookkeeping, advanced once per render tick.
///
/// Delta time is clamped so a stalled host (debugger, minimised terminal) does not
/// hand scripts a huge step on the next frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    frame_index: u64,
    dt: Duration,
    dt_max: Duration,

    fps: f64,
    fps_window: Duration,
    window_start: Option<Instant>,
    window_frames: u32,
}

impl FrameClock {
    pub fn new(fps_window: Duration) -> Self {
        Self {
            last: None,
            frame_index: 0,
            dt: Duration::ZERO,
            dt_max: Duration::from_millis(250),
            fps: 0.0,
            fps_window: fps_window.max(Duration::from_millis(1)),
            window_start: None,
            window_frames: 0,
        }
    }

    /// Resets the delta-time baseline without touching the frame rate.
    pub fn reset(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// Advances the clock to `now` and returns the new `FrameTime`.
    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.dt = dt.min(self.dt_max);
        self.last = Some(now);
        self.frame_index = self.frame_index.wrapping_add(1);

        // The tick that opens a window only marks its start
        let Some(window_start) = self.window_start else {
            self.window_start = Some(now);
            return self.frame_time();
        };
        self.window_frames += 1;
        let elapsed = now.saturating_duration_since(window_start);
        if elapsed >= self.fps_window {
            self.fps = f64::from(self.window_frames) / elapsed.as_secs_f64();
            self.window_start = Some(now);
            self.window_frames = 0;
        }

        self.frame_time()
    }

    fn frame_time(&self) -> FrameTime {
        FrameTime {
            dt: self.dt.as_secs_f64(),
            frame_index: self.frame_index,
        }
    }

    /// Delta time of the last tick, in seconds
    pub fn dt(&self) -> f64 {
        self.dt.as_secs_f64()
    }

    /// Frame rate over the last completed window; 0 until one has completed
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_has_zero_dt() {
        let mut clock = FrameClock::default();
        let ft = clock.tick(Instant::now());
        assert_eq!(ft.dt, 0.0);
        assert_eq!(ft.frame_index, 1);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut clock = FrameClock::default();
        let start = Instant::now();
        clock.tick(start);
        let ft = clock.tick(start + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_fps_aggregates_over_window() {
        let mut clock = FrameClock::new(Duration::from_millis(500));
        let start = Instant::now();
        let step = Duration::from_millis(20);

        for i in 0..=25u32 {
            clock.tick(start + step * i);
        }
        // 25 frame intervals over the first 500ms window
        assert!((clock.fps() - 50.0).abs() < 1e-6, "fps was {}", clock.fps());

        for i in 26..=50u32 {
            clock.tick(start + step * i);
        }
        assert!((clock.fps() - 50.0).abs() < 1e-6, "fps was {}", clock.fps());
    }

    #[test]
    fn test_fps_is_zero_before_first_window_completes() {
        let mut clock = FrameClock::new(Duration::from_millis(500));
        let start = Instant::now();
        for i in 0..25u32 {
            clock.tick(start + Duration::from_millis(20) * i);
        }
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn test_reset_moves_baseline() {
        let mut clock = FrameClock::default();
        let start = Instant::now();
        clock.tick(start);
        clock.reset(start + Duration::from_secs(3));
        let ft = clock.tick(start + Duration::from_millis(3016));
        assert!((ft.dt - 0.016).abs() < 1e-9);
    }
}
