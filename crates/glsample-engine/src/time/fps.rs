use std::time::Instant;

/// Average frames-per-second over a fixed window of frames.
///
/// The average is recomputed every `window` frames from the wall time the
/// window took; between recomputations the previous value is reported.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: u32,
    frames: u32,
    window_start: Option<Instant>,
    average: f32,
}

impl FpsCounter {
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            window_start: None,
            average: 0.0,
        }
    }

    /// Records one presented frame. Returns `true` when the average was refreshed.
    pub fn record(&mut self, now: Instant) -> bool {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return false;
        };

        self.frames += 1;
        if self.frames < self.window {
            return false;
        }

        let secs = now.saturating_duration_since(start).as_secs_f32();
        if secs > 0.0 {
            self.average = self.frames as f32 / secs;
        }
        self.frames = 0;
        self.window_start = Some(now);
        true
    }

    pub fn fps(&self) -> f32 {
        self.average
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn average_refreshes_once_per_window() {
        let mut fps = FpsCounter::new(10);
        let t0 = Instant::now();
        assert!(!fps.record(t0));

        let mut refreshed = 0;
        for i in 1..=10 {
            if fps.record(t0 + Duration::from_millis(10 * i)) {
                refreshed += 1;
            }
        }
        assert_eq!(refreshed, 1);
        // 10 frames in 100ms.
        assert!((fps.fps() - 100.0).abs() < 0.5);
    }

    #[test]
    fn zero_window_is_treated_as_one() {
        let mut fps = FpsCounter::new(0);
        let t0 = Instant::now();
        fps.record(t0);
        assert!(fps.record(t0 + Duration::from_millis(20)));
        assert!((fps.fps() - 50.0).abs() < 0.5);
    }
}
