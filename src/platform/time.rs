//! Frame timing

use crate::consts::DEFAULT_FRAME_DT;

/// Turns animation-frame timestamps into per-frame elapsed seconds
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call. The first call, and any clock that
    /// runs backwards, yields one nominal frame.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) if now_ms > last => ((now_ms - last) / 1000.0) as f32,
            _ => DEFAULT_FRAME_DT,
        };
        self.last_ms = Some(now_ms);
        dt
    }

    /// Forget the previous timestamp (after the tab was hidden, say)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_is_nominal() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(1234.0), DEFAULT_FRAME_DT);
    }

    #[test]
    fn test_elapsed_between_frames() {
        let mut clock = FrameClock::new();
        clock.tick(1000.0);
        assert!((clock.tick(1050.0) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_backwards_clock_and_reset() {
        let mut clock = FrameClock::new();
        clock.tick(1000.0);
        assert_eq!(clock.tick(900.0), DEFAULT_FRAME_DT);
        clock.reset();
        assert_eq!(clock.tick(5000.0), DEFAULT_FRAME_DT);
    }
}
