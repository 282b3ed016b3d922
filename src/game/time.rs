//! Frame-time helpers
//!
//! Turns that move something across the grid suspend on a `Tween` until the
//! interpolation has run its course.

use std::time::Duration;

/// Linear interpolation between two points over a fixed duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: (f32, f32),
    to: (f32, f32),
    /// Total length in seconds
    duration: f32,
    /// Time advanced so far
    elapsed: f32,
}

impl Tween {
    /// A non-positive duration yields a tween that is already finished.
    pub fn new(from: (f32, f32), to: (f32, f32), duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advance by `delta` and return the new position
    pub fn advance(&mut self, delta: Duration) -> (f32, f32) {
        self.elapsed = (self.elapsed + delta.as_secs_f32()).min(self.duration);
        self.position()
    }

    /// Fraction complete, in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn position(&self) -> (f32, f32) {
        let t = self.progress();
        (
            self.from.0 + (self.to.0 - self.from.0) * t,
            self.from.1 + (self.to.1 - self.from.1) * t,
        )
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn target(&self) -> (f32, f32) {
        self.to
    }
}

/// Fixed-length wait, e.g. an attack's recoil
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Advance by `delta`; true once the countdown has run out
    pub fn advance(&mut self, delta: Duration) -> bool {
        self.remaining = (self.remaining - delta.as_secs_f32()).max(0.0);
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tween_interpolates_and_clamps() {
        let mut tween = Tween::new((0.0, 0.0), (2.0, -2.0), 0.5);
        assert_eq!(tween.position(), (0.0, 0.0));
        assert!(!tween.is_finished());

        let mid = tween.advance(Duration::from_millis(250));
        assert!((mid.0 - 1.0).abs() < 1e-5);
        assert!((mid.1 + 1.0).abs() < 1e-5);

        let end = tween.advance(Duration::from_secs(3));
        assert_eq!(end, (2.0, -2.0));
        assert!(tween.is_finished());
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let tween = Tween::new((1.0, 1.0), (4.0, 1.0), 0.0);
        assert!(tween.is_finished());
        assert_eq!(tween.position(), tween.target());
    }

    #[test]
    fn test_countdown() {
        let mut wait = Countdown::new(0.25);
        assert!(!wait.advance(Duration::from_millis(100)));
        assert!(!wait.advance(Duration::ZERO));
        assert!(wait.advance(Duration::from_millis(200)));
        assert!(Countdown::new(-1.0).is_finished());
    }
}
