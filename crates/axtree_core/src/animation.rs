//! Timed transitions for the viewport.
//!
//! # Frame Model
//! - No callbacks - the owner polls each frame
//! - Call `update(dt)` with the frame delta in seconds, then read `value()`
//! - A finished tween reports exactly its target value

use serde::{Deserialize, Serialize};

/// Cubic ease-in-out.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Values a [`Tween`] can interpolate.
pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

/// Fixed-duration eased interpolation between two values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween<T> {
    from: T,
    to: T,
    /// Seconds elapsed since start.
    elapsed: f32,
    /// Total duration in seconds.
    duration: f32,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration_ms as f32 / 1000.0,
        }
    }

    /// Advance by `dt` seconds and return the new value.
    pub fn update(&mut self, dt: f32) -> T {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.value()
    }

    /// Linear progress in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn value(&self) -> T {
        if self.is_complete() {
            self.to
        } else {
            self.from.lerp(self.to, ease_in_out_cubic(self.progress()))
        }
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// Count-down timer polled each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn from_ms(ms: u64) -> Self {
        Self {
            remaining: ms as f32 / 1000.0,
        }
    }

    /// Advance by `dt` seconds; true once the timer has run out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt.max(0.0);
        self.is_elapsed()
    }

    pub fn is_elapsed(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining_secs(&self) -> f32 {
        self.remaining.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
        assert!(ease_in_out_cubic(0.25) < 0.25);
        assert!(ease_in_out_cubic(0.75) > 0.75);
    }

    #[test]
    fn tween_lands_exactly_on_target() {
        let mut tween = Tween::new(0.0f32, 10.0, 600);
        let mid = tween.update(0.3);
        assert!(mid > 0.0 && mid < 10.0);
        assert!(!tween.is_complete());
        for _ in 0..100 {
            tween.update(1.0 / 60.0);
        }
        assert!(tween.is_complete());
        assert_eq!(tween.value(), 10.0);
    }

    #[test]
    fn zero_duration_is_immediate() {
        let tween = Tween::new(1.0f32, 2.0, 0);
        assert!(tween.is_complete());
        assert_eq!(tween.value(), 2.0);
    }

    #[test]
    fn countdown_elapses() {
        let mut timer = Countdown::from_ms(300);
        assert!(!timer.tick(0.2));
        assert!(timer.tick(0.2));
        assert_eq!(timer.remaining_secs(), 0.0);
    }
}
