//! Timed camera moves between two viewpoints

use cgmath::{Vector3, VectorSpace};

/// Quadratic ease-in-out, slow at both ends
pub fn power1_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Interpolates eye and target from a start to an end viewpoint
#[derive(Debug, Clone, Copy)]
pub struct CameraTween {
    from_eye: Vector3<f32>,
    from_target: Vector3<f32>,
    to_eye: Vector3<f32>,
    to_target: Vector3<f32>,
    duration: f32,
    elapsed: f32,
}

impl CameraTween {
    pub fn new(
        from: (Vector3<f32>, Vector3<f32>),
        to: (Vector3<f32>, Vector3<f32>),
        duration: f32,
    ) -> Self {
        Self {
            from_eye: from.0,
            from_target: from.1,
            to_eye: to.0,
            to_target: to.1,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Moves time forward by `dt` seconds and returns the current `(eye, target)`
    pub fn advance(&mut self, dt: f32) -> (Vector3<f32>, Vector3<f32>) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.sample()
    }

    pub fn sample(&self) -> (Vector3<f32>, Vector3<f32>) {
        if self.is_finished() {
            return self.destination();
        }
        let t = power1_in_out(self.progress());
        (
            self.from_eye.lerp(self.to_eye, t),
            self.from_target.lerp(self.to_target, t),
        )
    }

    /// Linear time progress in `[0, 1]`; a zero-length tween is already complete
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn destination(&self) -> (Vector3<f32>, Vector3<f32>) {
        (self.to_eye, self.to_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_and_midpoint() {
        assert_eq!(power1_in_out(0.0), 0.0);
        assert_eq!(power1_in_out(0.5), 0.5);
        assert_eq!(power1_in_out(1.0), 1.0);
        assert_eq!(power1_in_out(0.25), 0.125);
        assert_eq!(power1_in_out(0.75), 0.875);
        assert_eq!(power1_in_out(2.0), 1.0);
    }

    #[test]
    fn tween_reaches_destination_exactly() {
        let start = (Vector3::new(0.0, 0.0, 6.0), Vector3::new(0.0, 0.0, 0.0));
        let end = (Vector3::new(1.313, 17.765, 46.719), Vector3::new(0.0, 1.0, 0.0));
        let mut tween = CameraTween::new(start, end, 1.5);

        let (eye, _) = tween.advance(0.75);
        assert_eq!(eye, start.0.lerp(end.0, 0.5));
        assert!(!tween.is_finished());

        assert_eq!(tween.advance(10.0), end);
        assert!(tween.is_finished());
    }

    #[test]
    fn zero_duration_jumps() {
        let start = (Vector3::new(0.0, 0.0, 6.0), Vector3::new(0.0, 0.0, 0.0));
        let end = (Vector3::new(5.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let tween = CameraTween::new(start, end, 0.0);

        assert!(tween.is_finished());
        assert_eq!(tween.sample(), end);
    }
}
