/// First-order low-pass filter between raw scroll progress and the progress the
/// timeline is sampled at. It has no notion of scroll direction.
#[derive(Debug, Clone)]
pub struct Scrub {
    lag: f32,
    value: Option<f32>,
}

impl Scrub {
    const SNAP_EPSILON: f32 = 1e-4;

    /// `lag` is the filter time constant in seconds; zero binds progress directly.
    pub fn new(lag: f32) -> Self {
        Self {
            lag: lag.max(0.0),
            value: None,
        }
    }

    /// Advances the filter by `delta` seconds towards `target` and returns the smoothed value.
    pub fn update(&mut self, target: f32, delta: f32) -> f32 {
        let value = match self.value {
            // The first sample has nothing to lag behind.
            None => target,
            Some(_) if self.lag == 0.0 => target,
            Some(current) => {
                let blend = 1.0 - (-delta.max(0.0) / self.lag).exp();
                let next = current + (target - current) * blend;

                if (target - next).abs() < Self::SNAP_EPSILON {
                    target
                } else {
                    next
                }
            }
        };

        self.value = Some(value);
        value
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn is_settled(&self, target: f32) -> bool {
        self.value == Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn zero_lag_is_a_hard_binding() {
        let mut scrub = Scrub::new(0.0);
        scrub.update(0.0, FRAME);
        assert_eq!(scrub.update(0.7, FRAME), 0.7);
    }

    #[test]
    fn rapid_scroll_lags_then_catches_up() {
        let mut scrub = Scrub::new(0.1);
        scrub.update(0.0, FRAME);

        let first = scrub.update(1.0, FRAME);
        assert!(first > 0.0 && first < 1.0);

        let mut frames = 0;
        while !scrub.is_settled(1.0) {
            scrub.update(1.0, FRAME);
            frames += 1;
            assert!(frames < 600, "filter never settled");
        }
    }

    #[test]
    fn smoothing_is_symmetric_in_direction() {
        let mut forward = Scrub::new(0.25);
        let mut backward = Scrub::new(0.25);
        forward.update(0.2, FRAME);
        backward.update(0.8, FRAME);

        let up = forward.update(0.8, FRAME) - 0.2;
        let down = 0.8 - backward.update(0.2, FRAME);

        assert!((up - down).abs() < 1e-6);
    }

    #[test]
    fn first_sample_is_taken_as_is() {
        let mut scrub = Scrub::new(5.0);
        assert_eq!(scrub.value(), None);
        assert_eq!(scrub.update(0.4, FRAME), 0.4);
    }
}
