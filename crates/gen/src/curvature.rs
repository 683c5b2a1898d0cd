use crate::config::GeneratorConfig;
use crate::sample::SampleSource;

/// An in-progress sharp-turn ease-in.
///
/// `step_delta` is meaningless once `steps_remaining` reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EasingState {
    pub steps_remaining: u32,
    pub step_delta: f32,
}

impl EasingState {
    pub fn is_active(&self) -> bool {
        self.steps_remaining > 0
    }
}

/// Decides the heading change applied by each new segment.
///
/// Most segments wander by a small uniform amount. Occasionally a sharp turn
/// starts; its total angle is split evenly over several segments so the road
/// eases into it instead of kinking.
#[derive(Debug, Clone, Default)]
pub struct CurvatureController {
    easing: EasingState,
}

impl CurvatureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn easing(&self) -> EasingState {
        self.easing
    }

    /// Curvature delta for the next segment, in degrees.
    ///
    /// Draw order: chance, then sign, magnitude and step count for a sharp
    /// turn, otherwise one sample for the normal wander. No draws are made
    /// while an ease-in is being paid out.
    pub fn next_delta(&mut self, config: &GeneratorConfig, rng: &mut impl SampleSource) -> f32 {
        if self.easing.is_active() {
            self.easing.steps_remaining -= 1;
            return self.easing.step_delta;
        }

        if rng.next_unit() < config.sharp_turn_chance {
            let sign = if rng.next_unit() < 0.5 { -1.0 } else { 1.0 };
            let total = sign * rng.range(config.sharp_angle_min, config.sharp_angle_max);
            let steps = rng.range_inclusive(config.sharp_ease_min, config.sharp_ease_max);
            let step_delta = total / steps as f32;
            self.easing = EasingState {
                steps_remaining: steps - 1,
                step_delta,
            };
            tracing::debug!(total, steps, "sharp turn started");
            return step_delta;
        }

        rng.range(-config.normal_curve_change, config.normal_curve_change)
    }
}
