//! Critically damped heading filter used between sub-pieces.

/// Shortest signed difference `target - current` in degrees, in `(-180, 180]`.
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Advance `current` toward `target` with a critically damped spring.
///
/// `velocity` is the filter state carried between calls. `damping_time` is
/// roughly the time to reach the target; `dt` is the simulated step. The
/// spring never overshoots: if a step would carry past the target the
/// output is pinned to it.
///
/// Returns `(smoothed, velocity)`.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: f32,
    damping_time: f32,
    dt: f32,
) -> (f32, f32) {
    let damping_time = damping_time.max(1e-4);
    let omega = 2.0 / damping_time;
    let x = omega * dt;
    // Padé-style approximation of exp(-x), accurate for the step sizes used here.
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (velocity + omega * change) * dt;
    let mut velocity = (velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        output = target;
        velocity = if dt > 0.0 { (output - target) / dt } else { 0.0 };
    }
    (output, velocity)
}

/// [`smooth_damp`] over angles in degrees, taking the short way round.
pub fn smooth_damp_angle(
    current: f32,
    target: f32,
    velocity: f32,
    damping_time: f32,
    dt: f32,
) -> (f32, f32) {
    let target = current + delta_angle(current, target);
    smooth_damp(current, target, velocity, damping_time, dt)
}
