//! Cosmetic temperature gauge.
//!
//! Every executed instruction warms the core by a small random amount. The
//! gauge never cools while a program runs; it only resets on power-on or on a
//! program load.

/// Lower bound of the gauge, also the power-on temperature.
pub const TEMP_MIN: f64 = 35.0;
/// Upper clamp of the gauge.
pub const TEMP_MAX: f64 = 90.0;
/// Temperature right after power-on.
pub const POWER_ON_TEMPERATURE: f64 = TEMP_MIN;
/// Temperature right after a program load.
pub const LOAD_TEMPERATURE: f64 = 40.0;
/// Exclusive upper bound of the per-instruction increment.
pub const MAX_HEAT_STEP: f64 = 2.0;
/// Fixed increment applied by a system event.
pub const SYSCALL_HEAT: f64 = 0.5;

/// Source of the per-instruction heat sample.
pub trait HeatSource {
    /// Returns a sample in `[0, 1)`.
    fn sample(&mut self) -> f64;
}

/// Heat source that always yields the same sample. Useful to make thermal
/// behavior fully predictable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedHeat(pub f64);

impl HeatSource for FixedHeat {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

/// Adds `delta` to `temperature`, clamped to [`TEMP_MAX`].
///
/// Negative or NaN deltas are treated as zero so the gauge is monotonic.
#[must_use]
pub fn warm(temperature: f64, delta: f64) -> f64 {
    let delta = if delta.is_nan() { 0.0 } else { delta.max(0.0) };
    (temperature + delta).min(TEMP_MAX)
}

/// Warms the gauge by one instruction's worth of heat drawn from `source`.
pub fn heat_step(temperature: f64, source: &mut dyn HeatSource) -> f64 {
    let sample = source.sample().clamp(0.0, 1.0);
    warm(temperature, sample * MAX_HEAT_STEP)
}
