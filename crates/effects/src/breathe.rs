//! Slow pulse: one color fading in and out on every key.

use std::f64::consts::TAU;
use std::time::Duration;

use keylight_core::params::{param_color, param_millis};
use keylight_core::{RenderTarget, Renderer, Rgba};
use serde_json::{json, Value};

/// Default length of one full in-and-out cycle.
const DEFAULT_PERIOD: Duration = Duration::from_millis(10_000);
/// Shortest accepted period.
const MIN_PERIOD: Duration = Duration::from_millis(1);
/// Longest accepted period; keeps the cycle position in nanoseconds within `u64`.
const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Fades `color` in and out over `period`.
///
/// Alpha follows `color.a * (1 - cos(2π t / period)) / 2`: transparent at the
/// start of each cycle, full `color.a` halfway through.
#[derive(Debug, Clone)]
pub struct Breathe {
    color: Rgba,
    period: Duration,
    time: Duration,
}

impl Breathe {
    /// Creates the effect at the start of a cycle. The period is clamped to
    /// between one millisecond and one day.
    pub fn new(color: Rgba, period: Duration) -> Self {
        Self {
            color,
            period: period.clamp(MIN_PERIOD, MAX_PERIOD),
            time: Duration::ZERO,
        }
    }

    /// Builds from `{"color": "#rrggbb[aa]", "period": ms}`.
    pub fn from_json(params: &Value) -> Self {
        Self::new(
            param_color(params, "color", Rgba::WHITE),
            param_millis(params, "period", DEFAULT_PERIOD),
        )
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn params(&self) -> Value {
        json!({
            "color": self.color,
            "period": self.period.as_millis() as u64,
        })
    }

    /// Alpha for the current position in the cycle.
    fn alpha(&self) -> u8 {
        let phase = self.time.as_nanos() as f64 / self.period.as_nanos() as f64;
        let level = (1.0 - (TAU * phase).cos()) / 2.0;
        (f64::from(self.color.a) * level).round().clamp(0.0, 255.0) as u8
    }
}

impl Renderer for Breathe {
    fn render(&mut self, elapsed: Duration, target: &mut RenderTarget) {
        let period = self.period.as_nanos();
        let wrapped = (self.time.as_nanos() + elapsed.as_nanos()) % period;
        // wrapped < period <= MAX_PERIOD, so it fits in u64
        self.time = Duration::from_nanos(wrapped as u64);
        target.fill(self.color.with_alpha(self.alpha()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breathe_ms(period_ms: u64) -> Breathe {
        Breathe::new(Rgba::opaque(0, 255, 0), Duration::from_millis(period_ms))
    }

    fn alpha_after(effect: &mut Breathe, ms: u64) -> u8 {
        let mut target = RenderTarget::new(3).unwrap();
        effect.render(Duration::from_millis(ms), &mut target);
        target[0].a
    }

    #[test]
    fn from_json_defaults() {
        let effect = Breathe::from_json(&json!({}));
        assert_eq!(effect.period(), DEFAULT_PERIOD);
        assert_eq!(effect.color, Rgba::WHITE);
    }

    #[test]
    fn zero_period_is_raised_to_minimum() {
        let effect = Breathe::from_json(&json!({"period": 0}));
        assert_eq!(effect.period(), MIN_PERIOD);
    }

    #[test]
    fn huge_period_is_clamped_and_still_cycles() {
        let mut effect = Breathe::from_json(&json!({"period": u64::MAX}));
        assert_eq!(effect.period(), MAX_PERIOD);
        assert_eq!(alpha_after(&mut effect, 12 * 60 * 60 * 1000), 255);
        assert_eq!(alpha_after(&mut effect, 12 * 60 * 60 * 1000), 0);
    }

    #[test]
    fn starts_transparent() {
        let mut effect = breathe_ms(1000);
        assert_eq!(alpha_after(&mut effect, 0), 0);
    }

    #[test]
    fn peaks_halfway_through_cycle() {
        let mut effect = breathe_ms(1000);
        assert_eq!(alpha_after(&mut effect, 500), 255);
    }

    #[test]
    fn returns_to_transparent_after_full_cycle() {
        let mut effect = breathe_ms(1000);
        alpha_after(&mut effect, 500);
        assert_eq!(alpha_after(&mut effect, 500), 0);
    }

    #[test]
    fn rises_monotonically_in_first_half() {
        let mut effect = breathe_ms(1000);
        let mut previous = 0;
        for _ in 0..25 {
            let a = alpha_after(&mut effect, 20);
            assert!(a >= previous, "alpha dropped from {previous} to {a}");
            previous = a;
        }
    }

    #[test]
    fn scales_with_color_alpha() {
        let mut effect = Breathe::new(Rgba::new(0, 0, 255, 100), Duration::from_millis(1000));
        assert_eq!(alpha_after(&mut effect, 500), 100);
    }

    #[test]
    fn keeps_rgb_and_padding() {
        let mut effect = breathe_ms(1000);
        let mut target = RenderTarget::new(5).unwrap();
        effect.render(Duration::from_millis(300), &mut target);
        assert!(target.iter().all(|c| (c.r, c.g, c.b) == (0, 255, 0)));
        assert!(target.padding().iter().all(|&c| c == Rgba::TRANSPARENT));
    }

    #[test]
    fn params_round_trip() {
        let effect = breathe_ms(2500);
        let rebuilt = Breathe::from_json(&effect.params());
        assert_eq!(rebuilt.period(), Duration::from_millis(2500));
        assert_eq!(rebuilt.color, effect.color);
    }
}
