//! Twinkling stars: random keys light up and fade out.

use std::time::Duration;

use keylight_core::params::{param_color, param_millis, param_u64, param_usize};
use keylight_core::{RenderTarget, Renderer, Rgba, Xorshift64};
use serde_json::{json, Value};

const DEFAULT_COUNT: usize = 8;
/// Upper bound on stars; larger requests are clamped.
const MAX_COUNT: usize = 4096;
const DEFAULT_DURATION: Duration = Duration::from_millis(1000);
const MIN_DURATION: Duration = Duration::from_millis(1);
/// Longest fade; keeps every age in nanoseconds within `u64`.
const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_SEED: u64 = 0x5EED;

#[derive(Debug, Clone, Copy)]
struct Star {
    key: usize,
    age: Duration,
}

/// `count` stars, each lighting one random key at full `color.a` and fading
/// linearly to transparent over `duration`, then jumping to another key.
///
/// Keys without a star are transparent. Star ages are staggered so they do
/// not all fade in step. `count` is clamped to 4096 and `duration` to
/// between one millisecond and one day.
#[derive(Debug, Clone)]
pub struct Stars {
    color: Rgba,
    duration: Duration,
    seed: u64,
    rng: Xorshift64,
    stars: Vec<Star>,
    /// Key count the stars were placed for; 0 until the first render.
    keys: usize,
}

impl Stars {
    pub fn new(color: Rgba, count: usize, duration: Duration, seed: u64) -> Self {
        Self {
            color,
            duration: duration.clamp(MIN_DURATION, MAX_DURATION),
            seed,
            rng: Xorshift64::new(seed),
            stars: vec![Star { key: 0, age: Duration::ZERO }; count.min(MAX_COUNT)],
            keys: 0,
        }
    }

    /// Builds from `{"color", "count", "duration" (ms), "seed"}`.
    pub fn from_json(params: &Value) -> Self {
        Self::new(
            param_color(params, "color", Rgba::WHITE),
            param_usize(params, "count", DEFAULT_COUNT),
            param_millis(params, "duration", DEFAULT_DURATION),
            param_u64(params, "seed", DEFAULT_SEED),
        )
    }

    pub fn count(&self) -> usize {
        self.stars.len()
    }

    pub fn params(&self) -> Value {
        json!({
            "color": self.color,
            "count": self.stars.len(),
            "duration": self.duration.as_millis() as u64,
            "seed": self.seed,
        })
    }

    fn place(&mut self, keys: usize) {
        let count = self.stars.len() as u128;
        let duration = self.duration.as_nanos();
        for (i, star) in self.stars.iter_mut().enumerate() {
            star.key = self.rng.next_below(keys);
            star.age = Duration::from_nanos((duration * i as u128 / count) as u64);
        }
        self.keys = keys;
    }

    fn advance(&mut self, elapsed: Duration) {
        let duration = self.duration.as_nanos();
        for star in &mut self.stars {
            let age = star.age.as_nanos() + elapsed.as_nanos();
            if age >= duration {
                star.key = self.rng.next_below(self.keys);
            }
            star.age = Duration::from_nanos((age % duration) as u64);
        }
    }

    fn alpha(&self, star: &Star) -> u8 {
        let duration = self.duration.as_nanos();
        let remaining = duration - star.age.as_nanos();
        (u128::from(self.color.a) * remaining / duration) as u8
    }
}

impl Renderer for Stars {
    fn render(&mut self, elapsed: Duration, target: &mut RenderTarget) {
        let keys = target.len();
        if keys == 0 {
            return;
        }
        if keys != self.keys {
            self.place(keys);
        } else {
            self.advance(elapsed);
        }

        target.fill(Rgba::TRANSPARENT);
        for star in &self.stars {
            let alpha = self.alpha(star);
            if let Some(entry) = target.get_mut(star.key) {
                if alpha >= entry.a {
                    *entry = self.color.with_alpha(alpha);
                }
            }
        }
    }
}
