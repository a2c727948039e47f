#![deny(unsafe_code)]
//! Effect registry: maps effect names to implementations, and renders
//! layered scenes.
//!
//! This crate sits between `keylight-core` (which defines the `Renderer`
//! trait and compositing) and the CLI, so name-based dispatch lives in one
//! place.

pub mod breathe;
pub mod fill;
pub mod scene;
pub mod stack;
pub mod stars;

use std::time::Duration;

use keylight_core::{KeylightError, RenderTarget, Renderer};
use serde_json::Value;

pub use scene::{LayerSpec, Scene};
pub use stack::LayerStack;

/// All available effect names.
const EFFECT_NAMES: &[&str] = &["fill", "breathe", "stars"];

/// Enumeration of the built-in effects.
///
/// Wraps each effect and delegates `Renderer`. Use
/// [`EffectKind::from_name`] for string-based construction.
#[derive(Debug, Clone)]
pub enum EffectKind {
    /// Solid color.
    Fill(fill::Fill),
    /// Cosine fade in and out.
    Breathe(breathe::Breathe),
    /// Random fading keys.
    Stars(stars::Stars),
}

impl EffectKind {
    /// Constructs an effect by name.
    ///
    /// Returns `KeylightError::UnknownEffect` if the name is not recognized.
    #[tracing::instrument(skip(params))]
    pub fn from_name(name: &str, params: &Value) -> Result<Self, KeylightError> {
        let effect = match name {
            "fill" => EffectKind::Fill(fill::Fill::from_json(params)),
            "breathe" => EffectKind::Breathe(breathe::Breathe::from_json(params)),
            "stars" => EffectKind::Stars(stars::Stars::from_json(params)),
            _ => return Err(KeylightError::UnknownEffect(name.to_string())),
        };
        tracing::debug!(params = %effect.params(), "effect created");
        Ok(effect)
    }

    /// Returns a slice of all recognized effect names.
    pub fn list_effects() -> &'static [&'static str] {
        EFFECT_NAMES
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Fill(_) => "fill",
            EffectKind::Breathe(_) => "breathe",
            EffectKind::Stars(_) => "stars",
        }
    }

    /// Effective parameters, defaults filled in.
    pub fn params(&self) -> Value {
        match self {
            EffectKind::Fill(e) => e.params(),
            EffectKind::Breathe(e) => e.params(),
            EffectKind::Stars(e) => e.params(),
        }
    }
}

impl Renderer for EffectKind {
    fn render(&mut self, elapsed: Duration, target: &mut RenderTarget) {
        match self {
            EffectKind::Fill(e) => e.render(elapsed, target),
            EffectKind::Breathe(e) => e.render(elapsed, target),
            EffectKind::Stars(e) => e.render(elapsed, target),
        }
    }
}
