//! Reproducible description of a layered render.
//!
//! A [`Scene`] captures everything needed to render the same frames again:
//! key count, frame count and interval, PRNG seed, and the layer stack.

use std::path::Path;

use keylight_core::{BlendMode, KeylightError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EffectKind;

/// One layer of a scene: an effect and how it is composited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerSpec {
    pub effect: String,
    #[serde(default = "empty_params")]
    pub params: Value,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

fn visible_by_default() -> bool {
    true
}

impl LayerSpec {
    /// A visible `normal` layer with default params.
    pub fn new(effect: &str) -> Self {
        Self {
            effect: effect.to_string(),
            params: empty_params(),
            blend_mode: BlendMode::Normal,
            visible: true,
        }
    }
}

/// Layers are listed bottom to top.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub keys: usize,
    pub frames: usize,
    pub interval_ms: u64,
    pub seed: u64,
    pub layers: Vec<LayerSpec>,
}

impl Scene {
    /// Creates a scene with no layers: one frame at 16 ms intervals.
    pub fn new(keys: usize, seed: u64) -> Self {
        Self {
            keys,
            frames: 1,
            interval_ms: 16,
            seed,
            layers: Vec::new(),
        }
    }

    /// Parses and validates a scene from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, KeylightError> {
        let scene: Scene =
            serde_json::from_str(text).map_err(|e| KeylightError::InvalidScene(e.to_string()))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Reads, parses and validates a scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeylightError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| KeylightError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Checks there is at least one layer, a non-zero interval, and that
    /// every layer names a known effect.
    pub fn validate(&self) -> Result<(), KeylightError> {
        if self.layers.is_empty() {
            return Err(KeylightError::InvalidScene("scene has no layers".into()));
        }
        if self.interval_ms == 0 {
            return Err(KeylightError::InvalidScene("interval_ms must be positive".into()));
        }
        if let Some(layer) = self
            .layers
            .iter()
            .find(|l| !EffectKind::list_effects().contains(&l.effect.as_str()))
        {
            return Err(KeylightError::UnknownEffect(layer.effect.clone()));
        }
        Ok(())
    }
}
