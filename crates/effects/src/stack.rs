//! Layered rendering of a [`Scene`].
//!
//! Every layer owns an effect and a scratch target. A frame clears the output,
//! padding included, then renders each visible layer and composites it on
//! top, bottom to top.

use std::time::Duration;

use keylight_core::composite::{self, Kernel};
use keylight_core::{BlendMode, KeylightError, RenderTarget, Renderer};
use serde_json::Value;

use crate::scene::{LayerSpec, Scene};
use crate::EffectKind;

#[derive(Debug)]
struct Layer {
    effect: EffectKind,
    mode: BlendMode,
    visible: bool,
    target: RenderTarget,
}

/// Effects plus their render targets, composited into one output.
///
/// All targets are created with the scene's key count, so every compositing
/// pair has equal capacity.
#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<Layer>,
    output: RenderTarget,
}

impl LayerStack {
    /// Validates `scene` and builds every layer's effect and target.
    #[tracing::instrument(skip(scene), fields(keys = scene.keys, layers = scene.layers.len()))]
    pub fn from_scene(scene: &Scene) -> Result<Self, KeylightError> {
        scene.validate()?;
        let layers = scene
            .layers
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let params = layer_params(spec, scene.seed, index);
                Ok(Layer {
                    effect: EffectKind::from_name(&spec.effect, &params)?,
                    mode: spec.blend_mode,
                    visible: spec.visible,
                    target: RenderTarget::new(scene.keys)?,
                })
            })
            .collect::<Result<Vec<_>, KeylightError>>()?;
        Ok(Self {
            layers,
            output: RenderTarget::new(scene.keys)?,
        })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer effects, bottom to top.
    pub fn effects(&self) -> impl Iterator<Item = &EffectKind> {
        self.layers.iter().map(|l| &l.effect)
    }

    /// Result of the most recent frame.
    pub fn output(&self) -> &RenderTarget {
        &self.output
    }

    /// Renders one frame with the runtime-selected kernel.
    pub fn render_frame(&mut self, elapsed: Duration) -> &RenderTarget {
        self.render_frame_with(composite::kernel(), elapsed)
    }

    /// Renders one frame compositing with `kernel`.
    pub fn render_frame_with<K: Kernel + ?Sized>(
        &mut self,
        kernel: &K,
        elapsed: Duration,
    ) -> &RenderTarget {
        self.output.clear();
        for layer in self.layers.iter_mut().filter(|l| l.visible) {
            layer.effect.render(elapsed, &mut layer.target);
            layer.mode.apply_with(kernel, &mut self.output, &layer.target);
        }
        &self.output
    }
}

/// `stars` layers without an explicit seed get one derived from the scene
/// seed and layer index, so two such layers do not twinkle in step.
fn layer_params(spec: &LayerSpec, seed: u64, index: usize) -> Value {
    let mut params = match &spec.params {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    if spec.effect == "stars" && !params.contains_key("seed") {
        let mixed = seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        params.insert("seed".into(), Value::from(mixed));
    }
    Value::Object(params)
}
