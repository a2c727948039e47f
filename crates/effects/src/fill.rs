//! Solid color on every key.

use std::time::Duration;

use keylight_core::params::param_color;
use keylight_core::{RenderTarget, Renderer, Rgba};
use serde_json::{json, Value};

/// Paints every key the same color. Time has no effect on the output.
#[derive(Debug, Clone)]
pub struct Fill {
    color: Rgba,
}

impl Fill {
    pub fn new(color: Rgba) -> Self {
        Self { color }
    }

    /// Builds from `{"color": "#rrggbb[aa]"}`; defaults to white.
    pub fn from_json(params: &Value) -> Self {
        Self::new(param_color(params, "color", Rgba::WHITE))
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn params(&self) -> Value {
        json!({ "color": self.color })
    }
}

impl Renderer for Fill {
    fn render(&mut self, _elapsed: Duration, target: &mut RenderTarget) {
        target.fill(self.color);
    }
}
