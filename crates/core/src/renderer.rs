//! The `Renderer` trait every lighting effect implements.
//!
//! The trait is object-safe so a render pass can drive different effects
//! through `&mut dyn Renderer`.

use std::time::Duration;

use crate::target::RenderTarget;

/// An effect that paints key colors into a [`RenderTarget`].
///
/// `render` is called once per frame with the time elapsed since the
/// previous call (zero on the first call). The effect writes the state it
/// has reached at that point into `target`.
///
/// Contract for implementers:
/// - Rendering cannot fail. An effect that has nothing valid to draw leaves
///   `target` as it was.
/// - Effects may keep animation state, but must not rely on receiving the
///   same target on every call.
/// - Only key entries are written; the padding is not reachable through the
///   target's public API.
///
/// Code that drives effects borrows them as `&mut dyn Renderer` and never
/// takes ownership. Whoever built the concrete effect owns and drops it.
pub trait Renderer {
    /// Updates `target` to reflect the effect after `elapsed` more time.
    fn render(&mut self, elapsed: Duration, target: &mut RenderTarget);
}
