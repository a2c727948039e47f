#![deny(unsafe_code)]
//! Core types for keylight, the per-key keyboard lighting engine.
//!
//! Provides the `Rgba` color entry, the SIMD-padded `RenderTarget` buffer,
//! over-blend and multiply compositing with generic and accelerated kernels,
//! the `Renderer` trait effects implement, parameter helpers, and a small
//! deterministic PRNG.

pub mod color;
pub mod composite;
pub mod error;
pub mod params;
pub mod prng;
pub mod renderer;
pub mod target;

pub use color::Rgba;
pub use composite::{BlendMode, Generic, Kernel};
pub use error::KeylightError;
pub use prng::Xorshift64;
pub use renderer::Renderer;
pub use target::{RenderTarget, ALIGN_ENTRIES};
