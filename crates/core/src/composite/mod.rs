//! Compositing of render targets: over-blend and multiply.
//!
//! Every operation runs over the full capacity of both targets, padding
//! included. Kernels are interchangeable: the [`Generic`] kernel defines the
//! result and accelerated kernels must match it byte for byte.
//!
//! Two ways to pick a kernel:
//! - [`blend`] / [`multiply`] use [`kernel()`], the best kernel this CPU
//!   supports, probed once per process.
//! - [`blend_with`] / [`multiply_with`] take a kernel explicitly. Passing a
//!   concrete type such as `&Generic` fixes the choice at build time.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::KeylightError;
use crate::target::RenderTarget;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use x86::{Avx2, Sse2};

/// All backend names, whether or not this CPU supports them.
const BACKEND_NAMES: &[&str] = &["generic", "sse2", "avx2"];

/// A compositing implementation.
///
/// Both slices must have the same length; implementations panic otherwise.
/// Any length is accepted, vector kernels finish the tail entry by entry.
pub trait Kernel: Send + Sync {
    /// Short backend name, e.g. `"sse2"`.
    fn name(&self) -> &'static str;

    /// Composites `src` over `dst` in place (see [`Rgba::blend`]).
    fn blend(&self, dst: &mut [Rgba], src: &[Rgba]);

    /// Modulates `dst` by `src` in place (see [`Rgba::multiply`]).
    fn multiply(&self, dst: &mut [Rgba], src: &[Rgba]);
}

/// Portable entry-by-entry kernel. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl Kernel for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn blend(&self, dst: &mut [Rgba], src: &[Rgba]) {
        check_lengths(dst, src);
        blend_entries(dst, src);
    }

    fn multiply(&self, dst: &mut [Rgba], src: &[Rgba]) {
        check_lengths(dst, src);
        multiply_entries(dst, src);
    }
}

fn check_lengths(dst: &[Rgba], src: &[Rgba]) {
    assert_eq!(
        dst.len(),
        src.len(),
        "compositing requires slices of equal length"
    );
}

fn blend_entries(dst: &mut [Rgba], src: &[Rgba]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = d.blend(*s);
    }
}

fn multiply_entries(dst: &mut [Rgba], src: &[Rgba]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = d.multiply(*s);
    }
}

static GENERIC: Generic = Generic;
static SELECTED: OnceLock<&'static dyn Kernel> = OnceLock::new();

/// Kernels this CPU can run, slowest first. Always starts with [`Generic`].
pub fn available() -> Vec<&'static dyn Kernel> {
    let mut kernels: Vec<&'static dyn Kernel> = vec![&GENERIC];
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        if let Some(k) = x86::sse2() {
            kernels.push(k);
        }
        if let Some(k) = x86::avx2() {
            kernels.push(k);
        }
    }
    kernels
}

/// The fastest kernel this CPU supports. Probed on first call, then cached.
pub fn kernel() -> &'static dyn Kernel {
    *SELECTED.get_or_init(|| {
        let generic: &'static dyn Kernel = &GENERIC;
        let best = available().last().copied().unwrap_or(generic);
        tracing::debug!(backend = best.name(), "selected compositing backend");
        best
    })
}

/// Looks up a kernel by name.
///
/// Returns `KeylightError::UnknownBackend` for names not in
/// [`list_backends`], and `KeylightError::UnsupportedBackend` when the
/// backend exists but this CPU lacks the instructions for it.
pub fn by_name(name: &str) -> Result<&'static dyn Kernel, KeylightError> {
    let found = available().into_iter().find(|k| k.name() == name);
    match (found, BACKEND_NAMES.iter().find(|&&n| n == name)) {
        (Some(k), _) => Ok(k),
        (None, Some(&known)) => Err(KeylightError::UnsupportedBackend(known)),
        (None, None) => Err(KeylightError::UnknownBackend(name.to_string())),
    }
}

/// Every backend name, including ones this CPU cannot run.
pub fn list_backends() -> &'static [&'static str] {
    BACKEND_NAMES
}

/// Composites `src` over `dst` with the runtime-selected kernel.
///
/// # Panics
///
/// Panics if the two targets differ in capacity.
pub fn blend(dst: &mut RenderTarget, src: &RenderTarget) {
    blend_with(kernel(), dst, src);
}

/// Modulates `dst` by `src` with the runtime-selected kernel.
///
/// # Panics
///
/// Panics if the two targets differ in capacity.
pub fn multiply(dst: &mut RenderTarget, src: &RenderTarget) {
    multiply_with(kernel(), dst, src);
}

/// Composites `src` over `dst` with the given kernel.
///
/// # Panics
///
/// Panics if the two targets differ in capacity.
pub fn blend_with<K: Kernel + ?Sized>(kernel: &K, dst: &mut RenderTarget, src: &RenderTarget) {
    check_capacity(dst, src);
    kernel.blend(dst.data_mut(), src.data());
}

/// Modulates `dst` by `src` with the given kernel.
///
/// # Panics
///
/// Panics if the two targets differ in capacity.
pub fn multiply_with<K: Kernel + ?Sized>(kernel: &K, dst: &mut RenderTarget, src: &RenderTarget) {
    check_capacity(dst, src);
    kernel.multiply(dst.data_mut(), src.data());
}

fn check_capacity(dst: &RenderTarget, src: &RenderTarget) {
    assert_eq!(
        dst.capacity(),
        src.capacity(),
        "compositing requires render targets of equal capacity"
    );
}

/// How a layer combines with the layers below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Alpha over-blend.
    #[default]
    Normal,
    /// Per-channel modulation.
    Multiply,
}

impl BlendMode {
    /// Parses a mode name as written in scene files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(BlendMode::Normal),
            "multiply" => Some(BlendMode::Multiply),
            _ => None,
        }
    }

    /// Applies this mode with the runtime-selected kernel.
    pub fn apply(self, dst: &mut RenderTarget, src: &RenderTarget) {
        self.apply_with(kernel(), dst, src);
    }

    /// Applies this mode with the given kernel.
    pub fn apply_with<K: Kernel + ?Sized>(self, kernel: &K, dst: &mut RenderTarget, src: &RenderTarget) {
        match self {
            BlendMode::Normal => blend_with(kernel, dst, src),
            BlendMode::Multiply => multiply_with(kernel, dst, src),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(len: usize, color: Rgba) -> RenderTarget {
        let mut target = RenderTarget::new(len).unwrap();
        target.fill(color);
        target
    }

    #[test]
    fn available_starts_with_generic() {
        let kernels = available();
        assert_eq!(kernels[0].name(), "generic");
    }

    #[test]
    fn selected_kernel_is_available() {
        let name = kernel().name();
        assert!(available().iter().any(|k| k.name() == name));
        // cached: same answer twice
        assert_eq!(kernel().name(), name);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn sse2_is_always_available_on_x86_64() {
        assert!(available().iter().any(|k| k.name() == "sse2"));
        assert!(Sse2::detect().is_some());
    }

    #[test]
    fn by_name_finds_generic() {
        assert_eq!(by_name("generic").unwrap().name(), "generic");
    }

    #[test]
    fn by_name_rejects_unknown_backend() {
        assert!(matches!(
            by_name("neon9000"),
            Err(KeylightError::UnknownBackend(_))
        ));
    }

    #[test]
    fn by_name_agrees_with_available() {
        for name in list_backends() {
            let supported = available().iter().any(|k| k.name() == *name);
            match by_name(name) {
                Ok(k) => assert!(supported && k.name() == *name),
                Err(KeylightError::UnsupportedBackend(n)) => {
                    assert!(!supported);
                    assert_eq!(n, *name);
                }
                Err(other) => panic!("unexpected error for {name}: {other}"),
            }
        }
    }

    // -- target-level behavior, checked on every kernel --

    #[test]
    fn half_blue_over_opaque_red() {
        for k in available() {
            let mut x = filled(8, Rgba::opaque(255, 0, 0));
            let y = filled(8, Rgba::new(0, 0, 255, 128));
            blend_with(k, &mut x, &y);
            for c in &x {
                assert_eq!(*c, Rgba::new(127, 0, 128, 255), "kernel {}", k.name());
            }
        }
    }

    #[test]
    fn blend_transparent_source_leaves_destination() {
        for k in available() {
            let mut dst = filled(11, Rgba::new(9, 8, 7, 200));
            let before = dst.clone();
            let src = filled(11, Rgba::new(255, 255, 255, 0));
            blend_with(k, &mut dst, &src);
            assert_eq!(dst, before, "kernel {}", k.name());
        }
    }

    #[test]
    fn blend_opaque_source_replaces_destination() {
        for k in available() {
            let mut dst = filled(11, Rgba::new(9, 8, 7, 200));
            let src = filled(11, Rgba::opaque(1, 2, 3));
            blend_with(k, &mut dst, &src);
            assert_eq!(dst.as_slice(), src.as_slice(), "kernel {}", k.name());
        }
    }

    #[test]
    fn multiply_by_white_is_identity() {
        for k in available() {
            let mut dst = filled(19, Rgba::new(10, 100, 200, 250));
            let before = dst.clone();
            let src = filled(19, Rgba::WHITE);
            multiply_with(k, &mut dst, &src);
            assert_eq!(dst.as_slice(), before.as_slice(), "kernel {}", k.name());
        }
    }

    #[test]
    fn multiply_by_zero_clears_destination() {
        for k in available() {
            let mut dst = filled(19, Rgba::new(10, 100, 200, 250));
            let src = RenderTarget::new(19).unwrap();
            multiply_with(k, &mut dst, &src);
            assert!(dst.data().iter().all(|&c| c == Rgba::TRANSPARENT));
        }
    }

    #[test]
    fn padding_stays_transparent_after_compositing() {
        for k in available() {
            let mut dst = filled(5, Rgba::opaque(1, 2, 3));
            let src = filled(5, Rgba::new(200, 100, 50, 77));
            blend_with(k, &mut dst, &src);
            multiply_with(k, &mut dst, &src);
            assert!(dst.padding().iter().all(|&c| c == Rgba::TRANSPARENT));
        }
    }

    #[test]
    fn runtime_dispatch_matches_generic() {
        let mut a = filled(13, Rgba::new(40, 80, 120, 160));
        let mut b = a.clone();
        let src = filled(13, Rgba::new(200, 10, 30, 90));
        blend(&mut a, &src);
        blend_with(&Generic, &mut b, &src);
        assert_eq!(a, b);
        multiply(&mut a, &src);
        multiply_with(&Generic, &mut b, &src);
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "equal capacity")]
    fn blend_rejects_capacity_mismatch() {
        let mut dst = RenderTarget::new(8).unwrap();
        let src = RenderTarget::new(9).unwrap();
        blend(&mut dst, &src);
    }

    #[test]
    #[should_panic(expected = "equal capacity")]
    fn multiply_rejects_capacity_mismatch() {
        let mut dst = RenderTarget::new(16).unwrap();
        let src = RenderTarget::new(8).unwrap();
        multiply_with(&Generic, &mut dst, &src);
    }

    #[test]
    fn longer_source_spills_into_padding_until_cleared() {
        let mut dst = filled(6, Rgba::BLACK);
        let src = filled(7, Rgba::WHITE);
        blend(&mut dst, &src);
        // the seventh src key lands on dst padding
        assert_eq!(dst.padding()[0], Rgba::WHITE);

        dst.fill(Rgba::TRANSPARENT);
        assert_eq!(dst.padding()[0], Rgba::WHITE);

        dst.clear();
        assert!(dst.data().iter().all(|&c| c == Rgba::TRANSPARENT));
        assert!(dst.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn equal_len_composites_keep_padding_transparent() {
        let mut dst = filled(6, Rgba::opaque(10, 20, 30));
        let src = filled(6, Rgba::new(200, 100, 50, 128));
        blend(&mut dst, &src);
        multiply(&mut dst, &src);
        assert!(dst.padding().iter().all(|&c| c == Rgba::TRANSPARENT));
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn kernel_rejects_slice_length_mismatch() {
        let mut dst = [Rgba::TRANSPARENT; 4];
        let src = [Rgba::TRANSPARENT; 3];
        kernel().blend(&mut dst, &src);
    }

    #[test]
    fn empty_targets_composite_as_noop() {
        let mut dst = RenderTarget::empty();
        let src = RenderTarget::empty();
        blend(&mut dst, &src);
        multiply(&mut dst, &src);
        assert!(dst.is_empty());
    }

    // -- BlendMode --

    #[test]
    fn blend_mode_default_is_normal() {
        assert_eq!(BlendMode::default(), BlendMode::Normal);
    }

    #[test]
    fn blend_mode_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&BlendMode::Multiply).unwrap(),
            "\"multiply\""
        );
        let mode: BlendMode = serde_json::from_str("\"normal\"").unwrap();
        assert_eq!(mode, BlendMode::Normal);
    }

    #[test]
    fn blend_mode_from_name() {
        assert_eq!(BlendMode::from_name("multiply"), Some(BlendMode::Multiply));
        assert_eq!(BlendMode::from_name("screen"), None);
    }

    #[test]
    fn blend_mode_apply_dispatches() {
        let mut dst = filled(3, Rgba::WHITE);
        let src = filled(3, Rgba::new(128, 128, 128, 255));
        BlendMode::Multiply.apply(&mut dst, &src);
        assert_eq!(dst[0], Rgba::new(128, 128, 128, 255));
        BlendMode::Normal.apply_with(&Generic, &mut dst, &filled(3, Rgba::BLACK));
        assert_eq!(dst[0], Rgba::BLACK);
    }

    // -- Property-based tests --

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn entries(len: usize) -> impl Strategy<Value = Vec<Rgba>> {
            prop::collection::vec(
                any::<[u8; 4]>().prop_map(|[r, g, b, a]| Rgba::new(r, g, b, a)),
                len,
            )
        }

        fn pair() -> impl Strategy<Value = (Vec<Rgba>, Vec<Rgba>)> {
            (0_usize..=67).prop_flat_map(|len| (entries(len), entries(len)))
        }

        proptest! {
            #[test]
            fn every_kernel_blends_like_generic((dst, src) in pair()) {
                let mut expected = dst.clone();
                Generic.blend(&mut expected, &src);
                for k in available() {
                    let mut got = dst.clone();
                    k.blend(&mut got, &src);
                    prop_assert_eq!(&got, &expected, "kernel {}", k.name());
                }
            }

            #[test]
            fn every_kernel_multiplies_like_generic((dst, src) in pair()) {
                let mut expected = dst.clone();
                Generic.multiply(&mut expected, &src);
                for k in available() {
                    let mut got = dst.clone();
                    k.multiply(&mut got, &src);
                    prop_assert_eq!(&got, &expected, "kernel {}", k.name());
                }
            }
        }
    }
}
