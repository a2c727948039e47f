//! SSE2 and AVX2 compositing kernels.
//!
//! Entries are widened to 16-bit lanes, combined with the same integer
//! formulas as [`Rgba::blend`] and [`Rgba::multiply`], and narrowed back.
//! Division by 255 uses `(t + (t >> 8)) >> 8` with `t = x + 128`, which
//! equals `(x + 127) / 255` for every `x <= 255 * 255`.
//!
//! Kernel values can only be obtained after a successful CPU feature probe,
//! which is what makes the `unsafe` calls below sound.

#![allow(unsafe_code)]

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::{blend_entries, check_lengths, multiply_entries, Kernel};
use crate::color::Rgba;

static SSE2: Sse2 = Sse2 { _probed: () };
static AVX2: Avx2 = Avx2 { _probed: () };

pub(super) fn sse2() -> Option<&'static Sse2> {
    Sse2::detect().map(|_| &SSE2)
}

pub(super) fn avx2() -> Option<&'static Avx2> {
    Avx2::detect().map(|_| &AVX2)
}

/// 128-bit kernel, four entries per register.
#[derive(Debug, Clone, Copy)]
pub struct Sse2 {
    _probed: (),
}

impl Sse2 {
    /// Returns the kernel if this CPU supports SSE2.
    pub fn detect() -> Option<Self> {
        is_x86_feature_detected!("sse2").then_some(Self { _probed: () })
    }
}

impl Kernel for Sse2 {
    fn name(&self) -> &'static str {
        "sse2"
    }

    fn blend(&self, dst: &mut [Rgba], src: &[Rgba]) {
        check_lengths(dst, src);
        // SAFETY: `Sse2` is only constructed after detecting SSE2.
        unsafe { blend_sse2(dst, src) }
    }

    fn multiply(&self, dst: &mut [Rgba], src: &[Rgba]) {
        check_lengths(dst, src);
        // SAFETY: `Sse2` is only constructed after detecting SSE2.
        unsafe { multiply_sse2(dst, src) }
    }
}

/// 256-bit kernel, eight entries per register.
#[derive(Debug, Clone, Copy)]
pub struct Avx2 {
    _probed: (),
}

impl Avx2 {
    /// Returns the kernel if this CPU supports AVX2.
    pub fn detect() -> Option<Self> {
        is_x86_feature_detected!("avx2").then_some(Self { _probed: () })
    }
}

impl Kernel for Avx2 {
    fn name(&self) -> &'static str {
        "avx2"
    }

    fn blend(&self, dst: &mut [Rgba], src: &[Rgba]) {
        check_lengths(dst, src);
        // SAFETY: `Avx2` is only constructed after detecting AVX2.
        unsafe { blend_avx2(dst, src) }
    }

    fn multiply(&self, dst: &mut [Rgba], src: &[Rgba]) {
        check_lengths(dst, src);
        // SAFETY: `Avx2` is only constructed after detecting AVX2.
        unsafe { multiply_avx2(dst, src) }
    }
}

// ── SSE2 ───────────────────────────────────────────────────────────

const SSE2_ENTRIES: usize = 4;

#[target_feature(enable = "sse2")]
unsafe fn blend_sse2(dst: &mut [Rgba], src: &[Rgba]) {
    let zero = _mm_setzero_si128();
    let alpha_lanes = _mm_set_epi16(-1, 0, 0, 0, -1, 0, 0, 0);
    let mut dst_chunks = dst.chunks_exact_mut(SSE2_ENTRIES);
    let mut src_chunks = src.chunks_exact(SSE2_ENTRIES);
    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        let dp = d.as_mut_ptr().cast::<__m128i>();
        let dv = _mm_loadu_si128(dp);
        let sv = _mm_loadu_si128(s.as_ptr().cast::<__m128i>());
        let lo = blend_lanes_sse2(
            _mm_unpacklo_epi8(dv, zero),
            _mm_unpacklo_epi8(sv, zero),
            alpha_lanes,
        );
        let hi = blend_lanes_sse2(
            _mm_unpackhi_epi8(dv, zero),
            _mm_unpackhi_epi8(sv, zero),
            alpha_lanes,
        );
        _mm_storeu_si128(dp, _mm_packus_epi16(lo, hi));
    }
    blend_entries(dst_chunks.into_remainder(), src_chunks.remainder());
}

#[target_feature(enable = "sse2")]
unsafe fn multiply_sse2(dst: &mut [Rgba], src: &[Rgba]) {
    let zero = _mm_setzero_si128();
    let mut dst_chunks = dst.chunks_exact_mut(SSE2_ENTRIES);
    let mut src_chunks = src.chunks_exact(SSE2_ENTRIES);
    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        let dp = d.as_mut_ptr().cast::<__m128i>();
        let dv = _mm_loadu_si128(dp);
        let sv = _mm_loadu_si128(s.as_ptr().cast::<__m128i>());
        let lo = div255_sse2(_mm_mullo_epi16(
            _mm_unpacklo_epi8(dv, zero),
            _mm_unpacklo_epi8(sv, zero),
        ));
        let hi = div255_sse2(_mm_mullo_epi16(
            _mm_unpackhi_epi8(dv, zero),
            _mm_unpackhi_epi8(sv, zero),
        ));
        _mm_storeu_si128(dp, _mm_packus_epi16(lo, hi));
    }
    multiply_entries(dst_chunks.into_remainder(), src_chunks.remainder());
}

/// Blends two entries held as eight 16-bit lanes each.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn blend_lanes_sse2(d: __m128i, s: __m128i, alpha_lanes: __m128i) -> __m128i {
    // copy each entry's alpha (lanes 3 and 7) into all four of its lanes
    let a = _mm_shufflehi_epi16::<0xFF>(_mm_shufflelo_epi16::<0xFF>(s));
    let inv = _mm_sub_epi16(_mm_set1_epi16(255), a);
    let faded = _mm_mullo_epi16(d, inv);
    let color = div255_sse2(_mm_add_epi16(_mm_mullo_epi16(s, a), faded));
    let alpha = _mm_add_epi16(s, div255_sse2(faded));
    _mm_or_si128(
        _mm_and_si128(alpha_lanes, alpha),
        _mm_andnot_si128(alpha_lanes, color),
    )
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn div255_sse2(x: __m128i) -> __m128i {
    let t = _mm_add_epi16(x, _mm_set1_epi16(128));
    _mm_srli_epi16::<8>(_mm_add_epi16(t, _mm_srli_epi16::<8>(t)))
}

// ── AVX2 ───────────────────────────────────────────────────────────
//
// unpack and pack work within each 128-bit half, so the entry order
// survives the round trip just as it does for SSE2.

const AVX2_ENTRIES: usize = 8;

#[target_feature(enable = "avx2")]
unsafe fn blend_avx2(dst: &mut [Rgba], src: &[Rgba]) {
    let zero = _mm256_setzero_si256();
    let alpha_lanes = _mm256_set_epi16(-1, 0, 0, 0, -1, 0, 0, 0, -1, 0, 0, 0, -1, 0, 0, 0);
    let mut dst_chunks = dst.chunks_exact_mut(AVX2_ENTRIES);
    let mut src_chunks = src.chunks_exact(AVX2_ENTRIES);
    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        let dp = d.as_mut_ptr().cast::<__m256i>();
        let dv = _mm256_loadu_si256(dp);
        let sv = _mm256_loadu_si256(s.as_ptr().cast::<__m256i>());
        let lo = blend_lanes_avx2(
            _mm256_unpacklo_epi8(dv, zero),
            _mm256_unpacklo_epi8(sv, zero),
            alpha_lanes,
        );
        let hi = blend_lanes_avx2(
            _mm256_unpackhi_epi8(dv, zero),
            _mm256_unpackhi_epi8(sv, zero),
            alpha_lanes,
        );
        _mm256_storeu_si256(dp, _mm256_packus_epi16(lo, hi));
    }
    blend_entries(dst_chunks.into_remainder(), src_chunks.remainder());
}

#[target_feature(enable = "avx2")]
unsafe fn multiply_avx2(dst: &mut [Rgba], src: &[Rgba]) {
    let zero = _mm256_setzero_si256();
    let mut dst_chunks = dst.chunks_exact_mut(AVX2_ENTRIES);
    let mut src_chunks = src.chunks_exact(AVX2_ENTRIES);
    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        let dp = d.as_mut_ptr().cast::<__m256i>();
        let dv = _mm256_loadu_si256(dp);
        let sv = _mm256_loadu_si256(s.as_ptr().cast::<__m256i>());
        let lo = div255_avx2(_mm256_mullo_epi16(
            _mm256_unpacklo_epi8(dv, zero),
            _mm256_unpacklo_epi8(sv, zero),
        ));
        let hi = div255_avx2(_mm256_mullo_epi16(
            _mm256_unpackhi_epi8(dv, zero),
            _mm256_unpackhi_epi8(sv, zero),
        ));
        _mm256_storeu_si256(dp, _mm256_packus_epi16(lo, hi));
    }
    multiply_entries(dst_chunks.into_remainder(), src_chunks.remainder());
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn blend_lanes_avx2(d: __m256i, s: __m256i, alpha_lanes: __m256i) -> __m256i {
    let a = _mm256_shufflehi_epi16::<0xFF>(_mm256_shufflelo_epi16::<0xFF>(s));
    let inv = _mm256_sub_epi16(_mm256_set1_epi16(255), a);
    let faded = _mm256_mullo_epi16(d, inv);
    let color = div255_avx2(_mm256_add_epi16(_mm256_mullo_epi16(s, a), faded));
    let alpha = _mm256_add_epi16(s, div255_avx2(faded));
    _mm256_or_si256(
        _mm256_and_si256(alpha_lanes, alpha),
        _mm256_andnot_si256(alpha_lanes, color),
    )
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn div255_avx2(x: __m256i) -> __m256i {
    let t = _mm256_add_epi16(x, _mm256_set1_epi16(128));
    _mm256_srli_epi16::<8>(_mm256_add_epi16(t, _mm256_srli_epi16::<8>(t)))
}
