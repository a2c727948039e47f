//! The per-key color entry and its per-entry compositing formulas.
//!
//! [`Rgba`] is four 8-bit channels in R, G, B, A order with no padding, so a
//! slice of entries can be handed to a device transport as raw bytes. The
//! [`Rgba::blend`] and [`Rgba::multiply`] formulas defined here are the
//! reference every compositing kernel must reproduce bit for bit.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeylightError;

/// One key's color: 8-bit red, green, blue and alpha.
///
/// Serializes as a hex string `"#rrggbbaa"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black. Padding entries always hold this value.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from its three components.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parses `"#rrggbb"` or `"#rrggbbaa"`, with or without the leading `#`,
    /// case insensitive. Six digits imply an opaque color.
    ///
    /// Returns `KeylightError::InvalidColor` for any other input.
    pub fn from_hex(hex: &str) -> Result<Rgba, KeylightError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 && digits.len() != 8 {
            return Err(KeylightError::InvalidColor(format!(
                "expected 6 or 8 hex digits, got '{hex}'"
            )));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(KeylightError::InvalidColor(format!(
                "non-hex digit in '{hex}'"
            )));
        }
        let channel = |at: usize| {
            u8::from_str_radix(&digits[at..at + 2], 16)
                .map_err(|e| KeylightError::InvalidColor(format!("'{hex}': {e}")))
        };
        let r = channel(0)?;
        let g = channel(2)?;
        let b = channel(4)?;
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Rgba { r, g, b, a })
    }

    /// Formats as `"#rrggbbaa"`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    /// Composites `src` over `self` using `src`'s alpha.
    ///
    /// Color channels: `(src * src.a + dst * (255 - src.a)) / 255`.
    /// Alpha: `src.a + dst.a * (255 - src.a) / 255`. Divisions round to nearest.
    #[inline]
    pub fn blend(self, src: Rgba) -> Rgba {
        let alpha = u32::from(src.a);
        let inv = 255 - alpha;
        let mix = |d: u8, s: u8| div255(u32::from(s) * alpha + u32::from(d) * inv);
        Rgba {
            r: mix(self.r, src.r),
            g: mix(self.g, src.g),
            b: mix(self.b, src.b),
            a: src.a + div255(u32::from(self.a) * inv),
        }
    }

    /// Modulates every channel, alpha included, by `src`: `dst * src / 255`.
    #[inline]
    pub fn multiply(self, src: Rgba) -> Rgba {
        let mul = |d: u8, s: u8| div255(u32::from(d) * u32::from(s));
        Rgba {
            r: mul(self.r, src.r),
            g: mul(self.g, src.g),
            b: mul(self.b, src.b),
            a: mul(self.a, src.a),
        }
    }
}

/// `x / 255` rounded to nearest. Exact for `x <= 255 * 255`.
#[inline]
pub(crate) fn div255(x: u32) -> u8 {
    ((x + 127) / 255) as u8
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
