//! Deterministic feature colors.
//!
//! Every feature gets its color from a hash of its identifier, so the same
//! feature is drawn in the same color in every view, every session and
//! regardless of render order. There is no palette and no assignment state.

use std::fmt;

use serde::{Serialize, Serializer};

/// An RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Color of a feature (or any other identifier).
///
/// Folds the UTF-16 code units into a 32-bit hash (`hash * 31 + unit`,
/// wrapping) and uses its low three bytes, least significant first, as the
/// red, green and blue channels.
pub fn color_of(identifier: &str) -> Color {
    let hash = identifier
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            i32::from(unit).wrapping_add((hash << 5).wrapping_sub(hash))
        });
    let byte = |i: u32| ((hash >> (i * 8)) & 0xff) as u8;
    Color::rgb(byte(0), byte(1), byte(2))
}

/// Linear interpolation from `a` towards `b`, per channel.
///
/// `amount` 0.0 yields `a`, 1.0 yields `b`. Each channel is rounded half-up
/// and clamped to a byte.
pub fn blend(a: Color, b: Color, amount: f64) -> Color {
    let mix = |x: u8, y: u8| {
        let x = f64::from(x);
        let y = f64::from(y);
        (x + (y - x) * amount + 0.5).floor().clamp(0.0, 255.0) as u8
    };
    Color::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

/// Midpoint blend, used for links between two features.
pub fn midpoint(a: Color, b: Color) -> Color {
    blend(a, b, 0.5)
}

/// Color of a link between two identifiers.
pub fn link_color(source: &str, target: &str) -> Color {
    midpoint(color_of(source), color_of(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_of_is_stable() {
        assert_eq!(color_of("Food"), color_of("Food"));
        assert_ne!(color_of("Food"), color_of("Drinks"));
    }

    #[test]
    fn color_of_uses_low_byte_first() {
        // "a" hashes to 97 = 0x61.
        assert_eq!(color_of("a").to_string(), "#610000");
        // "ab": 97 * 31 + 98 = 3105 = 0x0c21.
        assert_eq!(color_of("ab").to_string(), "#210c00");
        assert_eq!(color_of("").to_string(), "#000000");
    }

    #[test]
    fn color_of_wraps_long_identifiers() {
        let long = "Shop::Checkout::Payment::CreditCard::Validation".repeat(8);
        let color = color_of(&long);
        assert_eq!(color, color_of(&long));
        assert_eq!(color.to_string().len(), 7);
    }

    #[test]
    fn blend_with_itself_is_identity() {
        let c = Color::rgb(0x12, 0xab, 0xff);
        for amount in [0.0, 0.25, 0.5, 0.9, 1.0] {
            assert_eq!(blend(c, c, amount), c);
        }
    }

    #[test]
    fn blend_midpoint_rounds_half_up() {
        let a = Color::rgb(0, 0, 255);
        let b = Color::rgb(1, 255, 0);
        assert_eq!(midpoint(a, b), Color::rgb(1, 128, 128));
    }

    #[test]
    fn blend_clamps_out_of_range_amounts() {
        let a = Color::rgb(100, 100, 100);
        let b = Color::rgb(200, 0, 250);
        assert_eq!(blend(a, b, 3.0), Color::rgb(255, 0, 255));
        assert_eq!(blend(a, b, -3.0), Color::rgb(0, 255, 0));
    }

    #[test]
    fn prints_and_serializes_as_hex() {
        let c = Color::rgb(0x5e, 0x42, 0xa6);
        assert_eq!(c.to_string(), "#5e42a6");
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#5e42a6\"");
    }
}
