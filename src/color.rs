//! RGBA color value used throughout the reducer.
//!
//! Channels are stored in the 16-bit device range. 8-bit samples are widened
//! with `v * 257` (0xAB becomes 0xABAB) so that shifting right by eight recovers
//! the original value exactly.

use image::Rgba;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, u16::MAX);
    pub const WHITE: Color = Color::new(u16::MAX, u16::MAX, u16::MAX, u16::MAX);

    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Build a color from 8-bit channels.
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: widen(r),
            g: widen(g),
            b: widen(b),
            a: widen(a),
        }
    }

    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, u8::MAX)
    }

    /// Channels normalized down to 8 bits. Low-order precision is dropped.
    pub const fn to_rgba8(self) -> [u8; 4] {
        [
            narrow(self.r),
            narrow(self.g),
            narrow(self.b),
            narrow(self.a),
        ]
    }

    pub const fn to_rgb8(self) -> [u8; 3] {
        [narrow(self.r), narrow(self.g), narrow(self.b)]
    }

    /// The color as the 8-bit encoder will write it, widened back to 16 bits.
    /// Colors that narrow to the same 8-bit value share one normalized form.
    pub const fn normalized(self) -> Self {
        let [r, g, b, a] = self.to_rgba8();
        Self::from_rgba8(r, g, b, a)
    }

    pub const fn channels(self) -> [u16; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Sum of squared differences over all four 16-bit channels.
    pub fn squared_channel_distance(self, other: Color) -> u64 {
        self.channels()
            .iter()
            .zip(other.channels().iter())
            .map(|(&x, &y)| {
                let d = x as i64 - y as i64;
                (d * d) as u64
            })
            .sum()
    }

    /// Squared Euclidean distance over R, G, B after normalizing to 8 bits.
    /// Alpha does not take part.
    pub fn rgb8_distance(self, other: Color) -> u32 {
        let [r1, g1, b1] = self.to_rgb8();
        let [r2, g2, b2] = other.to_rgb8();
        let dr = r1 as i32 - r2 as i32;
        let dg = g1 as i32 - g2 as i32;
        let db = b1 as i32 - b2 as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// `#rrggbbaa` in 8-bit precision.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

const fn widen(v: u8) -> u16 {
    v as u16 * 257
}

const fn narrow(v: u16) -> u8 {
    (v >> 8) as u8
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R: {}, G: {}, B: {}, A: {}", self.r, self.g, self.b, self.a)
    }
}

impl From<Rgba<u8>> for Color {
    fn from(p: Rgba<u8>) -> Self {
        Color::from_rgba8(p[0], p[1], p[2], p[3])
    }
}

impl From<Rgba<u16>> for Color {
    fn from(p: Rgba<u16>) -> Self {
        Color::new(p[0], p[1], p[2], p[3])
    }
}

impl From<Color> for Rgba<u8> {
    fn from(c: Color) -> Self {
        Rgba(c.to_rgba8())
    }
}
