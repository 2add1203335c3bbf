//! Palette colours.
//!
//! The MK2 has no RGB in its note messages: `data2` is an index into a
//! fixed 128-entry palette.  A handful of indexes get names; any other
//! index is still a valid [`Color`].

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::pad::Square;

/// A palette index, 0..=127.  Index 0 is off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u8);

impl Color {
    pub const NONE:        Color = Color(0);
    pub const ORANGE:      Color = Color(9);
    pub const YELLOW:      Color = Color(13);
    pub const LIGHT_GREEN: Color = Color(21);
    pub const CYAN:        Color = Color(37);
    pub const BLUE:        Color = Color(45);
    pub const PURPLE:      Color = Color(53);
    pub const RED:         Color = Color(72);
    pub const LIGHT_BLUE:  Color = Color(79);
    pub const DARK_PURPLE: Color = Color(81);

    /// Named colours.  The order after `NONE` is the default row order.
    pub const NAMED: [(&'static str, Color); 10] = [
        ("NONE",        Color::NONE),
        ("YELLOW",      Color::YELLOW),
        ("BLUE",        Color::BLUE),
        ("PURPLE",      Color::PURPLE),
        ("RED",         Color::RED),
        ("LIGHT_BLUE",  Color::LIGHT_BLUE),
        ("LIGHT_GREEN", Color::LIGHT_GREEN),
        ("DARK_PURPLE", Color::DARK_PURPLE),
        ("ORANGE",      Color::ORANGE),
        ("CYAN",        Color::CYAN),
    ];

    /// The velocity byte, masked to 7 bits.
    pub fn index(self) -> u8 {
        self.0 & 0x7F
    }

    pub fn name(self) -> Option<&'static str> {
        Color::NAMED.iter().find(|(_, c)| *c == self).map(|(n, _)| *n)
    }

    /// Default colour for a grid row.  Cycles through the named colours,
    /// skipping `NONE`, so every row gets one.
    pub fn row_default(row: usize) -> Color {
        let named = &Color::NAMED[1..];
        named[row % named.len()].1
    }

    /// Approximate on-screen colour as packed ARGB, for the virtual pad.
    pub fn argb(self) -> u32 {
        match self.index() {
            0 => 0xFF202020,
            1 => 0xFF5A5A5A,
            2 => 0xFFA0A0A0,
            3 => 0xFFFFFFFF,
            i @ 4..=63 => {
                // 15 hue groups of 4 shades: bright, full, dim, dark
                let group = (i - 4) / 4;
                let shade = (i - 4) % 4;
                let (sat, val) = match shade {
                    0 => (0.55, 1.00),
                    1 => (0.95, 0.95),
                    2 => (0.95, 0.50),
                    _ => (0.95, 0.25),
                };
                hsv_to_argb(group as f32 * 24.0, sat, val)
            }
            i => hsv_to_argb((i - 64) as f32 * 360.0 / 64.0, 0.85, 0.90),
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts a name (`light_green`, `LIGHT-GREEN`) or an index `0..=127`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return if index <= 127 {
                Ok(Color(index))
            } else {
                Err(Error::UnknownColor(s.to_string()))
            };
        }
        let wanted = s.to_ascii_uppercase().replace('-', "_");
        Color::NAMED
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, c)| *c)
            .ok_or_else(|| Error::UnknownColor(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None       => write!(f, "#{}", self.index()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Palette arithmetic
// ════════════════════════════════════════════════════════════════════════════

/// Colour index shown on `square` when the whole palette is laid out over
/// two 8×8 pages.  Page 0 holds indexes 0..64, page 1 holds 64..128; each
/// page starts top left and reads left to right, top to bottom.
pub fn palette_index(square: Square, bank: u8) -> u8 {
    square.column + (7 - square.row) * 8 + (bank & 1) * 64
}

/// Colour index for a pressed pad id while a palette page is displayed.
pub fn palette_index_for_id(id: u8, bank: u8) -> Option<u8> {
    Square::from_id(id).map(|s| palette_index(s, bank))
}

/// Convert HSV to packed ARGB (0xAARRGGBB, A=0xFF).
fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h % 360.0;
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let channel = |x: f32| (x * 255.0) as u32;
    0xFF000000 | (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
