//! In-memory model of the Launchpad LEDs.
//!
//! A [`Surface`] is fed the exact bytes that go to the device and keeps
//! what each pad would show.  The virtual pad window draws from it and the
//! tests assert against it, so both see the wire format rather than the
//! intent behind it.

use crate::color::Color;
use crate::message::{
    parse_sysex, LightMode, ShortMessage, NOTE_OFF, NOTE_ON, SYSEX_LIGHT_ALL, SYSEX_LIGHT_COLUMN,
    SYSEX_LIGHT_ROW, SYSEX_SCROLL_TEXT,
};
use crate::pad::{Button, Pad, Square};

/// State of one LED.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Led {
    pub color: Color,
    pub mode:  LightMode,
    /// Static colour underneath; a flashing LED alternates with it.
    pub base:  Color,
}

impl Led {
    pub fn is_lit(&self) -> bool {
        self.color != Color::NONE
    }

    /// Colour shown at `millis`: flashing toggles every 250 ms.
    pub fn shown(&self, millis: u64) -> Color {
        match self.mode {
            LightMode::Flashing if (millis / 250) % 2 == 1 => self.base,
            _ => self.color,
        }
    }

    /// Brightness 0..=1 at `millis`: pulsing breathes over one second.
    pub fn brightness(&self, millis: u64) -> f32 {
        match self.mode {
            LightMode::Pulsing => {
                let phase = (millis % 1000) as f32 / 1000.0;
                0.35 + 0.65 * (0.5 - 0.5 * (phase * std::f32::consts::TAU).cos())
            }
            _ => 1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Surface {
    squares: [[Led; 8]; 8],
    top:     [Led; 8],
    right:   [Led; 8],
    text:    Option<(String, Color)>,
    /// Number of messages applied, including ignored ones.
    received: u64,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn led(&self, pad: impl Into<Pad>) -> Led {
        match pad.into() {
            Pad::Square(s) => self.squares[s.row as usize][s.column as usize],
            Pad::Button(b) if b.is_top() => self.top[b.id() as usize - 104],
            Pad::Button(b) => self.right[b.row() as usize],
        }
    }

    fn led_mut(&mut self, pad: Pad) -> &mut Led {
        match pad {
            Pad::Square(s) => &mut self.squares[s.row as usize][s.column as usize],
            Pad::Button(b) if b.is_top() => &mut self.top[b.id() as usize - 104],
            Pad::Button(b) => &mut self.right[b.row() as usize],
        }
    }

    /// Last scrolled text and its colour.
    pub fn text(&self) -> Option<(&str, Color)> {
        self.text.as_ref().map(|(t, c)| (t.as_str(), *c))
    }

    /// Pads with a non-zero colour.
    pub fn lit_count(&self) -> usize {
        Pad::all().filter(|p| self.led(*p).is_lit()).count()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn clear(&mut self) {
        *self = Surface { received: self.received, ..Surface::default() };
    }

    /// Apply one outbound message.  Anything not understood is ignored.
    pub fn apply(&mut self, bytes: &[u8]) {
        self.received += 1;
        if let Some(msg) = ShortMessage::from_bytes(bytes) {
            self.apply_short(msg);
        } else if let Some((command, payload)) = parse_sysex(bytes) {
            self.apply_sysex(command, payload);
        }
    }

    fn apply_short(&mut self, msg: ShortMessage) {
        let (status, color, mode) = if msg.command() == NOTE_OFF {
            (NOTE_ON, Color::NONE, Some(LightMode::Static))
        } else {
            (msg.status, Color(msg.data2), LightMode::from_channel(msg.channel()))
        };
        let (Some(pad), Some(mode)) = (Pad::find(status, msg.data1), mode) else {
            return;
        };
        let led = self.led_mut(pad);
        led.color = color;
        led.mode = mode;
        if mode == LightMode::Static {
            led.base = color;
        }
    }

    fn apply_sysex(&mut self, command: u8, payload: &[u8]) {
        match (command, payload) {
            (SYSEX_LIGHT_ROW, [row, color, ..]) => self.fill_row(*row, Color(*color)),
            (SYSEX_LIGHT_COLUMN, [column, color, ..]) => self.fill_column(*column, Color(*color)),
            (SYSEX_LIGHT_ALL, [color, ..]) => {
                for pad in Pad::all() {
                    *self.led_mut(pad) = solid(Color(*color));
                }
            }
            (SYSEX_SCROLL_TEXT, [color, _looping, text @ ..]) => {
                let text = text.iter().map(|b| *b as char).collect();
                self.text = Some((text, Color(*color)));
            }
            _ => {}
        }
    }

    /// Rows 0..=7 include their right-column button; row 8 is the top row.
    fn fill_row(&mut self, row: u8, color: Color) {
        match row {
            0..=7 => {
                for column in 0..8 {
                    *self.led_mut(Square::new(row, column).into()) = solid(color);
                }
                if let Some(b) = Button::right(row as usize) {
                    *self.led_mut(b.into()) = solid(color);
                }
            }
            8 => self.top = [solid(color); 8],
            _ => {}
        }
    }

    /// Columns 0..=7 include their top button; column 8 is the right column.
    fn fill_column(&mut self, column: u8, color: Color) {
        match column {
            0..=7 => {
                for row in 0..8 {
                    *self.led_mut(Square::new(row, column).into()) = solid(color);
                }
                self.top[column as usize] = solid(color);
            }
            8 => self.right = [solid(color); 8],
            _ => {}
        }
    }
}

fn solid(color: Color) -> Led {
    Led { color, mode: LightMode::Static, base: color }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{all_sysex, column_sysex, row_sysex, text_sysex, PadCommand};

    fn feed(surface: &mut Surface, cmd: PadCommand) {
        for m in cmd.encode() {
            surface.apply(&m);
        }
    }

    #[test]
    fn static_light_sets_base() {
        let mut s = Surface::new();
        feed(&mut s, PadCommand::light(Square::new(2, 3), Color::RED));
        let led = s.led(Square::new(2, 3));
        assert_eq!(led, Led { color: Color::RED, mode: LightMode::Static, base: Color::RED });
        assert_eq!(s.lit_count(), 1);
    }

    #[test]
    fn flashing_keeps_base() {
        let mut s = Surface::new();
        feed(&mut s, PadCommand::light(Button::Mixer, Color::BLUE));
        feed(&mut s, PadCommand::blink(Button::Mixer, Color::RED));
        let led = s.led(Button::Mixer);
        assert_eq!(led.mode, LightMode::Flashing);
        assert_eq!(led.shown(0), Color::RED);
        assert_eq!(led.shown(300), Color::BLUE);
    }

    #[test]
    fn pulsing_breathes() {
        let led = Led { color: Color::RED, mode: LightMode::Pulsing, base: Color::NONE };
        assert!(led.brightness(0) < led.brightness(500));
        assert_eq!(Led::default().brightness(123), 1.0);
    }

    #[test]
    fn note_off_clears() {
        let mut s = Surface::new();
        feed(&mut s, PadCommand::light(Square::new(0, 0), Color::RED));
        s.apply(&[0x80, 11, 0]);
        assert!(!s.led(Square::new(0, 0)).is_lit());
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = Surface::new();
        s.apply(&all_sysex(Color::YELLOW));
        assert_eq!(s.lit_count(), 80);
        feed(&mut s, PadCommand::Reset);
        assert_eq!(s.lit_count(), 0);
    }

    #[test]
    fn row_fill_includes_right_button() {
        let mut s = Surface::new();
        s.apply(&row_sysex(0, Color::BLUE));
        assert_eq!(s.lit_count(), 9);
        assert_eq!(s.led(Button::Record).color, Color::BLUE);
        assert_eq!(s.led(Square::new(0, 7)).color, Color::BLUE);
        assert!(!s.led(Square::new(1, 0)).is_lit());
    }

    #[test]
    fn top_row_and_right_column_fills() {
        let mut s = Surface::new();
        s.apply(&row_sysex(8, Color::RED));
        assert_eq!(s.led(Button::CursorUp).color, Color::RED);
        s.apply(&column_sysex(8, Color::CYAN));
        assert_eq!(s.led(Button::Volume).color, Color::CYAN);
        assert_eq!(s.lit_count(), 16);
    }

    #[test]
    fn text_is_recorded() {
        let mut s = Surface::new();
        s.apply(&text_sysex("kubernetes", Color::BLUE));
        assert_eq!(s.text(), Some(("kubernetes", Color::BLUE)));
        assert_eq!(s.lit_count(), 0);
    }

    #[test]
    fn junk_is_ignored() {
        let mut s = Surface::new();
        s.apply(&[]);
        s.apply(&[0x90, 95, 10]);
        s.apply(&[0x93, 11, 10]); // channel 3 is not a light mode
        assert_eq!(s.lit_count(), 0);
        assert_eq!(s.received(), 3);
    }
}
