//! MIDI messages to and from the Launchpad.
//!
//! Outbound, a pad is lit with a 3-byte note / control change whose
//! velocity is the palette index.  The MIDI channel picks the light mode:
//! channel 1 is static, 2 flashes, 3 pulses (0, 1, 2 on the wire).
//! Everything else (scrolling text, row and column fills) is system
//! exclusive with the Novation header `F0 00 20 29 02 18`.
//!
//! Inbound, a press is velocity 127 and a release velocity 0.

use crate::color::Color;
use crate::pad::{Button, Pad, Square};

pub const NOTE_OFF:         u8 = 0x80;
pub const NOTE_ON:          u8 = 0x90;
pub const CONTROL_CHANGE:   u8 = 0xB0;
pub const PRESSED_VELOCITY: u8 = 127;

pub const SYSEX_HEADER: [u8; 6] = [0xF0, 0x00, 0x20, 0x29, 0x02, 0x18];
pub const SYSEX_END:    u8 = 0xF7;

pub const SYSEX_LIGHT_COLUMN: u8 = 0x0C;
pub const SYSEX_LIGHT_ROW:    u8 = 0x0D;
pub const SYSEX_LIGHT_ALL:    u8 = 0x0E;
pub const SYSEX_SCROLL_TEXT:  u8 = 0x14;

// ════════════════════════════════════════════════════════════════════════════
// LightMode
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightMode {
    #[default]
    Static,
    /// Flashes between the current static colour and the new one.
    Flashing,
    /// Breathes the new colour.
    Pulsing,
}

impl LightMode {
    pub fn channel(self) -> u8 {
        match self {
            LightMode::Static   => 0,
            LightMode::Flashing => 1,
            LightMode::Pulsing  => 2,
        }
    }

    pub fn from_channel(channel: u8) -> Option<LightMode> {
        match channel {
            0 => Some(LightMode::Static),
            1 => Some(LightMode::Flashing),
            2 => Some(LightMode::Pulsing),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShortMessage
// ════════════════════════════════════════════════════════════════════════════

/// A 3-byte channel message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShortMessage {
    pub status: u8,
    pub data1:  u8,
    pub data2:  u8,
}

impl ShortMessage {
    /// Combine a command nibble and a channel into the status byte.  Any
    /// channel bits already in `command` are dropped.
    pub fn new(command: u8, channel: u8, data1: u8, data2: u8) -> Self {
        ShortMessage {
            status: (command & 0xF0) | (channel & 0x0F),
            data1:  data1 & 0x7F,
            data2:  data2 & 0x7F,
        }
    }

    pub fn command(&self) -> u8 { self.status & 0xF0 }
    pub fn channel(&self) -> u8 { self.status & 0x0F }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }

    /// Parse a channel message; sysex and running status are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Option<ShortMessage> {
        match bytes {
            [status, data1, data2, ..] if *status & 0x80 != 0 && *status < 0xF0 => {
                Some(ShortMessage { status: *status, data1: *data1, data2: *data2 })
            }
            _ => None,
        }
    }

    /// Light `pad` in `color` using `mode`.
    pub fn light(pad: Pad, mode: LightMode, color: Color) -> Self {
        ShortMessage::new(pad.status(), mode.channel(), pad.id(), color.index())
    }

    /// Turn `pad` off (static colour 0).
    pub fn off(pad: Pad) -> Self {
        ShortMessage::light(pad, LightMode::Static, Color::NONE)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// System exclusive
// ════════════════════════════════════════════════════════════════════════════

/// Wrap a Launchpad sysex command and its payload in header and end byte.
pub fn sysex(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SYSEX_HEADER.len() + payload.len() + 2);
    out.extend_from_slice(&SYSEX_HEADER);
    out.push(command);
    out.extend(payload.iter().map(|b| b & 0x7F));
    out.push(SYSEX_END);
    out
}

/// Scroll `text` once across the grid.  Non-ASCII characters become `?`.
pub fn text_sysex(text: &str, color: Color) -> Vec<u8> {
    let mut payload = vec![color.index(), 0]; // 0 = do not loop
    payload.extend(text.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));
    sysex(SYSEX_SCROLL_TEXT, &payload)
}

/// Light a whole row; row 8 is the top button row.
pub fn row_sysex(row: u8, color: Color) -> Vec<u8> {
    sysex(SYSEX_LIGHT_ROW, &[row, color.index()])
}

/// Light a whole column; column 8 is the right button column.
pub fn column_sysex(column: u8, color: Color) -> Vec<u8> {
    sysex(SYSEX_LIGHT_COLUMN, &[column, color.index()])
}

pub fn all_sysex(color: Color) -> Vec<u8> {
    sysex(SYSEX_LIGHT_ALL, &[color.index()])
}

/// Split a sysex message into its Launchpad command and payload.
pub fn parse_sysex(bytes: &[u8]) -> Option<(u8, &[u8])> {
    let body = bytes.strip_prefix(&SYSEX_HEADER[..])?;
    let body = body.strip_suffix(&[SYSEX_END])?;
    let (command, payload) = body.split_first()?;
    Some((*command, payload))
}

// ════════════════════════════════════════════════════════════════════════════
// PadCommand: what the application asks the device to do
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PadCommand {
    Light  { pad: Pad, color: Color },
    Off    { pad: Pad },
    Blink  { pad: Pad, color: Color },
    Pulse  { pad: Pad, color: Color },
    Text   { text: String, color: Color },
    FillRow { row: u8, color: Color },
    FillAll { color: Color },
    /// Turn every button and square off.
    Reset,
}

impl PadCommand {
    pub fn light(pad: impl Into<Pad>, color: Color) -> Self {
        PadCommand::Light { pad: pad.into(), color }
    }

    pub fn off(pad: impl Into<Pad>) -> Self {
        PadCommand::Off { pad: pad.into() }
    }

    pub fn blink(pad: impl Into<Pad>, color: Color) -> Self {
        PadCommand::Blink { pad: pad.into(), color }
    }

    pub fn pulse(pad: impl Into<Pad>, color: Color) -> Self {
        PadCommand::Pulse { pad: pad.into(), color }
    }

    pub fn text(text: impl Into<String>, color: Color) -> Self {
        PadCommand::Text { text: text.into(), color }
    }

    /// The raw MIDI messages for this command, in send order.
    pub fn encode(&self) -> Vec<Vec<u8>> {
        let short = |m: ShortMessage| m.to_bytes().to_vec();
        match self {
            PadCommand::Light { pad, color } =>
                vec![short(ShortMessage::light(*pad, LightMode::Static, *color))],
            PadCommand::Off { pad } =>
                vec![short(ShortMessage::off(*pad))],
            PadCommand::Blink { pad, color } =>
                vec![short(ShortMessage::light(*pad, LightMode::Flashing, *color))],
            PadCommand::Pulse { pad, color } =>
                vec![short(ShortMessage::light(*pad, LightMode::Pulsing, *color))],
            PadCommand::Text { text, color } =>
                vec![text_sysex(text, *color)],
            PadCommand::FillRow { row, color } =>
                vec![row_sysex(*row, *color)],
            PadCommand::FillAll { color } =>
                vec![all_sysex(*color)],
            PadCommand::Reset =>
                Pad::all().map(|p| short(ShortMessage::off(p))).collect(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PadEvent: what the device reports
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadEvent {
    Pressed(Pad),
    Released(Pad),
}

impl PadEvent {
    /// Decode a message received from the device.  Unknown pads and
    /// non-note messages yield `None`.
    pub fn decode(bytes: &[u8]) -> Option<PadEvent> {
        let msg = ShortMessage::from_bytes(bytes)?;
        let (command, pressed) = match msg.command() {
            NOTE_OFF       => (NOTE_ON, false),
            NOTE_ON        => (NOTE_ON, msg.data2 == PRESSED_VELOCITY),
            CONTROL_CHANGE => (CONTROL_CHANGE, msg.data2 == PRESSED_VELOCITY),
            _              => return None,
        };

        let pad = match msg.data1 {
            104..=111 | 19 | 29 | 39 | 49 | 59 | 69 | 79 | 89 =>
                Button::find(command, msg.data1).map(Pad::Button),
            id if command == NOTE_ON =>
                Square::from_id(id).map(Pad::Square),
            _ => None,
        }?;

        Some(if pressed { PadEvent::Pressed(pad) } else { PadEvent::Released(pad) })
    }

    pub fn pad(&self) -> Pad {
        match self {
            PadEvent::Pressed(p) | PadEvent::Released(p) => *p,
        }
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self, PadEvent::Pressed(_))
    }

    /// The message the device would send for this event.
    pub fn encode(&self) -> [u8; 3] {
        let pad = self.pad();
        let velocity = if self.is_pressed() { PRESSED_VELOCITY } else { 0 };
        ShortMessage::new(pad.status(), 0, pad.id(), velocity).to_bytes()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_square_static() {
        let m = ShortMessage::light(Square::new(0, 0).into(), LightMode::Static, Color::BLUE);
        assert_eq!(m.to_bytes(), [144, 11, 45]);
    }

    #[test]
    fn pulse_and_blink_use_channels() {
        let pad: Pad = Square::new(0, 0).into();
        // 146 = note on, channel 2; 145 = note on, channel 1
        assert_eq!(ShortMessage::light(pad, LightMode::Pulsing, Color::DARK_PURPLE).to_bytes(), [146, 11, 81]);
        assert_eq!(ShortMessage::light(pad, LightMode::Flashing, Color::DARK_PURPLE).to_bytes(), [145, 11, 81]);
    }

    #[test]
    fn top_button_pulse_is_control_change() {
        let m = ShortMessage::light(Button::Mixer.into(), LightMode::Pulsing, Color::RED);
        assert_eq!(m.to_bytes(), [0xB2, 111, 72]);
    }

    #[test]
    fn text_sysex_layout() {
        let bytes = text_sysex("Hi", Color(5));
        assert_eq!(bytes, vec![240, 0, 32, 41, 2, 24, 20, 5, 0, b'H', b'i', 247]);
    }

    #[test]
    fn row_sysex_matches_reference_bytes() {
        assert_eq!(row_sysex(0, Color::BLUE), vec![240, 0, 32, 41, 2, 24, 13, 0, 45, 247]);
        assert_eq!(row_sysex(0, Color::NONE), vec![240, 0, 32, 41, 2, 24, 13, 0, 0, 247]);
    }

    #[test]
    fn text_sysex_masks_non_ascii() {
        let bytes = text_sysex("é", Color::RED);
        let (cmd, payload) = parse_sysex(&bytes).unwrap();
        assert_eq!(cmd, SYSEX_SCROLL_TEXT);
        assert_eq!(payload, &[72, 0, b'?']);
    }

    #[test]
    fn reset_turns_off_every_pad() {
        let msgs = PadCommand::Reset.encode();
        assert_eq!(msgs.len(), 80);
        assert!(msgs.iter().all(|m| m.len() == 3 && m[2] == 0));
    }

    #[test]
    fn decode_square_press_and_release() {
        assert_eq!(PadEvent::decode(&[144, 11, 127]), Some(PadEvent::Pressed(Square::new(0, 0).into())));
        assert_eq!(PadEvent::decode(&[144, 11, 0]), Some(PadEvent::Released(Square::new(0, 0).into())));
        assert_eq!(PadEvent::decode(&[128, 88, 64]), Some(PadEvent::Released(Square::new(7, 7).into())));
    }

    #[test]
    fn decode_buttons() {
        assert_eq!(PadEvent::decode(&[176, 104, 127]), Some(PadEvent::Pressed(Button::CursorUp.into())));
        assert_eq!(PadEvent::decode(&[144, 89, 127]), Some(PadEvent::Pressed(Button::Volume.into())));
    }

    #[test]
    fn decode_rejects_junk() {
        assert_eq!(PadEvent::decode(&[]), None);
        assert_eq!(PadEvent::decode(&[144, 11]), None);
        assert_eq!(PadEvent::decode(&[0xF0, 0, 0xF7]), None);
        assert_eq!(PadEvent::decode(&[176, 11, 127]), None); // CC on a square id
        assert_eq!(PadEvent::decode(&[144, 95, 127]), None);
        assert_eq!(PadEvent::decode(&[0xE0, 0, 64]), None); // pitch bend
    }

    #[test]
    fn event_encode_decodes_back() {
        let e = PadEvent::Pressed(Button::Session.into());
        assert_eq!(PadEvent::decode(&e.encode()), Some(e));
    }

    #[test]
    fn parse_sysex_rejects_foreign_header() {
        assert_eq!(parse_sysex(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]), None);
    }
}
