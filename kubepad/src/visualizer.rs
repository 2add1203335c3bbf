//! The virtual Launchpad: a software-rendered `minifb` window.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  ○   ○   ○   ○   ○   ○   ○   ○           │  top buttons
//! │  ■   ■   ■   ■   ■   ■   ■   ■   ○       │  row 7
//! │  ..                              ..      │
//! │  ■   ■   ■   ■   ■   ■   ■   ■   ○       │  row 0
//! │  status bar                              │
//! └──────────────────────────────────────────┘
//! ```
//!
//! The window draws whatever the shared [`Surface`] holds, so it shows the
//! bytes actually sent.  Clicks become [`PadEvent`]s; number keys and the
//! arrow keys feed the gesture simulator.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use launchpad_mk2::{Button, Color, Pad, PadEvent, Square, Surface};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::error::Result;
use crate::gesture::SimKey;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const PAD:      usize = 54;
const GAP:      usize = 8;
const MARGIN:   usize = 20;
const STEP:     usize = PAD + GAP;
const STATUS_H: usize = 40;

pub const WIN_W: usize = 2 * MARGIN + 9 * PAD + 8 * GAP;
pub const WIN_H: usize = 2 * MARGIN + 9 * PAD + 8 * GAP + STATUS_H;

const BG_COLOR:     u32 = 0xFF1A1A1A;
const BODY_COLOR:   u32 = 0xFF101010;
const OFF_COLOR:    u32 = 0xFF2A2A2A;
const BORDER_COLOR: u32 = 0xFF3C3C3C;
const TEXT_COLOR:   u32 = 0xFFB0B0B0;

const SIM_KEYS: [(Key, SimKey); 11] = [
    (Key::Key0, SimKey::Swipe(0)),
    (Key::Key1, SimKey::Swipe(1)),
    (Key::Key2, SimKey::Swipe(2)),
    (Key::Key3, SimKey::Swipe(3)),
    (Key::Key4, SimKey::Swipe(4)),
    (Key::Key5, SimKey::Swipe(5)),
    (Key::Key6, SimKey::Swipe(6)),
    (Key::Key7, SimKey::Swipe(7)),
    (Key::Key8, SimKey::Swipe(8)),
    (Key::Up,   SimKey::ScreenTap),
    (Key::Down, SimKey::KeyTap),
];

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

/// Top-left corner of a pad in window pixels.
pub fn pad_origin(pad: Pad) -> (usize, usize) {
    // grid position: column 0..=8, line 0 (top buttons) ..= 8 (row 0)
    let (column, line) = match pad {
        Pad::Square(s) => (s.column as usize, 8 - s.row as usize),
        Pad::Button(b) if b.is_top() => ((b.id() - 104) as usize, 0),
        Pad::Button(b) => (8, 8 - b.row() as usize),
    };
    (MARGIN + column * STEP, MARGIN + line * STEP)
}

/// The pad under window pixel `(x, y)`, if any.
pub fn hit_test(x: f32, y: f32) -> Option<Pad> {
    if x < MARGIN as f32 || y < MARGIN as f32 {
        return None;
    }
    let (dx, dy) = (x as usize - MARGIN, y as usize - MARGIN);
    if dx % STEP >= PAD || dy % STEP >= PAD {
        return None;
    }
    let (column, line) = (dx / STEP, dy / STEP);
    match (column, line) {
        (c, 0) if c < 8 => Button::top(c).map(Pad::Button),
        (8, l) if (1..=8).contains(&l) => Button::right(8 - l).map(Pad::Button),
        (c, l) if c < 8 && (1..=8).contains(&l) => Some(Pad::Square(Square::new((8 - l) as u8, c as u8))),
        _ => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:  Window,
    buf:     Vec<u32>,
    surface: Arc<Mutex<Surface>>,
    pad_tx:  Sender<PadEvent>,
    sim_tx:  Sender<SimKey>,
    held:    Option<Pad>,
    started: Instant,
}

impl Visualizer {
    pub fn new(surface: Arc<Mutex<Surface>>, pad_tx: Sender<PadEvent>, sim_tx: Sender<SimKey>) -> Result<Self> {
        let mut window = Window::new(
            "Kubepad - Launchpad MK2",
            WIN_W,
            WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;
        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            surface,
            pad_tx,
            sim_tx,
            held: None,
            started: Instant::now(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Translate mouse and keys.  Returns false when the window should close.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open()
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            return false;
        }

        for (key, sim) in SIM_KEYS {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                let _ = self.sim_tx.send(sim);
            }
        }

        let down = self.window.get_mouse_down(MouseButton::Left);
        match (down, self.held) {
            (true, None) => {
                let pad = self.window.get_mouse_pos(MouseMode::Discard).and_then(|(x, y)| hit_test(x, y));
                if let Some(pad) = pad {
                    self.held = Some(pad);
                    let _ = self.pad_tx.send(PadEvent::Pressed(pad));
                }
            }
            (false, Some(pad)) => {
                self.held = None;
                let _ = self.pad_tx.send(PadEvent::Released(pad));
            }
            _ => {}
        }
        true
    }

    /// Draw one frame from the current surface.
    pub fn render(&mut self, status: &str) -> Result<()> {
        let millis = self.started.elapsed().as_millis() as u64;
        self.buf.fill(BG_COLOR);
        self.fill_rect(MARGIN / 2, MARGIN / 2, WIN_W - MARGIN, WIN_H - MARGIN - STATUS_H, BODY_COLOR);

        let (leds, text) = {
            let surface = self.surface.lock().map_err(|_| launchpad_mk2::Error::SurfacePoisoned)?;
            let leds: Vec<_> = Pad::all().map(|p| (p, surface.led(p))).collect();
            (leds, surface.text().map(|(t, c)| (t.to_string(), c)))
        };

        for (pad, led) in leds {
            let (x, y) = pad_origin(pad);
            let lit = led.shown(millis);
            let color = if lit == Color::NONE {
                OFF_COLOR
            } else {
                blend(OFF_COLOR, lit.argb(), led.brightness(millis))
            };
            match pad {
                Pad::Square(_) => {
                    self.fill_rect(x, y, PAD, PAD, color);
                    self.draw_border(x, y, PAD, PAD, BORDER_COLOR);
                }
                Pad::Button(_) => self.draw_disc(x + PAD / 2, y + PAD / 2, PAD / 2 - 6, color),
            }
        }

        let status_y = WIN_H - STATUS_H + 8;
        self.draw_label(status, MARGIN, status_y, TEXT_COLOR);
        if let Some((text, color)) = text {
            self.draw_label(&text, MARGIN, status_y + 12, color.argb());
        }

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H)?;
        Ok(())
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x + w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn draw_disc(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        let r2 = (r * r) as isize;
        for dy in -(r as isize)..=r as isize {
            for dx in -(r as isize)..=r as isize {
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel((cx as isize + dx) as usize, (cy as isize + dy) as usize, color);
                }
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// 3×5 bitmap font, scaled 2×.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * 2, y + row * 2, 2, 2, color);
                    }
                }
            }
            cx += 8;
            if cx + 8 > WIN_W {
                break;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |shift: u32| {
        let (ca, cb) = ((a >> shift) & 0xFF, (b >> shift) & 0xFF);
        ((ca as f32 * (1.0 - t) + cb as f32 * t) as u32) << shift
    };
    0xFF000000 | lerp(16) | lerp(8) | lerp(0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn centre(pad: Pad) -> (f32, f32) {
        let (x, y) = pad_origin(pad);
        ((x + PAD / 2) as f32, (y + PAD / 2) as f32)
    }

    #[test]
    fn every_pad_hits_itself() {
        for pad in Pad::all() {
            let (x, y) = centre(pad);
            assert_eq!(hit_test(x, y), Some(pad), "{}", pad);
        }
    }

    #[test]
    fn layout_corners() {
        assert_eq!(pad_origin(Pad::Button(Button::CursorUp)), (MARGIN, MARGIN));
        assert_eq!(pad_origin(Pad::Square(Square::new(7, 0))), (MARGIN, MARGIN + STEP));
        assert_eq!(pad_origin(Pad::Square(Square::new(0, 0))), (MARGIN, MARGIN + 8 * STEP));
        assert_eq!(pad_origin(Pad::Button(Button::Record)), (MARGIN + 8 * STEP, MARGIN + 8 * STEP));
    }

    #[test]
    fn gaps_and_margins_miss() {
        assert_eq!(hit_test(2.0, 2.0), None);
        assert_eq!(hit_test((MARGIN + PAD + 2) as f32, (MARGIN + STEP + 10) as f32), None);
        // the corner above the right column has no button
        assert_eq!(hit_test((MARGIN + 8 * STEP + 5) as f32, (MARGIN + 5) as f32), None);
        assert_eq!(hit_test(WIN_W as f32 - 1.0, WIN_H as f32 - 1.0), None);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
        assert_eq!(blend(0xFF000000, 0xFF0000FF, 0.5) & 0xFF, 127);
    }

    #[test]
    fn glyphs_fall_back_to_a_dot() {
        assert_eq!(char_glyph('a'), char_glyph('A'));
        assert_eq!(char_glyph('~'), [0, 0, 0b010, 0, 0]);
    }
}
