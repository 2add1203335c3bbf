//! Lighting patterns used by the probe and the startup screen.
//!
//! Each pattern is a list of [`PadCommand`]s; [`clear_commands`] produces
//! the commands that turn the same pads off again.

use crate::color::{palette_index, Color};
use crate::message::PadCommand;
use crate::pad::{Button, Pad, Square};

/// The four corner squares in BLUE.
pub fn corners() -> Vec<PadCommand> {
    [(0, 0), (0, 7), (7, 0), (7, 7)]
        .into_iter()
        .map(|(r, c)| PadCommand::light(Square::new(r, c), Color::BLUE))
        .collect()
}

pub fn pulse_square(square: Square) -> Vec<PadCommand> {
    vec![PadCommand::pulse(square, Color::DARK_PURPLE)]
}

pub fn blink_square(square: Square) -> Vec<PadCommand> {
    vec![PadCommand::blink(square, Color::DARK_PURPLE)]
}

/// One half of the palette: bank 0 shows indexes 0..64, bank 1 64..128.
pub fn palette_page(bank: u8) -> Vec<PadCommand> {
    Square::all()
        .map(|s| PadCommand::light(s, Color(palette_index(s, bank))))
        .collect()
}

pub fn row_fill(row: u8, color: Color) -> Vec<PadCommand> {
    vec![PadCommand::FillRow { row, color }]
}

pub fn scroll_text(text: &str, color: Color) -> Vec<PadCommand> {
    vec![PadCommand::text(text, color)]
}

// (row, column) from the bottom left; one colour per letter.
const LOGO_D: [(u8, u8); 8] = [(7, 0), (7, 1), (6, 0), (6, 2), (5, 0), (5, 2), (4, 0), (4, 1)];
const LOGO_C: [(u8, u8); 6] = [(7, 4), (7, 5), (6, 3), (5, 3), (4, 4), (4, 5)];
const LOGO_O: [(u8, u8); 8] = [(1, 0), (2, 0), (0, 1), (3, 1), (0, 2), (3, 2), (1, 3), (2, 3)];
const LOGO_S: [(u8, u8); 7] = [(0, 5), (0, 6), (1, 7), (2, 6), (3, 5), (4, 7), (4, 6)];

// Top row, left to right: cursors, then SESSION, USER_1, USER_2, MIXER.
const LOGO_TOP: [Color; 8] = [
    Color::BLUE, Color::BLUE, Color::BLUE, Color::BLUE,
    Color::RED, Color::LIGHT_GREEN, Color::YELLOW, Color::LIGHT_BLUE,
];

/// "DC" over "OS", one colour per letter, framed by the top row and a
/// PURPLE right column.
pub fn dcos_logo() -> Vec<PadCommand> {
    let top = Button::ALL[..8].iter().zip(LOGO_TOP).map(|(&b, color)| PadCommand::light(b, color));
    let right = (0..8).filter_map(Button::right).map(|b| PadCommand::light(b, Color::PURPLE));

    let letters: [(&[(u8, u8)], Color); 4] = [
        (&LOGO_D, Color::CYAN),
        (&LOGO_C, Color::ORANGE),
        (&LOGO_O, Color::PURPLE),
        (&LOGO_S, Color::LIGHT_GREEN),
    ];
    let grid = letters.into_iter().flat_map(|(squares, color)| {
        squares.iter().map(move |&(r, c)| PadCommand::light(Square::new(r, c), color))
    });
    top.chain(right).chain(grid).collect()
}

/// Commands that switch off whatever `commands` lit.  Text needs nothing.
pub fn clear_commands(commands: &[PadCommand]) -> Vec<PadCommand> {
    commands
        .iter()
        .filter_map(|cmd| match cmd {
            PadCommand::Light { pad, .. }
            | PadCommand::Blink { pad, .. }
            | PadCommand::Pulse { pad, .. } => Some(PadCommand::off(*pad)),
            PadCommand::Off { .. } | PadCommand::Text { .. } | PadCommand::Reset => None,
            PadCommand::FillRow { row, .. } => Some(PadCommand::FillRow { row: *row, color: Color::NONE }),
            PadCommand::FillAll { .. } => Some(PadCommand::FillAll { color: Color::NONE }),
        })
        .collect()
}

/// Pads touched by `commands`, for tests and logging.
pub fn pads(commands: &[PadCommand]) -> Vec<Pad> {
    commands
        .iter()
        .filter_map(|cmd| match cmd {
            PadCommand::Light { pad, .. }
            | PadCommand::Off { pad }
            | PadCommand::Blink { pad, .. }
            | PadCommand::Pulse { pad, .. } => Some(*pad),
            _ => None,
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    fn run(surface: &mut Surface, cmds: &[PadCommand]) {
        for cmd in cmds {
            for m in cmd.encode() {
                surface.apply(&m);
            }
        }
    }

    #[test]
    fn corners_light_four_blue_squares() {
        let mut s = Surface::new();
        run(&mut s, &corners());
        assert_eq!(s.lit_count(), 4);
        assert_eq!(s.led(Square::new(7, 0)).color, Color::BLUE);
        assert_eq!(s.led(Square::new(0, 7)).color, Color::BLUE);
    }

    #[test]
    fn palette_page_lights_indexes() {
        let mut s = Surface::new();
        run(&mut s, &palette_page(1));
        assert_eq!(s.led(Square::new(7, 0)).color, Color(64));
        assert_eq!(s.led(Square::new(0, 7)).color, Color(127));
    }

    #[test]
    fn logo_lights_squares_and_buttons_once() {
        let logo = dcos_logo();
        assert_eq!(logo.len(), 29 + 16);
        let mut s = Surface::new();
        run(&mut s, &logo);
        assert_eq!(s.lit_count(), 45);
        assert_eq!(s.led(Button::CursorUp).color, Color::BLUE);
        assert_eq!(s.led(Button::CursorRight).color, Color::BLUE);
        assert_eq!(s.led(Button::Session).color, Color::RED);
        assert_eq!(s.led(Button::User1).color, Color::LIGHT_GREEN);
        assert_eq!(s.led(Button::User2).color, Color::YELLOW);
        assert_eq!(s.led(Button::Mixer).color, Color::LIGHT_BLUE);
        for row in 0..8 {
            assert_eq!(s.led(Button::right(row).unwrap()).color, Color::PURPLE);
        }
        assert_eq!(s.led(Square::new(7, 0)).color, Color::CYAN);
        assert_eq!(s.led(Square::new(6, 3)).color, Color::ORANGE);
        assert_eq!(s.led(Square::new(0, 1)).color, Color::PURPLE);
        assert_eq!(s.led(Square::new(4, 7)).color, Color::LIGHT_GREEN);
    }

    #[test]
    fn clear_undoes_patterns() {
        for pattern in [corners(), dcos_logo(), pulse_square(Square::new(0, 0)), row_fill(3, Color::RED)] {
            let mut s = Surface::new();
            run(&mut s, &pattern);
            assert!(s.lit_count() > 0);
            run(&mut s, &clear_commands(&pattern));
            assert_eq!(s.lit_count(), 0);
        }
    }

    #[test]
    fn text_needs_no_clearing() {
        assert!(clear_commands(&scroll_text("hi", Color::BLUE)).is_empty());
    }

    #[test]
    fn pads_lists_touched_pads() {
        assert_eq!(pads(&blink_square(Square::new(2, 2))), vec![Pad::Square(Square::new(2, 2))]);
    }
}
