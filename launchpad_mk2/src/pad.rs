//! Pads: the 16 round buttons and the 8×8 square grid.
//!
//! Every pad is addressed by a MIDI status (note or control change) and an
//! id in `data1`.  Read the MK2 programmer's reference for the full map;
//! the short version:
//!
//! * top buttons are control changes 104..=111, left to right,
//! * right buttons are notes 19, 29, .. 89, bottom to top,
//! * squares are notes `11 + column + 10 * row`, origin bottom left.

use std::fmt;

use crate::message::{CONTROL_CHANGE, NOTE_ON};

// ════════════════════════════════════════════════════════════════════════════
// Button
// ════════════════════════════════════════════════════════════════════════════

/// The round buttons along the top and the right edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    // Top row, left to right
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    Session,
    User1,
    User2,
    Mixer,
    // Right column, bottom to top
    Record,
    Solo,
    Mute,
    Stop,
    SendB,
    SendA,
    Pan,
    Volume,
}

impl Button {
    /// All buttons, top row first, then the right column bottom to top.
    pub const ALL: [Button; 16] = [
        Button::CursorUp, Button::CursorDown, Button::CursorLeft, Button::CursorRight,
        Button::Session,  Button::User1,      Button::User2,      Button::Mixer,
        Button::Record,   Button::Solo,       Button::Mute,       Button::Stop,
        Button::SendB,    Button::SendA,      Button::Pan,        Button::Volume,
    ];

    fn ordinal(self) -> u8 {
        self as u8
    }

    /// True for the eight control-change buttons on top.
    pub fn is_top(self) -> bool {
        self.ordinal() < 8
    }

    /// MIDI status nibble used to address this button.
    pub fn status(self) -> u8 {
        if self.is_top() { CONTROL_CHANGE } else { NOTE_ON }
    }

    /// The id sent in `data1`.
    pub fn id(self) -> u8 {
        let i = self.ordinal();
        if self.is_top() { 104 + i } else { 19 + 10 * (i - 8) }
    }

    /// Logical row: 0..=7 for the right column, 8 for the top row.
    pub fn row(self) -> u8 {
        let i = self.ordinal();
        if self.is_top() { 8 } else { i - 8 }
    }

    /// Find a button by status and id.  The channel nibble is ignored.
    pub fn find(status: u8, id: u8) -> Option<Button> {
        let command = status & 0xF0;
        Button::ALL.iter().copied().find(|b| b.status() == command && b.id() == id)
    }

    /// One of the top buttons by index 0..=7.
    pub fn top(index: usize) -> Option<Button> {
        if index < 8 { Some(Button::ALL[index]) } else { None }
    }

    /// The right-column button next to grid row 0..=7.
    pub fn right(row: usize) -> Option<Button> {
        if row < 8 { Some(Button::ALL[row + 8]) } else { None }
    }

    pub fn name(self) -> &'static str {
        match self {
            Button::CursorUp    => "CURSOR_UP",
            Button::CursorDown  => "CURSOR_DOWN",
            Button::CursorLeft  => "CURSOR_LEFT",
            Button::CursorRight => "CURSOR_RIGHT",
            Button::Session     => "SESSION",
            Button::User1       => "USER_1",
            Button::User2       => "USER_2",
            Button::Mixer       => "MIXER",
            Button::Record      => "RECORD",
            Button::Solo        => "SOLO",
            Button::Mute        => "MUTE",
            Button::Stop        => "STOP",
            Button::SendB       => "SEND_B",
            Button::SendA       => "SEND_A",
            Button::Pan         => "PAN",
            Button::Volume      => "VOLUME",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Square
// ════════════════════════════════════════════════════════════════════════════

/// A square pad of the 8×8 grid.  Row 0 is the bottom row, column 0 the
/// leftmost column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub row:    u8,
    pub column: u8,
}

impl Square {
    pub const fn new(row: u8, column: u8) -> Self {
        Square { row, column }
    }

    /// Build a square from signed coordinates, `None` when off the grid.
    pub fn checked(row: i32, column: i32) -> Option<Square> {
        if (0..8).contains(&row) && (0..8).contains(&column) {
            Some(Square::new(row as u8, column as u8))
        } else {
            None
        }
    }

    /// The note id: lower left is 11, +1 per column, +10 per row.
    pub fn id(self) -> u8 {
        11 + self.column + 10 * self.row
    }

    /// Inverse of [`Square::id`].  Ids ending in 0 or 9 are not squares.
    pub fn from_id(id: u8) -> Option<Square> {
        if !(11..=88).contains(&id) {
            return None;
        }
        let column = id % 10;
        if column == 0 || column == 9 {
            return None;
        }
        Some(Square::new(id / 10 - 1, column - 1))
    }

    /// All 64 squares, row by row from the bottom.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |column| Square::new(row, column)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({}, {})", self.row, self.column)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pad: anything that can be lit or pressed
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pad {
    Button(Button),
    Square(Square),
}

impl Pad {
    pub fn status(self) -> u8 {
        match self {
            Pad::Button(b) => b.status(),
            Pad::Square(_) => NOTE_ON,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Pad::Button(b) => b.id(),
            Pad::Square(s) => s.id(),
        }
    }

    pub fn row(self) -> u8 {
        match self {
            Pad::Button(b) => b.row(),
            Pad::Square(s) => s.row,
        }
    }

    /// Resolve a pad from status and id, buttons first.
    pub fn find(status: u8, id: u8) -> Option<Pad> {
        if let Some(b) = Button::find(status, id) {
            return Some(Pad::Button(b));
        }
        if status & 0xF0 == NOTE_ON {
            return Square::from_id(id).map(Pad::Square);
        }
        None
    }

    /// Every pad on the device.
    pub fn all() -> impl Iterator<Item = Pad> {
        Button::ALL.into_iter().map(Pad::Button).chain(Square::all().map(Pad::Square))
    }
}

impl From<Button> for Pad {
    fn from(b: Button) -> Self { Pad::Button(b) }
}

impl From<Square> for Pad {
    fn from(s: Square) -> Self { Pad::Square(s) }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::Button(b) => b.fmt(f),
            Pad::Square(s) => s.fmt(f),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_bottom_left_from_id() {
        assert_eq!(Square::from_id(11), Some(Square::new(0, 0)));
    }

    #[test]
    fn square_first_of_second_row() {
        assert_eq!(Square::from_id(21), Some(Square::new(1, 0)));
    }

    #[test]
    fn square_top_right() {
        assert_eq!(Square::new(7, 7).id(), 88);
        assert_eq!(Square::from_id(88), Some(Square::new(7, 7)));
    }

    #[test]
    fn right_column_ids_are_not_squares() {
        for id in [10, 19, 20, 29, 89, 90, 104] {
            assert_eq!(Square::from_id(id), None, "id {} is not a square", id);
        }
    }

    #[test]
    fn find_mixer() {
        assert_eq!(Button::find(176, 111), Some(Button::Mixer));
    }

    #[test]
    fn find_ignores_channel() {
        // pulse channel on a control change
        assert_eq!(Button::find(0xB2, 104), Some(Button::CursorUp));
    }

    #[test]
    fn find_wrong_status_misses() {
        assert_eq!(Button::find(144, 111), None);
        assert_eq!(Button::find(176, 19), None);
    }

    #[test]
    fn top_by_index() {
        assert_eq!(Button::top(4), Some(Button::Session));
        assert_eq!(Button::top(7), Some(Button::Mixer));
        assert_eq!(Button::top(8), None);
    }

    #[test]
    fn right_by_row() {
        assert_eq!(Button::right(0), Some(Button::Record));
        assert_eq!(Button::right(7), Some(Button::Volume));
        assert_eq!(Button::Volume.id(), 89);
        assert_eq!(Button::Volume.row(), 7);
    }

    #[test]
    fn top_buttons_sit_on_row_eight() {
        for i in 0..8 {
            let b = Button::top(i).unwrap();
            assert_eq!(b.row(), 8);
            assert_eq!(b.status(), CONTROL_CHANGE);
        }
    }

    #[test]
    fn pad_find_prefers_buttons() {
        assert_eq!(Pad::find(NOTE_ON, 19), Some(Pad::Button(Button::Record)));
        assert_eq!(Pad::find(NOTE_ON, 12), Some(Pad::Square(Square::new(0, 1))));
        assert_eq!(Pad::find(CONTROL_CHANGE, 12), None);
    }

    #[test]
    fn eighty_pads() {
        assert_eq!(Pad::all().count(), 80);
    }

    #[test]
    fn checked_rejects_off_grid() {
        assert_eq!(Square::checked(8, 0), None);
        assert_eq!(Square::checked(0, -1), None);
        assert_eq!(Square::checked(3, 4), Some(Square::new(3, 4)));
    }
}
