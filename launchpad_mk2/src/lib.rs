//! # launchpad_mk2
//!
//! The Novation Launchpad MK2 as seen over MIDI: 64 square pads, 16 round
//! buttons, a 128-entry colour palette and three light modes.
//!
//! The protocol core (pads, colours, messages, the LED [`Surface`] model)
//! is plain byte arithmetic.  Only [`device`] touches real ports, through
//! `midir`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use launchpad_mk2::{device, Color, Launchpad, Square};
//!
//! let port = device::open_output(device::DEFAULT_DEVICE_NAME).unwrap();
//! let mut pad = Launchpad::new(port);
//!
//! pad.reset().unwrap();
//! pad.light(Square::new(0, 0), Color::BLUE).unwrap();
//! pad.text("kubernetes", Color::BLUE).unwrap();
//! ```
//!
//! ## Pad layout
//!
//! ```text
//!  104 105 106 107 108 109 110 111      <- top row, control change
//!   81  82  83  84  85  86  87  88  89
//!   71  ..                      78  79
//!   ..                              ..  <- right column, note
//!   11  12  13  14  15  16  17  18  19
//! ```

pub mod color;
pub mod device;
pub mod error;
pub mod message;
pub mod output;
pub mod pad;
pub mod patterns;
pub mod surface;

pub use color::{palette_index, palette_index_for_id, Color};
pub use error::{Error, Result};
pub use message::{LightMode, PadCommand, PadEvent, ShortMessage};
pub use output::{Launchpad, Mirror, NullOutput, PadOutput, SurfaceOutput};
pub use pad::{Button, Pad, Square};
pub use surface::{Led, Surface};
