//! Error type for the Launchpad crate.

use thiserror::Error;

use crate::device::PortDirection;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("MIDI initialisation failed: {0}")]
    MidiInit(String),

    #[error("no MIDI {direction} port matching \"{name}\"")]
    PortNotFound { direction: PortDirection, name: String },

    #[error("failed to connect to MIDI port \"{name}\": {reason}")]
    Connect { name: String, reason: String },

    #[error("failed to send MIDI message: {0}")]
    Send(String),

    #[error("unknown color: {0}")]
    UnknownColor(String),

    #[error("LED surface lock poisoned")]
    SurfacePoisoned,
}
