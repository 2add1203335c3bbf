//! Where outbound bytes go, and the [`Launchpad`] handle on top.

use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::message::PadCommand;
use crate::pad::Pad;
use crate::surface::Surface;

// ════════════════════════════════════════════════════════════════════════════
// PadOutput: abstraction over midir / surface / null
// ════════════════════════════════════════════════════════════════════════════

pub trait PadOutput: Send {
    /// Send one complete MIDI message.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Drops everything.  Used when no device is connected.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullOutput;

impl PadOutput for NullOutput {
    fn send(&mut self, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Records every message.
impl PadOutput for Vec<Vec<u8>> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.push(bytes.to_vec());
        Ok(())
    }
}

impl<O: PadOutput + ?Sized> PadOutput for Box<O> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }
}

/// Feeds a shared [`Surface`], e.g. the one drawn by the virtual pad.
#[derive(Clone, Debug, Default)]
pub struct SurfaceOutput(pub Arc<Mutex<Surface>>);

impl SurfaceOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self) -> Arc<Mutex<Surface>> {
        Arc::clone(&self.0)
    }
}

impl PadOutput for SurfaceOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.0.lock().map_err(|_| Error::SurfacePoisoned)?.apply(bytes);
        Ok(())
    }
}

/// Sends to both outputs, e.g. the hardware and the virtual pad.  Both are
/// always tried; the first error is reported.
#[derive(Debug, Default)]
pub struct Mirror<A, B> {
    pub primary:   A,
    pub secondary: B,
}

impl<A, B> Mirror<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Mirror { primary, secondary }
    }
}

impl<A: PadOutput, B: PadOutput> PadOutput for Mirror<A, B> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let first = self.primary.send(bytes);
        let second = self.secondary.send(bytes);
        first.and(second)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Launchpad: command-level handle
// ════════════════════════════════════════════════════════════════════════════

pub struct Launchpad<O: PadOutput> {
    out: O,
}

impl<O: PadOutput> Launchpad<O> {
    pub fn new(out: O) -> Self {
        Launchpad { out }
    }

    pub fn output(&self) -> &O {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.out
    }

    pub fn into_inner(self) -> O {
        self.out
    }

    /// Send raw bytes, short message or sysex.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(?bytes, "launchpad send");
        self.out.send(bytes)
    }

    /// Send every message of `cmd`.  A failed message does not stop the
    /// rest; the first error is returned at the end.
    pub fn apply(&mut self, cmd: &PadCommand) -> Result<()> {
        let mut outcome = Ok(());
        for msg in cmd.encode() {
            let sent = self.send_raw(&msg);
            outcome = outcome.and(sent);
        }
        outcome
    }

    pub fn light(&mut self, pad: impl Into<Pad>, color: Color) -> Result<()> {
        self.apply(&PadCommand::light(pad, color))
    }

    pub fn off(&mut self, pad: impl Into<Pad>) -> Result<()> {
        self.apply(&PadCommand::off(pad))
    }

    pub fn blink(&mut self, pad: impl Into<Pad>, color: Color) -> Result<()> {
        self.apply(&PadCommand::blink(pad, color))
    }

    pub fn pulse(&mut self, pad: impl Into<Pad>, color: Color) -> Result<()> {
        self.apply(&PadCommand::pulse(pad, color))
    }

    /// Scroll `text` once across the grid.
    pub fn text(&mut self, text: &str, color: Color) -> Result<()> {
        self.apply(&PadCommand::text(text, color))
    }

    pub fn fill_row(&mut self, row: u8, color: Color) -> Result<()> {
        self.apply(&PadCommand::FillRow { row, color })
    }

    pub fn fill_all(&mut self, color: Color) -> Result<()> {
        self.apply(&PadCommand::FillAll { color })
    }

    /// Turn every pad off.
    pub fn reset(&mut self) -> Result<()> {
        self.apply(&PadCommand::Reset)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::LightMode;
    use crate::pad::{Button, Square};

    struct Failing;
    impl PadOutput for Failing {
        fn send(&mut self, _bytes: &[u8]) -> Result<()> {
            Err(Error::Send("unplugged".into()))
        }
    }

    #[test]
    fn recording_backend_sees_bytes() {
        let mut pad = Launchpad::new(Vec::<Vec<u8>>::new());
        pad.light(Square::new(0, 0), Color::BLUE).unwrap();
        pad.pulse(Button::Mixer, Color::RED).unwrap();
        assert_eq!(pad.output(), &vec![vec![144, 11, 45], vec![0xB2, 111, 72]]);
    }

    #[test]
    fn surface_output_tracks_leds() {
        let out = SurfaceOutput::new();
        let surface = out.surface();
        let mut pad = Launchpad::new(out);
        pad.blink(Square::new(7, 7), Color::DARK_PURPLE).unwrap();
        let led = surface.lock().unwrap().led(Square::new(7, 7));
        assert_eq!(led.color, Color::DARK_PURPLE);
        assert_eq!(led.mode, LightMode::Flashing);
    }

    #[test]
    fn mirror_sends_to_both() {
        let mut pad = Launchpad::new(Mirror::new(Vec::<Vec<u8>>::new(), SurfaceOutput::new()));
        pad.reset().unwrap();
        assert_eq!(pad.output().primary.len(), 80);
        assert_eq!(pad.output().secondary.0.lock().unwrap().received(), 80);
    }

    #[test]
    fn mirror_reports_error_after_sending_both() {
        let mut pad = Launchpad::new(Mirror::new(Failing, Vec::<Vec<u8>>::new()));
        assert!(pad.light(Square::new(0, 0), Color::RED).is_err());
        assert_eq!(pad.output().secondary.len(), 1);
    }

    #[test]
    fn boxed_output_forwards() {
        let mut pad: Launchpad<Box<dyn PadOutput>> = Launchpad::new(Box::new(NullOutput));
        pad.text("hello", Color::BLUE).unwrap();
    }

    #[test]
    fn apply_reports_send_error() {
        let mut pad = Launchpad::new(Failing);
        assert!(matches!(pad.reset(), Err(Error::Send(_))));
    }

    #[test]
    fn failing_primary_still_clears_the_mirror() {
        let out = SurfaceOutput::new();
        let surface = out.surface();
        let mut pad = Launchpad::new(Mirror::new(Failing, out));
        assert!(pad.fill_all(Color::LIGHT_GREEN).is_err());
        assert_eq!(surface.lock().unwrap().lit_count(), 80);

        let before = surface.lock().unwrap().received();
        assert!(matches!(pad.reset(), Err(Error::Send(_))));
        let surface = surface.lock().unwrap();
        assert_eq!(surface.received() - before, 80);
        assert_eq!(surface.lit_count(), 0);
    }
}
