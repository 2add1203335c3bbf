//! Real MIDI ports through `midir`.

use std::fmt;

use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::message::PadEvent;
use crate::output::PadOutput;

/// Substring of the port name the MK2 registers with.
pub const DEFAULT_DEVICE_NAME: &str = "Launchpad MK2";

const CLIENT_NAME: &str = "kubepad";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input  => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortInfo {
    pub direction: PortDirection,
    pub name:      String,
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {}", self.direction, self.name)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Discovery
// ════════════════════════════════════════════════════════════════════════════

/// Every MIDI input and output port on the system, inputs first.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let input = MidiInput::new(CLIENT_NAME).map_err(|e| Error::MidiInit(e.to_string()))?;
    let output = MidiOutput::new(CLIENT_NAME).map_err(|e| Error::MidiInit(e.to_string()))?;

    let mut ports = Vec::new();
    for p in input.ports() {
        if let Ok(name) = input.port_name(&p) {
            ports.push(PortInfo { direction: PortDirection::Input, name });
        }
    }
    for p in output.ports() {
        if let Ok(name) = output.port_name(&p) {
            ports.push(PortInfo { direction: PortDirection::Output, name });
        }
    }
    Ok(ports)
}

/// Ports whose name contains `device_name`.  A connected MK2 shows up as
/// one input and one output.
pub fn find_launchpad_ports(device_name: &str) -> Result<Vec<PortInfo>> {
    Ok(filter_ports(list_ports()?, device_name))
}

fn filter_ports(ports: Vec<PortInfo>, device_name: &str) -> Vec<PortInfo> {
    ports.into_iter().filter(|p| p.name.contains(device_name)).collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Output
// ════════════════════════════════════════════════════════════════════════════

/// An open connection to the device's output port.
pub struct MidiPort {
    name: String,
    conn: MidiOutputConnection,
}

impl MidiPort {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn close(self) {
        debug!(port = %self.name, "closing MIDI output");
        self.conn.close();
    }
}

impl PadOutput for MidiPort {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.conn.send(bytes).map_err(|e| Error::Send(e.to_string()))
    }
}

/// Connect to the first output port whose name contains `device_name`.
pub fn open_output(device_name: &str) -> Result<MidiPort> {
    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| Error::MidiInit(e.to_string()))?;

    let found = midi_out.ports().into_iter().find_map(|p| {
        let name = midi_out.port_name(&p).ok()?;
        name.contains(device_name).then_some((p, name))
    });
    let Some((port, name)) = found else {
        return Err(Error::PortNotFound {
            direction: PortDirection::Output,
            name:      device_name.to_string(),
        });
    };

    info!(port = %name, "opening MIDI output");
    let conn = midi_out.connect(&port, "kubepad-out").map_err(|e| Error::Connect {
        name:   name.clone(),
        reason: e.to_string(),
    })?;
    Ok(MidiPort { name, conn })
}

// ════════════════════════════════════════════════════════════════════════════
// Input
// ════════════════════════════════════════════════════════════════════════════

/// An open connection to the device's input port.  Dropping it stops the
/// callback.
pub struct PadInput {
    name: String,
    conn: MidiInputConnection<()>,
}

impl PadInput {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn close(self) {
        debug!(port = %self.name, "closing MIDI input");
        self.conn.close();
    }
}

/// Connect to the first input port whose name contains `device_name` and
/// call `on_event` for every decoded press and release.  The callback runs
/// on the MIDI driver's thread.
pub fn open_input<F>(device_name: &str, mut on_event: F) -> Result<PadInput>
where
    F: FnMut(PadEvent) + Send + 'static,
{
    let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| Error::MidiInit(e.to_string()))?;
    midi_in.ignore(midir::Ignore::None);

    let found = midi_in.ports().into_iter().find_map(|p| {
        let name = midi_in.port_name(&p).ok()?;
        name.contains(device_name).then_some((p, name))
    });
    let Some((port, name)) = found else {
        return Err(Error::PortNotFound {
            direction: PortDirection::Input,
            name:      device_name.to_string(),
        });
    };

    info!(port = %name, "opening MIDI input");
    let conn = midi_in
        .connect(
            &port,
            "kubepad-in",
            move |_stamp, bytes, _| match PadEvent::decode(bytes) {
                Some(event) => on_event(event),
                None => warn!(?bytes, "ignoring unrecognised MIDI message"),
            },
            (),
        )
        .map_err(|e| Error::Connect { name: name.clone(), reason: e.to_string() })?;
    Ok(PadInput { name, conn })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn port(direction: PortDirection, name: &str) -> PortInfo {
        PortInfo { direction, name: name.to_string() }
    }

    #[test]
    fn filter_keeps_matching_ports() {
        let ports = vec![
            port(PortDirection::Input, "Midi Through Port-0"),
            port(PortDirection::Input, "Launchpad MK2 MIDI 1"),
            port(PortDirection::Output, "Launchpad MK2 MIDI 1"),
            port(PortDirection::Output, "FLUID Synth"),
        ];
        let found = filter_ports(ports, DEFAULT_DEVICE_NAME);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].direction, PortDirection::Input);
        assert_eq!(found[1].direction, PortDirection::Output);
    }

    #[test]
    fn port_not_found_message() {
        let e = Error::PortNotFound { direction: PortDirection::Output, name: "X".into() };
        assert_eq!(e.to_string(), "no MIDI output port matching \"X\"");
    }

    #[test]
    fn port_info_display() {
        assert_eq!(port(PortDirection::Input, "LP").to_string(), "input  LP");
    }
}
