//! launchpad_probe: poke a connected Launchpad MK2 by hand.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use launchpad_mk2::device::{self, DEFAULT_DEVICE_NAME};
use launchpad_mk2::{palette_index_for_id, patterns, Color, Launchpad, PadCommand, PadEvent, PadOutput, Square};

#[derive(Parser, Debug)]
#[command(name = "launchpad_probe", about = "Exercise a Novation Launchpad MK2 over MIDI")]
struct Cli {
    /// Substring of the MIDI port name.
    #[arg(long, default_value = DEFAULT_DEVICE_NAME)]
    device: String,

    /// Seconds to hold each pattern before clearing it.
    #[arg(long, default_value_t = 3)]
    hold: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List MIDI ports and the ones that look like the Launchpad.
    Devices,
    /// Light the four corners in blue.
    Corners,
    /// Pulse the bottom-left square.
    Pulse,
    /// Blink the bottom-left square.
    Blink,
    /// Show both palette pages; pressed squares print their colour index.
    Palette,
    /// Fill a row via sysex.
    RowFill {
        #[arg(default_value_t = 0)]
        row: u8,
        #[arg(long, default_value = "BLUE")]
        color: Color,
    },
    /// Draw the DC/OS logo.
    Logo,
    /// Scroll a message.
    Text {
        message: String,
        #[arg(long, default_value = "BLUE")]
        color: Color,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let commands = match &cli.command {
        Command::Devices => return devices(&cli.device),
        Command::Palette => None,
        Command::Corners => Some(patterns::corners()),
        Command::Pulse => Some(patterns::pulse_square(Square::new(0, 0))),
        Command::Blink => Some(patterns::blink_square(Square::new(0, 0))),
        Command::RowFill { row, color } => Some(patterns::row_fill(*row, *color)),
        Command::Logo => Some(patterns::dcos_logo()),
        Command::Text { message, color } => Some(patterns::scroll_text(message, *color)),
    };

    let port = device::open_output(&cli.device)
        .with_context(|| format!("is a {} plugged in?", cli.device))?;
    let mut pad = Launchpad::new(port);
    let hold = Duration::from_secs(cli.hold);

    match commands {
        Some(commands) => show(&mut pad, commands, hold)?,
        None => palette(&mut pad, &cli.device, hold)?,
    }

    pad.into_inner().close();
    Ok(())
}

fn devices(name: &str) -> Result<()> {
    let ports = device::list_ports()?;
    println!("MIDI ports:");
    for p in &ports {
        println!("  {}", p);
    }
    let matching = device::find_launchpad_ports(name)?;
    println!();
    println!("{} port(s) matching \"{}\"", matching.len(), name);
    for p in &matching {
        println!("  {}", p);
    }
    Ok(())
}

fn show<O: PadOutput>(pad: &mut Launchpad<O>, commands: Vec<PadCommand>, hold: Duration) -> Result<()> {
    for cmd in &commands {
        pad.apply(cmd)?;
    }
    thread::sleep(hold);
    for cmd in patterns::clear_commands(&commands) {
        pad.apply(&cmd)?;
    }
    Ok(())
}

fn palette<O: PadOutput>(pad: &mut Launchpad<O>, device_name: &str, hold: Duration) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel::<PadEvent>();
    let input = device::open_input(device_name, move |e| {
        let _ = tx.send(e);
    });
    if let Err(e) = &input {
        tracing::warn!("{e}; pressed squares will not be reported");
    }

    for bank in 0..2u8 {
        println!("palette page {} (indexes {}..{})", bank, bank as u16 * 64, (bank as u16 + 1) * 64);
        let page = patterns::palette_page(bank);
        for cmd in &page {
            pad.apply(cmd)?;
        }
        thread::sleep(hold);
        while let Ok(event) = rx.try_recv() {
            if let PadEvent::Pressed(p) = event {
                if let Some(index) = palette_index_for_id(p.id(), bank) {
                    println!("  {} -> colour {}", p, Color(index));
                }
            }
        }
    }
    pad.reset()?;

    if let Ok(input) = input {
        input.close();
    }
    Ok(())
}
