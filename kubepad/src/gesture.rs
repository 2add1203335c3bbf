//! Hand gestures, from LeapMotion hardware or keyboard simulation.
//!
//! The public interface is [`GestureEvent`] delivered over a `mpsc` channel.
//! Consumers don't need to know whether events came from real hardware or the
//! keyboard simulator.
//!
//! Recognition itself is plain arithmetic over [`HandFrame`]s in
//! [`GestureRecognizer`], so it can be driven by synthetic frames.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, error};

// ════════════════════════════════════════════════════════════════════════════
// Gesture / GestureEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gesture {
    /// A fast sideways sweep.  `fingers` is the most extended fingers seen
    /// during the sweep.
    Swipe { fingers: u8 },
    /// A poke towards the screen.
    ScreenTap,
    /// A downward tap, as on a key.
    KeyTap,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gesture::Swipe { fingers } => write!(f, "swipe with {} finger(s)", fingers),
            Gesture::ScreenTap => f.write_str("screen tap"),
            Gesture::KeyTap => f.write_str("key tap"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEvent {
    Connected,
    Disconnected,
    Gesture(Gesture),
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame + GestureRecognizer
// ════════════════════════════════════════════════════════════════════════════

/// One tracked hand in one frame.  Millimetres and mm/s, Leap axes:
/// x to the right, y up, z towards the user.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub timestamp_us:     u64,
    pub palm_position:    [f32; 3],
    pub palm_velocity:    [f32; 3],
    pub extended_fingers: u8,
}

pub const SWIPE_START_SPEED: f32 = 1000.0;
pub const SWIPE_END_SPEED:   f32 = 300.0;
pub const SWIPE_MIN_TRAVEL:  f32 = 150.0;
pub const TAP_SPEED:         f32 = 400.0;
pub const COOLDOWN_US:       u64 = 300_000;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Track {
    Idle,
    Swiping { start_x: f32, last_x: f32, fingers: u8 },
    ScreenPoke,
    KeyPoke,
}

#[derive(Debug)]
pub struct GestureRecognizer {
    track:          Track,
    cooldown_until: u64,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRecognizer {
    pub fn new() -> Self {
        GestureRecognizer { track: Track::Idle, cooldown_until: 0 }
    }

    /// Feed one frame with a hand in view.
    pub fn update(&mut self, frame: &HandFrame) -> Option<Gesture> {
        let now = frame.timestamp_us;
        if now < self.cooldown_until {
            self.track = Track::Idle;
            return None;
        }
        let [x, _, _] = frame.palm_position;
        let [vx, vy, vz] = frame.palm_velocity;

        match self.track {
            Track::Swiping { start_x, fingers, .. } => {
                let fingers = fingers.max(frame.extended_fingers);
                if vx.abs() < SWIPE_END_SPEED {
                    return self.end_swipe(start_x, x, fingers, now);
                }
                self.track = Track::Swiping { start_x, last_x: x, fingers };
                None
            }
            _ if vx.abs() >= SWIPE_START_SPEED => {
                self.track = Track::Swiping { start_x: x, last_x: x, fingers: frame.extended_fingers };
                None
            }
            Track::ScreenPoke if vz > 0.0 => self.fire(Gesture::ScreenTap, now),
            Track::KeyPoke if vy > 0.0 => self.fire(Gesture::KeyTap, now),
            Track::ScreenPoke | Track::KeyPoke => None,
            Track::Idle => {
                if vz <= -TAP_SPEED {
                    self.track = Track::ScreenPoke;
                } else if vy <= -TAP_SPEED {
                    self.track = Track::KeyPoke;
                }
                None
            }
        }
    }

    /// The hand left the view.  Ends a swipe in progress.
    pub fn hand_lost(&mut self, timestamp_us: u64) -> Option<Gesture> {
        match std::mem::replace(&mut self.track, Track::Idle) {
            Track::Swiping { start_x, last_x, fingers } if timestamp_us >= self.cooldown_until => {
                self.end_swipe(start_x, last_x, fingers, timestamp_us)
            }
            _ => None,
        }
    }

    fn end_swipe(&mut self, start_x: f32, end_x: f32, fingers: u8, now: u64) -> Option<Gesture> {
        self.track = Track::Idle;
        if (end_x - start_x).abs() >= SWIPE_MIN_TRAVEL {
            self.fire(Gesture::Swipe { fingers }, now)
        } else {
            None
        }
    }

    fn fire(&mut self, gesture: Gesture, now: u64) -> Option<Gesture> {
        self.track = Track::Idle;
        self.cooldown_until = now + COOLDOWN_US;
        Some(gesture)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSource trait: unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`GestureEvent`]s over a channel.
pub trait GestureSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>);
}

/// Spawn a gesture source on its own thread and return the receiving end.
pub fn spawn_gesture_source<G: GestureSource>(source: G) -> Receiver<GestureEvent> {
    spawn_gesture_sources(vec![Box::new(source)])
}

/// Spawn several sources feeding one channel.
pub fn spawn_gesture_sources(sources: Vec<Box<dyn GestureSource>>) -> Receiver<GestureEvent> {
    let (tx, rx) = mpsc::channel();
    for (i, source) in sources.into_iter().enumerate() {
        let tx = tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("gestures-{}", i))
            .spawn(move || source.run(tx));
        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn gesture source");
        }
    }
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// LeapGestureSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Gesture source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Only the first hand in each frame is tracked.
#[cfg(feature = "leap")]
pub struct LeapGestureSource;

#[cfg(feature = "leap")]
impl GestureSource for LeapGestureSource {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>) {
        use leaprs::*;
        use std::time::Instant;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                error!(error = ?e, "failed to create LeapC connection");
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!(error = ?e, "failed to open LeapMotion connection");
            return;
        }

        let epoch = Instant::now();
        let mut recognizer = GestureRecognizer::new();
        let mut hand_seen = false;

        loop {
            let msg = match connection.poll(100) {
                Ok(m) => m,
                Err(_) => continue,
            };
            let now_us = epoch.elapsed().as_micros() as u64;

            let event = match msg.event() {
                Event::Connection(_) => Some(GestureEvent::Connected),
                Event::ConnectionLost(_) => Some(GestureEvent::Disconnected),
                Event::Tracking(frame) => {
                    let hand = frame.hands().next().map(|h| HandFrame {
                        timestamp_us:     now_us,
                        palm_position:    [h.palm().position().x, h.palm().position().y, h.palm().position().z],
                        palm_velocity:    [h.palm().velocity().x, h.palm().velocity().y, h.palm().velocity().z],
                        extended_fingers: h.digits().filter(|d| finger_extension(d) > 0.7).count() as u8,
                    });
                    let gesture = match hand {
                        Some(hand) => {
                            hand_seen = true;
                            recognizer.update(&hand)
                        }
                        None if hand_seen => {
                            hand_seen = false;
                            recognizer.hand_lost(now_us)
                        }
                        None => None,
                    };
                    gesture.map(GestureEvent::Gesture)
                }
                _ => None,
            };

            if let Some(event) = event {
                debug!(?event, "leap event");
                if tx.send(event).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(feature = "leap")]
fn finger_extension(digit: &leaprs::Digit) -> f32 {
    // Ratio of (tip – metacarpal base) distance to full finger length.
    // 1.0 = fully extended, ~0.0 = fully curled.
    let base = digit.metacarpal().prev_joint();
    let tip  = digit.distal().next_joint();
    let dx   = tip.x - base.x;
    let dy   = tip.y - base.y;
    let dz   = tip.z - base.z;
    let dist = (dx*dx + dy*dy + dz*dz).sqrt();
    // Normalise to ~0–1 using typical finger length ≈ 80 mm
    (dist / 80.0).clamp(0.0, 1.0)
}

// ════════════════════════════════════════════════════════════════════════════
// SimGestureSource: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Simulated gesture keys, sent by the virtual pad window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    /// Digit keys 0–8.
    Swipe(u8),
    /// Up arrow.
    ScreenTap,
    /// Down arrow.
    KeyTap,
}

/// Gesture source driven by [`SimKey`]s from the visualizer's window.
pub struct SimGestureSource {
    pub rx: Receiver<SimKey>,
}

impl GestureSource for SimGestureSource {
    fn run(self: Box<Self>, tx: Sender<GestureEvent>) {
        if tx.send(GestureEvent::Connected).is_err() {
            return;
        }
        for key in self.rx {
            let gesture = match key {
                SimKey::Swipe(fingers) => Gesture::Swipe { fingers: fingers.min(8) },
                SimKey::ScreenTap      => Gesture::ScreenTap,
                SimKey::KeyTap         => Gesture::KeyTap,
            };
            if tx.send(GestureEvent::Gesture(gesture)).is_err() {
                return;
            }
        }
        let _ = tx.send(GestureEvent::Disconnected);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
