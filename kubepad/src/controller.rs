//! What the buttons do.
//!
//! The controller owns the [`ClusterNodeGrid`] and the selected row.  It
//! reacts to pad presses, gestures, cluster events and grid transitions,
//! and answers with [`Action`]s for the application loop to carry out.
//!
//! | Pad | Action |
//! |---|---|
//! | `CURSOR_UP` / `CURSOR_DOWN` | select the next occupied row above / below |
//! | `CURSOR_RIGHT` | start one more node on the selected row |
//! | `CURSOR_LEFT` | stop the last node on the selected row |
//! | `SESSION` | stop all: scale every app to 0 |
//! | `USER_1` | start all: scale every app to 8 |
//! | `USER_2` | reset pad and reload the cluster |
//! | `MIXER` | play snake |
//! | right column | select that row |
//! | square | start or stop that node |

use kpad_cluster::ClusterAppEvent;
use launchpad_mk2::{Button, Color, Pad, PadCommand, PadEvent, Square};
use tracing::{debug, info};

use crate::gesture::Gesture;
use crate::grid::{ClusterNodeGrid, GridEffect, NodeEvent, COLUMNS, ROW_BUTTON};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Send to the Launchpad.
    Pad(PadCommand),
    /// Ask the cluster worker to scale the app on `row`.
    Scale { row: usize, replicas: u32 },
    /// Ask the cluster worker to forget its table and list again.
    Reload,
    StartGame,
}

pub const CURSOR_COLOR: Color = Color::BLUE;
pub const CURSOR_PRESSED_COLOR: Color = Color::PURPLE;
pub const SELECTED_ROW_COLOR: Color = Color::BLUE;
pub const ROW_COLOR: Color = Color::PURPLE;
pub const TEXT_COLOR: Color = Color::BLUE;

const ACTION_BUTTONS: [(Button, Color); 8] = [
    (Button::CursorUp,    CURSOR_COLOR),
    (Button::CursorDown,  CURSOR_COLOR),
    (Button::CursorLeft,  CURSOR_COLOR),
    (Button::CursorRight, CURSOR_COLOR),
    (Button::Session,     Color::RED),
    (Button::User1,       Color::LIGHT_GREEN),
    (Button::User2,       Color::YELLOW),
    (Button::Mixer,       Color::LIGHT_BLUE),
];

pub struct LaunchpadController {
    grid:       ClusterNodeGrid,
    active_row: Option<usize>,
}

impl LaunchpadController {
    pub fn new(grid: ClusterNodeGrid) -> Self {
        LaunchpadController { grid, active_row: None }
    }

    pub fn grid(&self) -> &ClusterNodeGrid {
        &self.grid
    }

    pub fn active_row(&self) -> Option<usize> {
        self.active_row
    }

    // ── Pad events ────────────────────────────────────────────────────────

    pub fn on_pad_event(&mut self, event: PadEvent) -> Vec<Action> {
        match event {
            PadEvent::Pressed(pad) => self.pressed(pad),
            PadEvent::Released(pad) => self.released(pad),
        }
    }

    fn pressed(&mut self, pad: Pad) -> Vec<Action> {
        debug!(%pad, "pressed");
        let button = match pad {
            Pad::Square(square) => return self.toggle(square),
            Pad::Button(b) => b,
        };

        match button {
            Button::CursorUp => self.up(),
            Button::CursorDown => self.down(),
            Button::CursorRight => {
                let Some(row) = self.active_row else { return Vec::new() };
                let mut actions = vec![light(button, CURSOR_PRESSED_COLOR)];
                if let Some(column) = self.grid.next(row) {
                    let effects = self.grid.start(row, column);
                    actions.extend(self.apply(effects));
                }
                actions
            }
            Button::CursorLeft => {
                let Some(row) = self.active_row else { return Vec::new() };
                let mut actions = vec![light(button, CURSOR_PRESSED_COLOR)];
                if let Some(column) = self.grid.last(row) {
                    let effects = self.grid.stop(row, column);
                    actions.extend(self.apply(effects));
                }
                actions
            }
            Button::Session => {
                info!("stopping all apps");
                let effects = self.grid.stop_all();
                self.apply(effects)
            }
            Button::User1 => {
                info!("starting all apps");
                let effects = self.grid.start_all();
                self.apply(effects)
            }
            Button::User2 => self.reset(),
            Button::Mixer => {
                debug!("start game");
                vec![Action::StartGame]
            }
            row_button => self.select(row_button.row() as usize),
        }
    }

    fn released(&mut self, pad: Pad) -> Vec<Action> {
        match pad {
            Pad::Button(b @ (Button::CursorUp | Button::CursorDown | Button::CursorLeft | Button::CursorRight)) => {
                vec![light(b, CURSOR_COLOR)]
            }
            _ => Vec::new(),
        }
    }

    fn toggle(&mut self, square: Square) -> Vec<Action> {
        let (row, column) = (square.row as usize, square.column as usize);
        if !self.grid.is_occupied(row) {
            return Vec::new();
        }
        let Some(node) = self.grid.node(row, column).copied() else { return Vec::new() };
        if node.is_live() {
            let effects = self.grid.stop(row, column);
            self.apply(effects)
        } else if !node.is_active() {
            let effects = self.grid.start(row, column);
            self.apply(effects)
        } else {
            debug!(row, column, "node already stopping");
            Vec::new()
        }
    }

    // ── Row selection ─────────────────────────────────────────────────────

    fn select(&mut self, row: usize) -> Vec<Action> {
        if !self.grid.is_occupied(row) {
            return Vec::new();
        }
        self.move_selection(row)
    }

    fn move_selection(&mut self, row: usize) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(old) = self.active_row.filter(|&old| old != row) {
            actions.extend(right(old).map(|b| light(b, ROW_COLOR)));
        }
        actions.extend(right(row).map(|b| light(b, SELECTED_ROW_COLOR)));
        self.active_row = Some(row);
        actions
    }

    /// Select the next occupied row above the selected one.
    pub fn up(&mut self) -> Vec<Action> {
        let Some(active) = self.active_row.filter(|&r| self.grid.is_occupied(r)) else {
            return Vec::new();
        };
        match self.grid.rows().into_iter().find(|&r| r > active) {
            Some(row) => self.move_selection(row),
            None => Vec::new(),
        }
    }

    /// Select the next occupied row below the selected one.
    pub fn down(&mut self) -> Vec<Action> {
        let Some(active) = self.active_row.filter(|&r| self.grid.is_occupied(r)) else {
            return Vec::new();
        };
        match self.grid.rows().into_iter().rev().find(|&r| r < active) {
            Some(row) => self.move_selection(row),
            None => Vec::new(),
        }
    }

    /// Scale the selected row to `fingers` nodes.
    pub fn scale(&mut self, fingers: usize) -> Vec<Action> {
        let Some(row) = self.active_row else {
            debug!(fingers, "no row selected, ignoring scale");
            return Vec::new();
        };
        let effects = self.grid.scale(row, fingers.min(COLUMNS));
        self.apply(effects)
    }

    pub fn on_gesture(&mut self, gesture: Gesture) -> Vec<Action> {
        debug!(%gesture, "gesture");
        match gesture {
            Gesture::Swipe { fingers } => self.scale(fingers as usize),
            Gesture::ScreenTap => self.up(),
            Gesture::KeyTap => self.down(),
        }
    }

    // ── Cluster and grid events ───────────────────────────────────────────

    pub fn on_cluster_event(&mut self, event: &ClusterAppEvent) -> Vec<Action> {
        debug!(kind = %event.kind, row = event.index, replicas = event.replicas, "cluster event");
        let effects = self.grid.on_app_event(event);
        self.apply(effects)
    }

    fn apply(&mut self, effects: Vec<GridEffect>) -> Vec<Action> {
        let mut actions = Vec::new();
        for effect in effects {
            match effect {
                GridEffect::Node(event) => actions.extend(self.on_node_event(event)),
                GridEffect::Scale { row, replicas } => actions.push(Action::Scale { row, replicas }),
            }
        }
        actions
    }

    fn on_node_event(&mut self, event: NodeEvent) -> Option<Action> {
        let row = event.row();
        let color = self.grid.color(row);
        let square = || Square::checked(row as i32, event.column() as i32);

        match event {
            NodeEvent::Starting { .. } | NodeEvent::Stopping { .. } => {
                square().map(|s| Action::Pad(PadCommand::pulse(s, color)))
            }
            NodeEvent::Started { column, .. } if column == ROW_BUTTON => {
                let c = if self.active_row == Some(row) { SELECTED_ROW_COLOR } else { ROW_COLOR };
                right(row).map(|b| light(b, c))
            }
            NodeEvent::Started { .. } => square().map(|s| Action::Pad(PadCommand::light(s, color))),
            NodeEvent::Stopped { column, .. } if column == ROW_BUTTON => {
                if self.active_row == Some(row) {
                    self.active_row = None;
                }
                right(row).map(|b| Action::Pad(PadCommand::off(b)))
            }
            NodeEvent::Stopped { .. } => square().map(|s| Action::Pad(PadCommand::off(s))),
        }
    }

    // ── Whole pad ─────────────────────────────────────────────────────────

    /// Clear the pad, light the action buttons, forget the grid and have the
    /// cluster re-announce every app.
    pub fn reset(&mut self) -> Vec<Action> {
        info!("resetting launchpad");
        self.grid.reset();
        self.active_row = None;

        let mut actions = vec![Action::Pad(PadCommand::Reset)];
        actions.extend(ACTION_BUTTONS.iter().map(|&(b, c)| light(b, c)));
        actions.push(Action::Reload);
        actions
    }

    /// Scroll `message` across the pad.
    pub fn write(&self, message: &str) -> Vec<Action> {
        info!("{}", message);
        vec![Action::Pad(PadCommand::text(message, TEXT_COLOR))]
    }
}

fn light(button: Button, color: Color) -> Action {
    Action::Pad(PadCommand::light(button, color))
}

fn right(row: usize) -> Option<Button> {
    Button::right(row)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
