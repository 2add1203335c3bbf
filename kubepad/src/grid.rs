//! The 8×8 grid of cluster nodes behind the Launchpad squares.
//!
//! Row `r` shows the app on table row `r`; each lit square is one replica.
//! The grid never talks to the pad or the cluster itself.  Every operation
//! returns the [`GridEffect`]s it caused and the controller turns them into
//! pad commands and scale requests.

use std::fmt;

use kpad_cluster::{ClusterAppEvent, ClusterEventKind, LABEL_COLOR};
use launchpad_mk2::Color;
use tracing::{debug, error, info};

pub const ROWS: usize = 8;
pub const COLUMNS: usize = 8;

/// Column used in node events to address the row's right-hand button.
pub const ROW_BUTTON: usize = 8;

// ════════════════════════════════════════════════════════════════════════════
// ClusterNode
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Running,
    Terminated,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterNode {
    pub row:    usize,
    pub column: usize,
    phase:      Phase,
    active:     bool,
}

impl ClusterNode {
    pub fn new(row: usize, column: usize) -> Self {
        ClusterNode { row, column, phase: Phase::Unknown, active: false }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active and not on its way out.
    pub fn is_live(&self) -> bool {
        self.active && self.phase != Phase::Succeeded
    }

    pub fn activate(&mut self) -> &mut Self {
        self.active = true;
        self.phase = Phase::Running;
        self
    }

    /// Ignored while inactive.
    pub fn update(&mut self, phase: Phase) {
        if self.active {
            self.phase = phase;
        }
    }

    pub fn deactivate(&mut self) -> &mut Self {
        self.active = false;
        self.phase = Phase::Terminated;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Effects
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    Starting { row: usize, column: usize },
    Started  { row: usize, column: usize },
    Stopping { row: usize, column: usize },
    Stopped  { row: usize, column: usize },
}

impl NodeEvent {
    pub fn row(&self) -> usize {
        match *self {
            NodeEvent::Starting { row, .. }
            | NodeEvent::Started { row, .. }
            | NodeEvent::Stopping { row, .. }
            | NodeEvent::Stopped { row, .. } => row,
        }
    }

    pub fn column(&self) -> usize {
        match *self {
            NodeEvent::Starting { column, .. }
            | NodeEvent::Started { column, .. }
            | NodeEvent::Stopping { column, .. }
            | NodeEvent::Stopped { column, .. } => column,
        }
    }
}

impl fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeEvent::Starting { .. } => "starting",
            NodeEvent::Started { .. }  => "started",
            NodeEvent::Stopping { .. } => "stopping",
            NodeEvent::Stopped { .. }  => "stopped",
        };
        write!(f, "{} ({}, {})", name, self.row(), self.column())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridEffect {
    Node(NodeEvent),
    /// Ask the cluster to run `replicas` instances of the app on `row`.
    Scale { row: usize, replicas: u32 },
}

// ════════════════════════════════════════════════════════════════════════════
// ClusterNodeGrid
// ════════════════════════════════════════════════════════════════════════════

pub struct ClusterNodeGrid {
    nodes:       [[ClusterNode; COLUMNS]; ROWS],
    colors:      [Color; ROWS],
    occupied:    [bool; ROWS],
    initialized: bool,
}

impl Default for ClusterNodeGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterNodeGrid {
    /// An uninitialised grid; cluster events are dropped until [`init`].
    ///
    /// [`init`]: ClusterNodeGrid::init
    pub fn new() -> Self {
        let nodes = std::array::from_fn(|row| std::array::from_fn(|column| ClusterNode::new(row, column)));
        ClusterNodeGrid {
            nodes,
            colors:      std::array::from_fn(Color::row_default),
            occupied:    [false; ROWS],
            initialized: false,
        }
    }

    pub fn init(&mut self) {
        info!("initialising 8x8 cluster node grid");
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Forget every node, row and colour.  The grid stays initialised.
    pub fn reset(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            *node = ClusterNode::new(node.row, node.column);
        }
        self.colors = std::array::from_fn(Color::row_default);
        self.occupied = [false; ROWS];
    }

    pub fn node(&self, row: usize, column: usize) -> Option<&ClusterNode> {
        self.nodes.get(row)?.get(column)
    }

    pub fn row(&self, row: usize) -> &[ClusterNode] {
        self.nodes.get(row).map(|r| &r[..]).unwrap_or(&[])
    }

    pub fn color(&self, row: usize) -> Color {
        self.colors.get(row).copied().unwrap_or(Color::LIGHT_GREEN)
    }

    /// True when an app sits on `row`.
    pub fn is_occupied(&self, row: usize) -> bool {
        self.occupied.get(row).copied().unwrap_or(false)
    }

    /// Occupied rows, bottom to top.
    pub fn rows(&self) -> Vec<usize> {
        (0..ROWS).filter(|&r| self.occupied[r]).collect()
    }

    pub fn active(&self, row: usize) -> usize {
        self.row(row).iter().filter(|n| n.is_active()).count()
    }

    pub fn live(&self, row: usize) -> usize {
        self.row(row).iter().filter(|n| n.is_live()).count()
    }

    /// First inactive column.
    pub fn next(&self, row: usize) -> Option<usize> {
        self.row(row).iter().find(|n| !n.is_active()).map(|n| n.column)
    }

    /// Last live column.
    pub fn last(&self, row: usize) -> Option<usize> {
        self.row(row).iter().rev().find(|n| n.is_live()).map(|n| n.column)
    }

    // ── Local requests ────────────────────────────────────────────────────

    pub fn start(&mut self, row: usize, column: usize) -> Vec<GridEffect> {
        if row >= ROWS || column >= COLUMNS {
            return Vec::new();
        }
        info!(row, column, "start cluster node");
        let live = self.live(row);
        self.nodes[row][column].activate().update(Phase::Pending);
        vec![
            GridEffect::Node(NodeEvent::Starting { row, column }),
            GridEffect::Scale { row, replicas: (live + 1) as u32 },
        ]
    }

    pub fn stop(&mut self, row: usize, column: usize) -> Vec<GridEffect> {
        if row >= ROWS || column >= COLUMNS {
            return Vec::new();
        }
        info!(row, column, "stop cluster node");
        let live = self.live(row);
        self.nodes[row][column].update(Phase::Succeeded);
        vec![
            GridEffect::Node(NodeEvent::Stopping { row, column }),
            GridEffect::Scale { row, replicas: live.saturating_sub(1) as u32 },
        ]
    }

    /// Scale `row` to `replicas` (at most 8), updating the squares right away.
    pub fn scale(&mut self, row: usize, replicas: usize) -> Vec<GridEffect> {
        if row >= ROWS {
            return Vec::new();
        }
        let replicas = replicas.min(COLUMNS);
        let live = self.live(row);
        let mut effects = vec![GridEffect::Scale { row, replicas: replicas as u32 }];

        if live > replicas {
            for _ in replicas..live {
                let Some(column) = self.last(row) else { break };
                self.nodes[row][column].update(Phase::Succeeded);
                effects.push(GridEffect::Node(NodeEvent::Stopping { row, column }));
            }
        } else {
            for _ in live..replicas {
                let Some(column) = self.next(row) else { break };
                self.nodes[row][column].activate().update(Phase::Pending);
                effects.push(GridEffect::Node(NodeEvent::Starting { row, column }));
            }
        }
        effects
    }

    pub fn start_all(&mut self) -> Vec<GridEffect> {
        self.rows().into_iter().flat_map(|row| self.scale(row, COLUMNS)).collect()
    }

    pub fn stop_all(&mut self) -> Vec<GridEffect> {
        self.rows().into_iter().flat_map(|row| self.scale(row, 0)).collect()
    }

    // ── Cluster events ────────────────────────────────────────────────────

    pub fn on_app_event(&mut self, event: &ClusterAppEvent) -> Vec<GridEffect> {
        if !self.initialized {
            debug!(kind = %event.kind, row = event.index, "ignoring cluster event before init");
            return Vec::new();
        }
        let row = event.index;
        if row >= ROWS {
            debug!(row, "ignoring cluster event outside the grid");
            return Vec::new();
        }

        let updates_row = matches!(
            event.kind,
            ClusterEventKind::ScaledUp | ClusterEventKind::ScaledDown | ClusterEventKind::Deployed
        );
        if updates_row && !self.occupied[row] {
            debug!(kind = %event.kind, row, "ignoring cluster event for an empty row");
            return Vec::new();
        }

        let mut events = Vec::new();
        match event.kind {
            ClusterEventKind::Added => {
                self.occupied[row] = true;
                self.colors[row] = match event.labels.get(LABEL_COLOR) {
                    Some(name) => name.parse().unwrap_or_else(|_| {
                        error!(color = %name, row, "unknown color");
                        Color::row_default(row)
                    }),
                    None => Color::row_default(row),
                };
                let n = (event.replicas as usize).min(COLUMNS);
                for node in self.nodes[row][..n].iter_mut() {
                    node.activate();
                    events.push(NodeEvent::Started { row, column: node.column });
                }
                events.push(NodeEvent::Started { row, column: ROW_BUTTON });
            }

            ClusterEventKind::Deleted => {
                for node in self.nodes[row].iter_mut().filter(|n| n.is_active()) {
                    node.deactivate();
                    events.push(NodeEvent::Stopped { row, column: node.column });
                }
                self.occupied[row] = false;
                events.push(NodeEvent::Stopped { row, column: ROW_BUTTON });
            }

            ClusterEventKind::ScaledUp => {
                let target = (event.replicas as usize).min(COLUMNS);
                let missing = target.saturating_sub(self.live(row));
                for node in self.nodes[row].iter_mut().filter(|n| !n.is_active()).take(missing) {
                    node.activate().update(Phase::Pending);
                    events.push(NodeEvent::Starting { row, column: node.column });
                }
            }

            ClusterEventKind::ScaledDown => {
                let surplus = self.live(row).saturating_sub(event.replicas as usize);
                for node in self.nodes[row].iter_mut().rev().filter(|n| n.is_live()).take(surplus) {
                    node.update(Phase::Succeeded);
                    events.push(NodeEvent::Stopping { row, column: node.column });
                }
            }

            ClusterEventKind::Deployed => {
                for node in self.nodes[row].iter_mut() {
                    let phase = node.phase;
                    match phase {
                        Phase::Pending if node.active => {
                            node.update(Phase::Running);
                            events.push(NodeEvent::Started { row, column: node.column });
                        }
                        Phase::Succeeded if node.active => {
                            node.deactivate();
                            events.push(NodeEvent::Stopped { row, column: node.column });
                        }
                        _ => {}
                    }
                }
            }
        }
        events.into_iter().map(GridEffect::Node).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use kpad_cluster::Labels;

    fn grid() -> ClusterNodeGrid {
        let mut g = ClusterNodeGrid::new();
        g.init();
        g
    }

    fn app_event(index: usize, replicas: u32, kind: ClusterEventKind) -> ClusterAppEvent {
        ClusterAppEvent::new(index, replicas, Labels::new(), kind)
    }

    fn nodes(effects: &[GridEffect]) -> Vec<NodeEvent> {
        effects
            .iter()
            .filter_map(|e| match e {
                GridEffect::Node(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    fn scales(effects: &[GridEffect]) -> Vec<(usize, u32)> {
        effects
            .iter()
            .filter_map(|e| match e {
                GridEffect::Scale { row, replicas } => Some((*row, *replicas)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn node_lifecycle() {
        let mut n = ClusterNode::new(0, 0);
        n.update(Phase::Pending);
        assert_eq!(n.phase(), Phase::Unknown, "inactive nodes ignore updates");

        n.activate().update(Phase::Pending);
        assert!(n.is_live());
        assert_eq!(n.phase(), Phase::Pending);

        n.update(Phase::Succeeded);
        assert!(n.is_active() && !n.is_live());

        n.deactivate();
        assert_eq!(n.phase(), Phase::Terminated);
        assert!(!n.is_active());
    }

    #[test]
    fn events_before_init_are_ignored() {
        let mut g = ClusterNodeGrid::new();
        assert!(g.on_app_event(&app_event(0, 3, ClusterEventKind::Added)).is_empty());
        assert!(!g.is_occupied(0));
    }

    #[test]
    fn added_lights_replicas_and_row_button() {
        let mut g = grid();
        let effects = g.on_app_event(&app_event(2, 3, ClusterEventKind::Added));
        assert_eq!(
            nodes(&effects),
            vec![
                NodeEvent::Started { row: 2, column: 0 },
                NodeEvent::Started { row: 2, column: 1 },
                NodeEvent::Started { row: 2, column: 2 },
                NodeEvent::Started { row: 2, column: ROW_BUTTON },
            ]
        );
        assert_eq!(g.rows(), vec![2]);
        assert_eq!(g.active(2), 3);
        assert_eq!(g.next(2), Some(3));
        assert_eq!(g.last(2), Some(2));
        assert_eq!(g.color(2), Color::row_default(2));
    }

    #[test]
    fn added_caps_at_eight() {
        let mut g = grid();
        g.on_app_event(&app_event(0, 12, ClusterEventKind::Added));
        assert_eq!(g.active(0), 8);
        assert_eq!(g.next(0), None);
    }

    #[test]
    fn color_label_overrides_default() {
        let mut g = grid();
        let mut labels = Labels::new();
        labels.insert(LABEL_COLOR.into(), "RED".into());
        g.on_app_event(&ClusterAppEvent::new(1, 1, labels, ClusterEventKind::Added));
        assert_eq!(g.color(1), Color::RED);

        let mut labels = Labels::new();
        labels.insert(LABEL_COLOR.into(), "CHARTREUSE".into());
        g.on_app_event(&ClusterAppEvent::new(3, 1, labels, ClusterEventKind::Added));
        assert_eq!(g.color(3), Color::row_default(3));
        assert_eq!(g.color(42), Color::LIGHT_GREEN);
    }

    #[test]
    fn deleted_clears_row() {
        let mut g = grid();
        g.on_app_event(&app_event(0, 2, ClusterEventKind::Added));
        let effects = g.on_app_event(&app_event(0, 0, ClusterEventKind::Deleted));
        assert_eq!(
            nodes(&effects),
            vec![
                NodeEvent::Stopped { row: 0, column: 0 },
                NodeEvent::Stopped { row: 0, column: 1 },
                NodeEvent::Stopped { row: 0, column: ROW_BUTTON },
            ]
        );
        assert!(g.rows().is_empty());
        assert_eq!(g.active(0), 0);
    }

    #[test]
    fn start_and_stop_request_scaling() {
        let mut g = grid();
        g.on_app_event(&app_event(0, 2, ClusterEventKind::Added));

        let effects = g.start(0, 2);
        assert_eq!(nodes(&effects), vec![NodeEvent::Starting { row: 0, column: 2 }]);
        assert_eq!(scales(&effects), vec![(0, 3)]);
        assert_eq!(g.node(0, 2).map(|n| n.phase()), Some(Phase::Pending));

        let effects = g.stop(0, 0);
        assert_eq!(nodes(&effects), vec![NodeEvent::Stopping { row: 0, column: 0 }]);
        assert_eq!(scales(&effects), vec![(0, 2)]);

        // a stopping node no longer counts
        let effects = g.stop(0, 1);
        assert_eq!(scales(&effects), vec![(0, 1)]);
    }

    #[test]
    fn scale_up_then_down() {
        let mut g = grid();
        g.on_app_event(&app_event(4, 1, ClusterEventKind::Added));

        let effects = g.scale(4, 3);
        assert_eq!(scales(&effects), vec![(4, 3)]);
        assert_eq!(
            nodes(&effects),
            vec![NodeEvent::Starting { row: 4, column: 1 }, NodeEvent::Starting { row: 4, column: 2 }]
        );

        let effects = g.scale(4, 1);
        assert_eq!(scales(&effects), vec![(4, 1)]);
        assert_eq!(
            nodes(&effects),
            vec![NodeEvent::Stopping { row: 4, column: 2 }, NodeEvent::Stopping { row: 4, column: 1 }]
        );
        assert_eq!(g.last(4), Some(0));
    }

    #[test]
    fn scale_is_clamped() {
        let mut g = grid();
        g.on_app_event(&app_event(0, 0, ClusterEventKind::Added));
        let effects = g.scale(0, 20);
        assert_eq!(scales(&effects), vec![(0, 8)]);
        assert_eq!(nodes(&effects).len(), 8);
    }

    #[test]
    fn remote_scaling_and_deploy() {
        let mut g = grid();
        g.on_app_event(&app_event(0, 1, ClusterEventKind::Added));

        let effects = g.on_app_event(&app_event(0, 3, ClusterEventKind::ScaledUp));
        assert_eq!(
            nodes(&effects),
            vec![NodeEvent::Starting { row: 0, column: 1 }, NodeEvent::Starting { row: 0, column: 2 }]
        );
        assert!(scales(&effects).is_empty());

        let effects = g.on_app_event(&app_event(0, 3, ClusterEventKind::Deployed));
        assert_eq!(
            nodes(&effects),
            vec![NodeEvent::Started { row: 0, column: 1 }, NodeEvent::Started { row: 0, column: 2 }]
        );

        let effects = g.on_app_event(&app_event(0, 1, ClusterEventKind::ScaledDown));
        assert_eq!(
            nodes(&effects),
            vec![NodeEvent::Stopping { row: 0, column: 2 }, NodeEvent::Stopping { row: 0, column: 1 }]
        );

        let effects = g.on_app_event(&app_event(0, 1, ClusterEventKind::Deployed));
        assert_eq!(
            nodes(&effects),
            vec![NodeEvent::Stopped { row: 0, column: 1 }, NodeEvent::Stopped { row: 0, column: 2 }]
        );
        assert_eq!(g.active(0), 1);
    }

    #[test]
    fn local_start_is_not_doubled_by_scaled_up() {
        let mut g = grid();
        g.on_app_event(&app_event(0, 1, ClusterEventKind::Added));
        g.start(0, 1);
        let effects = g.on_app_event(&app_event(0, 2, ClusterEventKind::ScaledUp));
        assert!(effects.is_empty());
    }

    #[test]
    fn start_all_and_stop_all_cover_occupied_rows() {
        let mut g = grid();
        g.on_app_event(&app_event(1, 1, ClusterEventKind::Added));
        g.on_app_event(&app_event(5, 2, ClusterEventKind::Added));

        assert_eq!(scales(&g.start_all()), vec![(1, 8), (5, 8)]);
        assert_eq!(scales(&g.stop_all()), vec![(1, 0), (5, 0)]);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut g = grid();
        g.on_app_event(&app_event(1, 4, ClusterEventKind::Added));
        g.reset();
        assert!(g.rows().is_empty());
        assert_eq!(g.active(1), 0);
        assert!(g.is_initialized());
    }

    #[test]
    fn updates_for_an_empty_row_are_ignored() {
        let mut g = grid();
        g.on_app_event(&app_event(2, 3, ClusterEventKind::Added));
        g.reset();

        assert!(g.on_app_event(&app_event(2, 5, ClusterEventKind::ScaledUp)).is_empty());
        assert!(g.on_app_event(&app_event(2, 0, ClusterEventKind::ScaledDown)).is_empty());
        assert!(g.on_app_event(&app_event(2, 5, ClusterEventKind::Deployed)).is_empty());
        assert_eq!(g.active(2), 0);
        assert!(g.rows().is_empty());

        let effects = g.on_app_event(&app_event(6, 2, ClusterEventKind::ScaledUp));
        assert!(effects.is_empty());
        assert_eq!(g.active(6), 0);
    }
}
