//! What a cluster backend reports and what the app table emits.

use std::collections::BTreeMap;
use std::fmt;

pub type Labels = BTreeMap<String, String>;

/// Label that must be `true` (any case) for an app to get a row.
pub const LABEL_ENABLE: &str = "LAUNCHPAD_ENABLE";
/// Preferred row, 0..8.
pub const LABEL_ROW:    &str = "LAUNCHPAD_ROW";
/// Row colour: palette name or index.
pub const LABEL_COLOR:  &str = "LAUNCHPAD_COLOR";

/// One scalable app as seen by a single poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSnapshot {
    pub id:        String,
    pub replicas:  u32,
    pub labels:    Labels,
    /// A rollout or scaling operation is still in progress.
    pub deploying: bool,
}

impl AppSnapshot {
    pub fn new(id: impl Into<String>, replicas: u32) -> Self {
        AppSnapshot { id: id.into(), replicas, labels: Labels::new(), deploying: false }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn deploying(mut self, deploying: bool) -> Self {
        self.deploying = deploying;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.labels.get(LABEL_ENABLE).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// `LAUNCHPAD_ROW` when present and numeric.
    pub fn preferred_row(&self) -> Option<usize> {
        self.labels.get(LABEL_ROW)?.trim().parse().ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClusterEventKind {
    Added,
    Deleted,
    ScaledUp,
    ScaledDown,
    Deployed,
}

impl fmt::Display for ClusterEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterEventKind::Added      => "ADDED",
            ClusterEventKind::Deleted    => "DELETED",
            ClusterEventKind::ScaledUp   => "SCALED_UP",
            ClusterEventKind::ScaledDown => "SCALED_DOWN",
            ClusterEventKind::Deployed   => "DEPLOYED",
        };
        f.write_str(s)
    }
}

/// A change to the app at `index` (its Launchpad row).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterAppEvent {
    pub index:    usize,
    pub replicas: u32,
    pub labels:   Labels,
    pub kind:     ClusterEventKind,
}

impl ClusterAppEvent {
    pub fn new(index: usize, replicas: u32, labels: Labels, kind: ClusterEventKind) -> Self {
        ClusterAppEvent { index, replicas, labels, kind }
    }
}
