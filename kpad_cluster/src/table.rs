//! The eight-row app table.
//!
//! Every Launchpad row shows at most one app.  [`AppTable::sync`] takes a
//! full listing from a backend, diffs it against the previous one and
//! returns the events that turn the old picture into the new one.

use tracing::{debug, info};

use crate::model::{AppSnapshot, ClusterAppEvent, ClusterEventKind, Labels};

pub const ROWS: usize = 8;

#[derive(Clone, Debug, Default)]
pub struct AppTable {
    rows: [Option<AppSnapshot>; ROWS],
}

impl AppTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> usize {
        ROWS
    }

    pub fn app_exists(&self, row: usize) -> bool {
        self.get(row).is_some()
    }

    /// Replicas of the app at `row`; `None` for an empty row.
    pub fn replicas(&self, row: usize) -> Option<u32> {
        self.get(row).map(|a| a.replicas)
    }

    /// Labels of the app at `row`; empty for an empty row.
    pub fn labels(&self, row: usize) -> Labels {
        self.get(row).map(|a| a.labels.clone()).unwrap_or_default()
    }

    pub fn id(&self, row: usize) -> Option<&str> {
        self.get(row).map(|a| a.id.as_str())
    }

    pub fn get(&self, row: usize) -> Option<&AppSnapshot> {
        self.rows.get(row).and_then(Option::as_ref)
    }

    /// Occupied rows, bottom up.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &AppSnapshot)> {
        self.rows.iter().enumerate().filter_map(|(i, a)| a.as_ref().map(|a| (i, a)))
    }

    pub fn clear(&mut self) {
        self.rows = Default::default();
    }

    /// Record an accepted scale request.  The next poll that shows the app
    /// settled emits `Deployed`.  Returns false for an empty row.
    pub fn mark_scaled(&mut self, row: usize, replicas: u32) -> bool {
        match self.rows.get_mut(row).and_then(Option::as_mut) {
            Some(app) => {
                app.replicas = replicas;
                app.deploying = true;
                true
            }
            None => false,
        }
    }

    /// Apply a full listing and return the resulting events, known rows
    /// first (bottom up), then additions in listing order.
    pub fn sync(&mut self, snapshots: Vec<AppSnapshot>) -> Vec<ClusterAppEvent> {
        let mut events = Vec::new();
        let mut fresh = snapshots;

        for row in 0..ROWS {
            let Some(old) = self.rows[row].take() else { continue };

            let Some(pos) = fresh.iter().position(|s| s.id == old.id) else {
                info!(app = %old.id, row, "app deleted");
                events.push(ClusterAppEvent::new(row, 0, old.labels, ClusterEventKind::Deleted));
                continue;
            };
            let new = fresh.remove(pos);

            let resized = old.replicas != new.replicas;
            if old.replicas < new.replicas {
                info!(app = %new.id, from = old.replicas, to = new.replicas, "scaled up");
                events.push(ClusterAppEvent::new(row, new.replicas, new.labels.clone(), ClusterEventKind::ScaledUp));
            } else if old.replicas > new.replicas {
                info!(app = %new.id, from = old.replicas, to = new.replicas, "scaled down");
                events.push(ClusterAppEvent::new(row, new.replicas, new.labels.clone(), ClusterEventKind::ScaledDown));
            }
            if (resized || old.deploying) && !new.deploying {
                debug!(app = %new.id, replicas = new.replicas, "deployed");
                events.push(ClusterAppEvent::new(row, new.replicas, new.labels.clone(), ClusterEventKind::Deployed));
            }
            self.rows[row] = Some(new);
        }

        for app in fresh {
            if let Some(event) = self.add(app) {
                events.push(event);
            }
        }
        events
    }

    fn add(&mut self, app: AppSnapshot) -> Option<ClusterAppEvent> {
        if !app.is_enabled() {
            return None;
        }
        if self.occupied().any(|(_, a)| a.id == app.id) {
            info!(app = %app.id, "app already added, ignored");
            return None;
        }
        let Some(free) = self.rows.iter().position(Option::is_none) else {
            info!(app = %app.id, "found new app but all rows are occupied");
            return None;
        };
        let row = match app.preferred_row() {
            Some(r) if r < ROWS && self.rows[r].is_none() => r,
            _ => free,
        };

        info!(app = %app.id, row, replicas = app.replicas, "app added");
        let event = ClusterAppEvent::new(row, app.replicas, app.labels.clone(), ClusterEventKind::Added);
        self.rows[row] = Some(app);
        Some(event)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LABEL_ENABLE, LABEL_ROW};

    fn app(id: &str, replicas: u32) -> AppSnapshot {
        AppSnapshot::new(id, replicas).with_label(LABEL_ENABLE, "true")
    }

    fn kinds(events: &[ClusterAppEvent]) -> Vec<(usize, ClusterEventKind, u32)> {
        events.iter().map(|e| (e.index, e.kind, e.replicas)).collect()
    }

    #[test]
    fn first_sync_adds_enabled_apps_in_order() {
        let mut t = AppTable::new();
        let ev = t.sync(vec![app("a", 2), AppSnapshot::new("hidden", 1), app("b", 0)]);
        assert_eq!(kinds(&ev), vec![(0, ClusterEventKind::Added, 2), (1, ClusterEventKind::Added, 0)]);
        assert_eq!(t.id(1), Some("b"));
        assert!(!t.app_exists(2));
    }

    #[test]
    fn preferred_row_is_used_when_free() {
        let mut t = AppTable::new();
        let ev = t.sync(vec![app("a", 1).with_label(LABEL_ROW, "5"), app("b", 1).with_label(LABEL_ROW, "5")]);
        assert_eq!(kinds(&ev), vec![(5, ClusterEventKind::Added, 1), (0, ClusterEventKind::Added, 1)]);
    }

    #[test]
    fn preferred_row_out_of_range_falls_back() {
        let mut t = AppTable::new();
        let ev = t.sync(vec![app("a", 1).with_label(LABEL_ROW, "9")]);
        assert_eq!(ev[0].index, 0);
    }

    #[test]
    fn ninth_app_is_ignored() {
        let mut t = AppTable::new();
        let apps: Vec<_> = (0..9).map(|i| app(&format!("app{}", i), 1)).collect();
        let ev = t.sync(apps);
        assert_eq!(ev.len(), 8);
        assert!(t.occupied().all(|(_, a)| a.id != "app8"));
    }

    #[test]
    fn duplicate_ids_in_one_listing_are_placed_once() {
        let mut t = AppTable::new();
        let ev = t.sync(vec![app("a", 1), app("a", 1)]);
        assert_eq!(ev.len(), 1);
    }

    #[test]
    fn scale_up_then_deployed() {
        let mut t = AppTable::new();
        t.sync(vec![app("a", 1)]);
        let ev = t.sync(vec![app("a", 3).deploying(true)]);
        assert_eq!(kinds(&ev), vec![(0, ClusterEventKind::ScaledUp, 3)]);
        let ev = t.sync(vec![app("a", 3)]);
        assert_eq!(kinds(&ev), vec![(0, ClusterEventKind::Deployed, 3)]);
        assert!(t.sync(vec![app("a", 3)]).is_empty());
    }

    #[test]
    fn settled_scale_down_reports_both() {
        let mut t = AppTable::new();
        t.sync(vec![app("a", 4)]);
        let ev = t.sync(vec![app("a", 2)]);
        assert_eq!(kinds(&ev), vec![(0, ClusterEventKind::ScaledDown, 2), (0, ClusterEventKind::Deployed, 2)]);
    }

    #[test]
    fn missing_app_is_deleted_and_row_reused() {
        let mut t = AppTable::new();
        t.sync(vec![app("a", 1), app("b", 1)]);
        let ev = t.sync(vec![app("b", 1), app("c", 2)]);
        assert_eq!(kinds(&ev), vec![(0, ClusterEventKind::Deleted, 0), (0, ClusterEventKind::Added, 2)]);
        assert_eq!(t.replicas(0), Some(2));
    }

    #[test]
    fn mark_scaled_suppresses_resize_and_waits_for_settle() {
        let mut t = AppTable::new();
        t.sync(vec![app("a", 1)]);
        assert!(t.mark_scaled(0, 4));
        assert!(!t.mark_scaled(3, 4));
        assert!(t.sync(vec![app("a", 4).deploying(true)]).is_empty());
        let ev = t.sync(vec![app("a", 4)]);
        assert_eq!(kinds(&ev), vec![(0, ClusterEventKind::Deployed, 4)]);
    }

    #[test]
    fn empty_row_accessors() {
        let t = AppTable::new();
        assert_eq!(t.replicas(3), None);
        assert!(t.labels(3).is_empty());
        assert!(!t.app_exists(42));
        assert_eq!(t.rows(), 8);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut t = AppTable::new();
        t.sync(vec![app("a", 1)]);
        t.clear();
        assert_eq!(t.occupied().count(), 0);
        let ev = t.sync(vec![app("a", 1)]);
        assert_eq!(ev[0].kind, ClusterEventKind::Added);
    }
}
