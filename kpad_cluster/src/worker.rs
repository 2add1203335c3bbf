//! Background polling thread.
//!
//! The worker owns the backend and the [`AppTable`].  It lists apps every
//! poll interval, sends the resulting events back, and serves scale and
//! reload requests in between.  Failures are logged and the loop goes on.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::backend::ClusterBackend;
use crate::error::{Error, Result};
use crate::model::ClusterAppEvent;
use crate::table::AppTable;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

// ════════════════════════════════════════════════════════════════════════════
// ClusterCommand: sent to the worker thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClusterCommand {
    /// Scale the app shown on `row`.
    Scale { row: usize, replicas: u32 },
    /// Forget every row and list again.
    Reload,
    /// Terminate the thread.
    Shutdown,
}

// ════════════════════════════════════════════════════════════════════════════
// ClusterWorker: handle held by the application
// ════════════════════════════════════════════════════════════════════════════

pub struct ClusterWorker {
    name:     String,
    cmd_tx:   Sender<ClusterCommand>,
    event_rx: Receiver<ClusterAppEvent>,
    handle:   Option<JoinHandle<()>>,
}

impl ClusterWorker {
    /// Name of the backend, e.g. `kubernetes`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn send(&self, cmd: ClusterCommand) -> Result<()> {
        self.cmd_tx.send(cmd).map_err(|_| Error::WorkerGone)
    }

    pub fn scale(&self, row: usize, replicas: u32) -> Result<()> {
        self.send(ClusterCommand::Scale { row, replicas })
    }

    pub fn reload(&self) -> Result<()> {
        self.send(ClusterCommand::Reload)
    }

    /// Drain pending events (non-blocking).
    pub fn drain_events(&self) -> Vec<ClusterAppEvent> {
        let mut out = Vec::new();
        while let Ok(e) = self.event_rx.try_recv() {
            out.push(e);
        }
        out
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_event(&self, timeout: Duration) -> Option<ClusterAppEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stop the thread and wait for it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(ClusterCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("cluster worker panicked");
            }
        }
    }
}

impl Drop for ClusterWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start polling `backend` every `poll_interval`.  The first poll happens
/// straight away.
pub fn spawn_cluster_worker<B>(backend: B, poll_interval: Duration) -> ClusterWorker
where
    B: ClusterBackend + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<ClusterCommand>();
    let (event_tx, event_rx) = mpsc::channel::<ClusterAppEvent>();
    let name = backend.name().to_string();

    let handle = thread::Builder::new()
        .name(format!("cluster-{}", name))
        .spawn(move || worker_thread(backend, poll_interval, cmd_rx, event_tx))
        .map_err(|e| error!(error = %e, "failed to spawn cluster worker"))
        .ok();

    ClusterWorker { name, cmd_tx, event_rx, handle }
}

// ════════════════════════════════════════════════════════════════════════════
// worker_thread: the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn worker_thread<B: ClusterBackend>(
    mut backend:   B,
    poll_interval: Duration,
    cmd_rx:        Receiver<ClusterCommand>,
    event_tx:      Sender<ClusterAppEvent>,
) {
    info!(backend = backend.name(), interval_ms = poll_interval.as_millis() as u64, "cluster worker started");
    let mut table = AppTable::new();
    let mut next_poll = Instant::now();

    loop {
        let now = Instant::now();
        if now >= next_poll {
            if !poll(&mut backend, &mut table, &event_tx) {
                break;
            }
            next_poll = now + poll_interval;
        }

        match cmd_rx.recv_timeout(next_poll.saturating_duration_since(Instant::now())) {
            Ok(ClusterCommand::Scale { row, replicas }) => {
                if let Err(e) = scale(&mut backend, &mut table, row, replicas) {
                    error!(row, replicas, error = %e, "scaling failed");
                }
            }
            Ok(ClusterCommand::Reload) => {
                debug!("reloading app table");
                table.clear();
                next_poll = Instant::now();
            }
            Ok(ClusterCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
    info!(backend = backend.name(), "cluster worker stopped");
}

/// False once nobody listens for events any more.
fn poll<B: ClusterBackend>(backend: &mut B, table: &mut AppTable, event_tx: &Sender<ClusterAppEvent>) -> bool {
    match backend.list_apps() {
        Ok(apps) => {
            for event in table.sync(apps) {
                if event_tx.send(event).is_err() {
                    return false;
                }
            }
        }
        Err(e) => warn!(error = %e, "failed to list apps"),
    }
    true
}

fn scale<B: ClusterBackend>(backend: &mut B, table: &mut AppTable, row: usize, replicas: u32) -> Result<()> {
    let id = table.id(row).ok_or(Error::NoApp(row))?.to_string();
    backend.scale_app(&id, replicas)?;
    table.mark_scaled(row, replicas);
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
