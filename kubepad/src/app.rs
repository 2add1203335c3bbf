//! Top-level application state and the main loop.
//!
//! `AppState` owns the [`LaunchpadController`], the [`SnakeGame`] and the
//! Launchpad handle.  It processes pad presses, gestures and cluster events,
//! carries out the resulting [`Action`]s and queues [`ClusterCommand`]s for
//! the worker.  [`run`] wires it to the hardware, the virtual pad, the
//! gesture sources and the cluster worker.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use kpad_cluster::{
    spawn_cluster_worker, ClusterAppEvent, ClusterCommand, ClusterWorker, KubernetesBackend,
    KubernetesClient, MarathonBackend, MarathonClient,
};
use launchpad_mk2::{device, Launchpad, Mirror, NullOutput, PadEvent, PadOutput, SurfaceOutput};
use tracing::{debug, info, warn};

use crate::config::{ClusterService, KubepadConfig};
use crate::controller::{Action, LaunchpadController};
use crate::error::Result;
use crate::gesture::{spawn_gesture_sources, GestureEvent, GestureSource, SimGestureSource};
use crate::grid::ClusterNodeGrid;
use crate::snake::{game_over_text, SnakeGame, Step};
use crate::visualizer::Visualizer;

const FRAME: Duration = Duration::from_millis(16);

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    controller: LaunchpadController,
    snake:      SnakeGame,
    pad:        Launchpad<Box<dyn PadOutput>>,
    /// Commands waiting for the cluster worker.
    outbox:     Vec<ClusterCommand>,
    pub status: String,
}

impl AppState {
    pub fn new(output: Box<dyn PadOutput>) -> Self {
        Self::with_snake(output, SnakeGame::new())
    }

    pub fn with_snake(output: Box<dyn PadOutput>, snake: SnakeGame) -> Self {
        let mut grid = ClusterNodeGrid::new();
        grid.init();
        AppState {
            controller: LaunchpadController::new(grid),
            snake,
            pad:        Launchpad::new(output),
            outbox:     Vec::new(),
            status:     "Ready".to_string(),
        }
    }

    pub fn controller(&self) -> &LaunchpadController {
        &self.controller
    }

    pub fn snake(&self) -> &SnakeGame {
        &self.snake
    }

    /// Clear the pad, announce the cluster service and light the buttons.
    pub fn startup(&mut self, service: &str) -> Result<()> {
        self.pad.reset()?;
        let now = Instant::now();
        let greeting = self.controller.write(service);
        self.apply(greeting, now)?;
        let reset = self.controller.reset();
        self.apply(reset, now)?;
        self.status = format!("Connected to {}", service);
        Ok(())
    }

    // ── Inputs ────────────────────────────────────────────────────────────

    pub fn handle_pad_event(&mut self, event: PadEvent, now: Instant) -> Result<()> {
        if self.snake.is_running() {
            if self.snake.on_pad_event(event) {
                self.status = format!("Snake aborted, score {}", self.snake.score());
                let actions = self.controller.reset();
                self.apply(actions, now)?;
            }
            return Ok(());
        }
        let actions = self.controller.on_pad_event(event);
        self.apply(actions, now)
    }

    pub fn handle_gesture(&mut self, event: GestureEvent, now: Instant) -> Result<()> {
        match event {
            GestureEvent::Connected => {
                info!("gesture source connected");
                self.status = "Gestures connected".to_string();
            }
            GestureEvent::Disconnected => {
                warn!("gesture source disconnected");
                self.status = "Gestures disconnected".to_string();
            }
            GestureEvent::Gesture(_) if self.snake.is_running() => {}
            GestureEvent::Gesture(gesture) => {
                self.status = gesture.to_string();
                let actions = self.controller.on_gesture(gesture);
                self.apply(actions, now)?;
            }
        }
        Ok(())
    }

    /// The grid follows the cluster even while the snake owns the pad; the
    /// reset after the game redraws it.
    pub fn handle_cluster_event(&mut self, event: &ClusterAppEvent, now: Instant) -> Result<()> {
        self.status = format!("{} row {} ({} replicas)", event.kind, event.index, event.replicas);
        let mut actions = self.controller.on_cluster_event(event);
        if self.snake.is_running() {
            actions.retain(|a| !matches!(a, Action::Pad(_)));
        }
        self.apply(actions, now)
    }

    /// Advance the snake.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        match self.snake.tick(now) {
            Some(Step::Moved(commands)) => {
                for cmd in &commands {
                    self.pad.apply(cmd)?;
                }
            }
            Some(Step::GameOver { score }) => {
                self.status = format!("Game Over! Score: {}", score);
                let actions = self.controller.reset();
                self.apply(actions, now)?;
                self.pad.apply(&game_over_text(score))?;
            }
            None => {}
        }
        Ok(())
    }

    pub fn apply(&mut self, actions: Vec<Action>, now: Instant) -> Result<()> {
        for action in actions {
            match action {
                Action::Pad(cmd) => self.pad.apply(&cmd)?,
                Action::Scale { row, replicas } => {
                    debug!(row, replicas, "queue scale");
                    self.outbox.push(ClusterCommand::Scale { row, replicas });
                }
                Action::Reload => self.outbox.push(ClusterCommand::Reload),
                Action::StartGame => {
                    self.status = "Snake!".to_string();
                    for cmd in self.snake.start(now) {
                        self.pad.apply(&cmd)?;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn take_cluster_commands(&mut self) -> Vec<ClusterCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        info!("clearing launchpad");
        self.pad.reset()?;
        Ok(())
    }

    /// Clear the pad however the loop ended.  The loop's own error wins
    /// over a failed clear.
    pub fn finish(&mut self, outcome: Result<()>) -> Result<()> {
        let cleared = self.shutdown();
        outcome.and(cleared)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run kubepad until the window closes, `Q` is pressed or Ctrl-C arrives.
pub fn run(config: &KubepadConfig) -> Result<()> {
    let shutdown_rx = ctrl_c()?;
    let (pad_tx, pad_rx) = mpsc::channel::<PadEvent>();
    let device_name = config.launchpad.device_name.as_str();

    // ── Launchpad output ─────────────────────────────────────────────────
    let hardware = device::open_output(device_name)
        .map_err(|e| warn!(error = %e, "no Launchpad output"))
        .ok();
    let input = hardware.as_ref().and_then(|_| {
        let tx = pad_tx.clone();
        device::open_input(device_name, move |event| {
            let _ = tx.send(event);
        })
        .map_err(|e| warn!(error = %e, "no Launchpad input"))
        .ok()
    });
    let surface = config.launchpad.virtual_pad.then(SurfaceOutput::new);

    let output: Box<dyn PadOutput> = match (hardware, surface.clone()) {
        (Some(hw), Some(virt)) => Box::new(Mirror::new(hw, virt)),
        (Some(hw), None) => Box::new(hw),
        (None, Some(virt)) => Box::new(virt),
        (None, None) => {
            warn!("no Launchpad and no virtual pad, pad output is discarded");
            Box::new(NullOutput)
        }
    };

    // ── Gestures and the virtual pad window ──────────────────────────────
    let mut sources = leap_sources(config.leap.enabled);
    let mut window = match surface {
        Some(virt) => {
            let (sim_tx, sim_rx) = mpsc::channel();
            sources.push(Box::new(SimGestureSource { rx: sim_rx }));
            Some(Visualizer::new(virt.surface(), pad_tx, sim_tx)?)
        }
        None => None,
    };
    let gesture_rx = spawn_gesture_sources(sources);

    // ── App state and cluster worker ─────────────────────────────────────
    let mut app = AppState::new(output);
    app.startup(&config.cluster.service.to_string())?;
    // the worker lists everything on its first poll
    app.take_cluster_commands();
    let worker = spawn_worker(config)?;

    let outcome = main_loop(&mut app, &worker, window.as_mut(), &pad_rx, &gesture_rx, &shutdown_rx);

    info!("shutting down");
    worker.shutdown();
    if let Some(input) = input {
        input.close();
    }
    app.finish(outcome)
}

/// Runs until a shutdown request or an error.  Cleanup is left to the caller.
fn main_loop(
    app:         &mut AppState,
    worker:      &ClusterWorker,
    mut window:  Option<&mut Visualizer>,
    pad_rx:      &Receiver<PadEvent>,
    gesture_rx:  &Receiver<GestureEvent>,
    shutdown_rx: &Receiver<()>,
) -> Result<()> {
    loop {
        match shutdown_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return Ok(()),
            Err(TryRecvError::Empty) => {}
        }
        if let Some(vis) = window.as_deref_mut() {
            if !vis.poll_input() {
                return Ok(());
            }
        }

        let now = Instant::now();
        while let Ok(event) = pad_rx.try_recv() {
            report(app.handle_pad_event(event, now));
        }
        drain_gestures(gesture_rx, app, now);
        for event in worker.drain_events() {
            report(app.handle_cluster_event(&event, now));
        }
        report(app.tick(now));
        forward_commands(app, worker)?;

        match window.as_deref_mut() {
            Some(vis) => vis.render(&app.status)?,
            None => std::thread::sleep(FRAME),
        }
    }
}

/// Hand queued scale and reload requests to the worker.
fn forward_commands(app: &mut AppState, worker: &ClusterWorker) -> Result<()> {
    for cmd in app.take_cluster_commands() {
        worker.send(cmd)?;
    }
    Ok(())
}

/// Print what the Leap Motion controller reports until Ctrl-C.
#[cfg(feature = "leap")]
pub fn leap_probe() -> Result<()> {
    use crate::gesture::{spawn_gesture_source, LeapGestureSource};
    use std::sync::mpsc::RecvTimeoutError;

    let shutdown_rx = ctrl_c()?;
    let gesture_rx = spawn_gesture_source(LeapGestureSource);
    while shutdown_rx.try_recv().is_err() {
        match gesture_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(GestureEvent::Connected) => println!("Connected"),
            Ok(GestureEvent::Disconnected) => println!("Disconnected"),
            Ok(GestureEvent::Gesture(gesture)) => println!("Gesture: {}", gesture),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

#[cfg(not(feature = "leap"))]
pub fn leap_probe() -> Result<()> {
    Err(crate::error::Error::FeatureNotEnabled("leap"))
}

fn ctrl_c() -> Result<Receiver<()>> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        info!("Ctrl-C received, exiting");
        let _ = tx.send(());
    })?;
    Ok(rx)
}

fn spawn_worker(config: &KubepadConfig) -> Result<ClusterWorker> {
    let interval = config.cluster.poll_interval();
    let timeout = config.cluster.request_timeout();
    let worker = match config.cluster.service {
        ClusterService::Kubernetes => {
            let k8s = &config.kubernetes;
            let client = KubernetesClient::new(&k8s.master_url, k8s.token_file.as_deref(), timeout)?;
            spawn_cluster_worker(KubernetesBackend::new(client, k8s.namespace.clone()), interval)
        }
        ClusterService::Marathon => {
            let m = &config.marathon;
            let client = MarathonClient::new(&m.api_endpoint, m.access_token_file.as_deref(), timeout)?;
            spawn_cluster_worker(MarathonBackend::new(client), interval)
        }
    };
    info!(service = %config.cluster.service, "cluster worker started");
    Ok(worker)
}

#[cfg(feature = "leap")]
fn leap_sources(enabled: bool) -> Vec<Box<dyn GestureSource>> {
    if !enabled {
        info!("No Leap Motion support.");
        return Vec::new();
    }
    info!("Leap Motion support enabled.");
    vec![Box::new(crate::gesture::LeapGestureSource)]
}

#[cfg(not(feature = "leap"))]
fn leap_sources(_enabled: bool) -> Vec<Box<dyn GestureSource>> {
    info!("No Leap Motion support.");
    Vec::new()
}

fn drain_gestures(rx: &Receiver<GestureEvent>, app: &mut AppState, now: Instant) {
    loop {
        match rx.try_recv() {
            Ok(event) => report(app.handle_gesture(event, now)),
            // no sources, or all of them gone
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        warn!(error = %e, "launchpad update failed");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
