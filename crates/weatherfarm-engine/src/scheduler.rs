//! Weather scheduler task.
//!
//! One tokio task owns the engine, the farm and the presentation sink. It
//! waits on four things at once, in priority order:
//! 1. the shutdown signal
//! 2. the freeze timer (only armed while snow holds crops)
//! 3. the day tick (next midnight, or the preview interval)
//! 4. commands from the input loop
//!
//! Nothing else touches engine state, so every mutation is serialized.

use std::future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};
use weatherfarm_common::PlotId;
use weatherfarm_gameplay::{
    day_label, Application, Clock, CurrentState, Farm, PlantCatalog, PresentationSink,
    PresentationState, WeatherEngine,
};

/// Capacity of the command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Shortest wait before re-reading the date after midnight.
const MIN_MIDNIGHT_WAIT_SECS: f64 = 1.0;

/// Errors talking to the scheduler task.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The task has stopped and no longer accepts commands.
    #[error("Weather scheduler is not running")]
    Stopped,
}

/// How the scheduler decides a day has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Wake just after midnight in the reference zone and apply the new day.
    RealTime {
        /// Extra wait after midnight.
        midnight_buffer: Duration,
    },
    /// Every `interval`, roll random weather for the unchanged date.
    /// Stored assignments are not touched.
    Preview {
        /// Time between rolls.
        interval: Duration,
    },
}

/// Requests accepted by the scheduler task.
#[derive(Debug)]
pub enum Command {
    /// Jump to the next day.
    ForceAdvance,
    /// Forget stored weather around today.
    ClearStored,
    /// Save money, plots and the current weather.
    Save,
    /// Restore money, plots and weather.
    Load,
    /// Report the current status.
    Snapshot(oneshot::Sender<Snapshot>),
}

/// Point-in-time view of the farm's weather.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Engine session state.
    pub state: CurrentState,
    /// What is on screen for the current weather.
    pub presentation: PresentationState,
    /// Day label text.
    pub label: String,
    /// Player money.
    pub money: i64,
    /// Growth speed per plot.
    pub speeds: Vec<(PlotId, f32)>,
    /// Plots that are currently dry.
    pub dry_plots: usize,
    /// Day ticks handled so far.
    pub ticks: u64,
    /// Whether an unfreeze is scheduled.
    pub freeze_pending: bool,
}

/// The scheduler task's state.
#[derive(Debug)]
pub struct WeatherScheduler<S> {
    engine: WeatherEngine,
    farm: Farm,
    catalog: PlantCatalog,
    sink: S,
    mode: ScheduleMode,
    freeze_deadline: Option<Instant>,
    ticks: u64,
}

impl<S: PresentationSink + 'static> WeatherScheduler<S> {
    /// Creates a scheduler. Nothing is applied until `run`.
    pub fn new(
        engine: WeatherEngine,
        farm: Farm,
        catalog: PlantCatalog,
        sink: S,
        mode: ScheduleMode,
    ) -> Self {
        Self {
            engine,
            farm,
            catalog,
            sink,
            mode,
            freeze_deadline: None,
            ticks: 0,
        }
    }

    /// The engine.
    #[must_use]
    pub fn engine(&self) -> &WeatherEngine {
        &self.engine
    }

    /// The farm.
    #[must_use]
    pub fn farm(&self) -> &Farm {
        &self.farm
    }

    /// The presentation sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Spawns the scheduler on the current runtime.
    ///
    /// The join handle yields the scheduler back once it stops.
    pub fn spawn(self) -> (SchedulerHandle, JoinHandle<Self>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(commands_rx, shutdown_rx));
        let handle = SchedulerHandle {
            commands: commands_tx,
            shutdown: shutdown_tx,
        };
        (handle, task)
    }

    /// Applies today's weather, then serves timers and commands until
    /// shutdown or until every command sender is gone.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let applied = self.engine.start(&mut self.farm, &mut self.sink);
        self.track_freeze(&applied);
        let mut next_tick = self.next_tick_deadline();
        info!("Weather scheduler running ({:?})", self.mode);

        loop {
            let freeze_deadline = self.freeze_deadline;
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                () = freeze_elapsed(freeze_deadline) => {
                    self.freeze_deadline = None;
                    self.engine.end_freeze(&mut self.farm);
                }
                () = time::sleep_until(next_tick) => {
                    self.tick();
                    next_tick = self.next_tick_deadline();
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        debug!("All command senders dropped");
                        break;
                    },
                },
            }
        }

        info!("Weather scheduler stopped after {} tick(s)", self.ticks);
        self
    }

    fn next_tick_deadline(&self) -> Instant {
        let wait = match self.mode {
            ScheduleMode::RealTime { midnight_buffer } => {
                let secs = self
                    .engine
                    .clock()
                    .seconds_until_next_midnight()
                    .max(MIN_MIDNIGHT_WAIT_SECS);
                Duration::from_secs_f64(secs) + midnight_buffer
            },
            ScheduleMode::Preview { interval } => interval,
        };
        debug!("Next day tick in {wait:?}");
        Instant::now() + wait
    }

    fn tick(&mut self) {
        self.ticks += 1;
        let applied = match self.mode {
            ScheduleMode::RealTime { .. } => {
                let today = self.engine.clock().today();
                if today == self.engine.state().current_date {
                    debug!("Woke before the date changed, still {today}");
                    return;
                }
                self.engine.advance_to_today(&mut self.farm, &mut self.sink)
            },
            ScheduleMode::Preview { .. } => self.engine.preview_tick(&mut self.farm, &mut self.sink),
        };
        self.track_freeze(&applied);
    }

    fn track_freeze(&mut self, applied: &Application) {
        if applied.freeze_started {
            let deadline = Instant::now() + self.engine.freeze_duration();
            debug!("Unfreeze scheduled in {:?}", self.engine.freeze_duration());
            self.freeze_deadline = Some(deadline);
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::ForceAdvance => {
                let applied = self.engine.force_advance(&mut self.farm, &mut self.sink);
                self.track_freeze(&applied);
            },
            Command::ClearStored => {
                self.engine.clear_all_stored();
            },
            Command::Save => {
                if let Err(e) = self.engine.save_game(&self.farm) {
                    warn!("Save failed: {e}");
                }
            },
            Command::Load => {
                self.engine
                    .load_game(&mut self.farm, &self.catalog, &mut self.sink);
            },
            Command::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    debug!("Snapshot requester went away");
                }
            },
        }
    }

    /// Current status.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.engine.state();
        Snapshot {
            state,
            presentation: self.engine.current_presentation(),
            label: day_label(state.current_date, state.current_weather),
            money: self.farm.money,
            speeds: self
                .farm
                .acres()
                .map(|a| (a.id.clone(), a.modifier.speed_multiplier))
                .collect(),
            dry_plots: self.farm.acres().filter(|a| a.is_dry()).count(),
            ticks: self.ticks,
            freeze_pending: self.freeze_deadline.is_some(),
        }
    }
}

async fn freeze_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Sends commands to a running scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
    shutdown: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Queues a command.
    pub async fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SchedulerError::Stopped)
    }

    /// Asks for the current status.
    pub async fn snapshot(&self) -> Result<Snapshot, SchedulerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        response.await.map_err(|_| SchedulerError::Stopped)
    }

    /// Signals the task to stop. Pending waits are abandoned.
    pub fn shutdown(&self) {
        if self.shutdown.send(true).is_err() {
            debug!("Scheduler already stopped");
        }
    }
}
