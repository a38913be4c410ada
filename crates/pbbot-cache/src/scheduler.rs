//! Background persistence tasks.
//!
//! Three loops run on the tokio runtime:
//!
//! - **flush** writes the cache back every `flush_interval`;
//! - **rollover** sleeps until local midnight and closes the day's usage
//!   counters;
//! - **presence** refreshes the bot's presence every `presence_interval`.
//!
//! Rollover and flush never overlap. Before rolling over, the rollover side
//! sends the flush loop a numbered pause request and waits until the loop
//! reports it is parked under that number. The loop only parks between
//! flushes, and it is the only task that flushes on a timer, so once it is
//! parked no flush is in flight.

use crate::cache::PersistentCache;
use crate::store::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use pbbot_config::SchedulingConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Something that republishes the bot's presence.
#[async_trait]
pub trait PresenceSink: Send + Sync {
    /// Publishes the current presence.
    async fn refresh(&self) -> anyhow::Result<()>;
}

/// Lifecycle of the flush/rollover pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Flushing on the timer.
    Running,
    /// Waiting for the flush loop to park before a rollover.
    PausedForRollover,
    /// Closing the day's counters.
    RollingOver,
    /// Shut down.
    Stopped,
}

/// Timings for [`Scheduler::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Time between cache flushes.
    pub flush_interval: Duration,
    /// Time between presence refreshes.
    pub presence_interval: Duration,
    /// Whether to roll usage counters over at local midnight.
    pub daily_rollover: bool,
}

impl From<&SchedulingConfig> for SchedulerOptions {
    fn from(config: &SchedulingConfig) -> Self {
        Self {
            flush_interval: config.flush_interval(),
            presence_interval: config.presence_interval(),
            daily_rollover: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushCommand {
    Run,
    Pause(u64),
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushPhase {
    Idle,
    Flushing,
    Parked(u64),
    Exited,
}

struct Shared {
    cache: Arc<PersistentCache>,
    state: watch::Sender<SchedulerState>,
    command: watch::Sender<FlushCommand>,
    phase: watch::Receiver<FlushPhase>,
    rollover_lock: Mutex<u64>,
}

impl Shared {
    fn transition(&self, from: SchedulerState, to: SchedulerState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    async fn rollover_now(&self, day: NaiveDate) -> StoreResult<bool> {
        let mut epoch = self.rollover_lock.lock().await;

        let paused = self.transition(SchedulerState::Running, SchedulerState::PausedForRollover);
        if !paused {
            debug!("Scheduler is not running, skipping rollover");
            return Ok(false);
        }

        *epoch += 1;
        let ticket = *epoch;
        self.command.send_replace(FlushCommand::Pause(ticket));

        let mut phase = self.phase.clone();
        let parked = phase
            .wait_for(|phase| match phase {
                FlushPhase::Parked(n) => *n == ticket,
                FlushPhase::Exited => true,
                FlushPhase::Idle | FlushPhase::Flushing => false,
            })
            .await
            .map(|phase| *phase);
        debug!("Flush loop reported {:?} for rollover {}", parked, ticket);

        self.transition(SchedulerState::PausedForRollover, SchedulerState::RollingOver);
        let result = self.cache.rollover(day).await;

        self.command.send_replace(FlushCommand::Run);
        self.transition(SchedulerState::RollingOver, SchedulerState::Running);

        result
    }
}

/// Owner of the background loops.
pub struct Scheduler {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    handles: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Spawns the loops. Must be called inside a tokio runtime.
    pub fn start(
        cache: Arc<PersistentCache>,
        options: SchedulerOptions,
        presence: Option<Arc<dyn PresenceSink>>,
    ) -> Self {
        let (command_tx, command_rx) = watch::channel(FlushCommand::Run);
        let (phase_tx, phase_rx) = watch::channel(FlushPhase::Idle);
        let (state_tx, _) = watch::channel(SchedulerState::Running);
        let cancel = CancellationToken::new();

        let shared = Arc::new(Shared {
            cache: cache.clone(),
            state: state_tx,
            command: command_tx,
            phase: phase_rx,
            rollover_lock: Mutex::new(0),
        });

        let mut handles = vec![tokio::spawn(flush_loop(
            cache,
            non_zero(options.flush_interval),
            command_rx,
            phase_tx,
            cancel.clone(),
        ))];

        if options.daily_rollover {
            handles.push(tokio::spawn(rollover_loop(shared.clone(), cancel.clone())));
        }

        if let Some(sink) = presence {
            handles.push(tokio::spawn(presence_loop(
                sink,
                non_zero(options.presence_interval),
                cancel.clone(),
            )));
        }

        info!(
            "Scheduler started: flush every {:?}, presence every {:?}, daily rollover {}",
            options.flush_interval,
            options.presence_interval,
            if options.daily_rollover { "on" } else { "off" }
        );

        Self {
            shared,
            cancel,
            handles: parking_lot::Mutex::new(handles),
        }
    }

    /// Current state of the flush/rollover pair.
    pub fn state(&self) -> SchedulerState {
        *self.shared.state.borrow()
    }

    /// Closes the usage counters now with `day` as the new day, pausing the
    /// flush loop for the duration. Returns `Ok(false)` if nothing was rolled
    /// over.
    pub async fn rollover_now(&self, day: NaiveDate) -> StoreResult<bool> {
        self.shared.rollover_now(day).await
    }

    /// Stops every loop, waits for them, then flushes once more.
    pub async fn shutdown(&self) -> StoreResult<()> {
        info!("Stopping scheduler");
        self.shared.state.send_replace(SchedulerState::Stopped);
        self.shared.command.send_replace(FlushCommand::Stop);
        self.cancel.cancel();

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Scheduler task ended abnormally: {}", e);
            }
        }

        match self.shared.cache.dump_all().await {
            Ok(()) => {
                info!("Final cache flush complete");
                Ok(())
            }
            Err(e) => {
                warn!("Final cache flush failed: {}", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn non_zero(interval: Duration) -> Duration {
    interval.max(Duration::from_millis(1))
}

async fn flush_loop(
    cache: Arc<PersistentCache>,
    interval: Duration,
    mut commands: watch::Receiver<FlushCommand>,
    phase: watch::Sender<FlushPhase>,
    cancel: CancellationToken,
) {
    let mut ticker = flush_ticker(interval);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = commands.changed() => {
                if changed.is_err() {
                    break;
                }
                let command = *commands.borrow_and_update();
                match command {
                    FlushCommand::Run => {}
                    FlushCommand::Stop => break,
                    FlushCommand::Pause(ticket) => {
                        if !park(ticket, &mut commands, &phase, &cancel).await {
                            break;
                        }
                        ticker = flush_ticker(interval);
                    }
                }
            }
            _ = ticker.tick() => {
                phase.send_replace(FlushPhase::Flushing);
                if let Err(e) = cache.dump_all().await {
                    warn!("Cache flush failed, retrying next tick: {}", e);
                }
                phase.send_replace(FlushPhase::Idle);
            }
        }
    }

    phase.send_replace(FlushPhase::Exited);
    debug!("Flush loop exited");
}

/// Waits in the parked phase until told to run again. Returns `false` if the
/// loop should exit instead.
async fn park(
    mut ticket: u64,
    commands: &mut watch::Receiver<FlushCommand>,
    phase: &watch::Sender<FlushPhase>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        phase.send_replace(FlushPhase::Parked(ticket));
        debug!("Flush loop parked for rollover {}", ticket);

        tokio::select! {
            biased;
            () = cancel.cancelled() => return false,
            changed = commands.changed() => {
                if changed.is_err() {
                    return false;
                }
                let command = *commands.borrow_and_update();
                match command {
                    FlushCommand::Run => {
                        phase.send_replace(FlushPhase::Idle);
                        return true;
                    }
                    FlushCommand::Stop => return false,
                    FlushCommand::Pause(next) => ticket = next,
                }
            }
        }
    }
}

fn flush_ticker(interval: Duration) -> time::Interval {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn rollover_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        let wait = duration_until_next_midnight(&Local::now());
        debug!("Next stats rollover in {:?}", wait);

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = time::sleep(wait) => {}
        }

        let today = Local::now().date_naive();
        match shared.rollover_now(today).await {
            Ok(true) => info!("Daily stats rollover to {} complete", today),
            Ok(false) => debug!("No stats rollover needed for {}", today),
            Err(e) => warn!("Daily stats rollover failed: {}", e),
        }
    }
}

async fn presence_loop(sink: Arc<dyn PresenceSink>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = sink.refresh().await {
                    warn!("Presence refresh failed: {}", e);
                }
            }
        }
    }
}

/// Time from `now` until the next local midnight. If midnight does not exist
/// that day (a DST gap), the first valid instant of the next hour is used.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    const FALLBACK: Duration = Duration::from_secs(60 * 60);

    let Some(midnight) = now
        .date_naive()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
    else {
        return FALLBACK;
    };

    let zone = now.timezone();
    zone.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            zone.from_local_datetime(&(midnight + chrono::Duration::hours(1)))
                .earliest()
        })
        .and_then(|next| next.signed_duration_since(now.clone()).to_std().ok())
        .unwrap_or(FALLBACK)
}
