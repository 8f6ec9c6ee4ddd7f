//! Fixed-interval detection scheduler.
//!
//! ```text
//!   Idle ──(interval elapsed ∧ window ≥ min events)──▶ Scheduled
//!   Scheduled ──(dispatch accepted)──▶ Computing
//!   Scheduled ──(dispatch dropped)──▶ Idle
//!   Computing ──(report or error)──▶ Idle
//! ```
//!
//! Ticks that land while Computing are dropped; the next tick is the retry.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle as TaskHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::dispatcher::{Dispatcher, JobHandle};
use super::pipeline::{DetectionReport, WindowSnapshot};
use crate::error::{Result, TopoError};
use crate::stream::{Event, RateTracker, StreamBuffer};

/// Source of "now" in epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall-clock time in epoch milliseconds.
pub fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Computing,
}

/// Transition logic of the scheduler, free of any runtime.
#[derive(Debug, Clone)]
pub struct SchedulerCore {
    state: SchedulerState,
    interval_ms: u64,
    min_events: usize,
    last_dispatch_ms: Option<i64>,
}

impl SchedulerCore {
    pub fn new(interval_ms: u64, min_events: usize) -> Self {
        Self {
            state: SchedulerState::Idle,
            interval_ms,
            min_events,
            last_dispatch_ms: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Returns true when a cycle should be dispatched now.
    pub fn on_tick(&mut self, now_ms: i64, window_len: usize) -> bool {
        if self.state != SchedulerState::Idle {
            return false;
        }
        let elapsed = self
            .last_dispatch_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.interval_ms as i64);
        if elapsed && window_len >= self.min_events {
            self.state = SchedulerState::Scheduled;
            true
        } else {
            false
        }
    }

    pub fn on_dispatched(&mut self, now_ms: i64) {
        self.state = SchedulerState::Computing;
        self.last_dispatch_ms = Some(now_ms);
    }

    pub fn on_dropped(&mut self) {
        self.state = SchedulerState::Idle;
    }

    pub fn on_complete(&mut self) {
        self.state = SchedulerState::Idle;
    }
}

/// Counters reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub events_ingested: u64,
    pub cycles_dispatched: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub dispatches_dropped: u64,
}

/// Owns the stream buffer and drives detection cycles on a fixed interval.
///
/// The scheduler task is the single writer of the buffer and rate ring;
/// events reach it through a channel.
pub struct DetectionScheduler {
    dispatcher: Arc<Dispatcher>,
    buffer: StreamBuffer,
    rate: RateTracker,
    core: SchedulerCore,
    clock: Clock,
    stats: SchedulerStats,
}

impl DetectionScheduler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let config = dispatcher.config();
        Self {
            buffer: StreamBuffer::new(config.window_size),
            rate: RateTracker::new(config.rate_window_ms),
            core: SchedulerCore::new(config.detection_interval_ms, config.min_window_events),
            clock: Arc::new(wall_clock_ms),
            stats: SchedulerStats::default(),
            dispatcher,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn ingest(&mut self, event: Event) {
        self.rate.record((self.clock)());
        self.buffer.append(event);
        self.stats.events_ingested += 1;
    }

    fn tick(&mut self) -> Option<JobHandle> {
        let config = self.dispatcher.config();
        let window_ms = config.window_ms;
        let now = (self.clock)();

        self.buffer.expire(now, window_ms);
        let window_len = self.buffer.window_len(now, window_ms);
        if !self.core.on_tick(now, window_len) {
            return None;
        }

        let ingest_rate = self.rate.rate(now);
        let snapshot =
            WindowSnapshot::new(self.buffer.snapshot(now, window_ms), now, window_ms)
                .with_ingest_rate(ingest_rate);
        let aux_signal = snapshot.window_rate();

        match self.dispatcher.submit_window(snapshot, aux_signal) {
            Ok(handle) => {
                self.core.on_dispatched(now);
                self.stats.cycles_dispatched += 1;
                Some(handle)
            }
            Err(TopoError::Busy) => {
                self.core.on_dropped();
                self.stats.dispatches_dropped += 1;
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Dispatch failed; cycle skipped");
                self.core.on_dropped();
                self.stats.cycles_failed += 1;
                None
            }
        }
    }

    /// Start the scheduler loop. Reports are forwarded on `reports`.
    ///
    /// The loop ends when [`SchedulerHandle::stop`] is called, the event
    /// channel closes, or the report receiver is dropped.
    pub fn spawn(
        mut self,
        mut events: mpsc::Receiver<Event>,
        reports: mpsc::Sender<DetectionReport>,
    ) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = Duration::from_millis(self.dispatcher.config().detection_interval_ms);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut pending: Option<JobHandle> = None;

            tracing::info!(interval_ms = period.as_millis() as u64, "Detection scheduler started");

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    received = events.recv() => match received {
                        Some(event) => self.ingest(event),
                        None => break,
                    },
                    _ = ticker.tick() => {
                        if let Some(handle) = self.tick() {
                            pending = Some(handle);
                        }
                    }
                    outcome = wait_pending(&mut pending), if pending.is_some() => {
                        pending = None;
                        self.core.on_complete();
                        match outcome {
                            Ok(report) => {
                                self.stats.cycles_completed += 1;
                                if reports.send(report).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                self.stats.cycles_failed += 1;
                                tracing::error!(error = %e, "Detection cycle skipped");
                            }
                        }
                    }
                }
            }

            tracing::info!(
                dispatched = self.stats.cycles_dispatched,
                dropped = self.stats.dispatches_dropped,
                "Detection scheduler stopped"
            );
            self.stats
        });

        SchedulerHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

async fn wait_pending(pending: &mut Option<JobHandle>) -> Result<DetectionReport> {
    match pending {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: TaskHandle<SchedulerStats>,
}

impl SchedulerHandle {
    /// Stop the loop and return its counters. An in-flight job is not
    /// cancelled; its report is discarded.
    pub async fn stop(mut self) -> Result<SchedulerStats> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task
            .await
            .map_err(|e| TopoError::JobFailed(e.to_string()))
    }
}
