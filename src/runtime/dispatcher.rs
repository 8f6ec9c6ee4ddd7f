//! At-most-one-in-flight job dispatch.
//!
//! A dispatch attempt while a job is computing is dropped, never queued.
//! The snapshot moves into a blocking task by value; the result comes
//! back through a oneshot channel wrapped in a [`JobHandle`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::pipeline::{DetectionReport, PipelineContext, WindowSnapshot};
use crate::config::EngineConfig;
use crate::detection::MultiModalDetector;
use crate::error::{Result, TopoError};

/// Pending result of a submitted window.
#[derive(Debug)]
pub struct JobHandle {
    rx: oneshot::Receiver<Result<DetectionReport>>,
}

impl Future for JobHandle {
    type Output = Result<DetectionReport>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TopoError::ChannelClosed)))
    }
}

/// Clears the in-flight flag when the job ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs detection jobs off the ingestion path, one at a time.
#[derive(Debug)]
pub struct Dispatcher {
    config: EngineConfig,
    context: Arc<Mutex<PipelineContext>>,
    in_flight: Arc<AtomicBool>,
}

impl Dispatcher {
    /// Validate `config` and create the pipeline context.
    pub fn initialize(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let context = PipelineContext::new(config.clone());
        Ok(Self::from_context(config, context))
    }

    /// Like [`initialize`](Self::initialize) with a caller-built detector,
    /// e.g. one carrying a custom statistical signal or distance.
    pub fn with_detector(config: EngineConfig, detector: MultiModalDetector) -> Result<Self> {
        config.validate()?;
        let context = PipelineContext::with_detector(config.clone(), detector);
        Ok(Self::from_context(config, context))
    }

    fn from_context(config: EngineConfig, context: PipelineContext) -> Self {
        tracing::info!(
            window_size = config.window_size,
            baseline_capacity = config.baseline_capacity,
            interval_ms = config.detection_interval_ms,
            threshold = config.anomaly_threshold,
            "Detection dispatcher initialized"
        );
        Self {
            config,
            context: Arc::new(Mutex::new(context)),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Current baseline population. Waits for an in-flight job to finish.
    pub fn baseline_len(&self) -> usize {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .detector()
            .baseline()
            .len()
    }

    /// Submit a window for detection.
    ///
    /// Returns [`TopoError::Busy`] without side effects if a job is
    /// already running. Must be called from within a Tokio runtime.
    pub fn submit_window(&self, snapshot: WindowSnapshot, aux_signal: f64) -> Result<JobHandle> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(events = snapshot.events.len(), "Detection busy; dispatch dropped");
            return Err(TopoError::Busy);
        }
        let guard = InFlightGuard(self.in_flight.clone());

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => return Err(TopoError::NoRuntime),
        };

        let (tx, rx) = oneshot::channel();
        let context = self.context.clone();

        runtime.spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                let mut ctx = context.lock().unwrap_or_else(PoisonError::into_inner);
                ctx.run(&snapshot, aux_signal)
            })
            .await;

            let outcome = joined.map_err(|e| {
                tracing::error!(error = %e, "Detection job failed; cycle skipped");
                TopoError::JobFailed(e.to_string())
            });
            drop(guard);
            let _ = tx.send(outcome);
        });

        Ok(JobHandle { rx })
    }
}
