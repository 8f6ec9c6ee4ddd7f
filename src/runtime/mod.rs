//! Runtime Module: Scheduling and Dispatch of Detection Cycles
//!
//! ```text
//!  ingestion ──events──▶ DetectionScheduler ──snapshot──▶ Dispatcher
//!                          (StreamBuffer)                  (blocking task,
//!                                ▲                          PipelineContext)
//!                                └────────DetectionReport──────┘
//! ```
//!
//! Ingestion and detection share nothing mutable. Each cycle receives an
//! immutable snapshot by value, at most one cycle computes at a time and
//! attempts made while busy are dropped.

mod dispatcher;
mod pipeline;
mod scheduler;

pub use dispatcher::{Dispatcher, JobHandle};
pub use pipeline::{DetectionReport, PipelineContext, WindowSnapshot};
pub use scheduler::{
    wall_clock_ms, Clock, DetectionScheduler, SchedulerCore, SchedulerHandle, SchedulerState,
    SchedulerStats,
};
