//! Stream Module: Event Records and Rolling Windows
//!
//! Events arrive one at a time from the ingestion transport and are kept
//! in a bounded buffer. Each detection cycle queries a window
//!
//!   W(now) = { e : now - t(e) < window }
//!
//! and receives it as an immutable snapshot.

mod buffer;
mod event;

pub use buffer::{RateTracker, StreamBuffer};
pub use event::{Event, FLAG_AUTOMATED, FLAG_MINOR};
