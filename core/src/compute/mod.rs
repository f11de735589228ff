//! Cooperative async primitives for the load pipeline.
//!
//! - [`YieldNow`] — Suspends the current task once
//! - [`CancellationToken`] — Shared cancellation flag for an in-flight load
//! - [`Checkpoint`] — Yield point that also observes a token
//!
//! The pipeline is single-threaded: every long-running stage is a suspension
//! point inside one future, never a separate thread.

mod cancellation;
mod yield_now;

pub use cancellation::{CancellationToken, Cancelled, Checkpoint};
pub use yield_now::{YieldNow, yield_now};
