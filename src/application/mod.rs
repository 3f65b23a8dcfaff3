//! Application layer: status transitions, notification fan-out and the simulator
//! operations built on top of them.
//!
//! Everything here runs on the tokio runtime. Transitions are independent tasks, and
//! notifications flow through a bounded queue drained by a fixed worker pool, so no
//! request ever waits on a callback.

pub mod command;
pub mod dispatcher;
pub mod lifecycle;
pub mod simulator;
