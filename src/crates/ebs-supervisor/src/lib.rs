//! # ebs-supervisor — the single-run Simulation Supervisor
//!
//! Owns at most one in-flight evolution run, streams its node-by-node events to any
//! number of subscribers over a [`tokio::sync::broadcast`] bus, and brokers
//! human-in-the-loop requests. This is the seam a binary or service layer wraps (§1);
//! the crate itself has no HTTP, CLI, or persistence surface of its own.

pub mod error;
pub mod event;
pub mod hil;
pub mod supervisor;

pub use error::SupervisorError;
pub use event::{Event, EventType};
pub use hil::{HilRequest, HIL_TIMEOUT_SENTINEL};
pub use supervisor::Supervisor;
