//! # ebs-core — run state, strategy, and configuration types
//!
//! The data model shared by every crate in the evolutionary beam search workspace:
//! [`Strategy`], [`RunState`]/[`RunStateDelta`], [`EngineConfig`], and the small
//! supporting records ([`InformationNeed`], [`ArchitectDecision`]).
//!
//! ## Design
//!
//! - **No owning back-pointers.** Strategies are stored flat in `RunState::strategies`;
//!   the parent/child tree is recovered through `parent_id`, never modeled with an
//!   owning reference (§9's design note on cyclic references).
//! - **Delta-merge, not in-place mutation.** Nodes return a [`RunStateDelta`]; only
//!   `RunState::apply_delta` mutates the live state, which keeps the merge rule (scalars
//!   overwrite, `history` concatenates, `strategies` replaces wholesale) in one place.
//! - **Dependency-injected config.** `EngineConfig` is a plain, `Default`-able record
//!   loaded once by [`config::loader`] and threaded through `RunState`, not resolved via
//!   module-level globals.
//!
//! ## See Also
//!
//! - `ebs-graph` — the graph runtime these types flow through.
//! - `ebs-math` — the KDE/temperature/UCB/Boltzmann numerics Evolution calls.
//! - `ebs-nodes` — the nine agent nodes that produce and consume `RunStateDelta`.

pub mod architect_decision;
pub mod config;
pub mod error;
pub mod information_need;
pub mod run_state;
pub mod strategy;

pub use architect_decision::ArchitectDecision;
pub use config::{EngineConfig, TemperatureCoupling, ThinkingLevel};
pub use error::{EngineError, Result};
pub use information_need::{InformationNeed, InformationNeedType};
pub use run_state::{ResearchStatus, RunState, RunStateDelta};
pub use strategy::{Strategy, StrategyStatus};
