//! # ebs-math — the statistical-mechanics core of the evolutionary beam search engine
//!
//! Everything the Evolution node needs on a single visit: pairwise distances, an
//! adaptive kernel bandwidth, leave-one-in Gaussian KDE, an effective-temperature
//! estimator, UCB ranking, and Boltzmann allocation for soft pruning.
//!
//! None of this is generic numerics — every formula here is pinned to the exact
//! constants and stability tricks the engine's convergence behavior depends on
//! (adaptive bandwidth instead of Silverman's rule, the `-V_max` shift in the
//! Boltzmann weights, the `+epsilon` guard in UCB's normalisation). Treat the modules
//! as a fixed numerical contract, not a general-purpose stats toolbox.
//!
//! ## Modules
//!
//! - [`distance`] — pairwise squared distances and the median helper bandwidth relies on.
//! - [`bandwidth`] — adaptive bandwidth selection.
//! - [`kde`] — Gaussian KDE log-density with stable logsumexp.
//! - [`temperature`] — effective and normalized temperature.
//! - [`ucb`] — Upper Confidence Bound scoring.
//! - [`boltzmann`] — soft-pruning child-budget allocation.

pub mod bandwidth;
pub mod boltzmann;
pub mod distance;
pub mod error;
pub mod kde;
pub mod temperature;
pub mod ucb;

pub use bandwidth::estimate_bandwidth;
pub use boltzmann::{allocate as allocate_boltzmann, apply_beam_cap};
pub use distance::pairwise_dist_sq;
pub use error::MathError;
pub use kde::{compute_kde_optimized, estimate_density, gaussian_kernel_log_density};
pub use temperature::{calculate_effective_temperature, calculate_normalized_temperature};
pub use ucb::{batch_calculate_ucb, calculate_ucb_score};
