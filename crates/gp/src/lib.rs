//! This library implements an ordinary [Kriging](https://en.wikipedia.org/wiki/Kriging) surrogate
//! (constant mean, squared exponential correlation) dedicated to sequential Bayesian optimization:
//!
//! * length scales are either fixed or fitted by likelihood maximization with a
//!   [COBYLA](https://crates.io/crates/cobyla) multistart,
//! * posterior draws of the length scales are available to marginalize acquisition
//!   criteria over hyperparameters ([`Kriging::sample_hyperparameters`]),
//! * predictions come with analytical gradients of mean and variance
//!   ([`Kriging::predict_valvar_gradients`]).
//!
//! Kriging models are implemented by [Kriging] parameterized by [KrigingParams].
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod correlation_models;
mod errors;
mod parameters;
mod sampling;
mod utils;

mod optimization;

pub use algorithm::*;
pub use errors::*;
pub use parameters::*;

/// Default number of multistart for hyperparameters optimization
pub const GP_OPTIM_N_START: usize = 10;
/// Maximum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MAX_EVAL: usize = 200;
