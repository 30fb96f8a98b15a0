//! Bayesian optimizer configuration.
use crate::errors::{BoError, Result};

use serde::{Deserialize, Serialize};

/// Default number of iterations of [`BayesianOptimizer::optimize_with_default_iters`](crate::BayesianOptimizer::optimize_with_default_iters)
pub const N_ITER_DEFAULT: usize = 20;

/// Bayesian optimizer configuration
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct BoConfig {
    /// Number of iterations (one expensive evaluation each) run when
    /// no explicit number is given
    pub(crate) n_iter: usize,
    /// Number of hyperparameters draws used to marginalize the acquisition,
    /// point estimates are used when None
    pub(crate) hyper_draws: Option<usize>,
    /// Random generator seed used for hyperparameters sampling
    pub(crate) seed: Option<u64>,
    /// Directory where configuration and evaluated points are recorded
    pub(crate) outdir: Option<String>,
}

impl Default for BoConfig {
    fn default() -> Self {
        BoConfig {
            n_iter: N_ITER_DEFAULT,
            hyper_draws: None,
            seed: None,
            outdir: None,
        }
    }
}

impl BoConfig {
    /// Sets the default number of iterations
    pub fn n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Enables marginalization of the acquisition over `hyper_draws`
    /// posterior draws of the surrogate hyperparameters
    pub fn hyper_draws(mut self, hyper_draws: usize) -> Self {
        self.hyper_draws = Some(hyper_draws);
        self
    }

    /// Sets a random seed for reproducibility
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets a directory to record configuration and evaluated points
    pub fn outdir(mut self, outdir: impl Into<String>) -> Self {
        self.outdir = Some(outdir.into());
        self
    }

    /// Get the default number of iterations
    pub fn get_n_iter(&self) -> usize {
        self.n_iter
    }

    /// Get the number of hyperparameters draws
    pub fn get_hyper_draws(&self) -> Option<usize> {
        self.hyper_draws
    }

    /// Check configuration consistency
    pub fn check(self) -> Result<Self> {
        if self.hyper_draws == Some(0) {
            return Err(BoError::InvalidConfigError(
                "hyper_draws should be strictly positive".to_string(),
            ));
        }
        if matches!(self.outdir.as_deref(), Some("")) {
            return Err(BoError::InvalidConfigError(
                "outdir should not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}
