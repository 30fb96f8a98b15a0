use crate::errors::{GpError, Result};
use crate::{GP_COBYLA_MAX_EVAL, GP_OPTIM_N_START};

use ndarray::{array, Array1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Length scales tuning of the squared exponential correlation
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum ThetaTuning {
    /// Given length scales, no likelihood maximization
    Fixed(Array1<f64>),
    /// Length scales are optimized within bounds (lower, upper) starting from `init`.
    /// A one-element `init` or `bounds` is broadcast to every input dimension.
    Optimized {
        /// Initial guess
        init: Array1<f64>,
        /// Bounds (lower, upper)
        bounds: Array1<(f64, f64)>,
    },
}

impl Default for ThetaTuning {
    fn default() -> Self {
        ThetaTuning::Optimized {
            init: array![ThetaTuning::DEFAULT_INIT],
            bounds: array![ThetaTuning::DEFAULT_BOUNDS],
        }
    }
}

impl ThetaTuning {
    /// Default initial theta value
    pub const DEFAULT_INIT: f64 = 1e-1;
    /// Default bounds for theta values
    pub const DEFAULT_BOUNDS: (f64, f64) = (1e-2, 1e1);

    /// Initial theta value
    pub fn init(&self) -> &Array1<f64> {
        match self {
            ThetaTuning::Fixed(init) => init,
            ThetaTuning::Optimized { init, .. } => init,
        }
    }

    /// Bounds of theta values, a fixed theta is bounded by itself
    pub fn bounds(&self) -> Array1<(f64, f64)> {
        match self {
            ThetaTuning::Fixed(init) => init.mapv(|v| (v, v)),
            ThetaTuning::Optimized { bounds, .. } => bounds.to_owned(),
        }
    }

    /// Whether the likelihood is maximized with regard to theta
    pub fn is_optimized(&self) -> bool {
        matches!(self, ThetaTuning::Optimized { .. })
    }
}

/// Settings of the random-walk Metropolis sampler used to draw
/// length scales from their posterior distribution
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct SamplerParams {
    /// Number of discarded iterations before collecting draws
    pub burn_in: usize,
    /// Number of iterations between two collected draws
    pub thinning: usize,
    /// Standard deviation of the proposal in log10(theta) space
    pub step_size: f64,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            burn_in: 100,
            thinning: 5,
            step_size: 0.1,
        }
    }
}

/// Kriging hyperparameters, validated with [`KrigingParams::check`]
/// before fitting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct KrigingParams {
    pub(crate) theta_tuning: ThetaTuning,
    pub(crate) nugget: f64,
    pub(crate) n_start: usize,
    pub(crate) max_eval: usize,
    pub(crate) sampler: SamplerParams,
}

impl Default for KrigingParams {
    fn default() -> Self {
        KrigingParams {
            theta_tuning: ThetaTuning::default(),
            nugget: 100. * f64::EPSILON,
            n_start: GP_OPTIM_N_START,
            max_eval: GP_COBYLA_MAX_EVAL,
            sampler: SamplerParams::default(),
        }
    }
}

impl KrigingParams {
    /// Kriging parameters with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set length scales tuning
    pub fn theta_tuning(mut self, theta_tuning: ThetaTuning) -> Self {
        self.theta_tuning = theta_tuning;
        self
    }

    /// Set nugget added to the correlation matrix diagonal
    pub fn nugget(mut self, nugget: f64) -> Self {
        self.nugget = nugget;
        self
    }

    /// Set number of restarts of the likelihood maximization
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.n_start = n_start;
        self
    }

    /// Set maximum number of likelihood evaluations per restart
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Set posterior sampler settings
    pub fn sampler(mut self, sampler: SamplerParams) -> Self {
        self.sampler = sampler;
        self
    }

    /// Get length scales tuning
    pub fn theta_tuning_ref(&self) -> &ThetaTuning {
        &self.theta_tuning
    }

    /// Get posterior sampler settings
    pub fn sampler_ref(&self) -> &SamplerParams {
        &self.sampler
    }

    /// Validate parameters
    pub fn check(&self) -> Result<()> {
        if self.theta_tuning.init().is_empty() {
            return Err(GpError::InvalidValueError(
                "theta init must not be empty".to_string(),
            ));
        }
        if let ThetaTuning::Optimized { init, bounds } = &self.theta_tuning {
            if bounds.is_empty() {
                return Err(GpError::InvalidValueError(
                    "theta bounds must not be empty".to_string(),
                ));
            }
            if init.len() != 1 && bounds.len() != 1 && init.len() != bounds.len() {
                return Err(GpError::InvalidValueError(format!(
                    "theta init dim ({}) and bounds dim ({}) should match",
                    init.len(),
                    bounds.len()
                )));
            }
            if bounds.iter().any(|(lo, up)| *lo <= 0. || lo > up) {
                return Err(GpError::InvalidValueError(
                    "theta bounds should be positive with lower <= upper".to_string(),
                ));
            }
        }
        if self.theta_tuning.init().iter().any(|t| *t <= 0.) {
            return Err(GpError::InvalidValueError(
                "theta should be positive".to_string(),
            ));
        }
        if self.nugget < 0. {
            return Err(GpError::InvalidValueError(format!(
                "nugget should be non negative, got {}",
                self.nugget
            )));
        }
        if self.sampler.thinning == 0 || self.sampler.step_size <= 0. {
            return Err(GpError::InvalidValueError(
                "sampler thinning and step size should be positive".to_string(),
            ));
        }
        Ok(())
    }
}
