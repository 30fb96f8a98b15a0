//! Bayesian optimizer: sequential optimization of expensive black-box functions
//! driven by an acquisition function.
//!
//! Each iteration maximizes the acquisition with an inner optimizer, evaluates
//! the expensive functions at the selected point and updates the acquisition
//! data with the new observation.
//!
//! ```no_run
//! use ndarray::{array, Array2, ArrayView2, Axis};
//! use seqbo::{BayesianOptimizerBuilder, Domain, ExpectedImprovement, Objectives};
//! use seqbo_doe::{Lhs, SamplingMethod};
//! use seqbo_gp::KrigingParams;
//!
//! fn xsinx(x: &ArrayView2<f64>) -> Array2<f64> {
//!     x.mapv(|v| (v - 3.5) * ((v - 3.5) / std::f64::consts::PI).sin())
//! }
//!
//! let domain = Domain::new(&array![[0., 25.]]).unwrap();
//! let doe = Lhs::new(domain.xlimits()).sample(5);
//! let ei = ExpectedImprovement::new(
//!     KrigingParams::new(),
//!     &Array2::zeros((0, 1)),
//!     &Array2::zeros((0, 1)),
//! ).unwrap();
//! let mut optimizer = BayesianOptimizerBuilder::new(&domain, ei)
//!     .configure(|config| config.n_iter(10))
//!     .initial(&doe)
//!     .build()
//!     .expect("Bayesian optimizer");
//! let res = optimizer
//!     .optimize_with_default_iters(&Objectives::new(xsinx))
//!     .expect("xsinx minimization");
//! println!("{}", res);
//! ```
use crate::acquisition::{Acquisition, MarginalizedAcquisition, NegatedAcquisition};
use crate::config::BoConfig;
use crate::design::{Design, EmptyDesign};
use crate::domain::Domain;
use crate::errors::{BoError, Result};
use crate::optimizers::{InfillOptimizer, Optimizer, SlsqpOptimizer};
use crate::types::{InfillFn, Objectives, OptimResult};
use crate::utils::{write_config, write_doe, DOE_FILE, DOE_INITIAL_FILE, SEQBO_LOG};

use env_logger::{Builder, Env, Target};
use log::{debug, info, warn};
use ndarray::{concatenate, s, Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;

/// Message of a result without any feasible evaluation
pub const NO_FEASIBLE_MESSAGE: &str = "No evaluations satisfied the constraints";

/// One-shot buffer of points evaluated at the start of the next optimization
#[derive(Clone, Debug, PartialEq)]
pub enum InitialDesign {
    /// Points still to be evaluated, possibly none
    Pending(Array2<f64>),
    /// Points already evaluated and folded into the acquisition data
    Consumed,
}

/// Builder of a [`BayesianOptimizer`]
pub struct BayesianOptimizerBuilder {
    domain: Domain,
    acquisition: Box<dyn Acquisition>,
    optimizer: Option<Box<dyn InfillOptimizer>>,
    initial: Array2<f64>,
    config: BoConfig,
}

impl BayesianOptimizerBuilder {
    /// Optimization of the functions modelled by `acquisition` within `domain`
    pub fn new(domain: &Domain, acquisition: impl Acquisition + 'static) -> Self {
        BayesianOptimizerBuilder {
            domain: domain.clone(),
            acquisition: Box::new(acquisition),
            optimizer: None,
            initial: EmptyDesign::new(domain).generate(),
            config: BoConfig::default(),
        }
    }

    /// Adjusts the configuration
    pub fn configure<F: FnOnce(BoConfig) -> BoConfig>(mut self, init: F) -> Self {
        self.config = init(self.config);
        self
    }

    /// Sets the optimizer used to maximize the acquisition,
    /// SLSQP started at the domain midpoint by default
    pub fn optimizer(mut self, optimizer: impl InfillOptimizer + 'static) -> Self {
        self.optimizer = Some(Box::new(optimizer));
        self
    }

    /// Sets the initial design evaluated at the start of the first optimization
    pub fn initial(mut self, design: &impl Design) -> Self {
        self.initial = design.generate();
        self
    }

    /// Checks the configuration and builds the optimizer
    pub fn build(self) -> Result<BayesianOptimizer> {
        let env = Env::new().filter_or(SEQBO_LOG, "info");
        Builder::from_env(env).target(Target::Stdout).try_init().ok();

        let config = self.config.check()?;
        let dim = self.domain.dim();
        if self.acquisition.input_dim() != dim {
            return Err(BoError::InvalidConfigError(format!(
                "domain dimension {} does not match acquisition input dimension {}",
                dim,
                self.acquisition.input_dim()
            )));
        }
        if self.initial.ncols() != dim {
            return Err(BoError::InvalidConfigError(format!(
                "initial design should have {} columns, got {}",
                dim,
                self.initial.ncols()
            )));
        }

        let acquisition = match config.hyper_draws {
            Some(n_draws) => {
                let rng = match config.seed {
                    Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
                    None => Xoshiro256Plus::from_entropy(),
                };
                info!(
                    "{} acquisition marginalized over {} hyperparameters draws",
                    self.acquisition.name(),
                    n_draws
                );
                Box::new(MarginalizedAcquisition::new(self.acquisition, n_draws, rng)?)
                    as Box<dyn Acquisition>
            }
            None => self.acquisition,
        };

        let mut optimizer = self
            .optimizer
            .unwrap_or_else(|| Box::new(SlsqpOptimizer::new(&self.domain)));
        optimizer.set_domain(self.domain.clone());

        Ok(BayesianOptimizer {
            domain: self.domain,
            acquisition,
            optimizer,
            initial: InitialDesign::Pending(self.initial),
            config,
        })
    }
}

/// Sequential Bayesian optimizer.
///
/// The acquisition owns the evaluated data, the optimizer only appends to it.
/// Objectives are never asked for gradients.
pub struct BayesianOptimizer {
    domain: Domain,
    acquisition: Box<dyn Acquisition>,
    optimizer: Box<dyn InfillOptimizer>,
    initial: InitialDesign,
    config: BoConfig,
}

impl BayesianOptimizer {
    /// The acquisition holding the evaluated data
    pub fn acquisition(&self) -> &dyn Acquisition {
        self.acquisition.as_ref()
    }

    /// The configuration
    pub fn config(&self) -> &BoConfig {
        &self.config
    }

    /// State of the initial design buffer
    pub fn initial_design(&self) -> &InitialDesign {
        &self.initial
    }

    /// Runs the configured default number of iterations, see [`BayesianOptimizer::optimize`]
    pub fn optimize_with_default_iters(&mut self, objectives: &Objectives) -> Result<OptimResult> {
        self.optimize(objectives, self.config.n_iter)
    }

    /// Minimizes the objectives (subject to the constraints) with `n_iter`
    /// expensive evaluations after the pending initial design, if any.
    ///
    /// `objectives` responses are concatenated column-wise and must match
    /// the acquisition data width. An objective failure aborts the run.
    pub fn optimize(&mut self, objectives: &Objectives, n_iter: usize) -> Result<OptimResult> {
        info!("{:?}", self.config);
        if let Some(outdir) = self.config.outdir.as_deref() {
            write_config(outdir, &self.config)?;
        }
        let mut nfev = 0;

        let pending = match &self.initial {
            InitialDesign::Pending(doe) => Some(doe.to_owned()),
            InitialDesign::Consumed => None,
        };
        if let Some(doe) = pending {
            if doe.nrows() > 0 {
                if doe.ncols() != self.domain.dim() {
                    return Err(BoError::ShapeError(format!(
                        "initial design should have {} columns, got {}",
                        self.domain.dim(),
                        doe.ncols()
                    )));
                }
                let (y, _) = self.evaluate_objectives(&doe, objectives)?;
                self.update_model_data(&doe, &y)?;
                self.initial = InitialDesign::Consumed;
                nfev += doe.nrows();
                info!("Initial design of {} points evaluated", doe.nrows());
                self.record(DOE_INITIAL_FILE)?;
            } else {
                self.initial = InitialDesign::Consumed;
            }
        }

        for i in 0..n_iter {
            let infill = {
                let negated = NegatedAcquisition::new(self.acquisition.as_ref());
                let fun: &InfillFn<'_> = &|x| negated.evaluate_with_gradients(x);
                self.optimizer.minimize(fun)?
            };
            debug!(
                "Infill optimization: {} ({} calls, status {})",
                infill.fun, infill.nfev, infill.message
            );
            let x = infill.x.insert_axis(Axis(0));
            let (y, _) = self.evaluate_objectives(&x, objectives)?;
            self.update_model_data(&x, &y)?;
            nfev += 1;
            info!(
                "Iteration {}/{}: acquisition={} at x={} -> y={}",
                i + 1,
                n_iter,
                -infill.fun,
                x.row(0),
                y.row(0)
            );
            self.record(DOE_FILE)?;
        }

        let mut result = self.create_result(true, "OK")?;
        result.nfev = nfev;
        info!("{}", result);
        Ok(result)
    }

    /// Evaluates every objective on the (n, nx) points and concatenates
    /// the responses column-wise.
    ///
    /// Returns the (n, m) responses and a (n, 0) placeholder for gradients,
    /// with m the acquisition data width. No function is called when `x` is empty,
    /// a (0, m) matrix and a (0, 0) placeholder are returned.
    pub fn evaluate_objectives(
        &self,
        x: &Array2<f64>,
        objectives: &Objectives,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        let width = self.acquisition.output_dim();
        if x.nrows() == 0 {
            return Ok((Array2::zeros((0, width)), Array2::zeros((0, 0))));
        }
        let mut responses = Vec::with_capacity(objectives.len());
        for (i, f) in objectives.iter().enumerate() {
            let y = f(&x.view()).map_err(BoError::EvaluationError)?;
            if y.nrows() != x.nrows() {
                return Err(BoError::ShapeError(format!(
                    "objective #{} returned {} rows for {} points",
                    i,
                    y.nrows(),
                    x.nrows()
                )));
            }
            responses.push(y);
        }
        let views: Vec<_> = responses.iter().map(|y| y.view()).collect();
        let y = concatenate(Axis(1), &views).map_err(|e| BoError::ShapeError(e.to_string()))?;
        if y.ncols() != width {
            return Err(BoError::ShapeError(format!(
                "objectives return {} columns while the acquisition expects {}",
                y.ncols(),
                width
            )));
        }
        Ok((y, Array2::zeros((x.nrows(), 0))))
    }

    /// Appends the (n, nx) points and their (n, m) responses to the
    /// acquisition data. The data are left untouched on error.
    pub fn update_model_data(&mut self, new_x: &Array2<f64>, new_y: &Array2<f64>) -> Result<()> {
        let (x, y) = self.acquisition.data();
        if new_x.ncols() != x.ncols() {
            return Err(BoError::ShapeError(format!(
                "new points should have {} columns, got {}",
                x.ncols(),
                new_x.ncols()
            )));
        }
        if new_y.ncols() != y.ncols() {
            return Err(BoError::ShapeError(format!(
                "new responses should have {} columns, got {}",
                y.ncols(),
                new_y.ncols()
            )));
        }
        if new_x.nrows() != new_y.nrows() {
            return Err(BoError::ShapeError(format!(
                "{} new points for {} new responses",
                new_x.nrows(),
                new_y.nrows()
            )));
        }
        let x = concatenate(Axis(0), &[x.view(), new_x.view()])
            .map_err(|e| BoError::ShapeError(e.to_string()))?;
        let y = concatenate(Axis(0), &[y.view(), new_y.view()])
            .map_err(|e| BoError::ShapeError(e.to_string()))?;
        self.acquisition.set_data(&x, &y)
    }

    /// Best feasible point of the acquisition data with respect to the objectives.
    ///
    /// Without any feasible row the result is a failure whatever `success`.
    /// Ties are resolved by the first occurrence and NaN values are ignored.
    pub fn create_result(&self, success: bool, message: &str) -> Result<OptimResult> {
        let (x, y) = self.acquisition.data();
        let feasible: Vec<usize> = self
            .acquisition
            .feasible_data_index()
            .iter()
            .enumerate()
            .filter_map(|(i, ok)| ok.then_some(i))
            .collect();
        if feasible.is_empty() {
            return Ok(OptimResult {
                x_opt: None,
                y_opt: None,
                success: false,
                message: NO_FEASIBLE_MESSAGE.to_string(),
                nfev: 0,
                x_doe: x,
                y_doe: y,
            });
        }

        let objectives = self.acquisition.objective_indices();
        if objectives.len() > 1 {
            warn!(
                "{} objectives: best point picked on the minimum over all objective values",
                objectives.len()
            );
        }
        let x_feasible = x.select(Axis(0), &feasible);
        let y_objectives = y.select(Axis(0), &feasible).select(Axis(1), &objectives);

        let flattened = Array1::from_iter(y_objectives.iter().cloned());
        let best = match flattened.argmin_skipnan() {
            Ok(index) => index / objectives.len(),
            Err(_) => {
                warn!("No objective value to minimize, first feasible point returned");
                0
            }
        };
        Ok(OptimResult {
            x_opt: Some(x_feasible.row(best).to_owned()),
            y_opt: Some(y_objectives.slice(s![best, ..]).to_owned()),
            success,
            message: message.to_string(),
            nfev: 0,
            x_doe: x,
            y_doe: y,
        })
    }

    fn record(&self, filename: &str) -> Result<()> {
        if let Some(outdir) = self.config.outdir.as_deref() {
            let (x, y) = self.acquisition.data();
            write_doe(outdir, filename, &x, &y)?;
        }
        Ok(())
    }
}

impl Optimizer for BayesianOptimizer {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Rebinds this optimizer and its acquisition optimizer to the domain
    fn set_domain(&mut self, domain: Domain) {
        self.optimizer.set_domain(domain.clone());
        self.domain = domain;
    }

    /// Pending initial design, no point once consumed
    fn initial(&self) -> Array2<f64> {
        match &self.initial {
            InitialDesign::Pending(doe) => doe.to_owned(),
            InitialDesign::Consumed => Array2::zeros((0, self.domain.dim())),
        }
    }

    /// Re-arms the initial design, evaluated by the next optimization
    fn set_initial(&mut self, initial: Array2<f64>) {
        self.initial = InitialDesign::Pending(initial);
    }
}
