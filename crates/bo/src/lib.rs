//! This library implements sequential Bayesian optimization of expensive
//! black-box functions.
//!
//! Surrogate models are trained on the evaluated points and an acquisition
//! function built on them (expected improvement, probability of improvement,
//! lower confidence bound, probability of feasibility and their aggregations)
//! is maximized to select the next point to evaluate, one point per iteration.
//!
//! The optimizer comes with a set of options to:
//! * specify the initial design (latin hypercube, random, full factorial or given points),
//! * handle inequality constraints through probability of feasibility,
//! * marginalize the acquisition over posterior draws of the surrogate hyperparameters,
//! * choose the acquisition optimizer (SLSQP, COBYLA, candidates, Monte Carlo or a chain of them),
//! * record the evaluated points in an output directory.
//!
//! # Examples
//!
//! ## Unconstrained optimization
//!
//! ```
//! use ndarray::{array, Array2, ArrayView2};
//! use seqbo::{BayesianOptimizerBuilder, Domain, ExpectedImprovement, Objectives};
//! use seqbo_doe::{Lhs, SamplingMethod};
//! use seqbo_gp::KrigingParams;
//! use rand_xoshiro::Xoshiro256Plus;
//! use ndarray_rand::rand::SeedableRng;
//!
//! // A one-dimensional test function, x in [0., 25.] and min xsinx(x) ~ -15.1 at x ~ 18.9
//! fn xsinx(x: &ArrayView2<f64>) -> Array2<f64> {
//!     (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())
//! }
//!
//! let domain = Domain::new(&array![[0., 25.]]).unwrap();
//! let doe = Lhs::new(domain.xlimits())
//!     .with_rng(Xoshiro256Plus::seed_from_u64(42))
//!     .sample(5);
//! let ei = ExpectedImprovement::new(
//!     KrigingParams::new(),
//!     &Array2::zeros((0, 1)),
//!     &Array2::zeros((0, 1)),
//! ).unwrap();
//! let mut optimizer = BayesianOptimizerBuilder::new(&domain, ei)
//!     .initial(&doe)
//!     .build()
//!     .expect("Bayesian optimizer");
//! let res = optimizer
//!     .optimize(&Objectives::new(xsinx), 10)
//!     .expect("xsinx minimization");
//! println!("xsinx min result = {}", res);
//! assert_eq!(res.x_doe.nrows(), 15);
//! ```
//!
//! ## Constrained optimization
//!
//! Objectives and constraints are given in the order of the acquisition
//! outputs. A constraint value is feasible when lower than the probability
//! of feasibility threshold (0 by default).
//!
//! ```no_run
//! use ndarray::{array, Array2, ArrayView2, Axis};
//! use seqbo::{
//!     Aggregation, BayesianOptimizerBuilder, Domain, ExpectedImprovement, Objectives,
//!     ProbabilityOfFeasibility,
//! };
//! use seqbo_gp::KrigingParams;
//!
//! fn f(x: &ArrayView2<f64>) -> Array2<f64> {
//!     x.map_axis(Axis(1), |xi| xi.dot(&xi)).insert_axis(Axis(1))
//! }
//! // x0 + x1 >= 1
//! fn c(x: &ArrayView2<f64>) -> Array2<f64> {
//!     x.map_axis(Axis(1), |xi| 1. - xi.sum()).insert_axis(Axis(1))
//! }
//!
//! let domain = Domain::new(&array![[-2., 2.], [-2., 2.]]).unwrap();
//! let (x0, y0) = (Array2::zeros((0, 2)), Array2::zeros((0, 1)));
//! let ei = ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).unwrap();
//! let pof = ProbabilityOfFeasibility::new(KrigingParams::new(), &x0, &y0).unwrap();
//! let acquisition = Aggregation::product(vec![Box::new(ei), Box::new(pof)]).unwrap();
//!
//! let mut optimizer = BayesianOptimizerBuilder::new(&domain, acquisition)
//!     .initial(&array![[-1., -1.], [1., 1.], [-1., 1.], [1., -1.], [0.5, 0.5]])
//!     .build()
//!     .expect("Bayesian optimizer");
//! let res = optimizer
//!     .optimize(&Objectives::new(f).and(c), 20)
//!     .expect("constrained minimization");
//! println!("{}", res);
//! ```
//!
//! # Logging
//!
//! Progress is reported through the [`log`](https://docs.rs/log) facade,
//! the level is set with the `SEQBO_LOG` environment variable (`info` by default).
//!
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod acquisition;
pub mod optimizers;

mod bayesian_optimizer;
mod config;
mod design;
mod domain;
mod errors;
mod surrogate;
mod types;
mod utils;

pub use crate::acquisition::{
    Acquisition, Aggregation, AggregationOperator, ExpectedImprovement, LowerConfidenceBound,
    MarginalizedAcquisition, NegatedAcquisition, ProbabilityOfFeasibility,
    ProbabilityOfImprovement,
};
pub use crate::bayesian_optimizer::*;
pub use crate::config::*;
pub use crate::design::*;
pub use crate::domain::*;
pub use crate::errors::*;
pub use crate::optimizers::{InfillOptimizer, Optimizer};
pub use crate::surrogate::*;
pub use crate::types::*;
pub use crate::utils::{norm_cdf, norm_pdf, CONFIG_FILE, DOE_FILE, DOE_INITIAL_FILE, SEQBO_LOG};
