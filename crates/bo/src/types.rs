use crate::errors::Result;

use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a Bayesian optimization run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OptimResult {
    /// Best feasible point, if any
    pub x_opt: Option<Array1<f64>>,
    /// Objective values at `x_opt`
    pub y_opt: Option<Array1<f64>>,
    /// Whether the run succeeded and found a feasible point
    pub success: bool,
    /// Status message
    pub message: String,
    /// Number of expensive evaluations (points) performed during the run
    pub nfev: usize,
    /// Every point known by the acquisition at the end of the run
    pub x_doe: Array2<f64>,
    /// Responses of every objective and constraint at `x_doe`
    pub y_doe: Array2<f64>,
}

impl fmt::Display for OptimResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.x_opt, &self.y_opt) {
            (Some(x_opt), Some(y_opt)) => write!(
                f,
                "{} (success={}, nfev={}): min f(x)={} at x={}",
                self.message, self.success, self.nfev, y_opt, x_opt
            ),
            _ => write!(
                f,
                "{} (success={}, nfev={})",
                self.message, self.success, self.nfev
            ),
        }
    }
}

/// Result of an inner (acquisition) optimization
#[derive(Clone, Debug)]
pub struct InfillResult {
    /// Point minimizing the function
    pub x: Array1<f64>,
    /// Function value at `x`
    pub fun: f64,
    /// Whether the optimizer converged
    pub success: bool,
    /// Optimizer status
    pub message: String,
    /// Number of function calls
    pub nfev: usize,
}

/// Function minimized by inner optimizers: given (n, nx) points returns
/// values (n) and gradients (n, nx)
pub type InfillFn<'a> = dyn Fn(&ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> + 'a;

type ObjectiveFn<'a> = Box<dyn Fn(&ArrayView2<f64>) -> anyhow::Result<Array2<f64>> + 'a>;

/// Ordered expensive black-box functions (objectives and constraints).
///
/// Each function maps (n, nx) points to (n, q) responses, responses are
/// concatenated column-wise in the given order. Functions do not return gradients.
///
/// ```
/// use seqbo::Objectives;
/// use ndarray::{Array2, ArrayView2, Axis};
///
/// fn f(x: &ArrayView2<f64>) -> Array2<f64> {
///     x.map_axis(Axis(1), |xi| xi.dot(&xi)).insert_axis(Axis(1))
/// }
/// fn c(x: &ArrayView2<f64>) -> Array2<f64> {
///     x.column(0).mapv(|v| v - 0.5).insert_axis(Axis(1))
/// }
/// let objectives = Objectives::new(f).and(c);
/// assert_eq!(objectives.len(), 2);
/// ```
#[derive(Default)]
pub struct Objectives<'a> {
    fxs: Vec<ObjectiveFn<'a>>,
}

impl<'a> Objectives<'a> {
    /// A single infallible function
    pub fn new(f: impl Fn(&ArrayView2<f64>) -> Array2<f64> + 'a) -> Self {
        Objectives::default().and(f)
    }

    /// A single function which may fail
    pub fn fallible(f: impl Fn(&ArrayView2<f64>) -> anyhow::Result<Array2<f64>> + 'a) -> Self {
        Objectives::default().and_fallible(f)
    }

    /// Append an infallible function
    pub fn and(self, f: impl Fn(&ArrayView2<f64>) -> Array2<f64> + 'a) -> Self {
        self.and_fallible(move |x| Ok(f(x)))
    }

    /// Append a function which may fail
    pub fn and_fallible(
        mut self,
        f: impl Fn(&ArrayView2<f64>) -> anyhow::Result<Array2<f64>> + 'a,
    ) -> Self {
        self.fxs.push(Box::new(f));
        self
    }

    /// Number of functions
    pub fn len(&self) -> usize {
        self.fxs.len()
    }

    /// Whether there is no function
    pub fn is_empty(&self) -> bool {
        self.fxs.is_empty()
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = &(dyn Fn(&ArrayView2<f64>) -> anyhow::Result<Array2<f64>> + 'a)> {
        self.fxs.iter().map(|f| f.as_ref())
    }
}
