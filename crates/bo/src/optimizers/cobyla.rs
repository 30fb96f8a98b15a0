use crate::domain::Domain;
use crate::errors::{BoError, Result};
use crate::optimizers::{checked_initial, InfillOptimizer, Optimizer};
use crate::types::{InfillFn, InfillResult};

use cobyla::{minimize, Func, RhoBeg, StopTols};
use log::debug;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::cell::{Cell, RefCell};

/// Default maximum number of function evaluations per start
pub const COBYLA_MAX_EVAL_DEFAULT: usize = 500;

/// Derivative-free bounded minimization (COBYLA) run from every starting point,
/// the domain midpoint by default.
pub struct CobylaOptimizer {
    domain: Domain,
    initial: Array2<f64>,
    max_eval: usize,
    rhobeg: Option<f64>,
    ftol_rel: f64,
}

impl CobylaOptimizer {
    /// Optimizer over the given domain starting at its midpoint
    pub fn new(domain: &Domain) -> Self {
        CobylaOptimizer {
            domain: domain.clone(),
            initial: domain.midpoint().insert_axis(Axis(0)),
            max_eval: COBYLA_MAX_EVAL_DEFAULT,
            rhobeg: None,
            ftol_rel: 1e-6,
        }
    }

    /// Sets maximum number of function evaluations per start
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Sets initial step, a quarter of the smallest domain width by default
    pub fn rhobeg(mut self, rhobeg: f64) -> Self {
        self.rhobeg = Some(rhobeg);
        self
    }

    /// Sets relative tolerance on function value
    pub fn ftol_rel(mut self, ftol_rel: f64) -> Self {
        self.ftol_rel = ftol_rel;
        self
    }

    fn initial_step(&self) -> f64 {
        self.rhobeg.unwrap_or_else(|| {
            let width = (&self.domain.upper() - &self.domain.lower())
                .iter()
                .filter(|w| **w > 0.)
                .fold(f64::INFINITY, |a, b| a.min(*b));
            if width.is_finite() {
                width / 4.
            } else {
                0.5
            }
        })
    }
}

impl Optimizer for CobylaOptimizer {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
        self.initial = checked_initial(&self.domain, std::mem::take(&mut self.initial));
    }

    fn initial(&self) -> Array2<f64> {
        self.initial.to_owned()
    }

    fn set_initial(&mut self, initial: Array2<f64>) {
        self.initial = checked_initial(&self.domain, initial);
    }
}

impl InfillOptimizer for CobylaOptimizer {
    fn minimize(&mut self, fun: &InfillFn) -> Result<InfillResult> {
        let bounds = self.domain.bounds();
        let failure: RefCell<Option<BoError>> = RefCell::new(None);
        let nfev = Cell::new(0);

        let obj = |x: &[f64], _u: &mut ()| -> f64 {
            if failure.borrow().is_some() {
                return f64::INFINITY;
            }
            nfev.set(nfev.get() + 1);
            let evaluation = ArrayView2::from_shape((1, x.len()), x)
                .map_err(|e| BoError::ShapeError(e.to_string()))
                .and_then(|pt| fun(&pt));
            match evaluation {
                Ok((values, _)) if !values[0].is_nan() => values[0],
                Ok(_) => f64::INFINITY,
                Err(err) => {
                    *failure.borrow_mut() = Some(err);
                    f64::INFINITY
                }
            }
        };

        let cons: Vec<&dyn Func<()>> = vec![];
        let mut best: Option<InfillResult> = None;
        for start in self.initial.rows() {
            let (success, status, x_opt, f_opt) = match minimize(
                obj,
                &start.to_vec(),
                &bounds,
                &cons,
                (),
                self.max_eval,
                RhoBeg::All(self.initial_step()),
                Some(StopTols {
                    ftol_rel: self.ftol_rel,
                    ..StopTols::default()
                }),
            ) {
                Ok((status, x_opt, f_opt)) => (true, format!("{status:?}"), x_opt, f_opt),
                Err((status, x_opt, f_opt)) => (false, format!("{status:?}"), x_opt, f_opt),
            };
            if let Some(err) = failure.borrow_mut().take() {
                return Err(err);
            }
            debug!("Cobyla from {} -> f={} ({})", start, f_opt, status);
            let f_opt = if f_opt.is_nan() { f64::INFINITY } else { f_opt };
            if best.as_ref().map_or(true, |b| f_opt < b.fun) {
                best = Some(InfillResult {
                    x: self.domain.clip(&Array1::from(x_opt)),
                    fun: f_opt,
                    success,
                    message: status,
                    nfev: 0,
                });
            }
        }
        let mut result = best.ok_or_else(|| {
            BoError::InfillError("no starting point for cobyla optimizer".to_string())
        })?;
        result.nfev = nfev.get();
        Ok(result)
    }
}
