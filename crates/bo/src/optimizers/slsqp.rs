use crate::domain::Domain;
use crate::errors::{BoError, Result};
use crate::optimizers::{checked_initial, InfillOptimizer, Optimizer};
use crate::types::{InfillFn, InfillResult};

use log::debug;
use ndarray::{Array2, ArrayView2};
use std::cell::{Cell, RefCell};

/// Default maximum number of function evaluations per start
pub const SLSQP_MAX_EVAL_DEFAULT: usize = 200;

/// Gradient-based bounded minimization (SLSQP) run from every starting point,
/// the domain midpoint by default.
pub struct SlsqpOptimizer {
    domain: Domain,
    initial: Array2<f64>,
    max_eval: usize,
    ftol_rel: f64,
}

impl SlsqpOptimizer {
    /// Optimizer over the given domain starting at its midpoint
    pub fn new(domain: &Domain) -> Self {
        SlsqpOptimizer {
            domain: domain.clone(),
            initial: domain.midpoint().insert_axis(ndarray::Axis(0)),
            max_eval: SLSQP_MAX_EVAL_DEFAULT,
            ftol_rel: 1e-6,
        }
    }

    /// Sets maximum number of function evaluations per start
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.max_eval = max_eval;
        self
    }

    /// Sets relative tolerance on function value
    pub fn ftol_rel(mut self, ftol_rel: f64) -> Self {
        self.ftol_rel = ftol_rel;
        self
    }
}

impl Optimizer for SlsqpOptimizer {
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

impl InfillOptimizer for SlsqpOptimizer {
    fn minimize(&mut self, fun: &InfillFn) -> Result<InfillResult> {
        let bounds = self.domain.bounds();
        let failure: RefCell<Option<BoError>> = RefCell::new(None);
        let nfev = Cell::new(0);

        let obj = |x: &[f64], gradient: Option<&mut [f64]>, _u: &mut ()| -> f64 {
            if failure.borrow().is_some() {
                return f64::INFINITY;
            }
            nfev.set(nfev.get() + 1);
            let evaluation = ArrayView2::from_shape((1, x.len()), x)
                .map_err(|e| BoError::ShapeError(e.to_string()))
                .and_then(|pt| fun(&pt));
            match evaluation {
                Ok((values, grads)) if grads.dim() == (1, x.len()) => {
                    if let Some(gradient) = gradient {
                        gradient
                            .iter_mut()
                            .zip(grads.row(0))
                            .for_each(|(g, v)| *g = *v);
                    }
                    if values[0].is_nan() {
                        f64::INFINITY
                    } else {
                        values[0]
                    }
                }
                Ok((_, grads)) => {
                    *failure.borrow_mut() = Some(BoError::InfillError(format!(
                        "gradient of shape (1, {}) expected, got {:?}",
                        x.len(),
                        grads.dim()
                    )));
                    f64::INFINITY
                }
                Err(err) => {
                    *failure.borrow_mut() = Some(err);
                    f64::INFINITY
                }
            }
        };

        let cons: Vec<&dyn Fn(&[f64], Option<&mut [f64]>, &mut ()) -> f64> = vec![];
        let mut best: Option<InfillResult> = None;
        for start in self.initial.rows() {
            let xinit = start.to_vec();
            let (success, status, x_opt, f_opt) = match slsqp::minimize(
                obj,
                &xinit,
                &bounds,
                &cons,
                (),
                self.max_eval,
                Some(slsqp::StopTols {
                    ftol_rel: self.ftol_rel,
                    ..slsqp::StopTols::default()
                }),
            ) {
                Ok((status, x_opt, f_opt)) => (true, format!("{status:?}"), x_opt, f_opt),
                Err((status, x_opt, f_opt)) => (false, format!("{status:?}"), x_opt, f_opt),
            };
            if let Some(err) = failure.borrow_mut().take() {
                return Err(err);
            }
            debug!("Slsqp from {} -> f={} ({})", start, f_opt, status);
            let f_opt = if f_opt.is_nan() { f64::INFINITY } else { f_opt };
            if best.as_ref().map_or(true, |b| f_opt < b.fun) {
                best = Some(InfillResult {
                    x: self.domain.clip(&ndarray::Array1::from(x_opt)),
                    fun: f_opt,
                    success,
                    message: status,
                    nfev: 0,
                });
            }
        }
        let mut result = best.ok_or_else(|| {
            BoError::InfillError("no starting point for slsqp optimizer".to_string())
        })?;
        result.nfev = nfev.get();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Axis};

    fn sphere(x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
        let center = array![0.3, -0.2];
        let d = x - &center;
        Ok((d.mapv(|v| v * v).sum_axis(Axis(1)), d * 2.))
    }

    #[test]
    fn test_slsqp_sphere() {
        let domain = Domain::new(&array![[-1., 1.], [-1., 1.]]).unwrap();
        let mut optimizer = SlsqpOptimizer::new(&domain);
        let res = optimizer.minimize(&sphere).unwrap();
        assert_abs_diff_eq!(res.x, array![0.3, -0.2], epsilon = 1e-4);
        assert_abs_diff_eq!(res.fun, 0., epsilon = 1e-6);
        assert!(res.nfev > 0);
    }

    #[test]
    fn test_slsqp_bounded_minimum() {
        let domain = Domain::new(&array![[0.5, 1.], [-1., 1.]]).unwrap();
        let mut optimizer = SlsqpOptimizer::new(&domain);
        optimizer.set_initial(array![[0.9, 0.9], [0.6, -0.9]]);
        assert_eq!(optimizer.initial().nrows(), 2);
        let res = optimizer.minimize(&sphere).unwrap();
        assert!(domain.contains(&res.x));
        assert_abs_diff_eq!(res.x, array![0.5, -0.2], epsilon = 1e-4);
    }

    #[test]
    fn test_slsqp_propagates_errors() {
        let domain = Domain::new(&array![[-1., 1.]]).unwrap();
        let mut optimizer = SlsqpOptimizer::new(&domain);
        fn failing(_x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
            Err(BoError::InfillError("no model".to_string()))
        }
        assert!(matches!(
            optimizer.minimize(&failing),
            Err(BoError::InfillError(_))
        ));
    }

    #[test]
    fn test_slsqp_initial_outside_domain() {
        let domain = Domain::new(&array![[-1., 1.]]).unwrap();
        let mut optimizer = SlsqpOptimizer::new(&domain);
        optimizer.set_initial(array![[3.]]);
        assert_eq!(optimizer.initial(), array![[0.]]);
        optimizer.set_domain(Domain::new(&array![[2., 4.]]).unwrap());
        assert_eq!(optimizer.initial(), array![[3.]]);
    }
}
