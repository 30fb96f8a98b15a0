use crate::acquisition::models::{feasible_or_all, SurrogateState, VARIANCE_EPS};
use crate::acquisition::Acquisition;
use crate::errors::Result;
use crate::surrogate::SurrogateParams;
use crate::utils::{norm_cdf, norm_pdf};

use ndarray::{Array1, Array2, ArrayView2, Zip};
use rand_xoshiro::Xoshiro256Plus;
use std::rc::Rc;

/// Probability of improvement over the current minimum of the objective
///
/// `PI(x) = Phi((fmin - mu(x)) / sigma(x))`
#[derive(Clone)]
pub struct ProbabilityOfImprovement {
    state: SurrogateState,
    fmin: f64,
    feasible: Array1<bool>,
}

impl ProbabilityOfImprovement {
    /// Probability of improvement of the objective surrogate built with `params`
    /// and trained on (n, nx) inputs `x` and (n, 1) outputs `y`.
    pub fn new(params: impl SurrogateParams + 'static, x: &Array2<f64>, y: &Array2<f64>) -> Result<Self> {
        let mut pi = ProbabilityOfImprovement {
            state: SurrogateState::new(Rc::new(params), x, y)?,
            fmin: f64::INFINITY,
            feasible: Array1::from_elem(x.nrows(), true),
        };
        pi.setup(&Array1::from_elem(x.nrows(), true))?;
        Ok(pi)
    }

    /// Current reference minimum
    pub fn fmin(&self) -> f64 {
        self.fmin
    }
}

impl Acquisition for ProbabilityOfImprovement {
    fn name(&self) -> String {
        "PI".to_string()
    }

    fn data(&self) -> (Array2<f64>, Array2<f64>) {
        self.state.data()
    }

    fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        let previous = self.clone();
        let res = self
            .state
            .set_data(x, y)
            .and_then(|_| self.setup(&Array1::from_elem(x.nrows(), true)));
        if res.is_err() {
            *self = previous;
        }
        res
    }

    fn setup(&mut self, feasible: &Array1<bool>) -> Result<()> {
        self.feasible = feasible.to_owned();
        self.fmin = if self.state.nrows() == 0 {
            f64::INFINITY
        } else {
            let means = self.state.training_means()?;
            feasible_or_all(feasible)
                .into_iter()
                .map(|i| means[i])
                .fold(f64::INFINITY, f64::min)
        };
        Ok(())
    }

    fn evaluate_with_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
        let m = self.state.moments(x)?;
        let mut values = Array1::zeros(x.nrows());
        let mut grads = Array2::zeros(x.dim());
        Zip::from(&mut values)
            .and(grads.rows_mut())
            .and(&m.mean)
            .and(&m.sigma)
            .and(m.dmean.rows())
            .and(m.dsigma.rows())
            .for_each(|v, mut g, mean, sigma, dmean, dsigma| {
                if sigma * sigma < VARIANCE_EPS {
                    *v = if *mean < self.fmin { 1. } else { 0. };
                } else {
                    let u = (self.fmin - mean) / sigma;
                    *v = norm_cdf(u);
                    let du = (&dmean * (-1.) - &dsigma * u) / *sigma;
                    g.assign(&(du * norm_pdf(u)));
                }
            });
        Ok((values, grads))
    }

    fn objective_indices(&self) -> Vec<usize> {
        vec![0]
    }

    fn constraint_indices(&self) -> Vec<usize> {
        vec![]
    }

    fn output_dim(&self) -> usize {
        1
    }

    fn supports_hyper_sampling(&self) -> bool {
        true
    }

    fn sample_hyperparameters(
        &self,
        n_draws: usize,
        rng: &mut Xoshiro256Plus,
    ) -> Result<Vec<Box<dyn Acquisition>>> {
        self.state
            .replicas(n_draws, rng)?
            .into_iter()
            .map(|state| {
                let mut replica = ProbabilityOfImprovement {
                    state,
                    fmin: self.fmin,
                    feasible: self.feasible.clone(),
                };
                replica.setup(&self.feasible)?;
                Ok(Box::new(replica) as Box<dyn Acquisition>)
            })
            .collect()
    }
}
