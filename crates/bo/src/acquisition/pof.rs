use crate::acquisition::models::{SurrogateState, VARIANCE_EPS};
use crate::acquisition::Acquisition;
use crate::errors::Result;
use crate::surrogate::SurrogateParams;
use crate::utils::{norm_cdf, norm_pdf};

use ndarray::{Array1, Array2, ArrayView2, Zip};
use rand_xoshiro::Xoshiro256Plus;
use std::rc::Rc;

/// Probability that a black-box constraint is satisfied, ie `c(x) <= threshold`
///
/// `PoF(x) = Phi((threshold - mu(x)) / sigma(x))`
///
/// Usually multiplied with an objective acquisition through an [`Aggregation`](crate::Aggregation).
#[derive(Clone)]
pub struct ProbabilityOfFeasibility {
    state: SurrogateState,
    threshold: f64,
}

impl ProbabilityOfFeasibility {
    /// Probability of feasibility of the constraint surrogate built with `params`
    /// and trained on (n, nx) inputs `x` and (n, 1) constraint values `y`.
    /// The default threshold is 0.
    pub fn new(params: impl SurrogateParams + 'static, x: &Array2<f64>, y: &Array2<f64>) -> Result<Self> {
        Ok(ProbabilityOfFeasibility {
            state: SurrogateState::new(Rc::new(params), x, y)?,
            threshold: 0.,
        })
    }

    /// Sets the constraint threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Acquisition for ProbabilityOfFeasibility {
    fn name(&self) -> String {
        "PoF".to_string()
    }

    fn data(&self) -> (Array2<f64>, Array2<f64>) {
        self.state.data()
    }

    fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        self.state.set_data(x, y)
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
                    *v = if *mean <= self.threshold { 1. } else { 0. };
                } else {
                    let u = (self.threshold - mean) / sigma;
                    *v = norm_cdf(u);
                    let du = (&dmean * (-1.) - &dsigma * u) / *sigma;
                    g.assign(&(du * norm_pdf(u)));
                }
            });
        Ok((values, grads))
    }

    fn feasible_data_index(&self) -> Array1<bool> {
        self.state.y().column(0).mapv(|c| c <= self.threshold)
    }

    fn objective_indices(&self) -> Vec<usize> {
        vec![]
    }

    fn constraint_indices(&self) -> Vec<usize> {
        vec![0]
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
        Ok(self
            .state
            .replicas(n_draws, rng)?
            .into_iter()
            .map(|state| {
                Box::new(ProbabilityOfFeasibility {
                    state,
                    threshold: self.threshold,
                }) as Box<dyn Acquisition>
            })
            .collect())
    }
}
