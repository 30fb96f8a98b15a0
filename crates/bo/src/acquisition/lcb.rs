use crate::acquisition::models::SurrogateState;
use crate::acquisition::Acquisition;
use crate::errors::Result;
use crate::surrogate::SurrogateParams;

use ndarray::{Array1, Array2, ArrayView2};
use rand_xoshiro::Xoshiro256Plus;
use std::rc::Rc;

/// Negated lower confidence bound of the objective
///
/// `LCB(x) = sigma_weight * sigma(x) - mu(x)`
#[derive(Clone)]
pub struct LowerConfidenceBound {
    state: SurrogateState,
    sigma_weight: f64,
}

impl LowerConfidenceBound {
    /// Default weight of the standard deviation
    pub const DEFAULT_SIGMA_WEIGHT: f64 = 2.0;

    /// Lower confidence bound of the objective surrogate built with `params`
    /// and trained on (n, nx) inputs `x` and (n, 1) outputs `y`.
    pub fn new(params: impl SurrogateParams + 'static, x: &Array2<f64>, y: &Array2<f64>) -> Result<Self> {
        Ok(LowerConfidenceBound {
            state: SurrogateState::new(Rc::new(params), x, y)?,
            sigma_weight: Self::DEFAULT_SIGMA_WEIGHT,
        })
    }

    /// Sets the weight of the standard deviation (exploration)
    pub fn sigma_weight(mut self, sigma_weight: f64) -> Self {
        self.sigma_weight = sigma_weight;
        self
    }
}

impl Acquisition for LowerConfidenceBound {
    fn name(&self) -> String {
        "LCB".to_string()
    }

    fn data(&self) -> (Array2<f64>, Array2<f64>) {
        self.state.data()
    }

    fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        self.state.set_data(x, y)
    }

    fn evaluate_with_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
        let m = self.state.moments(x)?;
        let values = &m.sigma * self.sigma_weight - &m.mean;
        let grads = &m.dsigma * self.sigma_weight - &m.dmean;
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
        Ok(self
            .state
            .replicas(n_draws, rng)?
            .into_iter()
            .map(|state| {
                Box::new(LowerConfidenceBound {
                    state,
                    sigma_weight: self.sigma_weight,
                }) as Box<dyn Acquisition>
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use seqbo_gp::{KrigingParams, ThetaTuning};

    #[test]
    fn test_lcb_at_training_points() {
        let x = array![[0.], [0.5], [1.]];
        let y = array![[1.], [-1.], [2.]];
        let params = KrigingParams::new().theta_tuning(ThetaTuning::Fixed(array![1.]));
        let lcb = LowerConfidenceBound::new(params, &x, &y)
            .unwrap()
            .sigma_weight(3.);
        let values = lcb.evaluate(&x.view()).unwrap();
        assert_abs_diff_eq!(values, array![-1., 1., -2.], epsilon = 1e-4);
        let m = lcb.state.moments(&array![[0.25]].view()).unwrap();
        assert!(m.sigma[0] > 0.);
        let between = lcb.evaluate(&array![[0.25]].view()).unwrap();
        assert_abs_diff_eq!(between[0], 3. * m.sigma[0] - m.mean[0], epsilon = 1e-12);
    }
}
