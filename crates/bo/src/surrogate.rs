//! Surrogate models used by acquisition functions.
use crate::errors::Result;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand_xoshiro::Xoshiro256Plus;
use seqbo_gp::{Kriging, KrigingParams};

/// A builder of surrogate models of a scalar output
pub trait SurrogateParams {
    /// Train a surrogate on (n, nx) inputs `x` and n outputs `y`
    fn train(&self, x: &ArrayView2<f64>, y: &ArrayView1<f64>) -> Result<Box<dyn Surrogate>>;
}

/// A trained surrogate model of a scalar output
pub trait Surrogate {
    /// Predicted means and variances at (n, nx) points
    fn predict_valvar(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)>;

    /// Gradients of predicted means and variances at (n, nx) points,
    /// both (n, nx) matrices
    fn predict_valvar_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)>;

    /// Surrogates trained on the same data with hyperparameters
    /// drawn from their posterior distribution
    fn sample_hyperparameters(
        &self,
        n_draws: usize,
        rng: &mut Xoshiro256Plus,
    ) -> Result<Vec<Box<dyn Surrogate>>>;
}

impl SurrogateParams for KrigingParams {
    fn train(&self, x: &ArrayView2<f64>, y: &ArrayView1<f64>) -> Result<Box<dyn Surrogate>> {
        Ok(Box::new(self.fit(x, y)?))
    }
}

impl Surrogate for Kriging {
    fn predict_valvar(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        Ok(Kriging::predict_valvar(self, x)?)
    }

    fn predict_valvar_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        Ok(Kriging::predict_valvar_gradients(self, x)?)
    }

    fn sample_hyperparameters(
        &self,
        n_draws: usize,
        rng: &mut Xoshiro256Plus,
    ) -> Result<Vec<Box<dyn Surrogate>>> {
        Ok(Kriging::sample_hyperparameters(self, n_draws, rng)?
            .into_iter()
            .map(|k| Box::new(k) as Box<dyn Surrogate>)
            .collect())
    }
}
