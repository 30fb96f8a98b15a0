use crate::acquisition::Acquisition;
use crate::errors::Result;

use ndarray::{Array1, Array2, ArrayView2};

/// Sign flip of an acquisition: inner optimizers minimize while
/// acquisitions are to be maximized.
pub struct NegatedAcquisition<'a> {
    acquisition: &'a dyn Acquisition,
}

impl<'a> NegatedAcquisition<'a> {
    /// Wraps the given acquisition
    pub fn new(acquisition: &'a dyn Acquisition) -> Self {
        NegatedAcquisition { acquisition }
    }

    /// Negated utility values and gradients at (n, nx) points
    pub fn evaluate_with_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
        let (values, grads) = self.acquisition.evaluate_with_gradients(x)?;
        Ok((-values, -grads))
    }
}
