//! Acquisition functions: utilities (higher is better) computed from surrogate
//! models of the expensive objectives and constraints, maximized to select the
//! next point to evaluate.
mod aggregation;
mod ei;
mod lcb;
mod marginalized;
mod models;
mod negated;
mod pi;
mod pof;

pub use aggregation::{Aggregation, AggregationOperator};
pub use ei::ExpectedImprovement;
pub use lcb::LowerConfidenceBound;
pub use marginalized::MarginalizedAcquisition;
pub use negated::NegatedAcquisition;
pub use pi::ProbabilityOfImprovement;
pub use pof::ProbabilityOfFeasibility;

use crate::errors::{BoError, Result};
use ndarray::{Array1, Array2, ArrayView2};
use rand_xoshiro::Xoshiro256Plus;

/// A utility function over the domain built on surrogate models of the
/// expensive functions. It owns the evaluated data `(X, Y)`: X is (n, nx)
/// and Y is (n, m) where m is the total width of objectives and constraints.
pub trait Acquisition {
    /// Name of the acquisition
    fn name(&self) -> String;

    /// Copy of the training data (X, Y)
    fn data(&self) -> (Array2<f64>, Array2<f64>);

    /// Replace the training data and retrain the underlying models.
    ///
    /// On error the previous data are kept, [`Acquisition::data`] and
    /// [`Acquisition::feasible_data_index`] are the same as before the call.
    /// Composite acquisitions retrain their parts on the previous data.
    fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()>;

    /// Utility values (n) and gradients (n, nx) at (n, nx) points
    fn evaluate_with_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)>;

    /// Utility values (n) at (n, nx) points
    fn evaluate(&self, x: &ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self.evaluate_with_gradients(x)?.0)
    }

    /// Mask of training rows satisfying every constraint
    fn feasible_data_index(&self) -> Array1<bool> {
        Array1::from_elem(self.data().0.nrows(), true)
    }

    /// Columns of Y holding objective values
    fn objective_indices(&self) -> Vec<usize>;

    /// Columns of Y holding constraint values
    fn constraint_indices(&self) -> Vec<usize>;

    /// Input dimension
    fn input_dim(&self) -> usize {
        self.data().0.ncols()
    }

    /// Number of columns of Y
    fn output_dim(&self) -> usize {
        self.data().1.ncols()
    }

    /// Prepares the acquisition once data are set given the feasible rows
    /// of the training data (as decided by a possibly enclosing aggregation)
    fn setup(&mut self, _feasible: &Array1<bool>) -> Result<()> {
        Ok(())
    }

    /// Whether [`Acquisition::sample_hyperparameters`] is supported
    fn supports_hyper_sampling(&self) -> bool {
        false
    }

    /// Acquisitions sharing the same data where models hyperparameters
    /// are drawn from their posterior distribution
    fn sample_hyperparameters(
        &self,
        _n_draws: usize,
        _rng: &mut Xoshiro256Plus,
    ) -> Result<Vec<Box<dyn Acquisition>>> {
        Err(BoError::InvalidConfigError(format!(
            "{} acquisition does not support hyperparameters sampling",
            self.name()
        )))
    }
}

impl std::fmt::Debug for dyn Acquisition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}
