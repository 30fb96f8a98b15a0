//! Inner optimizers minimizing a cheap function (the negated acquisition)
//! over the domain.
mod candidates;
mod cobyla;
mod slsqp;
mod staged;

pub use self::candidates::{CandidateOptimizer, MonteCarloOptimizer};
pub use self::cobyla::CobylaOptimizer;
pub use self::slsqp::SlsqpOptimizer;
pub use self::staged::StagedOptimizer;

use crate::domain::Domain;
use crate::errors::Result;
use crate::types::{InfillFn, InfillResult};

use ndarray::Array2;

/// An optimizer bound to a domain with optional starting points
pub trait Optimizer {
    /// Domain the optimizer works on
    fn domain(&self) -> &Domain;

    /// Rebinds the optimizer to the given domain
    fn set_domain(&mut self, domain: Domain);

    /// Starting (or initially evaluated) points as a (n, nx) matrix
    fn initial(&self) -> Array2<f64>;

    /// Sets starting (or initially evaluated) points
    fn set_initial(&mut self, initial: Array2<f64>);
}

/// An optimizer able to minimize a function over its domain
pub trait InfillOptimizer: Optimizer {
    /// Minimizes `fun` given as a function of (n, nx) points returning
    /// values (n) and gradients (n, nx)
    fn minimize(&mut self, fun: &InfillFn) -> Result<InfillResult>;
}

/// Starting points kept when inside the domain, the domain midpoint otherwise
pub(crate) fn checked_initial(domain: &Domain, initial: Array2<f64>) -> Array2<f64> {
    let valid = initial.nrows() > 0 && initial.rows().into_iter().all(|x| domain.contains(&x));
    if valid {
        initial
    } else {
        domain.midpoint().insert_axis(ndarray::Axis(0))
    }
}
