//! Initial designs evaluated before the first optimization iteration.
use crate::domain::Domain;

use ndarray::Array2;
use seqbo_doe::SamplingMethod;

/// A provider of an initial set of points (rows) in the domain
pub trait Design {
    /// Points as a (n, nx) matrix, `n` may be zero
    fn generate(&self) -> Array2<f64>;
}

/// A design without any point
#[derive(Clone, Debug)]
pub struct EmptyDesign {
    dim: usize,
}

impl EmptyDesign {
    /// Empty design over the given domain
    pub fn new(domain: &Domain) -> Self {
        EmptyDesign { dim: domain.dim() }
    }
}

impl Design for EmptyDesign {
    fn generate(&self) -> Array2<f64> {
        Array2::zeros((0, self.dim))
    }
}

/// User given points
impl Design for Array2<f64> {
    fn generate(&self) -> Array2<f64> {
        self.to_owned()
    }
}

/// A design of `n_points` drawn by a sampling method
/// (random, full factorial, latin hypercube).
///
/// ```
/// use seqbo::{Design, SampledDesign};
/// use seqbo_doe::Lhs;
/// use ndarray::array;
///
/// let design = SampledDesign::new(Lhs::new(&array![[0., 1.], [-1., 1.]]), 5);
/// assert_eq!(design.generate().dim(), (5, 2));
/// ```
pub struct SampledDesign<S: SamplingMethod<f64>> {
    sampling: S,
    n_points: usize,
}

impl<S: SamplingMethod<f64>> SampledDesign<S> {
    /// Constructor
    pub fn new(sampling: S, n_points: usize) -> Self {
        SampledDesign { sampling, n_points }
    }
}

impl<S: SamplingMethod<f64>> Design for SampledDesign<S> {
    fn generate(&self) -> Array2<f64> {
        self.sampling.sample(self.n_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use seqbo_doe::{FullFactorial, Lhs, Random};

    #[test]
    fn test_empty_design() {
        let domain = Domain::new(&array![[0., 1.], [0., 1.], [0., 1.]]).unwrap();
        assert_eq!(EmptyDesign::new(&domain).generate().dim(), (0, 3));
    }

    #[test]
    fn test_sampled_designs() {
        let xlimits = array![[0., 1.], [5., 10.]];
        let domain = Domain::new(&xlimits).unwrap();
        let lhs = SampledDesign::new(
            Lhs::new(&xlimits).with_rng(Xoshiro256Plus::seed_from_u64(42)),
            7,
        )
        .generate();
        assert_eq!(lhs.dim(), (7, 2));
        assert!(lhs.rows().into_iter().all(|x| domain.contains(&x)));

        let random = SampledDesign::new(Random::new(&xlimits).seed(42), 3).generate();
        assert_eq!(random.dim(), (3, 2));
        assert!(random.rows().into_iter().all(|x| domain.contains(&x)));

        let grid = SampledDesign::new(FullFactorial::new(&xlimits), 4).generate();
        assert_eq!(grid, array![[0., 5.], [0., 10.], [1., 5.], [1., 10.]]);
    }
}
