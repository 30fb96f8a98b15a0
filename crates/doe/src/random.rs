use std::sync::{Arc, RwLock};

use crate::traits::check_xlimits;
use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_rand::{rand::Rng, rand::SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Points drawn independently and uniformly within the sample space.
///
/// Unlike [`crate::Lhs`] nothing prevents clustered points, it is mostly
/// useful to start an optimization from a handful of arbitrary locations.
/// Successive calls to `sample` continue the same random stream.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Random<F: Float> {
    xlimits: Array2<F>,
    rng: Arc<RwLock<Xoshiro256Plus>>,
}

impl<F: Float> Random<F> {
    /// Random design within a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    /// seeded from system entropy
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        let xlimits = xlimits.to_owned();
        check_xlimits(&xlimits);
        Random {
            xlimits,
            rng: Arc::new(RwLock::new(Xoshiro256Plus::from_entropy())),
        }
    }

    /// Restarts the random stream from `seed`
    pub fn seed(self, seed: u64) -> Self {
        Random {
            xlimits: self.xlimits,
            rng: Arc::new(RwLock::new(Xoshiro256Plus::seed_from_u64(seed))),
        }
    }
}

impl<F: Float> SamplingMethod<F> for Random<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let mut rng = match self.rng.write() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        let nx = self.xlimits.nrows();
        // row-major draws: the first points do not depend on `ns`
        Array2::from_shape_simple_fn((ns, nx), || F::cast(rng.gen::<f64>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, s};

    #[test]
    fn test_random_within_bounds() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let doe = Random::new(&xlimits).seed(42).sample(50);
        assert_eq!(&[50, 2], doe.shape());
        assert!(doe.column(0).iter().all(|v| (5. ..=10.).contains(v)));
        assert!(doe.column(1).iter().all(|v| (0. ..=1.).contains(v)));
    }

    #[test]
    fn test_random_stream() {
        let xlimits = arr2(&[[-1., 1.], [0., 2.]]);
        let long = Random::new(&xlimits).seed(0).sample(6);
        let short = Random::new(&xlimits).seed(0).sample(2);
        assert_eq!(long.slice(s![..2, ..]), short);

        let doe = Random::new(&xlimits).seed(0);
        let first = doe.sample(2);
        let next = doe.sample(4);
        assert_eq!(first, long.slice(s![..2, ..]));
        assert_eq!(next, long.slice(s![2.., ..]));
    }

    #[test]
    #[should_panic]
    fn test_bad_xlimits() {
        let _ = Random::new(&arr2(&[[0., 1., 2.]]));
    }
}
