use crate::traits::check_xlimits;
use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Grid design: all combinations of evenly spaced levels of every component.
///
/// The number of levels per component is chosen as evenly as possible such that
/// the grid holds at least the requested number of points; the first `ns` grid
/// points are returned.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct FullFactorial<F: Float> {
    xlimits: Array2<F>,
}

impl<F: Float> FullFactorial<F> {
    /// Constructor given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        let xlimits = xlimits.to_owned();
        check_xlimits(&xlimits);
        FullFactorial { xlimits }
    }
}

impl<F: Float> SamplingMethod<F> for FullFactorial<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        if ns == 0 || nx == 0 {
            return Array2::zeros((0, nx));
        }
        // add a level to the component having the fewest until the grid is large enough
        let mut levels: Array1<usize> = Array1::ones(nx);
        while levels.iter().product::<usize>() < ns {
            let (ind, _) = levels
                .iter()
                .enumerate()
                .min_by_key(|(_, n)| **n)
                .unwrap();
            levels[ind] += 1;
        }

        let mut doe = Array2::<F>::zeros((ns, nx));
        for (i, mut row) in doe.rows_mut().into_iter().enumerate() {
            // mixed radix decomposition of the grid index, last component varies fastest
            let mut rest = i;
            for j in (0..nx).rev() {
                let n = levels[j];
                let level = rest % n;
                rest /= n;
                row[j] = if n > 1 {
                    F::cast(level) / F::cast(n - 1)
                } else {
                    F::zero()
                };
            }
        }
        doe
    }
}
