use crate::traits::check_xlimits;
use crate::utils::pdist;
use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::{
    rand::seq::SliceRandom, rand::Rng, rand::SeedableRng, rand_distr::Uniform, RandomExt,
};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;
use std::sync::{Arc, RwLock};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Kinds of Latin Hypercube Design
#[derive(Clone, Debug, Default, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum LhsKind {
    /// sample is chosen randomly within its latin hypercube intervals
    Classic,
    /// sample is the middle of its latin hypercube intervals
    Centered,
    /// best classic design among several draws wrt the minimal distance between points
    #[default]
    Maximin,
}

/// Number of classic designs drawn to pick the maximin one
const MAXIMIN_ITERATIONS: usize = 5;

type RngRef<R> = Arc<RwLock<R>>;

/// Latin hypercube design: each component range is cut in `ns` intervals
/// and every interval holds exactly one sample.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Lhs<F: Float, R: Rng> {
    xlimits: Array2<F>,
    kind: LhsKind,
    rng: RngRef<R>,
}

impl<F: Float> Lhs<F, Xoshiro256Plus> {
    /// Constructor given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use seqbo_doe::Lhs;
    /// use ndarray::arr2;
    ///
    /// let doe = Lhs::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng> Lhs<F, R> {
    /// Constructor with a given random generator
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: R) -> Self {
        let xlimits = xlimits.to_owned();
        check_xlimits(&xlimits);
        Lhs {
            xlimits,
            kind: LhsKind::default(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sets the kind of LHS
    pub fn kind(mut self, kind: LhsKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> Lhs<F, R2> {
        Lhs {
            xlimits: self.xlimits,
            kind: self.kind,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    fn intervals(&self, ns: usize, centered: bool, rng: &mut R) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let width = 1. / ns as f64;
        let offsets = if centered {
            Array::from_elem((ns, nx), 0.5)
        } else {
            Array::random_using((ns, nx), Uniform::new(0., 1.), rng)
        };
        let mut lhs = Array2::zeros((ns, nx));
        for j in 0..nx {
            let mut perm: Vec<usize> = (0..ns).collect();
            perm.shuffle(rng);
            for (i, p) in perm.into_iter().enumerate() {
                lhs[[i, j]] = F::cast((p as f64 + offsets[[i, j]]) * width);
            }
        }
        lhs
    }

    fn maximin(&self, ns: usize, rng: &mut R) -> Array2<F> {
        let mut best = self.intervals(ns, false, rng);
        if ns < 2 {
            return best;
        }
        let mut best_dist = *pdist(&best).min().unwrap();
        for _ in 1..MAXIMIN_ITERATIONS {
            let candidate = self.intervals(ns, false, rng);
            let dist = *pdist(&candidate).min().unwrap();
            if dist > best_dist {
                best = candidate;
                best_dist = dist;
            }
        }
        best
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for Lhs<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let mut rng = self.rng.write().unwrap();
        match self.kind {
            LhsKind::Classic => self.intervals(ns, false, &mut *rng),
            LhsKind::Centered => self.intervals(ns, true, &mut *rng),
            LhsKind::Maximin => self.maximin(ns, &mut *rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, Axis};

    fn assert_latin(doe: &Array2<f64>, xlimits: &Array2<f64>) {
        let ns = doe.nrows();
        for (j, col) in doe.axis_iter(Axis(1)).enumerate() {
            let (lo, up) = (xlimits[[j, 0]], xlimits[[j, 1]]);
            let mut bins: Vec<usize> = col
                .iter()
                .map(|v| (((v - lo) / (up - lo)) * ns as f64).floor().min(ns as f64 - 1.) as usize)
                .collect();
            bins.sort_unstable();
            assert_eq!((0..ns).collect::<Vec<_>>(), bins);
        }
    }

    #[test]
    fn test_lhs_kinds_are_latin() {
        let xlimits = arr2(&[[5., 10.], [0., 1.], [-3., 3.]]);
        for kind in [LhsKind::Classic, LhsKind::Centered, LhsKind::Maximin] {
            let doe = Lhs::new(&xlimits)
                .kind(kind)
                .with_rng(Xoshiro256Plus::seed_from_u64(42))
                .sample(7);
            assert_eq!(&[7, 3], doe.shape());
            assert_latin(&doe, &xlimits);
        }
    }

    #[test]
    fn test_centered_lhs_levels() {
        let xlimits = arr2(&[[0., 1.]]);
        let doe = Lhs::new(&xlimits)
            .kind(LhsKind::Centered)
            .with_rng(Xoshiro256Plus::seed_from_u64(0))
            .sample(4);
        let mut values = doe.column(0).to_vec();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_abs_diff_eq!(
            Array::from_vec(values),
            Array::from_vec(vec![0.125, 0.375, 0.625, 0.875]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_lhs_single_point() {
        let xlimits = arr2(&[[0., 2.], [1., 3.]]);
        let doe = Lhs::new(&xlimits).sample(1);
        assert_eq!(&[1, 2], doe.shape());
    }
}
