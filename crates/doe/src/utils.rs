use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix2};
use ndarray_stats::DeviationExt;
use rayon::prelude::*;

/// Pairwise euclidean distances between the rows of `x`, as a condensed vector
/// of size `n * (n - 1) / 2` (order is not significant).
pub(crate) fn pdist<F: Float>(x: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>) -> Array1<F> {
    let nrows = x.nrows();
    let pairs: Vec<_> = (0..nrows)
        .flat_map(|i| ((i + 1)..nrows).map(move |j| (i, j)))
        .collect();
    pairs
        .par_iter()
        .map(|&(i, j)| F::cast(x.row(i).l2_dist(&x.row(j)).unwrap()))
        .collect::<Vec<_>>()
        .into()
}
