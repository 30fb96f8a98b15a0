use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Data normalized column-wise with its mean and standard deviation
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub(crate) struct NormalizedData {
    /// normalized data
    pub data: Array2<f64>,
    /// mean vector computed from data
    pub mean: Array1<f64>,
    /// standard deviation vector computed from data
    pub std: Array1<f64>,
}

impl NormalizedData {
    pub fn new(x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> NormalizedData {
        let (data, mean, std) = normalize(x);
        NormalizedData { data, mean, std }
    }

    /// Normalize `x` with the stored mean and standard deviation
    pub fn apply(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array2<f64> {
        (x - &self.mean) / &self.std
    }
}

/// Column-wise normalization, a null (or undefined for a single row)
/// standard deviation is replaced by one.
pub(crate) fn normalize(
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let ddof = if x.nrows() > 1 { 1. } else { 0. };
    let mut x_std = x.std_axis(Axis(0), ddof);
    x_std.mapv_inplace(|v| if v > f64::EPSILON { v } else { 1. });
    let xnorm = (x - &x_mean) / &x_std;

    (xnorm, x_mean, x_std)
}
