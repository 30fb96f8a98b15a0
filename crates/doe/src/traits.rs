use linfa::Float;
use ndarray::Array2;

/// Sampling method generating points within a box-shaped sample space
/// `[lower_bound_xi, upper_bound_xi]^nx`.
pub trait SamplingMethod<F: Float> {
    /// Returns the `(nx, 2)` bounds of the sample space
    fn sampling_space(&self) -> &Array2<F>;

    /// Generates `ns` samples in the unit hypercube `[0., 1.]^nx`
    fn normalized_sample(&self, ns: usize) -> Array2<F>;

    /// Generates `ns` samples scaled to the sample space bounds
    fn sample(&self, ns: usize) -> Array2<F> {
        let xlimits = self.sampling_space();
        let lower = xlimits.column(0);
        let scaler = &xlimits.column(1) - &lower;
        self.normalized_sample(ns) * scaler + lower
    }
}

pub(crate) fn check_xlimits<F: Float>(xlimits: &Array2<F>) {
    if xlimits.ncols() != 2 {
        panic!("xlimits must have 2 columns (lower, upper)");
    }
}
