//! Squared exponential correlation used by [`Kriging`](crate::Kriging).
//!
//! `r(x, x') = exp(-sum_k theta_k (x_k - x'_k)^2)`

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};

/// Squared exponential correlation model
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SquaredExponentialCorr();

impl SquaredExponentialCorr {
    /// Correlations between each row of `x` and each row of `xt`: (nx, nt) matrix
    pub fn value(&self, x: &ArrayView2<f64>, xt: &ArrayView2<f64>, theta: &ArrayView1<f64>) -> Array2<f64> {
        let mut r = Array2::zeros((x.nrows(), xt.nrows()));
        Zip::from(r.rows_mut())
            .and(x.rows())
            .for_each(|mut r_row, xi| {
                Zip::from(&mut r_row).and(xt.rows()).for_each(|rij, xj| {
                    let d2: f64 = Zip::from(&xi)
                        .and(&xj)
                        .and(theta)
                        .fold(0., |acc, a, b, t| acc + t * (a - b) * (a - b));
                    *rij = (-d2).exp();
                });
            });
        r
    }

    /// Jacobian of the correlations between `x` and each row of `xt`
    /// with regard to `x`: (nt, nx_dim) matrix
    pub fn jacobian(
        &self,
        x: &ArrayView1<f64>,
        xt: &ArrayView2<f64>,
        theta: &ArrayView1<f64>,
    ) -> Array2<f64> {
        let x2 = x.to_owned().insert_axis(ndarray::Axis(0));
        let r: Array1<f64> = self.value(&x2.view(), xt, theta).row(0).to_owned();
        let mut jac = Array2::zeros((xt.nrows(), x.len()));
        Zip::from(jac.rows_mut())
            .and(xt.rows())
            .and(&r)
            .for_each(|mut jac_row, xj, rj| {
                Zip::from(&mut jac_row)
                    .and(x)
                    .and(&xj)
                    .and(theta)
                    .for_each(|d, a, b, t| *d = -2. * t * (a - b) * rj);
            });
        jac
    }
}
