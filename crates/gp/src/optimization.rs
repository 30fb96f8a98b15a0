use crate::errors::Result;
use seqbo_doe::{Lhs, LhsKind, SamplingMethod};

use ndarray::{arr1, s, Array1, Array2, Zip};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

pub(crate) struct CobylaParams {
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub maxeval: usize,
}

impl Default for CobylaParams {
    fn default() -> Self {
        CobylaParams {
            rhobeg: 0.5,
            ftol_rel: 1e-4,
            maxeval: 200,
        }
    }
}

/// Starting points in log10(theta) space: the given `theta0` followed by
/// `n_start` points spread over the bounds.
pub(crate) fn prepare_multistart(
    n_start: usize,
    theta0: &Array1<f64>,
    bounds: &[(f64, f64)],
) -> (Array2<f64>, Vec<(f64, f64)>) {
    let bounds: Vec<(f64, f64)> = bounds
        .iter()
        .map(|(lo, up)| (lo.log10(), up.log10()))
        .collect();

    let mut theta0s = Array2::zeros((n_start + 1, theta0.len()));
    theta0s.row_mut(0).assign(&theta0.mapv(f64::log10));

    if n_start > 0 {
        let mut xlimits: Array2<f64> = Array2::zeros((bounds.len(), 2));
        Zip::from(xlimits.rows_mut())
            .and(&bounds)
            .for_each(|mut row, limits| row.assign(&arr1(&[limits.0, limits.1])));
        // Seeded: starting points only need to be spread over the bounds
        let seeds = Lhs::new(&xlimits)
            .kind(LhsKind::Maximin)
            .with_rng(Xoshiro256Plus::seed_from_u64(42))
            .sample(n_start);
        theta0s.slice_mut(s![1.., ..]).assign(&seeds);
    }
    (theta0s, bounds)
}

/// Minimize `objfn` with cobyla within bounds starting from `param0`.
/// Returns infinity as minimum value when the optimizer fails.
pub(crate) fn optimize_params<ObjF>(
    objfn: ObjF,
    param0: &Array1<f64>,
    bounds: &[(f64, f64)],
    cobyla: CobylaParams,
) -> (f64, Array1<f64>)
where
    ObjF: Fn(&[f64]) -> f64,
{
    use cobyla::{minimize, Func, RhoBeg, StopTols};

    let cons: Vec<&dyn Func<()>> = vec![];
    let param0 = param0.to_vec();

    match minimize(
        |x: &[f64], _u: &mut ()| objfn(x),
        &param0,
        bounds,
        &cons,
        (),
        cobyla.maxeval,
        RhoBeg::All(cobyla.rhobeg),
        Some(StopTols {
            ftol_rel: cobyla.ftol_rel,
            ..StopTols::default()
        }),
    ) {
        Ok((_, x_opt, fval)) => {
            let fval = if f64::is_nan(fval) {
                f64::INFINITY
            } else {
                fval
            };
            (fval, arr1(&x_opt))
        }
        Err((status, x_opt, _)) => {
            log::warn!("Cobyla optimizer failed in likelihood maximization status={status:?}");
            (f64::INFINITY, arr1(&x_opt))
        }
    }
}

/// Multistart minimization of `objfn` over log10(theta), returns theta
pub(crate) fn optimize_theta<ObjF>(
    objfn: ObjF,
    theta0: &Array1<f64>,
    bounds: &[(f64, f64)],
    n_start: usize,
    max_eval: usize,
) -> Result<Array1<f64>>
where
    ObjF: Fn(&[f64]) -> f64,
{
    let (theta0s, log_bounds) = prepare_multistart(n_start, theta0, bounds);
    let mut best = (f64::INFINITY, theta0s.row(0).to_owned());
    for start in theta0s.rows() {
        let (fval, x_opt) = optimize_params(
            &objfn,
            &start.to_owned(),
            &log_bounds,
            CobylaParams {
                maxeval: max_eval,
                ..CobylaParams::default()
            },
        );
        if fval < best.0 {
            best = (fval, x_opt);
        }
    }
    if best.0.is_infinite() {
        log::warn!("Likelihood maximization did not converge, keep initial theta");
    }
    Ok(best.1.mapv(|v| 10f64.powf(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_prepare_multistart() {
        let (theta0s, bounds) = prepare_multistart(4, &array![0.1, 1.], &[(1e-2, 1e1), (1e-2, 1e1)]);
        assert_eq!(theta0s.dim(), (5, 2));
        assert_abs_diff_eq!(theta0s.row(0), array![-1., 0.], epsilon = 1e-12);
        assert_abs_diff_eq!(bounds[0].0, -2., epsilon = 1e-12);
        assert!(theta0s
            .iter()
            .all(|v| (-2. - 1e-12..=1. + 1e-12).contains(v)));
    }

    #[test]
    fn test_optimize_theta_quadratic() {
        // minimum at log10(theta) = (0.5, -1)
        let objfn = |x: &[f64]| (x[0] - 0.5).powi(2) + (x[1] + 1.).powi(2);
        let theta = optimize_theta(objfn, &array![0.1, 0.1], &[(1e-2, 1e1), (1e-2, 1e1)], 2, 500)
            .unwrap();
        assert_abs_diff_eq!(theta.mapv(f64::log10), array![0.5, -1.], epsilon = 1e-2);
    }
}
