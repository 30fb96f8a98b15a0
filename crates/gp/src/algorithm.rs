use crate::correlation_models::SquaredExponentialCorr;
use crate::errors::{GpError, Result};
use crate::optimization::optimize_theta;
use crate::parameters::{KrigingParams, ThetaTuning};
use crate::utils::NormalizedData;

use linfa_linalg::{cholesky::*, triangular::*};
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Quantities computed at training for a given theta,
/// used later on in prediction computations
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub(crate) struct KrigingInnerParams {
    /// Concentrated log likelihood
    likelihood: f64,
    /// Process variance of the normalized outputs
    sigma2: f64,
    /// Weights: solution of `R alpha = y`
    alpha: Array1<f64>,
    /// Lower Cholesky factor of the correlation matrix R
    r_chol: Array2<f64>,
}

/// Ordinary Kriging surrogate of a scalar function.
///
/// The output is modeled as `Y(x) = mu + Z(x)` where `mu` is a constant mean
/// and `Z` a gaussian process with variance `sigma2` and squared exponential
/// correlation `exp(-sum_k theta_k (x_k - x'_k)^2)` computed on normalized inputs.
///
/// Length scales `theta` are either given or chosen by maximizing the
/// concentrated likelihood. Alternatively posterior draws of `theta` can be
/// obtained with [`Kriging::sample_hyperparameters`].
///
/// # Example
///
/// ```no_run
/// use seqbo_gp::{Kriging, KrigingParams};
/// use ndarray::{array, Axis};
///
/// let xt = array![[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]];
/// let yt = xt.column(0).mapv(|x: f64| (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).sin());
///
/// let kriging = KrigingParams::new().fit(&xt, &yt).expect("Kriging training");
/// let (mean, var) = kriging.predict_valvar(&array![[1.0], [7.5]]).expect("prediction");
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Kriging {
    /// Length scales
    theta: Array1<f64>,
    inner_params: KrigingInnerParams,
    xt_norm: NormalizedData,
    yt_norm: NormalizedData,
    /// Parameters used to fit this model
    params: KrigingParams,
}

impl KrigingParams {
    /// Fit a Kriging model to the training data `(xt, yt)`,
    /// `xt` being a (n, nx) matrix and `yt` a n-vector.
    pub fn fit(
        &self,
        xt: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        yt: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    ) -> Result<Kriging> {
        self.check()?;
        if xt.nrows() == 0 || xt.ncols() == 0 {
            return Err(GpError::InvalidDataError(
                "at least one training point of dimension >= 1 is required".to_string(),
            ));
        }
        if xt.nrows() != yt.len() {
            return Err(GpError::InvalidDataError(format!(
                "xt rows ({}) and yt length ({}) should match",
                xt.nrows(),
                yt.len()
            )));
        }
        if xt.iter().chain(yt.iter()).any(|v| !v.is_finite()) {
            return Err(GpError::InvalidDataError(
                "training data should be finite".to_string(),
            ));
        }

        let xt_norm = NormalizedData::new(xt);
        let yt_norm = NormalizedData::new(&yt.to_owned().insert_axis(Axis(1)));

        let dim = xt.ncols();
        let theta0 = broadcast(self.theta_tuning.init(), dim, "theta init")?;
        let theta = match &self.theta_tuning {
            ThetaTuning::Fixed(_) => theta0,
            ThetaTuning::Optimized { .. } => {
                let bounds = broadcast(&self.theta_tuning.bounds(), dim, "theta bounds")?;
                let objfn = |x: &[f64]| -> f64 {
                    let theta = Array1::from_iter(x.iter().map(|v| 10f64.powf(*v)));
                    match reduced_likelihood(&xt_norm, &yt_norm, &theta.view(), self.nugget) {
                        Ok(inner) => -inner.likelihood,
                        Err(_) => f64::INFINITY,
                    }
                };
                optimize_theta(
                    objfn,
                    &theta0,
                    &bounds.to_vec(),
                    self.n_start,
                    self.max_eval,
                )?
            }
        };
        debug!("Kriging theta = {theta}");

        let inner_params = reduced_likelihood(&xt_norm, &yt_norm, &theta.view(), self.nugget)?;
        Ok(Kriging {
            theta,
            inner_params,
            xt_norm,
            yt_norm,
            params: self.clone(),
        })
    }
}

impl Kriging {
    /// Kriging parameters with default values
    pub fn params() -> KrigingParams {
        KrigingParams::default()
    }

    /// Same training data refitted with given length scales
    pub fn with_theta(&self, theta: &Array1<f64>) -> Result<Kriging> {
        if theta.len() != self.dim() || theta.iter().any(|t| *t <= 0.) {
            return Err(GpError::InvalidValueError(format!(
                "theta should be a positive vector of dim {}, got {theta}",
                self.dim()
            )));
        }
        let inner_params =
            reduced_likelihood(&self.xt_norm, &self.yt_norm, &theta.view(), self.params.nugget)?;
        Ok(Kriging {
            theta: theta.to_owned(),
            inner_params,
            xt_norm: self.xt_norm.clone(),
            yt_norm: self.yt_norm.clone(),
            params: self.params.clone(),
        })
    }

    /// Length scales
    pub fn theta(&self) -> &Array1<f64> {
        &self.theta
    }

    /// Concentrated log likelihood of the training data
    pub fn likelihood(&self) -> f64 {
        self.inner_params.likelihood
    }

    /// Process variance in output units
    pub fn variance(&self) -> f64 {
        self.inner_params.sigma2 * self.yt_norm.std[0] * self.yt_norm.std[0]
    }

    /// Input dimension
    pub fn dim(&self) -> usize {
        self.xt_norm.data.ncols()
    }

    /// Number of training points
    pub fn n_training(&self) -> usize {
        self.xt_norm.data.nrows()
    }

    /// Parameters used to fit this model
    pub fn kriging_params(&self) -> &KrigingParams {
        &self.params
    }

    /// Predict mean values at `x` (n, nx) points
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        Ok(self.predict_valvar(x)?.0)
    }

    /// Predict variances at `x` (n, nx) points
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Array1<f64>> {
        Ok(self.predict_valvar(x)?.1)
    }

    /// Predict means and variances at `x` (n, nx) points
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<(Array1<f64>, Array1<f64>)> {
        self.check_input(x)?;
        let xnorm = self.xt_norm.apply(x);
        let r = self.correlations(&xnorm);
        let y_std = self.yt_norm.std[0];

        let mean = r.dot(&self.inner_params.alpha) * y_std + self.yt_norm.mean[0];

        let v = self
            .inner_params
            .r_chol
            .solve_triangular(&r.t(), UPLO::Lower)?;
        let var = v
            .mapv(|a| a * a)
            .sum_axis(Axis(0))
            .mapv(|s| (1. - s).max(0.) * self.inner_params.sigma2 * y_std * y_std);
        Ok((mean, var))
    }

    /// Predict gradients of means and variances at `x` (n, nx) points.
    /// Returns two (n, nx) matrices.
    pub fn predict_valvar_gradients(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        self.check_input(x)?;
        let xnorm = self.xt_norm.apply(x);
        let r = self.correlations(&xnorm);
        let y_std = self.yt_norm.std[0];
        let sigma2 = self.inner_params.sigma2;
        let r_chol = &self.inner_params.r_chol;

        // w = R^-1 r for each prediction point (columns)
        let v = r_chol.solve_triangular(&r.t(), UPLO::Lower)?;
        let explained = v.mapv(|a| a * a).sum_axis(Axis(0));
        let w = r_chol.t().solve_triangular(&v, UPLO::Upper)?;

        let corr = SquaredExponentialCorr::default();
        let mut mean_grads = Array2::zeros(x.dim());
        let mut var_grads = Array2::zeros(x.dim());
        Zip::from(mean_grads.rows_mut())
            .and(var_grads.rows_mut())
            .and(xnorm.rows())
            .and(w.columns())
            .and(&explained)
            .for_each(|mut dmean, mut dvar, xi, wi, expl| {
                let jac = corr.jacobian(&xi, &self.xt_norm.data.view(), &self.theta.view());
                let dmean_n = jac.t().dot(&self.inner_params.alpha);
                dmean.assign(&(dmean_n * y_std / &self.xt_norm.std));
                if *expl < 1. {
                    let dvar_n = jac.t().dot(&wi) * (-2. * sigma2);
                    dvar.assign(&(dvar_n * y_std * y_std / &self.xt_norm.std));
                }
            });
        Ok((mean_grads, var_grads))
    }

    fn correlations(&self, xnorm: &Array2<f64>) -> Array2<f64> {
        SquaredExponentialCorr::default().value(
            &xnorm.view(),
            &self.xt_norm.data.view(),
            &self.theta.view(),
        )
    }

    fn check_input(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<()> {
        if x.ncols() != self.dim() {
            return Err(GpError::InvalidValueError(format!(
                "prediction points should have {} columns, got {}",
                self.dim(),
                x.ncols()
            )));
        }
        Ok(())
    }
}

/// Broadcast a one-element array to `dim` elements
fn broadcast<T: Clone>(values: &Array1<T>, dim: usize, what: &str) -> Result<Array1<T>> {
    match values.len() {
        1 => Ok(Array1::from_elem(dim, values[0].clone())),
        n if n == dim => Ok(values.to_owned()),
        n => Err(GpError::InvalidValueError(format!(
            "{what} dim ({n}) should be 1 or match input dim ({dim})"
        ))),
    }
}

/// Largest nugget used to factorize the correlation matrix
const MAX_JITTER: f64 = 1e-6;

/// Concentrated log likelihood `-(n ln(sigma2) + ln(det(R))) / 2`
/// and the quantities used for prediction.
pub(crate) fn reduced_likelihood(
    xt_norm: &NormalizedData,
    yt_norm: &NormalizedData,
    theta: &ArrayView1<f64>,
    nugget: f64,
) -> Result<KrigingInnerParams> {
    let corr = SquaredExponentialCorr::default();
    let xt = xt_norm.data.view();
    let n_obs = xt.nrows();
    let r_mx = corr.value(&xt, &xt, theta);

    // Nearly duplicated points make R singular: the nugget is raised until
    // the factorization succeeds
    let mut jitter = nugget;
    let r_chol = loop {
        let mut r_jit = r_mx.to_owned();
        r_jit.diag_mut().mapv_inplace(|v| v + jitter);
        match r_jit.cholesky() {
            Ok(r_chol) => break r_chol,
            Err(err) if jitter < MAX_JITTER => {
                debug!("Cholesky failed with nugget {jitter:e}: {err}");
                jitter = (jitter * 10.).min(MAX_JITTER);
            }
            Err(err) => return Err(err.into()),
        }
    };
    let z = r_chol.solve_triangular(&yt_norm.data, UPLO::Lower)?;
    // Constant outputs have a null variance, floored to keep the log finite
    let sigma2 = (z.mapv(|v| v * v).sum() / n_obs as f64).max(f64::EPSILON);
    let alpha = r_chol.t().solve_triangular(&z, UPLO::Upper)?;

    let logdet = r_chol.diag().mapv(|v| v.ln()).sum() * 2.;
    let likelihood = -0.5 * (n_obs as f64 * sigma2.ln() + logdet);
    if !likelihood.is_finite() {
        return Err(GpError::LikelihoodComputationError(format!(
            "non finite likelihood for theta = {theta}"
        )));
    }

    Ok(KrigingInnerParams {
        likelihood,
        sigma2,
        alpha: alpha.column(0).to_owned(),
        r_chol,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use ndarray::{array, Array};

    fn xsinx(x: &Array2<f64>) -> Array1<f64> {
        x.column(0)
            .mapv(|v| (v - 3.5) * ((v - 3.5) / std::f64::consts::PI).sin())
    }

    fn trained() -> Kriging {
        let xt = array![[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]];
        let yt = xsinx(&xt);
        KrigingParams::new().fit(&xt, &yt).expect("Kriging training")
    }

    #[test]
    fn test_kriging_interpolates_training_data() {
        let xt = array![[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]];
        let kriging = trained();
        let (mean, var) = kriging.predict_valvar(&xt).unwrap();
        assert_abs_diff_eq!(mean, xsinx(&xt), epsilon = 1e-3);
        assert_abs_diff_eq!(var, Array1::zeros(7), epsilon = 1e-3);
    }

    #[test]
    fn test_kriging_variance_is_positive_between_points() {
        let kriging = trained();
        let var = kriging.predict_var(&array![[2.5], [12.5], [22.5]]).unwrap();
        assert!(var.iter().all(|v| *v > 0.));
        assert!(kriging.theta().iter().all(|t| *t > 0.));
        assert!(kriging.likelihood().is_finite());
    }

    #[test]
    fn test_kriging_gradients() {
        let xt: ndarray::Array2<f64> = array![[0., 0.], [1., 0.3], [0.2, 0.9], [0.7, 0.6], [0.4, 0.1], [0.9, 1.]];
        let yt = xt.map_axis(Axis(1), |r| r[0] * r[0] + (3. * r[1]).sin());
        let kriging = KrigingParams::new()
            .theta_tuning(ThetaTuning::Fixed(array![2., 1.]))
            .fit(&xt, &yt)
            .unwrap();

        let x = array![[0.35, 0.55], [0.8, 0.2]];
        let (dmean, dvar) = kriging.predict_valvar_gradients(&x).unwrap();
        for (i, xi) in x.rows().into_iter().enumerate() {
            let f_mean = |v: &Vec<f64>| -> f64 {
                kriging
                    .predict(&Array::from_shape_vec((1, 2), v.clone()).unwrap())
                    .unwrap()[0]
            };
            let f_var = |v: &Vec<f64>| -> f64 {
                kriging
                    .predict_var(&Array::from_shape_vec((1, 2), v.clone()).unwrap())
                    .unwrap()[0]
            };
            let fd_mean = Array1::from(xi.to_vec().central_diff(&f_mean));
            let fd_var = Array1::from(xi.to_vec().central_diff(&f_var));
            assert_abs_diff_eq!(dmean.row(i), fd_mean, epsilon = 1e-5);
            assert_abs_diff_eq!(dvar.row(i), fd_var, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_with_theta_refits_same_data() {
        let kriging = trained();
        let other = kriging.with_theta(&array![5.]).unwrap();
        assert_abs_diff_eq!(other.theta()[0], 5.);
        assert_eq!(other.n_training(), kriging.n_training());
        assert!(other.likelihood().is_finite());
        assert!(kriging.with_theta(&array![-1.]).is_err());
        assert!(kriging.with_theta(&array![1., 1.]).is_err());
    }

    #[test]
    fn test_bad_training_data() {
        let params = KrigingParams::new();
        assert!(params.fit(&array![[0.], [1.]], &array![1.]).is_err());
        assert!(params
            .fit(&Array2::<f64>::zeros((0, 1)), &Array1::<f64>::zeros(0))
            .is_err());
        assert!(params.fit(&array![[0.], [1.]], &array![1., f64::NAN]).is_err());
    }

    #[test]
    fn test_single_point_and_constant_outputs() {
        let kriging = KrigingParams::new()
            .fit(&array![[0.5, 0.5]], &array![3.])
            .unwrap();
        let mean = kriging.predict(&array![[0.5, 0.5], [0., 1.]]).unwrap();
        assert_abs_diff_eq!(mean[0], 3., epsilon = 1e-8);

        let kriging = KrigingParams::new()
            .fit(&array![[0.], [0.5], [1.]], &array![2., 2., 2.])
            .unwrap();
        let mean = kriging.predict(&array![[0.25]]).unwrap();
        assert_abs_diff_eq!(mean[0], 2., epsilon = 1e-8);
    }

    #[test]
    fn test_duplicated_training_points() {
        let xt = array![[0.], [0.3], [0.3], [0.7], [1.]];
        let yt = xt.column(0).mapv(|x: f64| (6. * x).sin());
        let kriging = KrigingParams::new().fit(&xt, &yt).unwrap();
        let mean = kriging.predict(&array![[0.3], [0.5]]).unwrap();
        assert_abs_diff_eq!(mean[0], (1.8f64).sin(), epsilon = 1e-2);
        assert!(mean[1].is_finite());
    }
}
