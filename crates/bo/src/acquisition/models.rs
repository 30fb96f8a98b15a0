use crate::errors::{BoError, Result};
use crate::surrogate::{Surrogate, SurrogateParams};

use ndarray::{Array1, Array2, ArrayView2, Zip};
use rand_xoshiro::Xoshiro256Plus;
use std::rc::Rc;

/// Training data of a single output surrogate and the surrogate trained on it
#[derive(Clone)]
pub(crate) struct SurrogateState {
    params: Rc<dyn SurrogateParams>,
    x: Array2<f64>,
    y: Array2<f64>,
    model: Option<Rc<dyn Surrogate>>,
}

/// Predictive moments and their gradients at n points
pub(crate) struct Moments {
    pub mean: Array1<f64>,
    pub sigma: Array1<f64>,
    pub dmean: Array2<f64>,
    pub dsigma: Array2<f64>,
}

/// Variance under which the prediction is considered deterministic
pub(crate) const VARIANCE_EPS: f64 = f64::EPSILON;

impl SurrogateState {
    pub fn new(params: Rc<dyn SurrogateParams>, x: &Array2<f64>, y: &Array2<f64>) -> Result<Self> {
        let mut state = SurrogateState {
            params,
            x: Array2::zeros((0, x.ncols())),
            y: Array2::zeros((0, 1)),
            model: None,
        };
        state.set_data(x, y)?;
        Ok(state)
    }

    pub fn data(&self) -> (Array2<f64>, Array2<f64>) {
        (self.x.to_owned(), self.y.to_owned())
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    pub fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        if y.ncols() != 1 || x.nrows() != y.nrows() || x.ncols() != self.x.ncols() {
            return Err(BoError::ShapeError(format!(
                "surrogate data should be (n, {}) inputs and (n, 1) outputs, got {:?} and {:?}",
                self.x.ncols(),
                x.dim(),
                y.dim()
            )));
        }
        let model = if x.nrows() > 0 {
            Some(Rc::from(self.params.train(&x.view(), &y.column(0))?))
        } else {
            None
        };
        self.x = x.to_owned();
        self.y = y.to_owned();
        self.model = model;
        Ok(())
    }

    pub fn model(&self) -> Result<&dyn Surrogate> {
        self.model.as_deref().ok_or_else(|| {
            BoError::InfillError("surrogate is not trained, no data available".to_string())
        })
    }

    /// Predicted means at training points
    pub fn training_means(&self) -> Result<Array1<f64>> {
        Ok(self.model()?.predict_valvar(&self.x.view())?.0)
    }

    pub fn moments(&self, x: &ArrayView2<f64>) -> Result<Moments> {
        if x.ncols() != self.x.ncols() {
            return Err(BoError::ShapeError(format!(
                "points should have {} columns, got {}",
                self.x.ncols(),
                x.ncols()
            )));
        }
        let model = self.model()?;
        let (mean, var) = model.predict_valvar(x)?;
        let (dmean, dvar) = model.predict_valvar_gradients(x)?;
        let sigma = var.mapv(|v| v.max(0.).sqrt());
        let mut dsigma = Array2::zeros(dvar.dim());
        Zip::from(dsigma.rows_mut())
            .and(dvar.rows())
            .and(&var)
            .and(&sigma)
            .for_each(|mut ds, dv, v, s| {
                if *v >= VARIANCE_EPS {
                    ds.assign(&dv.mapv(|d| d / (2. * s)));
                }
            });
        Ok(Moments {
            mean,
            sigma,
            dmean,
            dsigma,
        })
    }

    /// States sharing this data with surrogates of sampled hyperparameters,
    /// none when no surrogate is trained yet
    pub fn replicas(&self, n_draws: usize, rng: &mut Xoshiro256Plus) -> Result<Vec<SurrogateState>> {
        match &self.model {
            None => Ok(vec![]),
            Some(model) => Ok(model
                .sample_hyperparameters(n_draws, rng)?
                .into_iter()
                .map(|m| SurrogateState {
                    params: self.params.clone(),
                    x: self.x.clone(),
                    y: self.y.clone(),
                    model: Some(Rc::from(m)),
                })
                .collect()),
        }
    }
}

/// Rows where the mask is set, every row when none is set
pub(crate) fn feasible_or_all(feasible: &Array1<bool>) -> Vec<usize> {
    let rows: Vec<usize> = feasible
        .iter()
        .enumerate()
        .filter_map(|(i, ok)| ok.then_some(i))
        .collect();
    if rows.is_empty() {
        (0..feasible.len()).collect()
    } else {
        rows
    }
}
