use crate::acquisition::Acquisition;
use crate::errors::{BoError, Result};

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView2};
use rand_xoshiro::Xoshiro256Plus;

/// Acquisition averaged over posterior draws of the surrogate hyperparameters.
///
/// Replicas of the base acquisition, each with sampled hyperparameters, are
/// redrawn every time the data change. Utilities and gradients are the mean
/// over replicas. Data, feasibility and indices are the base ones.
pub struct MarginalizedAcquisition {
    base: Box<dyn Acquisition>,
    n_draws: usize,
    replicas: Vec<Box<dyn Acquisition>>,
    rng: Xoshiro256Plus,
}

impl MarginalizedAcquisition {
    /// Marginalize `base` over `n_draws` hyperparameters draws
    pub fn new(base: Box<dyn Acquisition>, n_draws: usize, rng: Xoshiro256Plus) -> Result<Self> {
        if n_draws == 0 {
            return Err(BoError::InvalidConfigError(
                "number of hyperparameters draws should be strictly positive".to_string(),
            ));
        }
        if !base.supports_hyper_sampling() {
            return Err(BoError::InvalidConfigError(format!(
                "{} acquisition does not support hyperparameters sampling",
                base.name()
            )));
        }
        let mut acquisition = MarginalizedAcquisition {
            base,
            n_draws,
            replicas: vec![],
            rng,
        };
        acquisition.draw_replicas()?;
        Ok(acquisition)
    }

    /// Number of hyperparameters draws
    pub fn n_draws(&self) -> usize {
        self.n_draws
    }

    /// Current replicas
    pub fn replicas(&self) -> &[Box<dyn Acquisition>] {
        &self.replicas
    }

    fn draw_replicas(&mut self) -> Result<()> {
        self.replicas = self
            .base
            .sample_hyperparameters(self.n_draws, &mut self.rng)?;
        debug!("{} replicas drawn for {}", self.replicas.len(), self.base.name());
        Ok(())
    }
}

impl Acquisition for MarginalizedAcquisition {
    fn name(&self) -> String {
        format!("Marginalized{}", self.base.name())
    }

    fn data(&self) -> (Array2<f64>, Array2<f64>) {
        self.base.data()
    }

    fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        let (previous_x, previous_y) = self.base.data();
        self.base.set_data(x, y)?;
        if let Err(err) = self.draw_replicas() {
            // replicas are only replaced on success, they still match the previous data
            if let Err(restore_err) = self.base.set_data(&previous_x, &previous_y) {
                warn!("{} could not be restored: {}", self.base.name(), restore_err);
            }
            return Err(err);
        }
        Ok(())
    }

    fn evaluate_with_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
        if self.replicas.is_empty() {
            return self.base.evaluate_with_gradients(x);
        }
        let mut values = Array1::zeros(x.nrows());
        let mut grads = Array2::zeros(x.dim());
        for replica in self.replicas.iter() {
            let (v, g) = replica.evaluate_with_gradients(x)?;
            values += &v;
            grads += &g;
        }
        let n = self.replicas.len() as f64;
        Ok((values / n, grads / n))
    }

    fn feasible_data_index(&self) -> Array1<bool> {
        self.base.feasible_data_index()
    }

    fn objective_indices(&self) -> Vec<usize> {
        self.base.objective_indices()
    }

    fn constraint_indices(&self) -> Vec<usize> {
        self.base.constraint_indices()
    }

    fn input_dim(&self) -> usize {
        self.base.input_dim()
    }

    fn output_dim(&self) -> usize {
        self.base.output_dim()
    }

    fn setup(&mut self, feasible: &Array1<bool>) -> Result<()> {
        self.base.setup(feasible)?;
        for replica in self.replicas.iter_mut() {
            replica.setup(feasible)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use ndarray_rand::rand::SeedableRng;

    /// Utility `scale * sum(x)` with a hyperparameter `scale` drawn as 1, 2, 3...
    /// Drawing fails beyond `max_rows` training points.
    struct Linear {
        x: Array2<f64>,
        y: Array2<f64>,
        scale: f64,
        sampling: bool,
        max_rows: usize,
    }

    impl Linear {
        fn new(sampling: bool) -> Self {
            Linear {
                x: array![[0., 1.]],
                y: array![[1.]],
                scale: 1.,
                sampling,
                max_rows: usize::MAX,
            }
        }
    }

    impl Acquisition for Linear {
        fn name(&self) -> String {
            "Linear".to_string()
        }
        fn data(&self) -> (Array2<f64>, Array2<f64>) {
            (self.x.clone(), self.y.clone())
        }
        fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
            self.x = x.clone();
            self.y = y.clone();
            Ok(())
        }
        fn evaluate_with_gradients(
            &self,
            x: &ArrayView2<f64>,
        ) -> Result<(Array1<f64>, Array2<f64>)> {
            Ok((
                x.sum_axis(Axis(1)) * self.scale,
                Array2::from_elem(x.dim(), self.scale),
            ))
        }
        fn objective_indices(&self) -> Vec<usize> {
            vec![0]
        }
        fn constraint_indices(&self) -> Vec<usize> {
            vec![]
        }
        fn supports_hyper_sampling(&self) -> bool {
            self.sampling
        }
        fn sample_hyperparameters(
            &self,
            n_draws: usize,
            _rng: &mut Xoshiro256Plus,
        ) -> Result<Vec<Box<dyn Acquisition>>> {
            if self.x.nrows() > self.max_rows {
                return Err(BoError::InfillError("sampler diverged".to_string()));
            }
            Ok((1..=n_draws)
                .map(|i| {
                    Box::new(Linear {
                        x: self.x.clone(),
                        y: self.y.clone(),
                        scale: i as f64,
                        sampling: true,
                        max_rows: self.max_rows,
                    }) as Box<dyn Acquisition>
                })
                .collect())
        }
    }

    #[test]
    fn test_marginalized_averages_replicas() {
        let rng = Xoshiro256Plus::seed_from_u64(42);
        let acq = MarginalizedAcquisition::new(Box::new(Linear::new(true)), 3, rng).unwrap();
        assert_eq!(acq.replicas().len(), 3);
        let (values, grads) = acq
            .evaluate_with_gradients(&array![[1., 2.], [0., -1.]].view())
            .unwrap();
        // mean scale is 2
        assert_abs_diff_eq!(values, array![6., -2.]);
        assert_abs_diff_eq!(grads, Array2::from_elem((2, 2), 2.));
        assert_eq!(acq.name(), "MarginalizedLinear");
    }

    #[test]
    fn test_marginalized_redraws_on_new_data() {
        let rng = Xoshiro256Plus::seed_from_u64(42);
        let mut acq = MarginalizedAcquisition::new(Box::new(Linear::new(true)), 2, rng).unwrap();
        let x = array![[0., 1.], [2., 3.]];
        let y = array![[1.], [5.]];
        acq.set_data(&x, &y).unwrap();
        assert_eq!(acq.data(), (x.clone(), y));
        assert!(acq.replicas().iter().all(|r| r.data().0 == x));
    }

    #[test]
    fn test_marginalized_failed_draw_keeps_data() {
        let rng = Xoshiro256Plus::seed_from_u64(42);
        let mut base = Linear::new(true);
        base.max_rows = 1;
        let mut acq = MarginalizedAcquisition::new(Box::new(base), 2, rng).unwrap();
        let (x, y) = acq.data();
        assert!(matches!(
            acq.set_data(&array![[0., 1.], [2., 3.]], &array![[1.], [5.]]),
            Err(BoError::InfillError(_))
        ));
        assert_eq!(acq.data(), (x.clone(), y));
        assert_eq!(acq.feasible_data_index().len(), 1);
        assert_eq!(acq.replicas().len(), 2);
        assert!(acq.replicas().iter().all(|r| r.data().0 == x));
    }

    #[test]
    fn test_marginalized_requires_sampling() {
        let rng = Xoshiro256Plus::seed_from_u64(42);
        assert!(MarginalizedAcquisition::new(Box::new(Linear::new(false)), 2, rng.clone()).is_err());
        assert!(MarginalizedAcquisition::new(Box::new(Linear::new(true)), 0, rng).is_err());
    }
}
