//! Posterior draws of the Kriging length scales.
//!
//! A random-walk Metropolis chain runs over `log10(theta)` with a flat prior
//! within the tuning bounds, the concentrated likelihood being the target.
//! Proposals falling outside the bounds are rejected.

use crate::algorithm::Kriging;
use crate::errors::{GpError, Result};

use log::debug;
use ndarray::Array1;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::{Distribution, Normal};

impl Kriging {
    /// Draw `n_draws` models sharing this model training data, each with
    /// length scales sampled from their posterior distribution.
    ///
    /// The chain starts at the current length scales and uses the sampler
    /// settings of the parameters this model was fitted with.
    pub fn sample_hyperparameters<R: Rng>(
        &self,
        n_draws: usize,
        rng: &mut R,
    ) -> Result<Vec<Kriging>> {
        let sampler = self.kriging_params().sampler_ref().clone();
        let tuning_bounds = self.kriging_params().theta_tuning_ref().bounds();
        let bounds: Vec<(f64, f64)> = match tuning_bounds.len() {
            1 => vec![tuning_bounds[0]; self.dim()],
            _ => tuning_bounds.to_vec(),
        }
        .into_iter()
        .map(|(lo, up)| (lo.log10(), up.log10()))
        .collect();

        let proposal = Normal::new(0., sampler.step_size)
            .map_err(|e| GpError::InvalidValueError(e.to_string()))?;

        let mut current = self.clone();
        let mut current_log_theta = current.theta().mapv(f64::log10);
        let mut draws = Vec::with_capacity(n_draws);
        let mut n_accepted = 0;
        let n_iter = sampler.burn_in + n_draws * sampler.thinning;
        for it in 1..=n_iter {
            let candidate: Array1<f64> = current_log_theta.mapv(|v| v + proposal.sample(&mut *rng));
            let within = candidate
                .iter()
                .zip(&bounds)
                .all(|(v, (lo, up))| *lo <= *v && *v <= *up);
            if within {
                // Singular correlation matrices are rejected proposals
                if let Ok(model) = current.with_theta(&candidate.mapv(|v| 10f64.powf(v))) {
                    let log_ratio = model.likelihood() - current.likelihood();
                    if log_ratio >= 0. || rng.gen::<f64>() < log_ratio.exp() {
                        current = model;
                        current_log_theta = candidate;
                        n_accepted += 1;
                    }
                }
            }
            if it > sampler.burn_in && (it - sampler.burn_in) % sampler.thinning == 0 {
                draws.push(current.clone());
            }
        }
        debug!(
            "Hyperparameters sampling: {} draws, acceptance rate {:.2}",
            draws.len(),
            n_accepted as f64 / n_iter.max(1) as f64
        );
        Ok(draws)
    }
}

#[cfg(test)]
mod tests {
    use crate::{KrigingParams, SamplerParams};
    use ndarray::{array, Axis};
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn test_sample_hyperparameters() {
        let xt: ndarray::Array2<f64> = array![[0., 0.], [1., 0.3], [0.2, 0.9], [0.7, 0.6], [0.4, 0.1], [0.9, 1.]];
        let yt = xt.map_axis(Axis(1), |r| r[0] * r[0] + (3. * r[1]).sin());
        let kriging = KrigingParams::new().fit(&xt, &yt).unwrap();

        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let draws = kriging.sample_hyperparameters(7, &mut rng).unwrap();
        assert_eq!(draws.len(), 7);
        for draw in draws.iter() {
            assert_eq!(draw.theta().len(), 2);
            assert!(draw.theta().iter().all(|t| *t > 0.));
            assert!(draw.predict(&array![[0.5, 0.5]]).unwrap()[0].is_finite());
        }
    }

    #[test]
    fn test_sample_hyperparameters_is_reproducible() {
        let xt = array![[0.], [0.3], [0.5], [0.8], [1.]];
        let yt = xt.column(0).mapv(|x: f64| (6. * x).cos());
        let kriging = KrigingParams::new()
            .sampler(SamplerParams {
                burn_in: 10,
                thinning: 2,
                step_size: 0.2,
            })
            .fit(&xt, &yt)
            .unwrap();

        let draws1 = kriging
            .sample_hyperparameters(3, &mut Xoshiro256Plus::seed_from_u64(0))
            .unwrap();
        let draws2 = kriging
            .sample_hyperparameters(3, &mut Xoshiro256Plus::seed_from_u64(0))
            .unwrap();
        let thetas1: Vec<f64> = draws1.iter().map(|k| k.theta()[0]).collect();
        let thetas2: Vec<f64> = draws2.iter().map(|k| k.theta()[0]).collect();
        assert_eq!(thetas1, thetas2);
        assert!(kriging
            .sample_hyperparameters(0, &mut Xoshiro256Plus::seed_from_u64(0))
            .unwrap()
            .is_empty());
    }
}
