use crate::domain::Domain;
use crate::errors::{BoError, Result};
use crate::optimizers::{InfillOptimizer, Optimizer};
use crate::types::{InfillFn, InfillResult};

use log::debug;
use ndarray::{concatenate, Array2, Axis};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use seqbo_doe::{Lhs, SamplingMethod};

/// Evaluates the whole batch once and returns its best row.
/// NaN values are skipped, the first row is returned when every value is NaN.
fn best_of(points: &Array2<f64>, fun: &InfillFn, name: &str) -> Result<InfillResult> {
    if points.nrows() == 0 {
        return Err(BoError::InfillError(format!(
            "{name} optimizer has no candidate to evaluate"
        )));
    }
    let (values, _) = fun(&points.view())?;
    if values.len() != points.nrows() {
        return Err(BoError::InfillError(format!(
            "{} values expected, got {}",
            points.nrows(),
            values.len()
        )));
    }
    let (best, fun_best) = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold((0, f64::NAN), |(ib, vb), (i, v)| {
            if vb.is_nan() || *v < vb {
                (i, *v)
            } else {
                (ib, vb)
            }
        });
    debug!("{} best candidate #{} -> f={}", name, best, fun_best);
    Ok(InfillResult {
        x: points.row(best).to_owned(),
        fun: if fun_best.is_nan() {
            f64::INFINITY
        } else {
            fun_best
        },
        success: true,
        message: "OK".to_string(),
        nfev: points.nrows(),
    })
}

/// Picks the best point among a fixed set of candidates
pub struct CandidateOptimizer {
    domain: Domain,
    candidates: Array2<f64>,
}

impl CandidateOptimizer {
    /// Optimizer over the domain choosing among the (n, nx) `candidates`
    pub fn new(domain: &Domain, candidates: Array2<f64>) -> Result<Self> {
        if candidates.ncols() != domain.dim() {
            return Err(BoError::ShapeError(format!(
                "candidates should have {} columns, got {}",
                domain.dim(),
                candidates.ncols()
            )));
        }
        Ok(CandidateOptimizer {
            domain: domain.clone(),
            candidates,
        })
    }
}

impl Optimizer for CandidateOptimizer {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn set_domain(&mut self, domain: Domain) {
        if domain.dim() != self.candidates.ncols() {
            self.candidates = Array2::zeros((0, domain.dim()));
        }
        self.domain = domain;
    }

    /// The candidate set
    fn initial(&self) -> Array2<f64> {
        self.candidates.to_owned()
    }

    /// Replaces the candidate set
    fn set_initial(&mut self, initial: Array2<f64>) {
        self.candidates = initial;
    }
}

impl InfillOptimizer for CandidateOptimizer {
    fn minimize(&mut self, fun: &InfillFn) -> Result<InfillResult> {
        best_of(&self.candidates, fun, "Candidate")
    }
}

/// Picks the best point among a fresh latin hypercube design drawn
/// at each call (completed with the initial points if any)
pub struct MonteCarloOptimizer {
    domain: Domain,
    initial: Array2<f64>,
    n_samples: usize,
    rng: Xoshiro256Plus,
}

impl MonteCarloOptimizer {
    /// Optimizer drawing `n_samples` points over the domain at each call
    pub fn new(domain: &Domain, n_samples: usize) -> Self {
        MonteCarloOptimizer {
            domain: domain.clone(),
            initial: Array2::zeros((0, domain.dim())),
            n_samples,
            rng: Xoshiro256Plus::from_entropy(),
        }
    }

    /// Sets the seed of the random generator
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Xoshiro256Plus::seed_from_u64(seed);
        self
    }
}

impl Optimizer for MonteCarloOptimizer {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn set_domain(&mut self, domain: Domain) {
        if domain.dim() != self.initial.ncols() {
            self.initial = Array2::zeros((0, domain.dim()));
        }
        self.domain = domain;
    }

    fn initial(&self) -> Array2<f64> {
        self.initial.to_owned()
    }

    fn set_initial(&mut self, initial: Array2<f64>) {
        self.initial = initial;
    }
}

impl InfillOptimizer for MonteCarloOptimizer {
    fn minimize(&mut self, fun: &InfillFn) -> Result<InfillResult> {
        let samples = if self.n_samples > 0 {
            Lhs::new(self.domain.xlimits())
                .with_rng(Xoshiro256Plus::seed_from_u64(self.rng.gen()))
                .sample(self.n_samples)
        } else {
            Array2::zeros((0, self.domain.dim()))
        };
        let points = concatenate(Axis(0), &[samples.view(), self.initial.view()])
            .map_err(|e| BoError::ShapeError(e.to_string()))?;
        best_of(&points, fun, "MonteCarlo")
    }
}
