use crate::domain::Domain;
use crate::errors::{BoError, Result};
use crate::optimizers::{InfillOptimizer, Optimizer};
use crate::types::{InfillFn, InfillResult};

use log::debug;
use ndarray::{Array2, Axis};

/// Chains optimizers: each stage starts from the point found by the previous one.
///
/// Typically a global search on candidates refined by a local gradient-based
/// optimizer. The best result over all stages is returned, with the number of
/// function calls summed over the stages.
pub struct StagedOptimizer {
    stages: Vec<Box<dyn InfillOptimizer>>,
}

impl StagedOptimizer {
    /// Chain of the given optimizers, which are all rebound to the domain of the first one
    pub fn new(stages: Vec<Box<dyn InfillOptimizer>>) -> Result<Self> {
        let domain = stages
            .first()
            .map(|s| s.domain().clone())
            .ok_or_else(|| {
                BoError::InvalidConfigError("staged optimizer requires at least one stage".to_string())
            })?;
        let mut staged = StagedOptimizer { stages };
        staged.set_domain(domain);
        Ok(staged)
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false, a staged optimizer has one stage at least
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Optimizer for StagedOptimizer {
    fn domain(&self) -> &Domain {
        self.stages[0].domain()
    }

    fn set_domain(&mut self, domain: Domain) {
        for stage in self.stages.iter_mut() {
            stage.set_domain(domain.clone());
        }
    }

    fn initial(&self) -> Array2<f64> {
        self.stages[0].initial()
    }

    fn set_initial(&mut self, initial: Array2<f64>) {
        self.stages[0].set_initial(initial);
    }
}

impl InfillOptimizer for StagedOptimizer {
    fn minimize(&mut self, fun: &InfillFn) -> Result<InfillResult> {
        let mut best: Option<InfillResult> = None;
        let mut nfev = 0;
        for (i, stage) in self.stages.iter_mut().enumerate() {
            if let Some(previous) = &best {
                stage.set_initial(previous.x.view().insert_axis(Axis(0)).to_owned());
            }
            let res = stage.minimize(fun)?;
            debug!("Stage {} -> f={} at {}", i, res.fun, res.x);
            nfev += res.nfev;
            if best.as_ref().map_or(true, |b| res.fun <= b.fun) {
                best = Some(res);
            }
        }
        let mut result =
            best.ok_or_else(|| BoError::InfillError("staged optimizer has no stage".to_string()))?;
        result.nfev = nfev;
        Ok(result)
    }
}
