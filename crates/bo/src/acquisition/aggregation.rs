use crate::acquisition::Acquisition;
use crate::errors::{BoError, Result};

use log::warn;
use ndarray::{concatenate, s, Array1, Array2, ArrayView2, Axis, Zip};
use rand_xoshiro::Xoshiro256Plus;

/// Operator combining acquisition utilities
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregationOperator {
    /// Product of utilities, eg. expected improvement times probability of feasibility
    Product,
    /// Sum of utilities
    Sum,
}

/// Combination of acquisitions, each one modelling its own columns of Y.
///
/// Columns of Y are split among operands in their given order. A training row
/// is feasible when it is feasible for every operand and objective/constraint
/// indices of operands are offset by the columns of the preceding ones.
/// New data are committed to every operand or to none of them.
///
/// ```no_run
/// use seqbo::{Aggregation, ExpectedImprovement, ProbabilityOfFeasibility};
/// use seqbo_gp::KrigingParams;
/// use ndarray::{array, Array2};
///
/// let x = array![[0.], [0.5], [1.]];
/// let ei = ExpectedImprovement::new(KrigingParams::new(), &x, &array![[1.], [0.], [2.]]).unwrap();
/// let pof = ProbabilityOfFeasibility::new(KrigingParams::new(), &x, &array![[-1.], [1.], [0.5]]).unwrap();
/// let acquisition = Aggregation::product(vec![Box::new(ei), Box::new(pof)]).unwrap();
/// ```
pub struct Aggregation {
    operands: Vec<Box<dyn Acquisition>>,
    operator: AggregationOperator,
    x: Array2<f64>,
    y: Array2<f64>,
}

impl Aggregation {
    /// Constructor, operands should share the same inputs
    pub fn new(operands: Vec<Box<dyn Acquisition>>, operator: AggregationOperator) -> Result<Self> {
        if operands.is_empty() {
            return Err(BoError::InvalidConfigError(
                "aggregation requires at least one acquisition".to_string(),
            ));
        }
        let (x0, _) = operands[0].data();
        let mut ys = Vec::with_capacity(operands.len());
        for operand in operands.iter() {
            let (x, y) = operand.data();
            if x != x0 {
                return Err(BoError::InvalidConfigError(format!(
                    "aggregated acquisitions should share the same inputs, {} differs from {}",
                    operand.name(),
                    operands[0].name()
                )));
            }
            ys.push(y);
        }
        let views: Vec<ArrayView2<f64>> = ys.iter().map(|y| y.view()).collect();
        let y0 = concatenate(Axis(1), &views).map_err(|e| BoError::ShapeError(e.to_string()))?;
        let mut aggregation = Aggregation {
            operands,
            operator,
            x: x0,
            y: y0,
        };
        let feasible = aggregation.feasible_data_index();
        aggregation.setup(&feasible)?;
        Ok(aggregation)
    }

    /// Product of the utilities of the given acquisitions
    pub fn product(operands: Vec<Box<dyn Acquisition>>) -> Result<Self> {
        Self::new(operands, AggregationOperator::Product)
    }

    /// Sum of the utilities of the given acquisitions
    pub fn sum(operands: Vec<Box<dyn Acquisition>>) -> Result<Self> {
        Self::new(operands, AggregationOperator::Sum)
    }

    /// Column ranges of Y owned by each operand
    fn column_ranges(&self) -> Vec<(usize, usize)> {
        let mut start = 0;
        self.operands
            .iter()
            .map(|op| {
                let range = (start, start + op.output_dim());
                start = range.1;
                range
            })
            .collect()
    }

    fn offset_indices(&self, indices: impl Fn(&dyn Acquisition) -> Vec<usize>) -> Vec<usize> {
        self.operands
            .iter()
            .zip(self.column_ranges())
            .flat_map(|(op, (start, _))| {
                indices(op.as_ref())
                    .into_iter()
                    .map(move |i| i + start)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Rows of `n` training points feasible for every operand,
    /// none when an operand holds a different number of rows
    fn feasibility(&self, n: usize) -> Array1<bool> {
        let mut feasible = Array1::from_elem(n, true);
        for op in self.operands.iter() {
            let mask = op.feasible_data_index();
            if mask.len() != n {
                warn!("{} holds {} rows instead of {}", op.name(), mask.len(), n);
                feasible.fill(false);
                break;
            }
            Zip::from(&mut feasible)
                .and(&mask)
                .for_each(|a, b| *a = *a && *b);
        }
        feasible
    }

    /// Trains every operand on its columns of `y`, stopping at the first failure
    fn update_operands(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        let ranges = self.column_ranges();
        for (op, (start, end)) in self.operands.iter_mut().zip(ranges) {
            op.set_data(x, &y.slice(s![.., start..end]).to_owned())?;
        }
        let feasible = self.feasibility(x.nrows());
        self.setup(&feasible)
    }

    /// Retrains every operand on the last committed data
    fn restore(&mut self) {
        let (x, y) = (self.x.to_owned(), self.y.to_owned());
        let ranges = self.column_ranges();
        for (op, (start, end)) in self.operands.iter_mut().zip(ranges) {
            if op.data().0 != x {
                if let Err(err) = op.set_data(&x, &y.slice(s![.., start..end]).to_owned()) {
                    warn!("{} could not be restored: {}", op.name(), err);
                }
            }
        }
        let feasible = self.feasibility(x.nrows());
        if let Err(err) = self.setup(&feasible) {
            warn!("{} could not be restored: {}", self.name(), err);
        }
    }
}

impl Acquisition for Aggregation {
    fn name(&self) -> String {
        let sep = match self.operator {
            AggregationOperator::Product => " * ",
            AggregationOperator::Sum => " + ",
        };
        let names: Vec<String> = self.operands.iter().map(|op| op.name()).collect();
        format!("({})", names.join(sep))
    }

    fn data(&self) -> (Array2<f64>, Array2<f64>) {
        (self.x.to_owned(), self.y.to_owned())
    }

    fn set_data(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<()> {
        let ranges = self.column_ranges();
        let width = ranges.last().map(|r| r.1).unwrap_or(0);
        if y.ncols() != width {
            return Err(BoError::ShapeError(format!(
                "aggregation expects {} output columns, got {}",
                width,
                y.ncols()
            )));
        }
        if x.nrows() != y.nrows() {
            return Err(BoError::ShapeError(format!(
                "{} points for {} responses",
                x.nrows(),
                y.nrows()
            )));
        }
        if let Err(err) = self.update_operands(x, y) {
            self.restore();
            return Err(err);
        }
        self.x = x.to_owned();
        self.y = y.to_owned();
        Ok(())
    }

    fn evaluate_with_gradients(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
        let mut iter = self.operands.iter();
        let first = iter
            .next()
            .ok_or_else(|| BoError::InfillError("empty aggregation".to_string()))?;
        let (mut values, mut grads) = first.evaluate_with_gradients(x)?;
        for op in iter {
            let (v, g) = op.evaluate_with_gradients(x)?;
            match self.operator {
                AggregationOperator::Product => {
                    // (uv)' = u'v + uv'
                    Zip::from(grads.rows_mut())
                        .and(g.rows())
                        .and(&values)
                        .and(&v)
                        .for_each(|mut acc, gi, u, vi| {
                            let updated = &acc * *vi + &gi * *u;
                            acc.assign(&updated);
                        });
                    values = values * &v;
                }
                AggregationOperator::Sum => {
                    values = values + &v;
                    grads = grads + &g;
                }
            }
        }
        Ok((values, grads))
    }

    fn feasible_data_index(&self) -> Array1<bool> {
        self.feasibility(self.x.nrows())
    }

    fn objective_indices(&self) -> Vec<usize> {
        self.offset_indices(|op| op.objective_indices())
    }

    fn constraint_indices(&self) -> Vec<usize> {
        self.offset_indices(|op| op.constraint_indices())
    }

    fn input_dim(&self) -> usize {
        self.operands[0].input_dim()
    }

    fn output_dim(&self) -> usize {
        self.operands.iter().map(|op| op.output_dim()).sum()
    }

    fn setup(&mut self, feasible: &Array1<bool>) -> Result<()> {
        for op in self.operands.iter_mut() {
            op.setup(feasible)?;
        }
        Ok(())
    }

    fn supports_hyper_sampling(&self) -> bool {
        self.operands.iter().all(|op| op.supports_hyper_sampling())
    }

    fn sample_hyperparameters(
        &self,
        n_draws: usize,
        rng: &mut Xoshiro256Plus,
    ) -> Result<Vec<Box<dyn Acquisition>>> {
        let mut drawn = Vec::with_capacity(self.operands.len());
        for op in self.operands.iter() {
            drawn.push(op.sample_hyperparameters(n_draws, rng)?);
        }
        let n_replicas = drawn.iter().map(|d| d.len()).min().unwrap_or(0);
        let mut columns: Vec<_> = drawn.into_iter().map(|d| d.into_iter()).collect();
        let mut replicas: Vec<Box<dyn Acquisition>> = Vec::with_capacity(n_replicas);
        for _ in 0..n_replicas {
            let operands = columns.iter_mut().filter_map(|c| c.next()).collect();
            let mut replica = Aggregation {
                operands,
                operator: self.operator,
                x: self.x.to_owned(),
                y: self.y.to_owned(),
            };
            replica.setup(&self.feasible_data_index())?;
            replicas.push(Box::new(replica));
        }
        Ok(replicas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{ExpectedImprovement, ProbabilityOfFeasibility};
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use seqbo_gp::{KrigingParams, ThetaTuning};

    fn params() -> KrigingParams {
        KrigingParams::new().theta_tuning(ThetaTuning::Fixed(array![1.]))
    }

    fn ei_times_pof() -> Aggregation {
        let x = array![[0.], [0.2], [0.45], [0.7], [1.]];
        let y = x.mapv(|v| (v - 0.8) * (v - 0.8));
        let c = x.mapv(|v| v - 0.5);
        let ei = ExpectedImprovement::new(params(), &x, &y).unwrap();
        let pof = ProbabilityOfFeasibility::new(params(), &x, &c).unwrap();
        Aggregation::product(vec![Box::new(ei), Box::new(pof)]).unwrap()
    }

    #[test]
    fn test_aggregation_indices_and_data() {
        let acq = ei_times_pof();
        assert_eq!(acq.name(), "(EI * PoF)");
        assert_eq!(acq.objective_indices(), vec![0]);
        assert_eq!(acq.constraint_indices(), vec![1]);
        assert_eq!(acq.output_dim(), 2);
        assert_eq!(acq.input_dim(), 1);
        let (x, y) = acq.data();
        assert_eq!(x.dim(), (5, 1));
        assert_eq!(y.dim(), (5, 2));
        assert_eq!(
            acq.feasible_data_index(),
            array![true, true, true, false, false]
        );
    }

    #[test]
    fn test_aggregation_set_data_splits_columns() {
        let mut acq = ei_times_pof();
        let (x, y) = acq.data();
        let x_new = concatenate![Axis(0), x, array![[0.3]]];
        let y_new = concatenate![Axis(0), y, array![[0.25, -0.2]]];
        acq.set_data(&x_new, &y_new).unwrap();
        assert_eq!(acq.data().1, y_new);
        assert_eq!(acq.feasible_data_index().len(), 6);
        assert!(acq.set_data(&x_new, &y_new.slice(s![.., ..1]).to_owned()).is_err());
        assert_eq!(acq.data().1, y_new);
    }

    #[test]
    fn test_aggregation_failed_update_keeps_data() {
        let mut acq = ei_times_pof();
        let (x, y) = acq.data();
        let feasible = acq.feasible_data_index();
        let x_new = concatenate![Axis(0), x, array![[0.3]]];

        // objective fitted, constraint fit fails
        let y_new = concatenate![Axis(0), y, array![[0.25, f64::NAN]]];
        assert!(matches!(
            acq.set_data(&x_new, &y_new),
            Err(BoError::GpError(_))
        ));
        assert_eq!(acq.data(), (x.clone(), y.clone()));
        assert_eq!(acq.feasible_data_index(), feasible);
        assert!(acq.operands.iter().all(|op| op.data().0 == x));

        // objective fit fails first
        let y_new = concatenate![Axis(0), y, array![[f64::NAN, -0.2]]];
        assert!(acq.set_data(&x_new, &y_new).is_err());
        assert_eq!(acq.data(), (x.clone(), y.clone()));
        assert_eq!(acq.feasible_data_index(), feasible);

        assert!(acq.evaluate(&array![[0.3]].view()).is_ok());
        let y_new = concatenate![Axis(0), y, array![[0.25, -0.2]]];
        acq.set_data(&x_new, &y_new).unwrap();
        assert_eq!(acq.data(), (x_new, y_new));
        assert_eq!(acq.feasible_data_index().len(), 6);
    }

    #[test]
    fn test_aggregation_product_rule() {
        let acq = ei_times_pof();
        let ei = &acq.operands[0];
        let pof = &acq.operands[1];
        let x = array![[0.3], [0.55]];
        let (values, _) = acq.evaluate_with_gradients(&x.view()).unwrap();
        let expected = ei.evaluate(&x.view()).unwrap() * pof.evaluate(&x.view()).unwrap();
        assert_abs_diff_eq!(values, expected, epsilon = 1e-12);

        let xi = vec![0.3];
        let (_, grad) = acq.evaluate_with_gradients(&array![[0.3]].view()).unwrap();
        let f = |v: &Vec<f64>| -> f64 {
            acq.evaluate(&Array::from_shape_vec((1, 1), v.clone()).unwrap().view())
                .unwrap()[0]
        };
        assert_abs_diff_eq!(grad[[0, 0]], xi.central_diff(&f)[0], epsilon = 1e-5);
    }

    #[test]
    fn test_aggregation_sum() {
        let x = array![[0.], [0.5], [1.]];
        let y = array![[1.], [0.], [2.]];
        let ei1 = ExpectedImprovement::new(params(), &x, &y).unwrap();
        let ei2 = ExpectedImprovement::new(params(), &x, &(&y * 2.)).unwrap();
        let acq = Aggregation::sum(vec![Box::new(ei1.clone()), Box::new(ei2.clone())]).unwrap();
        assert_eq!(acq.objective_indices(), vec![0, 1]);
        let pts = array![[0.25], [0.75]];
        let (values, grads) = acq.evaluate_with_gradients(&pts.view()).unwrap();
        let (v1, g1) = ei1.evaluate_with_gradients(&pts.view()).unwrap();
        let (v2, g2) = ei2.evaluate_with_gradients(&pts.view()).unwrap();
        assert_abs_diff_eq!(values, v1 + v2, epsilon = 1e-12);
        assert_abs_diff_eq!(grads, g1 + g2, epsilon = 1e-12);
    }

    #[test]
    fn test_aggregation_sampling() {
        let acq = ei_times_pof();
        assert!(acq.supports_hyper_sampling());
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let replicas = acq.sample_hyperparameters(3, &mut rng).unwrap();
        assert_eq!(replicas.len(), 3);
        assert_eq!(replicas[0].objective_indices(), vec![0]);
        assert_eq!(replicas[0].constraint_indices(), vec![1]);
    }

    #[test]
    fn test_mismatched_operands() {
        let ei1 = ExpectedImprovement::new(params(), &array![[0.], [1.]], &array![[0.], [1.]]).unwrap();
        let ei2 = ExpectedImprovement::new(params(), &array![[0.], [0.5]], &array![[0.], [1.]]).unwrap();
        assert!(Aggregation::product(vec![Box::new(ei1), Box::new(ei2)]).is_err());
        assert!(Aggregation::product(vec![]).is_err());
    }
}
