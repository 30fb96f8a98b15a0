use crate::errors::{BoError, Result};

use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Data, Ix1, Ix2, Zip};
use serde::{Deserialize, Serialize};

/// Box-shaped input space of the optimization
/// given as a (nx, 2) matrix of `[lower, upper]` bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    xlimits: Array2<f64>,
}

impl Domain {
    /// Constructor given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use seqbo::Domain;
    /// use ndarray::array;
    ///
    /// let domain = Domain::new(&array![[-5., 10.], [0., 15.]]).unwrap();
    /// assert_eq!(domain.dim(), 2);
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Self> {
        if xlimits.ncols() != 2 || xlimits.nrows() == 0 {
            return Err(BoError::InvalidConfigError(format!(
                "domain bounds should be a (nx, 2) matrix with nx > 0, got {:?}",
                xlimits.dim()
            )));
        }
        for (i, row) in xlimits.rows().into_iter().enumerate() {
            if !row[0].is_finite() || !row[1].is_finite() || row[0] > row[1] {
                return Err(BoError::InvalidConfigError(format!(
                    "domain bounds of component {i} should be finite with lower <= upper, got {row}"
                )));
            }
        }
        Ok(Domain {
            xlimits: xlimits.to_owned(),
        })
    }

    /// Input space dimension
    pub fn dim(&self) -> usize {
        self.xlimits.nrows()
    }

    /// Bounds as a (nx, 2) matrix
    pub fn xlimits(&self) -> &Array2<f64> {
        &self.xlimits
    }

    /// Lower bounds
    pub fn lower(&self) -> ArrayView1<f64> {
        self.xlimits.column(0)
    }

    /// Upper bounds
    pub fn upper(&self) -> ArrayView1<f64> {
        self.xlimits.column(1)
    }

    /// Bounds as expected by cobyla/slsqp optimizers
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.xlimits
            .rows()
            .into_iter()
            .map(|row| (row[0], row[1]))
            .collect()
    }

    /// Center of the box
    pub fn midpoint(&self) -> Array1<f64> {
        (&self.lower() + &self.upper()) / 2.
    }

    /// Projection of `x` onto the box
    pub fn clip(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Array1<f64> {
        let mut clipped = x.to_owned();
        Zip::from(&mut clipped)
            .and(self.xlimits.rows())
            .for_each(|v, row| *v = v.max(row[0]).min(row[1]));
        clipped
    }

    /// Whether `x` lies within the box
    pub fn contains(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> bool {
        x.len() == self.dim()
            && x.iter()
                .zip(self.xlimits.rows())
                .all(|(v, row)| row[0] <= *v && *v <= row[1])
    }
}
