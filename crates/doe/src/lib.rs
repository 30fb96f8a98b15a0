/*!
Sampling methods used to build the initial design of a sequential
Bayesian optimization run.

A design is a set of points within a sample space `xlimits`, a `(nx, 2)`
ndarray holding the lower and upper bounds of each of the `nx` components.

```
use seqbo_doe::{FullFactorial, Lhs, LhsKind, Random, SamplingMethod};
use ndarray::arr2;

let xlimits = arr2(&[[5., 10.], [0., 1.]]);
let samples = Lhs::new(&xlimits).kind(LhsKind::Centered).sample(5);
let samples = FullFactorial::new(&xlimits).sample(4);
let samples = Random::new(&xlimits).seed(42).sample(5);
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod full_factorial;
mod lhs;
mod random;
mod traits;
mod utils;

pub use full_factorial::*;
pub use lhs::*;
pub use random::*;
pub use traits::*;
