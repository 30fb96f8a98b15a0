use ndarray::{array, Array2, ArrayView2};
use seqbo::optimizers::{MonteCarloOptimizer, SlsqpOptimizer, StagedOptimizer};
use seqbo::{BayesianOptimizerBuilder, Domain, ExpectedImprovement, Objectives, SampledDesign};
use seqbo_doe::Lhs;
use seqbo_gp::KrigingParams;

fn xsinx(x: &ArrayView2<f64>) -> Array2<f64> {
    (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())
}

fn main() {
    let domain = Domain::new(&array![[0., 25.]]).expect("Domain");
    let ei = ExpectedImprovement::new(
        KrigingParams::new(),
        &Array2::zeros((0, 1)),
        &Array2::zeros((0, 1)),
    )
    .expect("Expected improvement");
    let optimizer = StagedOptimizer::new(vec![
        Box::new(MonteCarloOptimizer::new(&domain, 100)),
        Box::new(SlsqpOptimizer::new(&domain)),
    ])
    .expect("Staged optimizer");

    let mut bo = BayesianOptimizerBuilder::new(&domain, ei)
        .configure(|config| config.n_iter(20))
        .optimizer(optimizer)
        .initial(&SampledDesign::new(Lhs::new(domain.xlimits()), 5))
        .build()
        .expect("Bayesian optimizer configured");
    let res = bo
        .optimize_with_default_iters(&Objectives::new(xsinx))
        .expect("Minimization of xsinx");
    if let (Some(x_opt), Some(y_opt)) = (res.x_opt, res.y_opt) {
        println!("Minimum xsinx(x) = {} at x = {}", y_opt, x_opt);
    }
}
