use ndarray::{array, Array2, ArrayView2, Axis};
use seqbo::optimizers::{MonteCarloOptimizer, SlsqpOptimizer, StagedOptimizer};
use seqbo::{
    Acquisition, Aggregation, BayesianOptimizerBuilder, Domain, ExpectedImprovement, Objectives,
    ProbabilityOfFeasibility, SampledDesign,
};
use seqbo_doe::Lhs;
use seqbo_gp::KrigingParams;

// Function G24: 1 global optimum y_opt = -5.5080 at x_opt =(2.3295, 3.1785)
fn g24(x: &ArrayView2<f64>) -> Array2<f64> {
    x.map_axis(Axis(1), |xi| -xi[0] - xi[1]).insert_axis(Axis(1))
}

// Constraints < 0
fn g24_c1(x: &ArrayView2<f64>) -> Array2<f64> {
    x.map_axis(Axis(1), |xi| {
        -2.0 * xi[0].powf(4.0) + 8.0 * xi[0].powf(3.0) - 8.0 * xi[0].powf(2.0) + xi[1] - 2.0
    })
    .insert_axis(Axis(1))
}

fn g24_c2(x: &ArrayView2<f64>) -> Array2<f64> {
    x.map_axis(Axis(1), |xi| {
        -4.0 * xi[0].powf(4.0) + 32.0 * xi[0].powf(3.0) - 88.0 * xi[0].powf(2.0) + 96.0 * xi[0]
            + xi[1]
            - 36.0
    })
    .insert_axis(Axis(1))
}

fn main() {
    let domain = Domain::new(&array![[0., 3.], [0., 4.]]).expect("Domain");
    let (x0, y0) = (Array2::zeros((0, 2)), Array2::zeros((0, 1)));
    let operands: Vec<Box<dyn Acquisition>> = vec![
        Box::new(ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).expect("EI")),
        Box::new(ProbabilityOfFeasibility::new(KrigingParams::new(), &x0, &y0).expect("PoF")),
        Box::new(ProbabilityOfFeasibility::new(KrigingParams::new(), &x0, &y0).expect("PoF")),
    ];
    let acquisition = Aggregation::product(operands).expect("EI x PoF x PoF");
    let optimizer = StagedOptimizer::new(vec![
        Box::new(MonteCarloOptimizer::new(&domain, 500)),
        Box::new(SlsqpOptimizer::new(&domain)),
    ])
    .expect("Staged optimizer");

    let mut bo = BayesianOptimizerBuilder::new(&domain, acquisition)
        .configure(|config| config.outdir("./history"))
        .optimizer(optimizer)
        .initial(&SampledDesign::new(Lhs::new(domain.xlimits()), 8))
        .build()
        .expect("Bayesian optimizer configured");
    let res = bo
        .optimize(&Objectives::new(g24).and(g24_c1).and(g24_c2), 30)
        .expect("Minimization of G24");
    println!("G24 optim result = {}", res);
}
