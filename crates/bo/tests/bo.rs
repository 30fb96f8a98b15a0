use approx::assert_abs_diff_eq;
use ndarray::{array, s, Array2, ArrayView2, Axis};
use ndarray_npy::read_npy;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serial_test::serial;

use seqbo::optimizers::{
    CandidateOptimizer, CobylaOptimizer, MonteCarloOptimizer, SlsqpOptimizer, StagedOptimizer,
};
use seqbo::{
    Acquisition, Aggregation, BayesianOptimizerBuilder, BoConfig, Domain, ExpectedImprovement,
    InitialDesign, LowerConfidenceBound, Objectives, Optimizer, ProbabilityOfFeasibility,
    ProbabilityOfImprovement, SampledDesign, CONFIG_FILE, DOE_FILE, DOE_INITIAL_FILE,
};
use seqbo_doe::{FullFactorial, Lhs};
use seqbo_gp::KrigingParams;

fn xsinx(x: &ArrayView2<f64>) -> Array2<f64> {
    (x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())
}

fn sphere(x: &ArrayView2<f64>) -> Array2<f64> {
    x.map_axis(Axis(1), |xi| xi.dot(&xi)).insert_axis(Axis(1))
}

// Feasible when x0 + x1 >= 1
fn half_plane(x: &ArrayView2<f64>) -> Array2<f64> {
    x.map_axis(Axis(1), |xi| 1. - xi.sum()).insert_axis(Axis(1))
}

fn empty_data(dim: usize) -> (Array2<f64>, Array2<f64>) {
    (Array2::zeros((0, dim)), Array2::zeros((0, 1)))
}

fn staged(domain: &Domain, n_samples: usize, seed: u64) -> StagedOptimizer {
    StagedOptimizer::new(vec![
        Box::new(MonteCarloOptimizer::new(domain, n_samples).seed(seed)),
        Box::new(SlsqpOptimizer::new(domain)),
    ])
    .unwrap()
}

#[test]
#[serial]
fn test_xsinx_ei() {
    let domain = Domain::new(&array![[0., 25.]]).unwrap();
    let (x0, y0) = empty_data(1);
    let ei = ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).unwrap();
    let doe = SampledDesign::new(
        Lhs::new(domain.xlimits()).with_rng(Xoshiro256Plus::seed_from_u64(42)),
        5,
    );
    let mut bo = BayesianOptimizerBuilder::new(&domain, ei)
        .configure(|config| config.n_iter(20))
        .optimizer(staged(&domain, 100, 42))
        .initial(&doe)
        .build()
        .unwrap();
    let res = bo.optimize_with_default_iters(&Objectives::new(xsinx)).unwrap();

    assert!(res.success);
    assert_eq!(res.nfev, 25);
    assert_eq!(res.x_doe.nrows(), 25);
    let y_opt = res.y_opt.unwrap();
    assert!(y_opt[0] < -14., "xsinx minimum not found: {}", y_opt);
    assert!(domain.contains(&res.x_opt.unwrap()));
    assert_eq!(bo.initial_design(), &InitialDesign::Consumed);
}

#[test]
#[serial]
fn test_sphere_ei_pof() {
    let domain = Domain::new(&array![[-2., 2.], [-2., 2.]]).unwrap();
    let (x0, y0) = empty_data(2);
    let operands: Vec<Box<dyn Acquisition>> = vec![
        Box::new(ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).unwrap()),
        Box::new(ProbabilityOfFeasibility::new(KrigingParams::new(), &x0, &y0).unwrap()),
    ];
    let acquisition = Aggregation::product(operands).unwrap();
    assert_eq!(acquisition.objective_indices(), vec![0]);
    assert_eq!(acquisition.constraint_indices(), vec![1]);

    let mut bo = BayesianOptimizerBuilder::new(&domain, acquisition)
        .optimizer(staged(&domain, 200, 0))
        .initial(&SampledDesign::new(FullFactorial::new(domain.xlimits()), 9))
        .build()
        .unwrap();
    let res = bo
        .optimize(&Objectives::new(sphere).and(half_plane), 15)
        .unwrap();

    assert!(res.success);
    assert_eq!(res.y_doe.dim(), (24, 2));
    let x_opt = res.x_opt.unwrap();
    assert!(half_plane(&x_opt.view().insert_axis(Axis(0)))[[0, 0]] <= 0.);
    // best feasible value of the initial grid is 4 at (0, 2) and (2, 0), constrained minimum 0.5
    assert!(res.y_opt.unwrap()[0] < 3.);
}

#[test]
#[serial]
fn test_xsinx_marginalized_ei() {
    let domain = Domain::new(&array![[0., 25.]]).unwrap();
    let (x0, y0) = empty_data(1);
    let ei = ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).unwrap();
    let mut bo = BayesianOptimizerBuilder::new(&domain, ei)
        .configure(|config| config.hyper_draws(3).seed(0))
        .optimizer(staged(&domain, 50, 0))
        .initial(&array![[0.], [7.], [15.], [25.]])
        .build()
        .unwrap();
    assert_eq!(bo.acquisition().name(), "MarginalizedEI");
    let res = bo.optimize(&Objectives::new(xsinx), 5).unwrap();

    assert!(res.success);
    assert_eq!(res.nfev, 9);
    assert_eq!(res.x_doe.slice(s![..4, ..]), array![[0.], [7.], [15.], [25.]]);
}

#[test]
#[serial]
fn test_other_acquisitions_and_optimizers() {
    let domain = Domain::new(&array![[-1., 2.]]).unwrap();
    let (x0, y0) = empty_data(1);
    let initial = array![[-1.], [0.5], [2.]];

    let lcb = LowerConfidenceBound::new(KrigingParams::new(), &x0, &y0).unwrap();
    let mut bo = BayesianOptimizerBuilder::new(&domain, lcb)
        .optimizer(CobylaOptimizer::new(&domain))
        .initial(&initial)
        .build()
        .unwrap();
    let res = bo.optimize(&Objectives::new(sphere), 4).unwrap();
    assert_eq!(res.x_doe.nrows(), 7);
    assert!(res.x_doe.rows().into_iter().all(|x| domain.contains(&x)));

    let pi = ProbabilityOfImprovement::new(KrigingParams::new(), &x0, &y0).unwrap();
    let candidates = Array2::from_shape_fn((31, 1), |(i, _)| -1. + 0.1 * i as f64);
    let mut bo = BayesianOptimizerBuilder::new(&domain, pi)
        .optimizer(CandidateOptimizer::new(&domain, candidates).unwrap())
        .initial(&initial)
        .build()
        .unwrap();
    let res = bo.optimize(&Objectives::new(sphere), 4).unwrap();
    assert_eq!(res.x_doe.nrows(), 7);
    assert!(res.y_opt.unwrap()[0] <= 0.25);
}

#[test]
#[serial]
fn test_recording_outdir() {
    let outdir = "target/tests/seqbo_recording";
    for file in [CONFIG_FILE, DOE_INITIAL_FILE, DOE_FILE] {
        let _ = std::fs::remove_file(format!("{outdir}/{file}"));
    }
    let domain = Domain::new(&array![[0., 25.]]).unwrap();
    let (x0, y0) = empty_data(1);
    let ei = ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).unwrap();
    let initial = array![[0.], [7.], [25.]];
    let mut bo = BayesianOptimizerBuilder::new(&domain, ei)
        .configure(|config| config.outdir(outdir).seed(42))
        .optimizer(staged(&domain, 50, 42))
        .initial(&initial)
        .build()
        .unwrap();
    bo.optimize(&Objectives::new(xsinx), 3).unwrap();

    let config: BoConfig = serde_json::from_str(
        &std::fs::read_to_string(format!("{outdir}/{CONFIG_FILE}")).unwrap(),
    )
    .unwrap();
    assert_eq!(&config, bo.config());

    let initial_doe: Array2<f64> = read_npy(format!("{outdir}/{DOE_INITIAL_FILE}")).unwrap();
    assert_eq!(initial_doe.dim(), (3, 2));
    assert_abs_diff_eq!(initial_doe.column(0), initial.column(0), epsilon = 1e-12);
    let initial_y = xsinx(&initial.view());
    assert_abs_diff_eq!(
        initial_doe.column(1),
        initial_y.column(0),
        epsilon = 1e-12
    );

    let doe: Array2<f64> = read_npy(format!("{outdir}/{DOE_FILE}")).unwrap();
    assert_eq!(doe.dim(), (6, 2));
}

#[test]
#[serial]
fn test_rearmed_initial_design() {
    let domain = Domain::new(&array![[-1., 1.], [-1., 1.]]).unwrap();
    let (x0, y0) = empty_data(2);
    let ei = ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).unwrap();
    let mut bo = BayesianOptimizerBuilder::new(&domain, ei)
        .optimizer(staged(&domain, 50, 3))
        .initial(&array![[-0.5, -0.5], [0.5, 0.5], [0.5, -0.5]])
        .build()
        .unwrap();
    let res = bo.optimize(&Objectives::new(sphere), 2).unwrap();
    assert_eq!(res.nfev, 5);

    bo.set_initial(array![[0., 0.]]);
    assert_eq!(bo.initial(), array![[0., 0.]]);
    let res = bo.optimize(&Objectives::new(sphere), 0).unwrap();
    assert_eq!(res.nfev, 1);
    assert_eq!(res.x_doe.nrows(), 6);
    assert_eq!(res.x_opt, Some(array![0., 0.]));
    assert_eq!(res.y_opt, Some(array![0.]));
}

#[test]
#[serial]
fn test_failed_constraint_fit_keeps_dataset() {
    let domain = Domain::new(&array![[-2., 2.], [-2., 2.]]).unwrap();
    let (x0, y0) = empty_data(2);
    let operands: Vec<Box<dyn Acquisition>> = vec![
        Box::new(ExpectedImprovement::new(KrigingParams::new(), &x0, &y0).unwrap()),
        Box::new(ProbabilityOfFeasibility::new(KrigingParams::new(), &x0, &y0).unwrap()),
    ];
    let mut bo = BayesianOptimizerBuilder::new(&domain, Aggregation::product(operands).unwrap())
        .optimizer(staged(&domain, 50, 0))
        .initial(&SampledDesign::new(FullFactorial::new(domain.xlimits()), 9))
        .build()
        .unwrap();
    bo.optimize(&Objectives::new(sphere).and(half_plane), 2).unwrap();
    let (x, y) = bo.acquisition().data();
    let feasible = bo.acquisition().feasible_data_index();
    assert_eq!(y.dim(), (11, 2));

    let broken = Objectives::new(sphere)
        .and(|x| x.map_axis(Axis(1), |_| f64::NAN).insert_axis(Axis(1)));
    assert!(bo.optimize(&broken, 1).is_err());
    assert_eq!(bo.acquisition().data(), (x, y));
    assert_eq!(bo.acquisition().feasible_data_index(), feasible);

    let res = bo
        .optimize(&Objectives::new(sphere).and(half_plane), 1)
        .unwrap();
    assert_eq!(res.y_doe.dim(), (12, 2));
}
