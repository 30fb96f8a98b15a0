use ndarray::arr2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use seqbo_doe::{FullFactorial, Lhs, LhsKind, Random, SamplingMethod};

fn main() {
    // Box domain of a 2D optimization problem
    let xlimits = arr2(&[[-5., 10.], [0., 15.]]);
    let n = 9;

    println!("Initial designs of {n} points within");
    println!("{xlimits}\n");

    let designs: Vec<(&str, Box<dyn SamplingMethod<f64>>)> = vec![
        ("random", Box::new(Random::new(&xlimits).seed(42))),
        ("full factorial", Box::new(FullFactorial::new(&xlimits))),
        (
            "centered latin hypercube",
            Box::new(
                Lhs::new(&xlimits)
                    .kind(LhsKind::Centered)
                    .with_rng(Xoshiro256Plus::seed_from_u64(42)),
            ),
        ),
        (
            "maximin latin hypercube",
            Box::new(Lhs::new(&xlimits).with_rng(Xoshiro256Plus::seed_from_u64(42))),
        ),
    ];

    for (name, design) in designs {
        println!("*** {name}");
        println!("{}\n", design.sample(n));
    }
}
