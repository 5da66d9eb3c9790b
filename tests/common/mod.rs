#![allow(dead_code)]

use instant::Instant;

use hgsvrp::config::Config;
use hgsvrp::models::{FloatType, Matrix, ProblemBuilder};
use hgsvrp::solver::genetic::Individual;
use hgsvrp::solver::Context;

/// Quiet configuration with a short non-productive limit for tests
pub fn test_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.seed = seed;
    config.log_enabled = false;
    config.max_iterations_without_improvement = 500;
    config
}

pub fn builder_from_coords(
    coordinates: Vec<(FloatType, FloatType)>,
    demands: Vec<FloatType>,
    capacity: FloatType,
    num_vehicles: i64,
) -> ProblemBuilder {
    let dim = coordinates.len();
    assert_eq!(dim, demands.len());
    let mut builder = ProblemBuilder::new();
    builder.coordinates = Some(coordinates);
    builder.demands = demands;
    builder.service_durations = vec![0.0; dim];
    builder.vehicle_capacity = Some(capacity);
    builder.num_vehicles = num_vehicles;
    builder
}

pub fn context_from_builder(mut builder: ProblemBuilder, config: Config) -> Context {
    builder.granularity = config.granularity as usize;
    let problem = builder.build().expect("Failed to build test instance");
    Context::new(problem, config, Instant::now())
}

/// Six customers on a line, unit-ish demands, capacity for three of them
pub fn line_context(seed: u64) -> Context {
    let coordinates = vec![
        (0.0, 0.0),
        (10.0, 0.0),
        (20.0, 0.0),
        (30.0, 0.0),
        (40.0, 0.0),
        (50.0, 0.0),
        (60.0, 0.0),
    ];
    let demands = vec![0.0, 1.0, 1.0, 1.5, 1.5, 2.0, 2.0];
    context_from_builder(
        builder_from_coords(coordinates, demands, 5.0, 4),
        test_config(seed),
    )
}

/// Nine customers on a 3x3 grid around a corner depot
pub fn grid_context(seed: u64) -> Context {
    let mut coordinates = vec![(0.0, 0.0)];
    let mut demands = vec![0.0];
    for i in 0..3 {
        for j in 0..3 {
            coordinates.push(((i as FloatType + 1.0) * 10.0, (j as FloatType + 1.0) * 10.0));
            demands.push(1.0);
        }
    }
    context_from_builder(
        builder_from_coords(coordinates, demands, 5.0, 4),
        test_config(seed),
    )
}

/// The nine-customer instance of the end-to-end scenarios: depot at (1, 5),
/// customers strung out along two diagonals
pub fn scenario_coordinates() -> Vec<(FloatType, FloatType)> {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
    let y = [5.0, 4.0, 3.0, 2.0, 1.0, 9.0, 8.0, 7.0, 6.0, 5.0];
    x.iter().zip(y.iter()).map(|(&x, &y)| (x, y)).collect()
}

pub fn scenario_demands() -> Vec<FloatType> {
    vec![0.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]
}

/// Rounded euclidean matrix over the scenario coordinates, optionally scaled
/// by the asymmetric factor (1 + 0.05 i - 0.03 j)
pub fn scenario_matrix(scaled: bool) -> Matrix<FloatType> {
    let coordinates = scenario_coordinates();
    let dim = coordinates.len();
    let mut matrix = Matrix::new(dim, dim);
    for i in 0..dim {
        for j in 0..dim {
            let dx = coordinates[i].0 - coordinates[j].0;
            let dy = coordinates[i].1 - coordinates[j].1;
            let mut distance = (dx * dx + dy * dy).sqrt();
            if scaled {
                distance *= 1.0 + 0.05 * i as FloatType - 0.03 * j as FloatType;
            } else {
                distance = distance.round();
            }
            matrix.set(i, j, distance);
        }
    }
    matrix
}

/// Build an evaluated individual from explicit routes
pub fn individual_from_routes(ctx: &Context, routes: Vec<Vec<usize>>) -> Individual {
    let mut phenotype = routes;
    while phenotype.len() < ctx.problem.num_vehicles {
        phenotype.push(Vec::new());
    }
    let genotype: Vec<usize> = phenotype.iter().flatten().copied().collect();
    let mut individual = Individual::new(genotype);
    individual.phenotype = phenotype;
    individual.evaluate(ctx);
    individual
}

/// Every customer appears exactly once across the routes
pub fn assert_covers_all_customers(ctx: &Context, phenotype: &[Vec<usize>]) {
    let mut seen = vec![false; ctx.problem.dim()];
    for route in phenotype.iter() {
        for &customer in route.iter() {
            assert!(customer >= 1 && customer < ctx.problem.dim());
            assert!(!seen[customer], "Customer {} visited twice", customer);
            seen[customer] = true;
        }
    }
    for customer in 1..ctx.problem.dim() {
        assert!(seen[customer], "Customer {} not visited", customer);
    }
}
