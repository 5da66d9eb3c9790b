use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::time::Duration;

use instant::Instant;

use hgsvrp::config::Config;
use hgsvrp::models::{FloatType, ProblemBuilder};
use hgsvrp::solver::genetic::GeneticAlgorithm;
use hgsvrp::solver::Context;

fn synthetic_builder(num_customers: usize) -> ProblemBuilder {
    let mut rng = fastrand::Rng::with_seed(97);
    let mut builder = ProblemBuilder::new();
    let mut coordinates = vec![(500.0, 500.0)];
    let mut demands = vec![0.0];
    for _ in 0..num_customers {
        coordinates.push((rng.f64() * 1000.0, rng.f64() * 1000.0));
        demands.push((rng.usize(1..10)) as FloatType);
    }
    builder.coordinates = Some(coordinates);
    builder.demands = demands;
    builder.service_durations = vec![0.0; num_customers + 1];
    builder.vehicle_capacity = Some(50.0);
    builder.round_distances = true;
    builder
}

fn code(num_customers: usize) {
    let start_time = Instant::now();
    let mut config = Config::default();
    config.seed = 1;
    config.max_iterations_without_improvement = 500;
    config.log_enabled = false;

    let mut builder = synthetic_builder(num_customers);
    builder.granularity = config.granularity as usize;
    let problem = builder.build().expect("Failed to build instance");

    let ctx = Context::new(problem, config, start_time);
    let mut solver = GeneticAlgorithm::new(&ctx);
    solver.run(&ctx);
}

pub fn bench(c: &mut Criterion) {
    c.bench_function("GeneticSearch", |b| b.iter(|| code(black_box(100))));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10).measurement_time(Duration::from_secs(60));
    targets = bench
}
criterion_main!(benches);
