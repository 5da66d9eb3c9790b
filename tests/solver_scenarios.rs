mod common;

use instant::Instant;

use hgsvrp::config::Config;
use hgsvrp::models::{FloatType, Matrix, ProblemBuilder};
use hgsvrp::solver::genetic::{GeneticAlgorithm, Individual};
use hgsvrp::solver::Context;
use hgsvrp::utils::Random;

use common::*;

struct Scenario {
    coordinates: Option<Vec<(FloatType, FloatType)>>,
    matrix: Option<Matrix<FloatType>>,
    duration_limit: Option<FloatType>,
    num_vehicles: i64,
    round_distances: bool,
    swap_star: bool,
    seed: u64,
}

fn solve(scenario: Scenario) -> (Individual, Context) {
    let mut builder = ProblemBuilder::new();
    builder.coordinates = scenario.coordinates;
    builder.distances = scenario.matrix;
    builder.demands = scenario_demands();
    builder.service_durations = vec![0.0; 10];
    builder.vehicle_capacity = Some(10.0);
    builder.duration_limit = scenario.duration_limit;
    builder.num_vehicles = scenario.num_vehicles;
    builder.round_distances = scenario.round_distances;

    let mut config = Config::default();
    config.seed = scenario.seed;
    config.swap_star = scenario.swap_star;
    config.log_enabled = false;
    config.time_limit = Some(1.73);
    builder.granularity = config.granularity as usize;

    let problem = builder.build().expect("Failed to build scenario instance");
    let ctx = Context::new(problem, config, Instant::now());
    let mut solver = GeneticAlgorithm::new(&ctx);
    solver.run(&ctx);
    let best = solver.best().expect("No solution found").clone();
    (best, ctx)
}

#[test]
fn rounded_euclidean_two_vehicles() {
    let (best, ctx) = solve(Scenario {
        coordinates: Some(scenario_coordinates()),
        matrix: None,
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });

    assert_covers_all_customers(&ctx, &best.phenotype);
    assert!(best.is_feasible());
    assert_eq!(2, best.num_nonempty_routes());
    assert_eq!(29.0, best.penalized_cost());
}

#[test]
fn scaled_matrix_is_used_as_given() {
    let (best, ctx) = solve(Scenario {
        coordinates: Some(scenario_coordinates()),
        matrix: Some(scenario_matrix(true)),
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });

    assert_covers_all_customers(&ctx, &best.phenotype);
    assert!(best.is_feasible());
    assert_eq!(32.0, best.penalized_cost().round());
}

#[test]
fn matrix_only_input_matches_the_coordinate_run() {
    let (with_coords, _) = solve(Scenario {
        coordinates: Some(scenario_coordinates()),
        matrix: Some(scenario_matrix(true)),
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });

    // Coordinates passed as zeros
    let (with_zeros, _) = solve(Scenario {
        coordinates: Some(vec![(0.0, 0.0); 10]),
        matrix: Some(scenario_matrix(true)),
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });

    // Coordinates omitted entirely
    let (without_coords, ctx) = solve(Scenario {
        coordinates: None,
        matrix: Some(scenario_matrix(true)),
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });
    assert!(!ctx.problem.coordinates_provided);

    assert_eq!(
        with_coords.penalized_cost().round(),
        with_zeros.penalized_cost().round()
    );
    assert_eq!(
        with_coords.penalized_cost().round(),
        without_coords.penalized_cost().round()
    );
}

#[test]
fn swap_star_toggle_does_not_change_the_small_optimum() {
    let (with_swap_star, _) = solve(Scenario {
        coordinates: None,
        matrix: Some(scenario_matrix(true)),
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });

    let (without_swap_star, _) = solve(Scenario {
        coordinates: None,
        matrix: Some(scenario_matrix(true)),
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: false,
        seed: 0,
    });

    assert_eq!(
        with_swap_star.penalized_cost().round(),
        without_swap_star.penalized_cost().round()
    );
}

#[test]
fn duration_limit_is_enforced() {
    let (best, ctx) = solve(Scenario {
        coordinates: None,
        matrix: Some(scenario_matrix(false)),
        duration_limit: Some(18.0),
        num_vehicles: 5,
        round_distances: false,
        swap_star: false,
        seed: 12,
    });

    assert_covers_all_customers(&ctx, &best.phenotype);
    assert!(best.is_feasible());
    assert_eq!(42.0, best.penalized_cost());

    for route in best.phenotype.iter().filter(|route| !route.is_empty()) {
        let mut distance = ctx.problem.distance.get(0, route[0]);
        for pair in route.windows(2) {
            distance += ctx.problem.distance.get(pair[0], pair[1]);
        }
        distance += ctx.problem.distance.get(route[route.len() - 1], 0);
        assert!(distance <= 18.0 + 1e-6, "Route distance {} exceeds 18", distance);
    }
}

#[test]
fn redundant_duration_limit_changes_nothing() {
    let (unconstrained, _) = solve(Scenario {
        coordinates: Some(scenario_coordinates()),
        matrix: None,
        duration_limit: None,
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });

    let (constrained, _) = solve(Scenario {
        coordinates: Some(scenario_coordinates()),
        matrix: None,
        duration_limit: Some(1000.0),
        num_vehicles: 2,
        round_distances: true,
        swap_star: true,
        seed: 0,
    });

    assert_eq!(unconstrained.penalized_cost(), constrained.penalized_cost());
}

#[test]
fn random_instances_keep_the_invariants() {
    let rng = Random::from_seed(999);
    for run in 0..10u64 {
        let num_customers = rng.range_usize(10, 31);
        let mut coordinates = vec![(50.0, 50.0)];
        let mut demands = vec![0.0];
        for _ in 0..num_customers {
            coordinates.push((rng.real() * 100.0, rng.real() * 100.0));
            demands.push(1.0 + rng.range_usize(0, 9) as FloatType);
        }

        let mut config = test_config(run);
        config.max_iterations_without_improvement = 200;
        let ctx = context_from_builder(
            builder_from_coords(coordinates, demands, 15.0, -1),
            config,
        );
        let mut solver = GeneticAlgorithm::new(&ctx);
        solver.run(&ctx);

        let population = &solver.population;

        // Penalties stay bounded
        let (penalty_capacity, penalty_duration) = ctx.penalties();
        assert!(penalty_capacity >= 0.1 && penalty_capacity <= 100_000.0);
        assert!(penalty_duration >= 0.1 && penalty_duration <= 100_000.0);

        // Subpopulations stay sorted and bounded
        for subpopulation in [&population.feasible, &population.infeasible].iter() {
            assert!(subpopulation.size() <= 65);
            for pair in subpopulation.individuals.windows(2) {
                assert!(pair[0].penalized_cost() <= pair[1].penalized_cost() + 1e-6);
            }
            for individual in subpopulation.individuals.iter() {
                assert_covers_all_customers(&ctx, &individual.phenotype);
                let eval = &individual.evaluation;
                assert!(
                    (eval.penalized_cost
                        - (eval.distance
                            + penalty_capacity * eval.capacity_excess
                            + penalty_duration * eval.duration_excess))
                        .abs()
                        < 1e-4
                );
            }
        }

        // Random instances of this size always admit a feasible solution
        let best = solver.best().expect("No best solution");
        assert!(best.is_feasible());
        assert_covers_all_customers(&ctx, &best.phenotype);
    }
}
