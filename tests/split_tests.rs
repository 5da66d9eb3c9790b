mod common;

use hgsvrp::models::FloatType;
use hgsvrp::solver::genetic::{Individual, Split};
use hgsvrp::solver::Context;

use common::*;

fn split_tour(ctx: &Context, tour: Vec<usize>, max_vehicles: usize) -> Individual {
    let mut individual = Individual::new(tour);
    let mut split = Split::new(ctx);
    split.run(ctx, &mut individual, max_vehicles);
    individual
}

#[test]
fn covers_every_customer_and_keeps_tour_order() {
    let ctx = line_context(0);
    let individual = split_tour(&ctx, vec![1, 2, 3, 4, 5, 6], 4);

    assert_covers_all_customers(&ctx, &individual.phenotype);
    assert_eq!(ctx.problem.num_vehicles, individual.phenotype.len());

    // The concatenated routes are exactly the giant tour
    let flattened: Vec<usize> = individual.phenotype.iter().flatten().copied().collect();
    assert_eq!(individual.genotype, flattened);
}

#[test]
fn single_customer_route_cost() {
    let ctx = line_context(0);
    let individual = split_tour(&ctx, vec![1, 2, 3], 4);
    // Total demand 3.5 fits one vehicle; the optimum is a single route
    assert_eq!(1, individual.num_nonempty_routes());
    assert!((individual.evaluation.distance - 60.0).abs() < 1e-6);
    assert!(individual.is_feasible());
}

#[test]
fn splits_when_capacity_is_exceeded() {
    let ctx = line_context(0);
    let individual = split_tour(&ctx, vec![1, 2, 3, 4, 5, 6], 4);
    // Total demand 9.0 against capacity 5.0 needs at least two routes
    assert!(individual.num_nonempty_routes() >= 2);
    assert!(individual.is_feasible());
    for route in individual.phenotype.iter() {
        let load: FloatType = route
            .iter()
            .map(|&customer| ctx.problem.clients[customer].demand)
            .sum();
        assert!(load <= ctx.problem.vehicle_capacity + 1e-9);
    }
}

/// Cheapest penalised cost over all decompositions of the tour into at most
/// `max_routes` consecutive routes, by exhaustive recursion. Multi-customer
/// routes are capped at 1.5x the vehicle capacity, the same arc set the
/// solver's shortest path considers.
fn brute_force_best(
    ctx: &Context,
    tour: &[usize],
    from: usize,
    max_routes: usize,
) -> FloatType {
    if from == tour.len() {
        return 0.0;
    }
    if max_routes == 0 {
        return FloatType::INFINITY;
    }
    let problem = &ctx.problem;
    let (penalty_capacity, penalty_duration) = ctx.penalties();
    let mut best = FloatType::INFINITY;
    for to in (from + 1)..=tour.len() {
        let route = &tour[from..to];
        let route_load: FloatType = route
            .iter()
            .map(|&customer| problem.clients[customer].demand)
            .sum();
        if route.len() > 1 && route_load > 1.5 * problem.vehicle_capacity {
            break;
        }
        let mut distance = problem.distance.get(0, route[0]);
        let mut load = 0.0;
        let mut service = 0.0;
        for (position, &customer) in route.iter().enumerate() {
            if position > 0 {
                distance += problem.distance.get(route[position - 1], customer);
            }
            load += problem.clients[customer].demand;
            service += problem.clients[customer].service_duration;
        }
        distance += problem.distance.get(route[route.len() - 1], 0);

        let cost = distance
            + penalty_capacity * (load - problem.vehicle_capacity).max(0.0)
            + penalty_duration * (distance + service - problem.duration_limit).max(0.0);
        let rest = brute_force_best(ctx, tour, to, max_routes - 1);
        if cost + rest < best {
            best = cost + rest;
        }
    }
    best
}

#[test]
fn matches_brute_force_on_fixed_tours() {
    let ctx = line_context(3);
    let tours = vec![
        vec![1, 2, 3, 4, 5, 6],
        vec![6, 5, 4, 3, 2, 1],
        vec![2, 4, 6, 1, 3, 5],
        vec![5, 1, 6, 2, 4, 3],
    ];
    for tour in tours {
        let individual = split_tour(&ctx, tour.clone(), ctx.problem.num_vehicles);
        let best = brute_force_best(&ctx, &tour, 0, ctx.problem.num_vehicles);
        assert!(
            (individual.penalized_cost() - best).abs() < 1e-6,
            "Split cost {} differs from brute force {} on {:?}",
            individual.penalized_cost(),
            best,
            tour
        );
    }
}

#[test]
fn limited_fleet_respects_the_bound() {
    let ctx = line_context(0);
    // Unconstrained, the cheapest decomposition of this tour may use more
    // than two routes; with the bound it must not
    let individual = split_tour(&ctx, vec![1, 2, 3, 4, 5, 6], 2);
    assert!(individual.num_nonempty_routes() <= 2);
    assert_covers_all_customers(&ctx, &individual.phenotype);

    let best = brute_force_best(&ctx, &[1, 2, 3, 4, 5, 6], 0, 2);
    assert!((individual.penalized_cost() - best).abs() < 1e-6);
}

#[test]
fn duration_excess_is_penalised() {
    let coordinates = vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)];
    let demands = vec![0.0, 1.0, 1.0, 1.0];
    let mut builder = builder_from_coords(coordinates, demands, 10.0, 1);
    builder.duration_limit = Some(45.0);
    let ctx = context_from_builder(builder, test_config(0));

    // One vehicle only: the single route 0-1-2-3-0 has length 60 > 45
    let individual = split_tour(&ctx, vec![1, 2, 3], 1);
    assert!(!individual.is_feasible());
    assert!((individual.evaluation.duration_excess - 15.0).abs() < 1e-6);
    let (_, penalty_duration) = ctx.penalties();
    assert!(
        (individual.penalized_cost()
            - (individual.evaluation.distance + penalty_duration * 15.0))
            .abs()
            < 1e-6
    );
}

#[test]
fn penalized_cost_identity_holds() {
    let ctx = line_context(7);
    let individual = split_tour(&ctx, vec![3, 1, 4, 2, 6, 5], 2);
    let (penalty_capacity, penalty_duration) = ctx.penalties();
    let eval = &individual.evaluation;
    assert!(
        (eval.penalized_cost
            - (eval.distance
                + penalty_capacity * eval.capacity_excess
                + penalty_duration * eval.duration_excess))
            .abs()
            < 1e-9
    );
}
