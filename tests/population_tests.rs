mod common;

use hgsvrp::models::FloatType;
use hgsvrp::solver::genetic::Population;
use hgsvrp::solver::Context;

use common::*;

fn routes_rotated(ctx: &Context, offset: usize) -> Vec<Vec<usize>> {
    let num_customers = ctx.problem.num_customers();
    let customers: Vec<usize> = (1..=num_customers)
        .map(|c| (c + offset - 1) % num_customers + 1)
        .collect();
    customers.chunks(3).map(|chunk| chunk.to_vec()).collect()
}

#[test]
fn broken_pairs_distance_is_a_pseudometric() {
    let ctx = grid_context(0);
    let a = individual_from_routes(&ctx, routes_rotated(&ctx, 0));
    let b = individual_from_routes(&ctx, routes_rotated(&ctx, 0));
    let c = individual_from_routes(&ctx, routes_rotated(&ctx, 4));

    assert_eq!(0.0, a.broken_pairs_distance(&b));
    let ab = a.broken_pairs_distance(&c);
    let ba = c.broken_pairs_distance(&a);
    assert!(ab >= 0.0);
    assert_eq!(ab, ba);

    let d = individual_from_routes(&ctx, routes_rotated(&ctx, 7));
    let ac = a.broken_pairs_distance(&c);
    let cd = c.broken_pairs_distance(&d);
    let ad = a.broken_pairs_distance(&d);
    assert!(ad <= ac + cd + 1e-9);
}

#[test]
fn subpopulations_stay_sorted_and_bounded() {
    let ctx = grid_context(1);
    let mut config = ctx.config.borrow_mut();
    config.min_population_size = 4;
    config.population_lambda = 3;
    drop(config);

    let mut population = Population::new(&ctx);
    for offset in 0..20 {
        let individual = individual_from_routes(&ctx, routes_rotated(&ctx, offset % 9));
        population.add_individual(&ctx, &individual, true);
    }

    // Bounded by mu + lambda at rest
    assert!(population.feasible.size() <= 7);
    assert!(population.infeasible.size() <= 7);
    assert!(population.size() >= 1);

    for subpopulation in [&population.feasible, &population.infeasible].iter() {
        for pair in subpopulation.individuals.windows(2) {
            assert!(pair[0].penalized_cost() <= pair[1].penalized_cost() + 1e-6);
        }
    }
}

#[test]
fn proximity_entries_stay_symmetric_through_evictions() {
    let ctx = grid_context(2);
    let mut config = ctx.config.borrow_mut();
    config.min_population_size = 3;
    config.population_lambda = 2;
    drop(config);

    let mut population = Population::new(&ctx);
    for offset in 0..12 {
        let individual = individual_from_routes(&ctx, routes_rotated(&ctx, offset % 9));
        population.add_individual(&ctx, &individual, true);
    }

    let subpopulation = &population.feasible;
    for individual in subpopulation.individuals.iter() {
        let list = subpopulation
            .proximity_list(individual.number)
            .expect("Missing proximity list");
        assert_eq!(subpopulation.size() - 1, list.len());
        for proximity in list.iter() {
            let other = subpopulation
                .proximity_list(proximity.to_number)
                .expect("Dangling proximity reference");
            assert!(other.iter().any(|back| back.to_number == individual.number
                && (back.distance - proximity.distance).abs() < 1e-12));
        }
    }
}

#[test]
fn best_feasible_is_tracked_and_never_lost() {
    let ctx = grid_context(3);
    let mut config = ctx.config.borrow_mut();
    config.min_population_size = 3;
    config.population_lambda = 2;
    drop(config);

    let mut population = Population::new(&ctx);
    let mut best_cost = FloatType::INFINITY;
    let mut claimed_improvements = 0;
    for offset in 0..9 {
        let individual = individual_from_routes(&ctx, routes_rotated(&ctx, offset));
        let cost = individual.penalized_cost();
        let improved = population.add_individual(&ctx, &individual, true);
        if improved {
            claimed_improvements += 1;
            assert!(cost < best_cost);
            best_cost = cost;
        }
    }

    assert!(claimed_improvements >= 1);
    let best = population.get_best_found().expect("No best solution");
    assert!(best.is_feasible());
    assert_eq!(best_cost, best.penalized_cost());
    assert_covers_all_customers(&ctx, &best.phenotype);
}

#[test]
fn penalties_adapt_and_stay_bounded() {
    let ctx = grid_context(4);
    let mut population = Population::new(&ctx);

    // Admit only overloaded solutions: the load window empties out and the
    // capacity penalty must rise
    let overloaded = individual_from_routes(
        &ctx,
        vec![vec![1, 2, 3, 4, 5, 6], vec![7, 8, 9]],
    );
    assert!(overloaded.evaluation.capacity_excess > 0.0);

    let (penalty_before, _) = ctx.penalties();
    for _ in 0..120 {
        population.add_individual(&ctx, &overloaded, true);
    }
    population.manage_penalties(&ctx);
    let (penalty_after, _) = ctx.penalties();
    assert!(penalty_after > penalty_before);

    for _ in 0..200 {
        population.manage_penalties(&ctx);
    }
    let (penalty_capped, penalty_duration) = ctx.penalties();
    assert!(penalty_capped <= 100_000.0);
    assert!(penalty_duration >= 0.1 && penalty_duration <= 100_000.0);

    // Infeasible subpopulation reordered under the new penalties
    for pair in population.infeasible.individuals.windows(2) {
        assert!(pair[0].penalized_cost() <= pair[1].penalized_cost() + 1e-6);
    }
}

#[test]
fn tournament_prefers_lower_biased_fitness() {
    let ctx = grid_context(5);
    let mut population = Population::new(&ctx);
    for offset in 0..9 {
        let individual = individual_from_routes(&ctx, routes_rotated(&ctx, offset));
        population.add_individual(&ctx, &individual, true);
    }

    for _ in 0..20 {
        let winner = population.get_binary_tournament(&ctx);
        assert!(winner.fitness.is_finite());
        assert_covers_all_customers(&ctx, &winner.phenotype);
    }
}
