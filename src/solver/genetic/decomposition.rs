use instant::Instant;

use crate::models::FloatType;
use crate::solver::genetic::{k_means, GeneticAlgorithm, Individual, Point, Population};
use crate::solver::Context;

/// Barycentre clustering decomposition: cluster the routes of an elite
/// solution by their barycentres, solve every cluster as an independent
/// sub-instance, and re-inject the recomposed solution into the population.
///
/// A no-op on instances without coordinates, at or below the target size, or
/// when the clustering degenerates to fewer than two clusters.
pub fn decompose(ctx: &Context, population: &mut Population) {
    let target_size = ctx.config.borrow().decomposition_target_size as usize;
    if !ctx.problem.coordinates_provided || ctx.problem.num_customers() <= target_size {
        return;
    }

    let elite = population.get_binary_tournament(ctx);

    // Barycentre of every route; empty routes carry no information and are
    // redistributed round-robin by the clustering
    let mut barycentres: Vec<Point> = Vec::with_capacity(elite.phenotype.len());
    let mut empty_routes: Vec<usize> = Vec::new();
    for (route_index, route) in elite.phenotype.iter().enumerate() {
        if route.is_empty() {
            empty_routes.push(route_index);
            barycentres.push(Point { x: 0.0, y: 0.0 });
            continue;
        }
        let mut x = 0.0;
        let mut y = 0.0;
        for &customer in route.iter() {
            x += ctx.problem.clients[customer].x;
            y += ctx.problem.clients[customer].y;
        }
        barycentres.push(Point {
            x: x / route.len() as FloatType,
            y: y / route.len() as FloatType,
        });
    }

    let k = (ctx.problem.num_customers() as FloatType / target_size as FloatType).ceil() as usize;
    let clusters = k_means(&ctx.random, k, &barycentres, &empty_routes);
    let num_subproblems = clusters
        .iter()
        .filter(|cluster| cluster.iter().any(|&route| !elite.phenotype[route].is_empty()))
        .count();
    if num_subproblems < 2 {
        return;
    }
    log::info!(
        "Decomposing {} routes into {} sub-instances",
        elite.num_nonempty_routes(),
        num_subproblems
    );

    let mut composite = Individual::empty();
    let mut time_spent: FloatType = 0.0;

    for cluster in clusters.iter() {
        let subproblem = match SubProblem::new(ctx, &elite, cluster) {
            Some(subproblem) => subproblem,
            None => continue,
        };

        let solve_start = Instant::now();
        let solution = subproblem.solve(ctx, time_spent);
        time_spent += solve_start.elapsed().as_secs_f64();

        subproblem.merge(ctx, &elite, solution, &mut composite);
    }

    while composite.phenotype.len() < ctx.problem.num_vehicles {
        composite.phenotype.push(Vec::new());
    }
    composite.rebuild_genotype();
    composite.evaluate(ctx);

    log::info!("Recomposed solution: {:.2}", composite.penalized_cost());
    population.add_individual(ctx, &composite, true);
}

/// One cluster of elite routes turned into an independent reduced instance
struct SubProblem {
    // Master indices of the sub-instance nodes; entry 0 is the depot
    mapping: Vec<usize>,
    // Indices of the elite routes this sub-problem was built from
    elite_routes: Vec<usize>,
    num_vehicles: usize,
}

impl SubProblem {
    fn new(ctx: &Context, elite: &Individual, cluster: &[usize]) -> Option<Self> {
        let mut mapping = vec![0];
        let mut elite_routes = Vec::with_capacity(cluster.len());
        for &route_index in cluster.iter() {
            elite_routes.push(route_index);
            mapping.extend(elite.phenotype[route_index].iter().copied());
        }
        // A cluster of empty routes has nothing to solve
        if mapping.len() <= 1 || elite_routes.is_empty() {
            return None;
        }
        Some(Self {
            num_vehicles: elite_routes.len(),
            mapping,
            elite_routes,
        })
    }

    /// Run a full reduced search on the cluster under the remaining time
    /// budget. Returns the best feasible sub-solution, if any was found.
    fn solve(&self, ctx: &Context, time_spent: FloatType) -> Option<Individual> {
        let config = ctx.config.borrow();
        let mut sub_config = config.clone();
        // Reduced population sizes, no nested decomposition, quiet run
        sub_config.min_population_size = (config.min_population_size / 2).max(1);
        sub_config.population_lambda = (config.population_lambda / 2).max(1);
        sub_config.num_elites = config.num_elites / 2;
        sub_config.max_iterations_without_improvement = config.decomposition_iterations();
        sub_config.use_decomposition = false;
        sub_config.log_enabled = false;
        sub_config.time_limit = ctx
            .remaining_time()
            .map(|remaining| (remaining - time_spent).max(0.0));
        drop(config);

        let granularity = sub_config.granularity as usize;
        let sub_problem = ctx
            .problem
            .restricted(&self.mapping, self.num_vehicles, granularity);

        log::debug!(
            "Solving a sub-instance with {} customers and {} vehicles",
            sub_problem.num_customers(),
            sub_problem.num_vehicles
        );

        let sub_ctx = Context::with_parts(
            sub_problem,
            sub_config,
            ctx.random.fork(),
            Instant::now(),
        );
        let mut algorithm = GeneticAlgorithm::new(&sub_ctx);
        algorithm.run(&sub_ctx);
        algorithm.best().cloned()
    }

    /// Keep whichever is better on this cluster: the sub-solution's routes or
    /// the elite's original ones, mapped back to master customer indices
    fn merge(
        &self,
        ctx: &Context,
        elite: &Individual,
        solution: Option<Individual>,
        composite: &mut Individual,
    ) {
        let elite_cost: FloatType = self
            .elite_routes
            .iter()
            .map(|&route_index| route_distance(ctx, &elite.phenotype[route_index]))
            .sum();

        match solution {
            Some(best) if elite_cost > best.penalized_cost() => {
                for route in best.phenotype.iter().filter(|route| !route.is_empty()) {
                    composite
                        .phenotype
                        .push(route.iter().map(|&customer| self.mapping[customer]).collect());
                }
            }
            _ => {
                for &route_index in self.elite_routes.iter() {
                    if !elite.phenotype[route_index].is_empty() {
                        composite.phenotype.push(elite.phenotype[route_index].clone());
                    }
                }
            }
        }
    }
}

fn route_distance(ctx: &Context, route: &[usize]) -> FloatType {
    if route.is_empty() {
        return 0.0;
    }
    let mut distance = ctx.problem.distance.get(0, route[0]);
    for pair in route.windows(2) {
        distance += ctx.problem.distance.get(pair[0], pair[1]);
    }
    distance + ctx.problem.distance.get(route[route.len() - 1], 0)
}
