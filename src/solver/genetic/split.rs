use crate::constants::UNBOUNDED;
use crate::models::{FloatType, Matrix};
use crate::solver::genetic::Individual;
use crate::solver::{route_cost, Context};

// Route loads considered by the split are capped at this multiple of the
// vehicle capacity, which bounds the inner propagation loops
const CAPACITY_FACTOR: FloatType = 1.5;

/// Decodes a giant tour into routes by a shortest path on the auxiliary
/// graph whose arc (i, j) serves customers i+1..=j of the tour as one route.
/// Arc costs carry the capacity and duration penalties at their current
/// levels.
#[derive(Debug)]
pub struct Split {
    // path_cost[k][i]: cost of serving the first i tour customers with k
    // routes (row 0 is the unlimited-fleet pass)
    path_cost: Matrix<FloatType>,
    predecessors: Matrix<usize>,

    // Per tour position 1..=N, loaded from the individual
    demand: Vec<FloatType>,
    distance_depot: Vec<FloatType>,
    cum_distance: Vec<FloatType>,
    cum_load: Vec<FloatType>,
    cum_service: Vec<FloatType>,

    penalty_capacity: FloatType,
    penalty_duration: FloatType,
}

impl Split {
    pub fn new(ctx: &Context) -> Self {
        let dim = ctx.problem.dim();
        let rows = ctx.problem.num_vehicles + 1;
        Self {
            path_cost: Matrix::init(UNBOUNDED, rows, dim),
            predecessors: Matrix::init(0, rows, dim),
            demand: vec![0.0; dim],
            distance_depot: vec![0.0; dim],
            cum_distance: vec![0.0; dim],
            cum_load: vec![0.0; dim],
            cum_service: vec![0.0; dim],
            penalty_capacity: 0.0,
            penalty_duration: 0.0,
        }
    }

    pub fn run(&mut self, ctx: &Context, individual: &mut Individual, max_vehicles: usize) {
        let max_vehicles = max_vehicles
            .max(ctx.problem.vehicle_lower_bound())
            .min(ctx.problem.num_vehicles)
            .max(1);

        self.load(ctx, individual);

        if !self.split(ctx, individual, max_vehicles) {
            if !self.split_limited_fleet(ctx, individual, max_vehicles) {
                // No path within the fleet bound: fall back to the
                // unlimited pass and carry the overflow as penalised excess
                self.split(ctx, individual, usize::MAX);
            }
        }
        individual.evaluate(ctx);
    }

    fn load(&mut self, ctx: &Context, individual: &Individual) {
        let (penalty_capacity, penalty_duration) = ctx.penalties();
        self.penalty_capacity = penalty_capacity;
        self.penalty_duration = penalty_duration;

        let problem = &ctx.problem;
        let dim = problem.dim();
        debug_assert_eq!(dim - 1, individual.genotype.len());

        for i in 1..dim {
            let node = individual.genotype[i - 1];
            let client = &problem.clients[node];
            self.demand[i] = client.demand;
            self.distance_depot[i] = problem.distance.get(0, node);
            self.cum_distance[i] = if i > 1 {
                self.cum_distance[i - 1] + problem.distance.get(individual.genotype[i - 2], node)
            } else {
                0.0
            };
            self.cum_load[i] = self.cum_load[i - 1] + client.demand;
            self.cum_service[i] = self.cum_service[i - 1] + client.service_duration;
        }
    }

    // Penalised cost of serving tour positions from+1..=to as one route
    #[inline]
    fn arc_cost(&self, problem_capacity: FloatType, duration_limit: FloatType, from: usize, to: usize) -> FloatType {
        let distance = self.distance_depot[from + 1]
            + (self.cum_distance[to] - self.cum_distance[from + 1])
            + self.distance_depot[to];
        let load = self.cum_load[to] - self.cum_load[from];
        let service = self.cum_service[to] - self.cum_service[from];
        route_cost(
            distance,
            load - problem_capacity,
            distance + service - duration_limit,
            self.penalty_capacity,
            self.penalty_duration,
        )
    }

    /// Unlimited-fleet Bellman pass. Returns true when the resulting number
    /// of routes stays within `max_vehicles`.
    pub fn split(&mut self, ctx: &Context, individual: &mut Individual, max_vehicles: usize) -> bool {
        let problem = &ctx.problem;
        let dim = problem.dim();
        let capacity = problem.vehicle_capacity;
        let duration_limit = problem.duration_limit;

        self.path_cost.set(0, 0, 0.0);
        for i in 1..dim {
            self.path_cost.set(0, i, UNBOUNDED);
        }

        for from in 0..(dim - 1) {
            let base = self.path_cost.get(0, from);
            if base >= UNBOUNDED {
                continue;
            }
            let mut load = 0.0;
            let mut to = from + 1;
            // A single-customer route is always permitted, even overloaded
            while to < dim
                && (to == from + 1 || load + self.demand[to] <= capacity * CAPACITY_FACTOR)
            {
                load += self.demand[to];
                let cost = base + self.arc_cost(capacity, duration_limit, from, to);
                if cost < self.path_cost.get(0, to) {
                    self.path_cost.set(0, to, cost);
                    self.predecessors.set(0, to, from);
                }
                to += 1;
            }
        }

        assert!(
            self.path_cost.get(0, dim - 1) < UNBOUNDED,
            "Split found no path to the last customer"
        );

        individual.phenotype.clear();
        let mut end = dim - 1;
        while end > 0 {
            let begin = self.predecessors.get(0, end);
            individual.phenotype.push(individual.genotype[begin..end].to_vec());
            end = begin;
        }
        individual.phenotype.reverse();

        let num_routes = individual.phenotype.len();
        self.pad_empty_routes(ctx, individual);
        num_routes <= max_vehicles
    }

    /// Layered Bellman pass tracking the number of routes used. Returns
    /// false when no path reaches the last customer within `max_vehicles`.
    pub fn split_limited_fleet(
        &mut self,
        ctx: &Context,
        individual: &mut Individual,
        max_vehicles: usize,
    ) -> bool {
        let problem = &ctx.problem;
        let dim = problem.dim();
        let capacity = problem.vehicle_capacity;
        let duration_limit = problem.duration_limit;

        self.path_cost.fill(UNBOUNDED);
        self.path_cost.set(0, 0, 0.0);

        for vehicle in 0..max_vehicles {
            for from in vehicle..(dim - 1) {
                let base = self.path_cost.get(vehicle, from);
                if base >= UNBOUNDED {
                    continue;
                }
                let mut load = 0.0;
                let mut to = from + 1;
                while to < dim
                    && (to == from + 1 || load + self.demand[to] <= capacity * CAPACITY_FACTOR)
                {
                    load += self.demand[to];
                    let cost = base + self.arc_cost(capacity, duration_limit, from, to);
                    if cost < self.path_cost.get(vehicle + 1, to) {
                        self.path_cost.set(vehicle + 1, to, cost);
                        self.predecessors.set(vehicle + 1, to, from);
                    }
                    to += 1;
                }
            }
        }

        // Cheapest path using at most max_vehicles routes
        let last = dim - 1;
        let mut num_routes = max_vehicles;
        let mut min_cost = self.path_cost.get(max_vehicles, last);
        for vehicle in 1..max_vehicles {
            if self.path_cost.get(vehicle, last) < min_cost {
                min_cost = self.path_cost.get(vehicle, last);
                num_routes = vehicle;
            }
        }
        if min_cost >= UNBOUNDED {
            return false;
        }

        individual.phenotype.clear();
        let mut end = last;
        let mut vehicle = num_routes;
        while vehicle > 0 {
            let begin = self.predecessors.get(vehicle, end);
            individual
                .phenotype
                .insert(0, individual.genotype[begin..end].to_vec());
            end = begin;
            vehicle -= 1;
        }
        debug_assert_eq!(0, end, "Limited fleet split left a gap in the tour");

        self.pad_empty_routes(ctx, individual);
        true
    }

    fn pad_empty_routes(&self, ctx: &Context, individual: &mut Individual) {
        while individual.phenotype.len() < ctx.problem.num_vehicles {
            individual.phenotype.push(Vec::new());
        }
    }
}
