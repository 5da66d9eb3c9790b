use crate::constants::EPSILON;
use crate::models::FloatType;
use crate::solver::Context;

/// True when `candidate` undercuts `incumbent` by more than the feasibility
/// tolerance. All best-solution bookkeeping goes through this so a cost has
/// to beat the incumbent by a real margin, not by float noise.
#[inline]
pub fn cost_improves(candidate: FloatType, incumbent: FloatType) -> bool {
    candidate < incumbent - EPSILON
}

/// True when two penalised costs coincide within the tolerance
#[inline]
pub fn costs_equal(a: FloatType, b: FloatType) -> bool {
    (a - b).abs() < EPSILON
}

/// Penalised cost of a single route
#[inline]
pub fn route_cost(
    distance: FloatType,
    overload: FloatType,
    duration_excess: FloatType,
    penalty_capacity: FloatType,
    penalty_duration: FloatType,
) -> FloatType {
    distance + penalty_capacity * overload.max(0.0) + penalty_duration * duration_excess.max(0.0)
}

/// Cost summary of a complete solution
#[derive(Debug, Clone)]
pub struct SolutionEvaluation {
    pub distance: FloatType,
    pub capacity_excess: FloatType,
    pub duration_excess: FloatType,
    pub num_routes: usize,
    pub penalized_cost: FloatType,
    pub feasible: bool,

    // Route adjacency of every node, with the depot closing each route
    pub predecessors: Vec<usize>,
    pub successors: Vec<usize>,
}

impl SolutionEvaluation {
    pub fn new() -> Self {
        Self {
            distance: 0.0,
            capacity_excess: 0.0,
            duration_excess: 0.0,
            num_routes: 0,
            penalized_cost: FloatType::INFINITY,
            feasible: false,
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    pub fn evaluate(&mut self, ctx: &Context, solution: &[Vec<usize>]) {
        let problem = &ctx.problem;
        let capacity = problem.vehicle_capacity;
        let duration_limit = problem.duration_limit;

        self.distance = 0.0;
        self.capacity_excess = 0.0;
        self.duration_excess = 0.0;
        self.num_routes = 0;
        self.predecessors.clear();
        self.predecessors.resize(problem.dim(), 0);
        self.successors.clear();
        self.successors.resize(problem.dim(), 0);

        for route in solution.iter() {
            if route.is_empty() {
                continue;
            }
            self.num_routes += 1;

            let mut last_node = 0;
            let mut distance = 0.0;
            let mut load = 0.0;
            let mut service = 0.0;
            for &node in route.iter() {
                distance += problem.distance.get(last_node, node);
                load += problem.clients[node].demand;
                service += problem.clients[node].service_duration;
                self.predecessors[node] = last_node;
                self.successors[last_node] = node;
                last_node = node;
            }
            self.successors[last_node] = 0;
            distance += problem.distance.get(last_node, 0);

            self.distance += distance;
            if load > capacity {
                self.capacity_excess += load - capacity;
            }
            if distance + service > duration_limit {
                self.duration_excess += distance + service - duration_limit;
            }
        }

        let (penalty_capacity, penalty_duration) = ctx.penalties();
        self.update_penalized_cost(penalty_capacity, penalty_duration);
    }

    /// Recompute the penalised cost from the stored excesses. Used when the
    /// penalty coefficients change without the routes changing.
    pub fn update_penalized_cost(
        &mut self,
        penalty_capacity: FloatType,
        penalty_duration: FloatType,
    ) {
        self.penalized_cost = self.distance
            + penalty_capacity * self.capacity_excess
            + penalty_duration * self.duration_excess;
        self.feasible = self.capacity_excess < EPSILON && self.duration_excess < EPSILON;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_cost_adds_positive_excesses_only() {
        assert_eq!(10.0, route_cost(10.0, -2.0, -5.0, 30.0, 1.0));
        assert_eq!(74.0, route_cost(10.0, 2.0, 4.0, 30.0, 1.0));
    }

    #[test]
    fn cost_comparisons_ignore_float_noise() {
        assert!(cost_improves(28.0, 29.0));
        assert!(!cost_improves(29.0, 29.0));
        assert!(!cost_improves(29.0 - 1e-12, 29.0));
        assert!(costs_equal(29.0, 29.0 + 1e-12));
        assert!(!costs_equal(29.0, 29.1));
    }
}
