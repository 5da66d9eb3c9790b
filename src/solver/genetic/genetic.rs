use crate::solver::genetic::{decompose, Individual, Population, Split};
use crate::solver::improvement::LocalSearch;
use crate::solver::Context;

#[derive(PartialEq)]
pub enum State {
    Created,
    Cycle,
    Terminated,
}

/// The outer hybrid genetic search loop: selection, OX crossover, split,
/// local search education, admission with probabilistic repair, penalty
/// management, traces, decomposition rounds and restarts.
pub struct GeneticAlgorithm {
    pub state: State,
    pub population: Population,
    pub split: Split,
    pub local_search: LocalSearch,

    pub iterations: u64,
    // Iterations since the last improvement, 1-based as in the termination test
    pub non_productive: u64,

    child: Individual,
}

impl GeneticAlgorithm {
    pub fn new(ctx: &Context) -> Self {
        Self {
            state: State::Created,
            population: Population::new(ctx),
            split: Split::new(ctx),
            local_search: LocalSearch::new(ctx),
            iterations: 0,
            non_productive: 1,
            child: Individual::empty(),
        }
    }

    pub fn best(&self) -> Option<&Individual> {
        self.population.get_best_found()
    }

    /// Drive the search to completion: one `iterate` per cycle until the
    /// non-productive limit or the time budget ends the run
    pub fn run(&mut self, ctx: &Context) {
        while !self.terminated() {
            self.iterate(ctx);
        }
        log::debug!(
            "T(s) {:.2} | Iter {:6} | search finished",
            ctx.elapsed_as_secs_f64(),
            self.iterations
        );
    }

    pub fn terminated(&self) -> bool {
        self.state == State::Terminated
    }

    fn crossover(&self, ctx: &Context, parent_one: &Individual, parent_two: &Individual) -> Individual {
        let length = parent_one.genotype.len();
        // Tiny sub-instances have no crossover zone to pick
        if length < 2 {
            return Individual::new(parent_one.genotype.clone());
        }
        let start = ctx.random.range_usize(0, length);
        let mut end = ctx.random.range_usize(0, length);
        while end == start {
            end = ctx.random.range_usize(0, length);
        }
        Self::crossover_ox(parent_one, parent_two, start, end)
    }

    /// OX crossover: copy the wrap-around slice [start..=end] from the first
    /// parent, then fill the remaining positions in the order the second
    /// parent visits them, beginning right after `end`
    pub fn crossover_ox(
        parent_one: &Individual,
        parent_two: &Individual,
        start: usize,
        end: usize,
    ) -> Individual {
        let length = parent_one.genotype.len();
        let mut genotype = vec![0; length];
        let mut inherited = vec![false; length + 1];

        let mut position = start;
        loop {
            genotype[position] = parent_one.genotype[position];
            inherited[genotype[position]] = true;
            if position == end {
                break;
            }
            position = (position + 1) % length;
        }

        let mut insert = (end + 1) % length;
        for offset in 1..=length {
            let candidate = parent_two.genotype[(end + offset) % length];
            if !inherited[candidate] {
                inherited[candidate] = true;
                genotype[insert] = candidate;
                insert = (insert + 1) % length;
            }
        }

        Individual::new(genotype)
    }

    fn educate_and_admit(&mut self, ctx: &Context) -> bool {
        let (penalty_capacity, penalty_duration) = ctx.penalties();
        self.local_search
            .run(ctx, &mut self.child, penalty_capacity, penalty_duration);

        let mut new_best = self.population.add_individual(ctx, &self.child, true);

        // Repair a share of the infeasible offspring under strong penalties
        let repair_probability = ctx.config.borrow().repair_probability;
        if !self.child.is_feasible() && ctx.random.real() < repair_probability {
            self.local_search.run(
                ctx,
                &mut self.child,
                penalty_capacity * 10.0,
                penalty_duration * 10.0,
            );
            if self.child.is_feasible() {
                new_best |= self.population.add_individual(ctx, &self.child, false);
            }
        }
        new_best
    }

    fn log_state(&self, ctx: &Context) {
        let num_customers = ctx.problem.num_customers();
        let (penalty_capacity, penalty_duration) = ctx.penalties();
        log::debug!(
            "T(s) {:.2} | Iter {:6} {:5} | Feas {} {:.2} {:.2} | Inf {} {:.2} {:.2} | \
             Div {:.2} {:.2} | Win {:.2} {:.2} | Pen {:.2} {:.2}",
            ctx.elapsed_as_secs_f64(),
            self.iterations,
            self.non_productive,
            self.population.feasible.size(),
            self.population
                .feasible
                .get_best()
                .map(|best| best.penalized_cost())
                .unwrap_or(-1.0),
            self.population.feasible.get_average_cost(),
            self.population.infeasible.size(),
            self.population
                .infeasible
                .get_best()
                .map(|best| best.penalized_cost())
                .unwrap_or(-1.0),
            self.population.infeasible.get_average_cost(),
            self.population.feasible.get_diversity() / num_customers.max(1) as f64,
            self.population.infeasible.get_diversity() / num_customers.max(1) as f64,
            self.population.load_window_fraction(),
            self.population.duration_window_fraction(),
            penalty_capacity,
            penalty_duration,
        );
    }

    /// One step of the state machine: population generation on the first
    /// call, afterwards one full selection/crossover/education cycle
    pub fn iterate(&mut self, ctx: &Context) {
        // The initial population is always generated; its own loop polls the
        // time budget after the first individual
        if self.state != State::Created && ctx.terminate() {
            self.state = State::Terminated;
        }
        match self.state {
            State::Created => {
                self.population
                    .generate(ctx, &mut self.split, &mut self.local_search);
                self.non_productive = 1;
                self.state = State::Cycle;
            }
            State::Cycle => {
                let max_non_productive =
                    ctx.config.borrow().max_iterations_without_improvement;
                if self.non_productive > max_non_productive {
                    self.state = State::Terminated;
                    return;
                }

                // Selection and crossover
                let parent_one = self.population.get_binary_tournament(ctx);
                let parent_two = self.population.get_binary_tournament(ctx);
                self.child = self.crossover(ctx, &parent_one, &parent_two);

                // The child may use as many routes as its first parent did
                let max_routes = parent_one.evaluation.num_routes.max(1);
                self.split.run(ctx, &mut self.child, max_routes);

                // Local search education and admission
                let new_best = self.educate_and_admit(ctx);
                if new_best {
                    self.non_productive = 1;
                } else {
                    self.non_productive += 1;
                }
                self.iterations += 1;

                // Periodic tasks
                let config = ctx.config.borrow();
                let penalty_interval = config.penalty_update_interval;
                let log_interval = config.log_interval;
                let log_enabled = config.log_enabled;
                let use_decomposition =
                    config.use_decomposition && ctx.problem.coordinates_provided;
                let decomposition_interval =
                    config.decomposition_interval_for(ctx.problem.num_customers());
                let time_limited = config.time_limit.is_some();
                drop(config);

                if self.iterations % penalty_interval == 0 {
                    self.population.manage_penalties(ctx);
                }
                if log_enabled && self.iterations % log_interval == 0 {
                    self.log_state(ctx);
                }
                if use_decomposition && self.iterations % decomposition_interval == 0 {
                    decompose(ctx, &mut self.population);
                }

                // With a time limit active the search restarts instead of
                // terminating on a non-productive streak
                if time_limited && self.non_productive == max_non_productive {
                    self.population
                        .restart(ctx, &mut self.split, &mut self.local_search);
                    self.non_productive = 1;
                }
            }
            State::Terminated => {}
        }
    }
}
