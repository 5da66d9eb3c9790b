use std::collections::{HashMap, VecDeque};

use ahash::RandomState;

use crate::constants::{EPSILON, PENALTY_MAX, PENALTY_MIN};
use crate::models::FloatType;
use crate::solver::genetic::{Individual, Split};
use crate::solver::improvement::LocalSearch;
use crate::solver::{cost_improves, Context};

/// Broken pairs distance from one individual to another, kept sorted
/// ascending in the owner's proximity list
#[derive(Debug, Clone, Copy)]
pub struct Proximity {
    pub distance: FloatType,
    pub to_number: u64,
}

/// One of the two subpopulations, kept sorted by ascending penalised cost.
/// Proximity entries reference peers by their stable `number`, never by
/// position, so evictions only have to unlink that number everywhere.
pub struct SubPopulation {
    pub individuals: Vec<Individual>,
    proximities: HashMap<u64, Vec<Proximity>, RandomState>,
    // Population grows to min_size + generation_size, then is pruned
    min_size: usize,
    max_size: usize,
}

impl SubPopulation {
    pub fn new(ctx: &Context) -> Self {
        let config = ctx.config.borrow();
        let min_size = config.min_population_size as usize;
        let max_size = (config.min_population_size + config.population_lambda) as usize;
        Self {
            individuals: Vec::with_capacity(max_size + 1),
            proximities: HashMap::with_capacity_and_hasher(max_size + 1, ctx.random.random_state()),
            min_size,
            max_size,
        }
    }

    pub fn size(&self) -> usize {
        self.individuals.len()
    }

    pub fn get_best(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    pub fn add(&mut self, ctx: &Context, individual: Individual) {
        let number = individual.number;

        // Broken pairs distances against every current member, kept
        // symmetrically on both sides
        let mut own: Vec<Proximity> = Vec::with_capacity(self.individuals.len());
        for other in self.individuals.iter() {
            let distance = individual.broken_pairs_distance(other);
            Self::insert_proximity(
                self.proximities
                    .get_mut(&other.number)
                    .expect("Missing proximity list"),
                Proximity {
                    distance,
                    to_number: number,
                },
            );
            Self::insert_proximity(
                &mut own,
                Proximity {
                    distance,
                    to_number: other.number,
                },
            );
        }
        self.proximities.insert(number, own);

        // Insert sorted by penalised cost, before approximately equal members
        let cost = individual.penalized_cost();
        let position = self
            .individuals
            .partition_point(|other| other.penalized_cost() <= cost - EPSILON);
        self.individuals.insert(position, individual);

        // Survivor selection once the maximum size is exceeded
        if self.size() > self.max_size {
            while self.size() > self.min_size {
                self.remove_worst(ctx);
            }
        }
    }

    fn insert_proximity(list: &mut Vec<Proximity>, proximity: Proximity) {
        let position = list.partition_point(|other| other.distance < proximity.distance);
        list.insert(position, proximity);
    }

    /// Evict the worst individual by biased fitness, preferring clones and
    /// never touching the best
    fn remove_worst(&mut self, ctx: &Context) {
        self.update_biased_fitnesses(ctx);
        assert!(self.size() > 1, "Eliminating the best individual");

        let mut worst_position = 1;
        let mut worst_is_clone = false;
        let mut worst_fitness = -1.0;
        for position in 1..self.individuals.len() {
            let is_clone = self.is_clone(self.individuals[position].number);
            let fitness = self.individuals[position].fitness;
            if (is_clone && !worst_is_clone)
                || (is_clone == worst_is_clone && fitness >= worst_fitness)
            {
                worst_position = position;
                worst_is_clone = is_clone;
                worst_fitness = fitness;
            }
        }

        self.remove_at(worst_position);
    }

    /// An individual is a clone when its closest peer is at distance zero
    fn is_clone(&self, number: u64) -> bool {
        match self.proximities.get(&number).and_then(|list| list.first()) {
            Some(closest) => closest.distance < EPSILON,
            None => false,
        }
    }

    fn remove_at(&mut self, position: usize) {
        let removed = self.individuals.remove(position);
        self.proximities.remove(&removed.number);
        // Unlink the evictee from every remaining proximity list
        for (_, list) in self.proximities.iter_mut() {
            let before = list.len();
            list.retain(|proximity| proximity.to_number != removed.number);
            debug_assert_eq!(before, list.len() + 1, "Proximity bookkeeping out of sync");
        }
    }

    pub fn clear(&mut self) {
        self.individuals.clear();
        self.proximities.clear();
    }

    /// Rank by cost and by diversity contribution, then combine both ranks
    /// into the biased fitness used for selection and eviction
    pub fn update_biased_fitnesses(&mut self, ctx: &Context) {
        if self.individuals.len() <= 1 {
            if let Some(individual) = self.individuals.first_mut() {
                individual.fitness = 0.0;
            }
            return;
        }

        let num_closest = ctx.config.borrow().num_diversity_closest as usize;
        let num_elites = ctx.config.borrow().num_elites as usize;

        // Sort descending on diversity contribution; the position in
        // `individuals` doubles as the cost rank
        let mut ranking: Vec<(FloatType, usize)> = self
            .individuals
            .iter()
            .enumerate()
            .map(|(position, individual)| {
                (
                    -self.average_broken_pairs_distance_closest(individual.number, num_closest),
                    position,
                )
            })
            .collect();
        ranking.sort_by(|a, b| a.partial_cmp(b).expect("Incomparable diversity"));

        let size = self.individuals.len();
        let rank_factor = (size - 1) as FloatType;
        let elite_factor = 1.0 - num_elites as FloatType / size as FloatType;
        for (diversity_position, &(_, cost_position)) in ranking.iter().enumerate() {
            let diversity_rank = diversity_position as FloatType / rank_factor;
            let fitness_rank = cost_position as FloatType / rank_factor;
            self.individuals[cost_position].fitness = if size <= num_elites {
                fitness_rank
            } else {
                fitness_rank + elite_factor * diversity_rank
            };
        }
    }

    /// Mean broken pairs distance to the `count` closest peers
    pub fn average_broken_pairs_distance_closest(&self, number: u64, count: usize) -> FloatType {
        let list = match self.proximities.get(&number) {
            Some(list) if !list.is_empty() => list,
            _ => return 0.0,
        };
        let count = count.min(list.len());
        let total: FloatType = list.iter().take(count).map(|p| p.distance).sum();
        total / count as FloatType
    }

    /// Average diversity over the better half of the subpopulation
    pub fn get_diversity(&self) -> FloatType {
        let size = self.min_size.min(self.size());
        if size == 0 {
            return -1.0;
        }
        let total: FloatType = self.individuals[..size]
            .iter()
            .map(|individual| self.average_broken_pairs_distance_closest(individual.number, size))
            .sum();
        total / size as FloatType
    }

    pub fn get_average_cost(&self) -> FloatType {
        let size = self.min_size.min(self.size());
        if size == 0 {
            return -1.0;
        }
        let total: FloatType = self.individuals[..size]
            .iter()
            .map(|individual| individual.penalized_cost())
            .sum();
        total / size as FloatType
    }

    pub fn proximity_list(&self, number: u64) -> Option<&Vec<Proximity>> {
        self.proximities.get(&number)
    }
}

/// Dual population of feasible and infeasible solutions, owner of every
/// admitted individual and of the best-found bookkeeping
pub struct Population {
    total_count: u64,

    pub feasible: SubPopulation,
    pub infeasible: SubPopulation,

    // Sliding windows over the feasibility of the last 100 admissions
    load_window: VecDeque<bool>,
    duration_window: VecDeque<bool>,

    pub best_solution_restart: Option<Individual>,
    pub best_solution_overall: Option<Individual>,
}

impl Population {
    pub fn new(ctx: &Context) -> Self {
        Self {
            total_count: 0,
            feasible: SubPopulation::new(ctx),
            infeasible: SubPopulation::new(ctx),
            load_window: std::iter::repeat(true).take(100).collect(),
            duration_window: std::iter::repeat(true).take(100).collect(),
            best_solution_restart: None,
            best_solution_overall: None,
        }
    }

    pub fn size(&self) -> usize {
        self.feasible.size() + self.infeasible.size()
    }

    /// Fill the population with up to 4·μ randomised, educated individuals,
    /// stopping early when the time budget runs out
    pub fn generate(&mut self, ctx: &Context, split: &mut Split, local_search: &mut LocalSearch) {
        log::info!("Building initial population");
        let count = 4 * ctx.config.borrow().min_population_size;
        let repair_probability = ctx.config.borrow().repair_probability;
        for i in 0..count {
            if i > 0 && ctx.terminate() {
                break;
            }
            let mut individual = Individual::new_random(ctx);
            split.run(ctx, &mut individual, ctx.problem.num_vehicles);
            let (penalty_capacity, penalty_duration) = ctx.penalties();
            local_search.run(ctx, &mut individual, penalty_capacity, penalty_duration);
            self.add_individual(ctx, &individual, true);
            if !individual.is_feasible() && ctx.random.real() < repair_probability {
                local_search.run(
                    ctx,
                    &mut individual,
                    penalty_capacity * 10.0,
                    penalty_duration * 10.0,
                );
                if individual.is_feasible() {
                    self.add_individual(ctx, &individual, false);
                }
            }
        }
        assert!(self.size() > 0, "Empty population after generation");
    }

    /// Copy the individual into the matching subpopulation. Returns true
    /// when it improved on the best feasible solution since the last restart.
    pub fn add_individual(
        &mut self,
        ctx: &Context,
        individual: &Individual,
        update_windows: bool,
    ) -> bool {
        if update_windows {
            self.load_window
                .push_back(individual.evaluation.capacity_excess < EPSILON);
            self.load_window.pop_front();
            self.duration_window
                .push_back(individual.evaluation.duration_excess < EPSILON);
            self.duration_window.pop_front();
        }

        let mut copy = individual.clone();
        copy.number = self.total_count;
        self.total_count += 1;

        if copy.is_feasible() {
            self.feasible.add(ctx, copy);
        } else {
            self.infeasible.add(ctx, copy);
        }

        if !individual.is_feasible() {
            return false;
        }

        let cost = individual.penalized_cost();
        let restart_best = self
            .best_solution_restart
            .as_ref()
            .map(|best| best.penalized_cost())
            .unwrap_or(FloatType::INFINITY);
        if cost_improves(cost, restart_best) {
            self.best_solution_restart = Some(individual.clone());
            let overall_best = self
                .best_solution_overall
                .as_ref()
                .map(|best| best.penalized_cost())
                .unwrap_or(FloatType::INFINITY);
            if cost_improves(cost, overall_best) {
                self.best_solution_overall = Some(individual.clone());
                ctx.search_history.borrow_mut().record_best(cost);
            }
            return true;
        }
        false
    }

    /// Two contestants drawn uniformly from the union of both
    /// subpopulations; the lower biased fitness wins
    pub fn get_binary_tournament(&mut self, ctx: &Context) -> Individual {
        self.feasible.update_biased_fitnesses(ctx);
        self.infeasible.update_biased_fitnesses(ctx);

        let first = self.sample(ctx);
        let second = self.sample(ctx);
        if first.fitness < second.fitness {
            first.clone()
        } else {
            second.clone()
        }
    }

    fn sample(&self, ctx: &Context) -> &Individual {
        let position = ctx.random.range_usize(0, self.size());
        if position < self.feasible.size() {
            &self.feasible.individuals[position]
        } else {
            &self.infeasible.individuals[position - self.feasible.size()]
        }
    }

    /// Steer the penalties towards the target share of feasible admissions,
    /// then restore the infeasible subpopulation's cost order
    pub fn manage_penalties(&mut self, ctx: &Context) {
        let load_fraction = window_fraction(&self.load_window);
        let duration_fraction = window_fraction(&self.duration_window);

        {
            let mut config = ctx.config.borrow_mut();
            let target = config.target_feasible;
            let increase = config.penalty_inc_multiplier;
            let decrease = config.penalty_dec_multiplier;

            if load_fraction < target - 0.05 && config.penalty_capacity < PENALTY_MAX {
                config.penalty_capacity = (config.penalty_capacity * increase).min(PENALTY_MAX);
            } else if load_fraction > target + 0.05 && config.penalty_capacity > PENALTY_MIN {
                config.penalty_capacity = (config.penalty_capacity * decrease).max(PENALTY_MIN);
            }

            if duration_fraction < target - 0.05 && config.penalty_duration < PENALTY_MAX {
                config.penalty_duration = (config.penalty_duration * increase).min(PENALTY_MAX);
            } else if duration_fraction > target + 0.05 && config.penalty_duration > PENALTY_MIN {
                config.penalty_duration = (config.penalty_duration * decrease).max(PENALTY_MIN);
            }
        }

        let (penalty_capacity, penalty_duration) = ctx.penalties();
        for individual in self.infeasible.individuals.iter_mut() {
            individual
                .evaluation
                .update_penalized_cost(penalty_capacity, penalty_duration);
        }
        self.infeasible.individuals.sort_by(|a, b| {
            a.penalized_cost()
                .partial_cmp(&b.penalized_cost())
                .expect("Incomparable cost")
        });
    }

    /// Throw both subpopulations away and start over, keeping only the
    /// overall best
    pub fn restart(&mut self, ctx: &Context, split: &mut Split, local_search: &mut LocalSearch) {
        log::info!("Restart: creating a new population");
        self.feasible.clear();
        self.infeasible.clear();
        self.best_solution_restart = None;
        self.generate(ctx, split, local_search);
    }

    pub fn get_best_found(&self) -> Option<&Individual> {
        self.best_solution_overall.as_ref()
    }

    pub fn load_window_fraction(&self) -> FloatType {
        window_fraction(&self.load_window)
    }

    pub fn duration_window_fraction(&self) -> FloatType {
        window_fraction(&self.duration_window)
    }
}

fn window_fraction(window: &VecDeque<bool>) -> FloatType {
    window.iter().filter(|&&feasible| feasible).count() as FloatType / window.len() as FloatType
}
