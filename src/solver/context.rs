use std::cell::RefCell;

use instant::Instant;

use crate::config::Config;
use crate::models::{FloatType, Problem};
use crate::solver::SearchHistory;
use crate::utils::Random;

/// Shared state of one solver run: the immutable problem, the mutable
/// configuration (penalties live here), the PRNG and the clock. Passed by
/// reference everywhere; never cloned.
#[derive(Debug)]
pub struct Context {
    pub problem: Problem,
    pub config: RefCell<Config>,
    pub random: Random,
    pub search_history: RefCell<SearchHistory>,
}

impl Context {
    pub fn new(problem: Problem, mut config: Config, start_time: Instant) -> Self {
        // Scale the initial capacity penalty to the instance
        config.penalty_capacity = problem.initial_capacity_penalty();
        config.penalty_duration = 1.0;
        let random = Random::from_seed(config.seed);
        Self::with_parts(problem, config, random, start_time)
    }

    /// Assembles a context without touching the penalties. Decomposition
    /// sub-runs use this to inherit the master's current penalty levels.
    pub fn with_parts(
        problem: Problem,
        config: Config,
        random: Random,
        start_time: Instant,
    ) -> Self {
        Self {
            problem,
            config: RefCell::new(config),
            random,
            search_history: RefCell::new(SearchHistory::new(start_time)),
        }
    }

    pub fn elapsed_as_secs_f64(&self) -> FloatType {
        self.search_history.borrow().start_time.elapsed().as_secs_f64()
    }

    /// Remaining wall time, if a time limit is set
    pub fn remaining_time(&self) -> Option<FloatType> {
        self.config
            .borrow()
            .time_limit
            .map(|limit| (limit - self.elapsed_as_secs_f64()).max(0.0))
    }

    /// Cooperative termination check, polled between iterations
    pub fn terminate(&self) -> bool {
        match self.config.borrow().time_limit {
            Some(limit) => self.elapsed_as_secs_f64() >= limit,
            None => false,
        }
    }

    pub fn penalties(&self) -> (FloatType, FloatType) {
        let config = self.config.borrow();
        (config.penalty_capacity, config.penalty_duration)
    }
}
