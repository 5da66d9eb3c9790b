use std::cmp::Ordering;

use crate::models::FloatType;
use crate::solver::{costs_equal, Context, SolutionEvaluation};

/// One complete solution: a giant tour (`genotype`) and its decomposition
/// into routes (`phenotype`), which always visit the same customers in the
/// same order.
#[derive(Debug, Clone)]
pub struct Individual {
    // Used as key in the population's proximity structures
    pub number: u64,
    // Giant tour over all customers, without the depot
    pub genotype: Vec<usize>,
    // Routes, empty ones included at their positions
    pub phenotype: Vec<Vec<usize>>,
    // Biased fitness assigned during population ranking
    pub fitness: FloatType,
    pub evaluation: SolutionEvaluation,
}

impl Individual {
    pub fn new(genotype: Vec<usize>) -> Self {
        Self {
            number: 0,
            genotype,
            phenotype: Vec::new(),
            fitness: FloatType::INFINITY,
            evaluation: SolutionEvaluation::new(),
        }
    }

    pub fn new_random(ctx: &Context) -> Self {
        let mut genotype: Vec<usize> = (1..ctx.problem.dim()).collect();
        ctx.random.shuffle(genotype.as_mut_slice());
        let mut individual = Self::new(genotype);
        individual.phenotype = vec![Vec::new(); ctx.problem.num_vehicles];
        individual
    }

    /// Placeholder individual with an unusable cost
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn evaluate(&mut self, ctx: &Context) {
        self.evaluation.evaluate(ctx, &self.phenotype);
    }

    pub fn is_feasible(&self) -> bool {
        self.evaluation.is_feasible()
    }

    pub fn penalized_cost(&self) -> FloatType {
        self.evaluation.penalized_cost
    }

    pub fn successor(&self, node: usize) -> usize {
        self.evaluation.successors[node]
    }

    pub fn predecessor(&self, node: usize) -> usize {
        self.evaluation.predecessors[node]
    }

    pub fn num_nonempty_routes(&self) -> usize {
        self.phenotype.iter().filter(|route| !route.is_empty()).count()
    }

    /// Rebuild the giant tour by concatenating the routes in order
    pub fn rebuild_genotype(&mut self) {
        self.genotype.clear();
        for route in self.phenotype.iter() {
            self.genotype.extend(route.iter().copied());
        }
    }

    /// Broken pairs distance: the number of adjacency pairs (depot links
    /// included) present in one solution but not the other, normalised by
    /// the number of customers. Both individuals must be evaluated.
    pub fn broken_pairs_distance(&self, other: &Self) -> FloatType {
        let mut differences = 0;
        let num_customers = self.genotype.len();

        for node in 1..=num_customers {
            // The successor of node is adjacent to it in neither direction in the other
            if self.successor(node) != other.successor(node)
                && self.successor(node) != other.predecessor(node)
            {
                differences += 1;
            }
            // Node starts a route here but is nowhere next to the depot in the other
            if self.predecessor(node) == 0
                && other.predecessor(node) != 0
                && other.successor(node) != 0
            {
                differences += 1;
            }
        }

        differences as FloatType / num_customers as FloatType
    }
}

impl PartialOrd for Individual {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else {
            self.penalized_cost().partial_cmp(&other.penalized_cost())
        }
    }
}

impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        costs_equal(self.penalized_cost(), other.penalized_cost())
    }
}

impl Ord for Individual {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).expect("Failed to compare individuals")
    }
}

impl Eq for Individual {}
