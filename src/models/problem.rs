use std::collections::BTreeSet;
use std::f64::consts::PI;

use anyhow::{bail, Result};

use crate::models::{FloatType, Matrix};

/// A client of the problem. Index 0 is the depot.
#[derive(Clone, Debug)]
pub struct Client {
    pub id: usize,
    pub x: FloatType,
    pub y: FloatType,
    pub demand: FloatType,
    pub service_duration: FloatType,
    // Polar angle around the depot in [0, 65536), only meaningful when
    // coordinates were provided
    pub polar_angle: i32,
}

#[derive(Debug)]
pub struct Problem {
    pub clients: Vec<Client>,
    pub vehicle_capacity: FloatType,
    pub duration_limit: FloatType,
    pub duration_constraint: bool,
    pub num_vehicles: usize,
    pub coordinates_provided: bool,
    pub distance: Matrix<FloatType>,
    // Correlated vertices of every customer, used by the granular search.
    // Empty for the depot.
    pub neighbors: Vec<Vec<usize>>,
    pub total_demand: FloatType,
    pub max_demand: FloatType,
    pub max_distance: FloatType,
}

impl Problem {
    /// Number of nodes including the depot
    pub fn dim(&self) -> usize {
        self.clients.len()
    }

    /// Number of customer nodes
    pub fn num_customers(&self) -> usize {
        self.dim() - 1
    }

    /// Trivial bin packing lower bound on the fleet size
    pub fn vehicle_lower_bound(&self) -> usize {
        (self.total_demand / self.vehicle_capacity).ceil() as usize
    }

    /// Scale for the initial capacity penalty
    pub fn initial_capacity_penalty(&self) -> FloatType {
        (self.max_distance / self.max_demand).max(0.1).min(1000.0)
    }

    /// Restriction of the problem to the nodes in `mapping`, where
    /// `mapping[i]` is the master index of sub-instance node `i` and
    /// `mapping[0]` is the depot. Used by the decomposition.
    pub fn restricted(&self, mapping: &[usize], num_vehicles: usize, granularity: usize) -> Self {
        let dim = mapping.len();
        let mut distance = Matrix::new(dim, dim);
        for i in 0..dim {
            for j in 0..dim {
                distance.set(i, j, self.distance.get(mapping[i], mapping[j]));
            }
        }

        let clients: Vec<Client> = mapping
            .iter()
            .enumerate()
            .map(|(index, &master)| {
                let mut client = self.clients[master].clone();
                client.id = index;
                client
            })
            .collect();

        let total_demand = clients.iter().map(|c| c.demand).sum();
        let max_demand = clients.iter().map(|c| c.demand).fold(0.0, FloatType::max);
        let mut max_distance: FloatType = 0.0;
        for i in 0..dim {
            for j in 0..dim {
                max_distance = max_distance.max(distance.get(i, j));
            }
        }

        let neighbors = correlated_vertices(&distance, dim - 1, granularity);

        Self {
            clients,
            vehicle_capacity: self.vehicle_capacity,
            duration_limit: self.duration_limit,
            duration_constraint: self.duration_constraint,
            num_vehicles,
            coordinates_provided: self.coordinates_provided,
            distance,
            neighbors,
            total_demand,
            max_demand,
            max_distance,
        }
    }
}

/// Collects the problem inputs and validates them into a `Problem`
#[derive(Debug)]
pub struct ProblemBuilder {
    pub coordinates: Option<Vec<(FloatType, FloatType)>>,
    pub demands: Vec<FloatType>,
    pub service_durations: Vec<FloatType>,
    pub distances: Option<Matrix<FloatType>>,
    pub vehicle_capacity: Option<FloatType>,
    pub duration_limit: Option<FloatType>,
    pub num_vehicles: i64,
    pub round_distances: bool,
    pub granularity: usize,
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self {
            coordinates: None,
            demands: Vec::new(),
            service_durations: Vec::new(),
            distances: None,
            vehicle_capacity: None,
            duration_limit: None,
            num_vehicles: -1,
            round_distances: false,
            granularity: 20,
        }
    }

    pub fn build(self) -> Result<Problem> {
        if self.demands.len() < 2 {
            bail!("Number of clients is undefined");
        }
        let num_customers = self.demands.len() - 1;
        let dim = num_customers + 1;

        let vehicle_capacity = match self.vehicle_capacity {
            Some(capacity) if capacity > 0.0 => capacity,
            _ => bail!("Vehicle capacity is undefined"),
        };

        if self.service_durations.len() != dim {
            bail!("Expected one service duration per node");
        }
        if let Some(coordinates) = self.coordinates.as_ref() {
            if coordinates.len() != dim {
                bail!("Expected one coordinate pair per node");
            }
        }

        let coordinates_provided = self.coordinates.is_some();

        // A supplied distance matrix is used as-is. Rounding only applies
        // when the matrix is computed from coordinates.
        let distance = match self.distances.clone() {
            Some(matrix) => {
                if matrix.rows != dim || matrix.cols != dim {
                    bail!(
                        "Distance matrix has dimension {}x{}, expected {}x{}",
                        matrix.rows,
                        matrix.cols,
                        dim,
                        dim
                    );
                }
                matrix
            }
            None => {
                let coordinates = match self.coordinates.as_ref() {
                    Some(coordinates) => coordinates,
                    None => bail!("Either coordinates or a distance matrix must be provided"),
                };
                let mut matrix = Matrix::new(dim, dim);
                for i in 0..dim {
                    for j in 0..dim {
                        let dx = coordinates[i].0 - coordinates[j].0;
                        let dy = coordinates[i].1 - coordinates[j].1;
                        let mut d = (dx * dx + dy * dy).sqrt();
                        if self.round_distances {
                            d = d.round();
                        }
                        matrix.set(i, j, d);
                    }
                }
                matrix
            }
        };

        let mut max_distance: FloatType = 0.0;
        for i in 0..dim {
            for j in 0..dim {
                max_distance = max_distance.max(distance.get(i, j));
            }
        }

        let depot = self.coordinates.as_ref().map(|c| c[0]).unwrap_or((0.0, 0.0));
        let clients: Vec<Client> = (0..dim)
            .map(|i| {
                let (x, y) = self
                    .coordinates
                    .as_ref()
                    .map(|c| c[i])
                    .unwrap_or((0.0, 0.0));
                Client {
                    id: i,
                    x,
                    y,
                    demand: self.demands[i],
                    service_duration: if i == 0 { 0.0 } else { self.service_durations[i] },
                    polar_angle: if coordinates_provided {
                        polar_angle(x - depot.0, y - depot.1)
                    } else {
                        0
                    },
                }
            })
            .collect();

        let total_demand: FloatType = clients.iter().map(|c| c.demand).sum();
        let max_demand = clients.iter().map(|c| c.demand).fold(0.0, FloatType::max);

        // Safeguards against numerical instability on oddly scaled instances
        if max_distance < 0.1 || max_distance > 100_000.0 {
            bail!(
                "The distances are of very small or large scale. \
                 Please rescale the dataset and run again."
            );
        }
        if max_demand < 0.1 || max_demand > 100_000.0 {
            bail!(
                "The demand quantities are of very small or large scale. \
                 Please rescale the dataset and run again."
            );
        }

        let num_vehicles = if self.num_vehicles < 0 {
            // Safety margin over the trivial bin packing bound
            let fleet = (1.3 * total_demand / vehicle_capacity).ceil() as usize + 3;
            log::info!("Fleet size was not specified, defaulting to {} vehicles", fleet);
            fleet
        } else {
            self.num_vehicles as usize
        };

        if num_vehicles < (total_demand / vehicle_capacity).ceil() as usize {
            bail!("Fleet size is insufficient to service the considered clients");
        }

        let neighbors = correlated_vertices(&distance, num_customers, self.granularity);

        Ok(Problem {
            clients,
            vehicle_capacity,
            duration_limit: self.duration_limit.unwrap_or(crate::constants::UNBOUNDED),
            duration_constraint: self.duration_limit.is_some(),
            num_vehicles,
            coordinates_provided,
            distance,
            neighbors,
            total_demand,
            max_demand,
            max_distance,
        })
    }
}

/// Polar angle around the depot, mapped onto [0, 65536)
fn polar_angle(x: FloatType, y: FloatType) -> i32 {
    (((y.atan2(x) / PI) * 32768.0).round() as i32).rem_euclid(65536)
}

/// Correlated vertices of every customer: the `granularity` nearest other
/// customers, symmetrised so that `j` correlated with `i` implies `i`
/// correlated with `j`. The depot never appears in any list.
fn correlated_vertices(
    distance: &Matrix<FloatType>,
    num_customers: usize,
    granularity: usize,
) -> Vec<Vec<usize>> {
    let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); num_customers + 1];
    let mut order: Vec<(FloatType, usize)> = Vec::with_capacity(num_customers);

    for i in 1..=num_customers {
        order.clear();
        for j in 1..=num_customers {
            if i != j {
                order.push((distance.get(i, j), j));
            }
        }
        order.sort_by(|a, b| a.partial_cmp(b).expect("Incomparable distance"));

        for &(_, j) in order.iter().take(granularity.min(num_customers - 1)) {
            sets[i].insert(j);
            sets[j].insert(i);
        }
    }

    sets.into_iter()
        .map(|set| set.into_iter().collect())
        .collect()
}
